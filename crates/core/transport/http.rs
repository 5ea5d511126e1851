//! HTTP transport for the text search endpoint.
//!
//! # Example
//!
//! ```no_run
//! use gridsweep::transport::http::{Credentials, HttpTransport};
//! use std::time::Duration;
//!
//! let transport = HttpTransport::new(
//!     "https://places.googleapis.com/v1/places:searchText",
//!     Credentials::Bearer("ya29...".into()),
//!     Duration::from_secs(30),
//! )?;
//! # Ok::<(), gridsweep::SweepError>(())
//! ```

use super::PageTransport;
use crate::error::{FetchError, Result};
use gridsweep_types::query::{PageResponse, SearchTextRequest};
use std::time::Duration;

pub const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";
pub const API_KEY_HEADER: &str = "X-Goog-Api-Key";

/// How requests authenticate against the endpoint.
#[derive(Clone, Default)]
pub enum Credentials {
    /// OAuth access token sent as `Authorization: Bearer`.
    Bearer(String),
    /// API key sent in the `X-Goog-Api-Key` header.
    ApiKey(String),
    #[default]
    Anonymous,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credentials::Anonymous => f.write_str("Anonymous"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    credentials: Credentials,
}

impl HttpTransport {
    /// Create a transport whose every HTTP call is bounded by `timeout`.
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Credentials,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            credentials,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PageTransport for HttpTransport {
    async fn fetch_page(
        &self,
        request: &SearchTextRequest,
        field_mask: &str,
    ) -> std::result::Result<PageResponse, FetchError> {
        let builder = self
            .client
            .post(&self.endpoint)
            .header(FIELD_MASK_HEADER, field_mask)
            .json(request);

        let builder = match &self.credentials {
            Credentials::Bearer(token) => builder.bearer_auth(token),
            Credentials::ApiKey(key) => builder.header(API_KEY_HEADER, key),
            Credentials::Anonymous => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}
