//! Builder for sweeps against the HTTP endpoint.

use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::sweep::Sweeper;
use crate::transport::http::{Credentials, HttpTransport};
use tokio_util::sync::CancellationToken;

/// Builder for a [`Sweeper`] talking to the real endpoint.
#[derive(Debug, Default)]
pub struct SweepBuilder {
    config: SweepConfig,
    credentials: Credentials,
    cancel: Option<CancellationToken>,
}

impl SweepBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: SweepConfig) -> Self {
        self.config = config;
        self
    }

    /// Authenticate with an OAuth access token.
    pub fn bearer_token(mut self, token: impl Into<String>) -> Self {
        self.credentials = Credentials::Bearer(token.into());
        self
    }

    /// Authenticate with an API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.credentials = Credentials::ApiKey(key.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn build(self) -> Result<Sweeper<HttpTransport>> {
        self.config.validate().map_err(SweepError::InvalidConfig)?;

        let transport = HttpTransport::new(
            self.config.endpoint.clone(),
            self.credentials,
            self.config.request_timeout(),
        )?;

        let sweeper = Sweeper::with_transport(self.config, transport)?;
        Ok(match self.cancel {
            Some(token) => sweeper.with_cancellation(token),
            None => sweeper,
        })
    }
}
