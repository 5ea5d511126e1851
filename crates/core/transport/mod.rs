//! Transport layer for the search endpoint
//!
//! A transport performs exactly one page request. Pagination, retries and
//! truncation detection live in [`PagedQueryClient`](crate::client::PagedQueryClient).
//!
//! Available transports:
//! - `http` - reqwest-based client for the real endpoint

pub mod http;

use crate::error::FetchError;
use gridsweep_types::query::{PageResponse, SearchTextRequest};
use std::future::Future;
use std::sync::Arc;

/// Fetches a single page of search results.
pub trait PageTransport: Send + Sync {
    fn fetch_page(
        &self,
        request: &SearchTextRequest,
        field_mask: &str,
    ) -> impl Future<Output = Result<PageResponse, FetchError>> + Send;
}

impl<T: PageTransport> PageTransport for Arc<T> {
    fn fetch_page(
        &self,
        request: &SearchTextRequest,
        field_mask: &str,
    ) -> impl Future<Output = Result<PageResponse, FetchError>> + Send {
        (**self).fetch_page(request, field_mask)
    }
}
