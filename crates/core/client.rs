//! One logical query: every page of results for one rectangle.

use crate::error::FetchError;
use crate::transport::PageTransport;
use gridsweep_types::place::PlaceRecord;
use gridsweep_types::query::{PageResponse, SearchRequestTemplate, SearchTextRequest};
use gridsweep_types::rect::Rectangle;
use std::time::Duration;

/// The merged pages of one rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub records: Vec<PlaceRecord>,
    /// The record count reached the cap, so the endpoint may have dropped
    /// results. Never set when `error` is present.
    pub truncated: bool,
    /// Pages successfully received.
    pub pages: u32,
    /// Set when pagination stopped early; `records` then holds the pages
    /// received before the failure.
    pub error: Option<FetchError>,
}

/// Follows pagination cursors for a rectangle until the endpoint stops
/// returning them.
#[derive(Debug, Clone)]
pub struct PagedQueryClient<T> {
    transport: T,
    cap: usize,
    max_retries: u32,
    retry_backoff: Duration,
}

impl<T: PageTransport> PagedQueryClient<T> {
    pub fn new(transport: T, cap: usize) -> Self {
        Self {
            transport,
            cap,
            max_retries: 0,
            retry_backoff: Duration::from_millis(500),
        }
    }

    /// Retry each failed page up to `max_retries` times when the failure is
    /// retryable, sleeping `backoff`, `2 * backoff`, ... between attempts.
    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch every page of `template` restricted to `rectangle`.
    ///
    /// Failures never escape: pagination stops at the first page that cannot
    /// be fetched and the error is returned alongside the records gathered so
    /// far. Truncation is judged on the total across all pages.
    pub async fn fetch_all(
        &self,
        rectangle: &Rectangle,
        template: &SearchRequestTemplate,
    ) -> PageResult {
        let field_mask = template.effective_field_mask();
        let mut request = template.for_rectangle(rectangle);
        let mut records = Vec::new();
        let mut pages = 0;

        let error = loop {
            let page = match self.fetch_with_retry(&request, &field_mask).await {
                Ok(page) => page,
                Err(e) => {
                    log::warn!(
                        "Page {} of {} failed: {} ({} records kept)",
                        pages + 1,
                        rectangle,
                        e,
                        records.len()
                    );
                    break Some(e);
                }
            };

            pages += 1;
            let next = page.next_cursor().map(str::to_owned);
            records.extend(page.places);

            match next {
                None => break None,
                Some(token) if request.page_token.as_deref() == Some(token.as_str()) => {
                    break Some(FetchError::Decode(format!(
                        "pagination cursor did not advance after page {}",
                        pages
                    )));
                }
                Some(token) => request = request.with_page_token(token),
            }
        };

        let truncated = error.is_none() && records.len() >= self.cap;
        PageResult {
            records,
            truncated,
            pages,
            error,
        }
    }

    async fn fetch_with_retry(
        &self,
        request: &SearchTextRequest,
        field_mask: &str,
    ) -> Result<PageResponse, FetchError> {
        let mut attempt = 0;
        let mut backoff = self.retry_backoff;

        loop {
            match self.transport.fetch_page(request, field_mask).await {
                Ok(page) => return Ok(page),
                Err(e) if attempt < self.max_retries && e.is_retryable() => {
                    attempt += 1;
                    log::debug!(
                        "Retrying {} after {:?} (attempt {}/{}): {}",
                        request.rectangle(),
                        backoff,
                        attempt,
                        self.max_retries,
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = backoff.saturating_mul(2);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
