//! Adaptive subdivision search.
//!
//! The endpoint silently drops results beyond its cap, so a rectangle whose
//! result count reaches the cap cannot be trusted. Such a rectangle is split
//! into a `divisions × divisions` grid and each child is searched in turn,
//! recursively, until every leaf returns fewer results than the cap.
//!
//! Siblings are independent and searched concurrently; a parent waits for all
//! of its children before folding their outcomes. A semaphore bounds the
//! number of logical queries in flight across the whole tree. Permits are held
//! only while a rectangle is being fetched, so a parent waiting on its
//! children never starves them.

use crate::client::PagedQueryClient;
use crate::config::SweepConfig;
use crate::outcome::{ExhaustReason, SearchOutcome};
use crate::transport::PageTransport;
use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use gridsweep_types::query::SearchRequestTemplate;
use gridsweep_types::rect::Rectangle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

pub struct RegionSearcher<T> {
    client: PagedQueryClient<T>,
    divisions: usize,
    max_depth: Option<u32>,
    min_cell_diagonal_meters: f64,
    permits: Semaphore,
    cancel: CancellationToken,
}

impl<T: PageTransport> RegionSearcher<T> {
    /// A searcher splitting saturated rectangles into `divisions × divisions`
    /// children, with no termination guard and one query in flight at a time.
    pub fn new(client: PagedQueryClient<T>, divisions: usize) -> Self {
        Self {
            client,
            divisions,
            max_depth: None,
            min_cell_diagonal_meters: 0.0,
            permits: Semaphore::new(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn from_config(client: PagedQueryClient<T>, config: &SweepConfig) -> Self {
        Self::new(client, config.sub_divisions)
            .with_max_depth(config.max_depth)
            .with_min_cell_diagonal_meters(config.min_cell_diagonal_meters)
            .with_concurrency(config.concurrency)
    }

    pub fn with_max_depth(mut self, max_depth: Option<u32>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_cell_diagonal_meters(mut self, meters: f64) -> Self {
        self.min_cell_diagonal_meters = meters;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.permits = Semaphore::new(concurrency.clamp(1, Semaphore::MAX_PERMITS));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn client(&self) -> &PagedQueryClient<T> {
        &self.client
    }

    /// Search `rectangle` exhaustively.
    ///
    /// The returned outcome holds the records of every leaf below
    /// `rectangle` and counts one request per rectangle queried, whatever
    /// the number of pages it took.
    pub async fn search(
        &self,
        rectangle: Rectangle,
        template: &SearchRequestTemplate,
    ) -> SearchOutcome {
        self.search_at(rectangle, template, 0).await
    }

    /// Search several independent rectangles and fold their outcomes.
    pub async fn search_all(
        &self,
        rectangles: impl IntoIterator<Item = Rectangle>,
        template: &SearchRequestTemplate,
    ) -> SearchOutcome {
        join_all(
            rectangles
                .into_iter()
                .map(|rectangle| self.search_at(rectangle, template, 0)),
        )
        .await
        .into_iter()
        .collect()
    }

    fn search_at<'a>(
        &'a self,
        rectangle: Rectangle,
        template: &'a SearchRequestTemplate,
        depth: u32,
    ) -> BoxFuture<'a, SearchOutcome> {
        async move {
            if self.cancel.is_cancelled() {
                return SearchOutcome::cancelled(rectangle, 0);
            }

            let result = {
                let _permit = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return SearchOutcome::cancelled(rectangle, 0),
                    permit = self.permits.acquire() => match permit {
                        Ok(permit) => permit,
                        Err(_) => return SearchOutcome::cancelled(rectangle, 0),
                    },
                };

                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => {
                        log::debug!("Aborted in-flight query for {}", rectangle);
                        return SearchOutcome::cancelled(rectangle, 1);
                    }
                    result = self.client.fetch_all(&rectangle, template) => result,
                }
            };

            log::debug!(
                "Depth {} {} -> {} places in {} pages",
                depth,
                rectangle,
                result.records.len(),
                result.pages
            );

            if let Some(error) = result.error {
                log::warn!(
                    "Query for {} failed at depth {}: {}; keeping {} records",
                    rectangle,
                    depth,
                    error,
                    result.records.len()
                );
                return SearchOutcome::failed(rectangle, depth, result.records, error);
            }

            if !result.truncated {
                return SearchOutcome::leaf(result.records, depth);
            }

            if let Some(reason) = self.refuse_split(&rectangle, depth) {
                log::warn!(
                    "{} still saturated at depth {} but cannot be split ({:?}); coverage incomplete",
                    rectangle,
                    depth,
                    reason
                );
                return SearchOutcome::exhausted(rectangle, depth, result.records, reason);
            }

            let children = match rectangle.subdivide(self.divisions) {
                Ok(children) => children,
                Err(e) => {
                    log::warn!("Cannot split {}: {}; coverage incomplete", rectangle, e);
                    return SearchOutcome::exhausted(
                        rectangle,
                        depth,
                        result.records,
                        ExhaustReason::Unsplittable,
                    );
                }
            };

            log::info!(
                "Subdividing {} at depth {} into {} cells",
                rectangle,
                depth,
                children.len()
            );

            // The parent's capped records are superseded by its children.
            drop(result.records);

            let outcomes = join_all(
                children
                    .into_iter()
                    .map(|child| self.search_at(child, template, depth + 1)),
            )
            .await;

            SearchOutcome::subdivided(outcomes)
        }
        .boxed()
    }

    fn refuse_split(&self, rectangle: &Rectangle, depth: u32) -> Option<ExhaustReason> {
        if let Some(max_depth) = self.max_depth
            && depth >= max_depth
        {
            return Some(ExhaustReason::MaxDepth);
        }

        // Children are roughly `divisions` times smaller along the diagonal.
        let child_diagonal = rectangle.diagonal_meters() / self.divisions as f64;
        if child_diagonal < self.min_cell_diagonal_meters {
            return Some(ExhaustReason::MinCellSize);
        }

        None
    }
}
