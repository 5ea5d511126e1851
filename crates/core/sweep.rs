//! Top-level driver: seed a grid over a region and search every cell.

use crate::boundary::BoundaryProvider;
use crate::client::PagedQueryClient;
use crate::config::SweepConfig;
use crate::error::{Result, SweepError};
use crate::outcome::SearchOutcome;
use crate::quadrant::QuadrantGenerator;
use crate::search::RegionSearcher;
use crate::transport::PageTransport;
use geo::MultiPolygon;
use gridsweep_types::query::SearchRequestTemplate;
use gridsweep_types::rect::Rectangle;
use tokio_util::sync::CancellationToken;

/// Runs a complete sweep over a region.
///
/// ```ignore
/// let sweeper = SweepBuilder::new().bearer_token(token).build()?;
/// let outcome = sweeper.run(&boundary, &template).await;
/// println!("{}", outcome.summary());
/// ```
pub struct Sweeper<T> {
    config: SweepConfig,
    quadrants: QuadrantGenerator,
    searcher: RegionSearcher<T>,
}

impl<T: PageTransport> Sweeper<T> {
    /// Build a sweeper around any transport.
    pub fn with_transport(config: SweepConfig, transport: T) -> Result<Self> {
        config.validate().map_err(SweepError::InvalidConfig)?;

        let client = PagedQueryClient::new(transport, config.cap)
            .with_retries(config.max_retries, config.retry_backoff());
        let searcher = RegionSearcher::from_config(client, &config);

        Ok(Self {
            quadrants: QuadrantGenerator::new(config.top_divisions),
            searcher,
            config,
        })
    }

    /// Cancel the sweep when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.searcher = self.searcher.with_cancellation(token);
        self
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn searcher(&self) -> &RegionSearcher<T> {
        &self.searcher
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.searcher.cancellation_token().clone()
    }

    /// The top-level cells a sweep over `boundary` starts from.
    pub fn quadrants(&self, boundary: &MultiPolygon<f64>) -> Vec<Rectangle> {
        self.quadrants.generate(boundary)
    }

    pub async fn run(
        &self,
        boundary: &MultiPolygon<f64>,
        template: &SearchRequestTemplate,
    ) -> SearchOutcome {
        let quadrants = self.quadrants(boundary);
        log::info!(
            "Sweeping {} quadrants for '{}'",
            quadrants.len(),
            template.text_query
        );

        let outcome = self.searcher.search_all(quadrants, template).await;
        log::info!("Sweep finished: {}", outcome.summary());
        outcome
    }

    /// Resolve the boundary from `provider`, then [`run`](Self::run).
    pub async fn run_provider(
        &self,
        provider: &impl BoundaryProvider,
        template: &SearchRequestTemplate,
    ) -> Result<SearchOutcome> {
        let boundary = provider.boundary()?;
        Ok(self.run(&boundary, template).await)
    }
}
