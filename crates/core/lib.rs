//! Exhaustive place search over a region through a capped search API.
//!
//! Search endpoints such as Google Places text search return at most a fixed
//! number of results per query (60) and silently drop the rest. `gridsweep`
//! covers a region completely by splitting it into a grid, querying each
//! cell, and recursively splitting any cell whose result count reaches the
//! cap until every leaf is safely below it.
//!
//! ## Features
//! - **Adaptive subdivision**: saturated rectangles are split into an
//!   `n × n` grid and searched again; leaves tile the region exactly
//! - **Bounded concurrency**: independent rectangles are searched
//!   concurrently under a fixed number of in-flight queries
//! - **Contained failures**: a failing rectangle is reported in the outcome
//!   without affecting its siblings
//! - **Termination guard**: maximum depth and minimum cell size stop runaway
//!   subdivision and report the affected areas
//! - **Cancellation**: abandoned rectangles are reported, never replaced by a
//!   truncated parent result
//!
//! ```rust,no_run
//! use gridsweep::prelude::*;
//!
//! # async fn run() -> gridsweep::Result<()> {
//! let boundary = GeoJsonBoundary::from_path("nyc.geojson")?.boundary()?;
//! let template = SearchRequestTemplate::new("restaurant", "places.id,places.displayName");
//!
//! let sweeper = SweepBuilder::new()
//!     .config(SweepConfig::default().with_top_divisions(30))
//!     .bearer_token("ya29...")
//!     .build()?;
//!
//! let outcome = sweeper.run(&boundary, &template).await;
//! println!("{}", outcome.summary());
//! # Ok(())
//! # }
//! ```

pub mod boundary;
pub mod builder;
pub mod client;
pub mod config;
pub mod error;
pub mod outcome;
pub mod quadrant;
pub mod search;
pub mod sweep;
pub mod transport;

pub use boundary::{BoundaryProvider, GeoJsonBoundary};
pub use builder::SweepBuilder;
pub use client::{PageResult, PagedQueryClient};
pub use config::{DEFAULT_CAP, DEFAULT_ENDPOINT, SweepConfig};
pub use error::{FetchError, Result, SweepError};
pub use outcome::{ExhaustReason, ExhaustedRegion, RegionFailure, SearchOutcome, SweepSummary};
pub use quadrant::QuadrantGenerator;
pub use search::RegionSearcher;
pub use sweep::Sweeper;
pub use transport::PageTransport;
pub use transport::http::{Credentials, HttpTransport};

pub use geo::MultiPolygon;
pub use gridsweep_types::place::PlaceRecord;
pub use gridsweep_types::query::{PageResponse, SearchRequestTemplate, SearchTextRequest};
pub use gridsweep_types::rect::{LatLng, Rectangle, RectangleError};
pub use tokio_util::sync::CancellationToken;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {
    pub use crate::{BoundaryProvider, GeoJsonBoundary};

    pub use crate::{Result, SweepBuilder, SweepConfig, SweepError, Sweeper};

    pub use crate::{SearchOutcome, SweepSummary};

    pub use crate::{LatLng, PlaceRecord, Rectangle, SearchRequestTemplate};

    pub use crate::CancellationToken;
}
