//! # gridsweep-types
//!
//! Value types shared by the gridsweep crates:
//!
//! - **Geometry**: `LatLng`, `Rectangle` (with exact grid subdivision)
//! - **Records**: `PlaceRecord`, an opaque payload returned by the search endpoint
//! - **Queries**: `SearchRequestTemplate`, `SearchTextRequest`, `PageResponse`
//!
//! Rectangles are built on top of `geo::Rect` with x = longitude and
//! y = latitude, and serialize in the `{low, high}` shape the search endpoint
//! uses for its location restriction.
//!
//! ## Examples
//!
//! ```rust
//! use gridsweep_types::rect::{LatLng, Rectangle};
//! use gridsweep_types::query::SearchRequestTemplate;
//!
//! let manhattan = Rectangle::new(
//!     LatLng::new(40.6829, -74.0479),
//!     LatLng::new(40.8820, -73.9067),
//! )?;
//! let cells = manhattan.subdivide(3)?;
//! assert_eq!(cells.len(), 9);
//!
//! let template = SearchRequestTemplate::new("restaurant", "places.id");
//! let request = template.for_rectangle(&cells[0]);
//! assert!(request.page_token.is_none());
//! # Ok::<(), gridsweep_types::rect::RectangleError>(())
//! ```

pub mod place;
pub mod query;
pub mod rect;
