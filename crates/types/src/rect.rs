use geo::{Distance, Haversine, Point, Rect, coord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building or splitting a [`Rectangle`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RectangleError {
    #[error("coordinates must be finite, got ({lat}, {lon})")]
    NonFinite { lat: f64, lon: f64 },
    #[error("degenerate rectangle: southwest {southwest} must be strictly below and west of northeast {northeast}")]
    Degenerate { southwest: LatLng, northeast: LatLng },
    #[error("grid divisions must be at least 1")]
    ZeroDivisions,
}

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    fn to_point(self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Wire shape of a rectangle: `{"low": {..}, "high": {..}}`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct LatLngBounds {
    low: LatLng,
    high: LatLng,
}

/// An axis-aligned, non-degenerate lat/lon rectangle used as a spatial
/// query restriction.
///
/// The southwest corner is always strictly south and west of the northeast
/// corner. Rectangles are immutable; subdivision produces new values.
///
/// # Examples
///
/// ```
/// use gridsweep_types::rect::{LatLng, Rectangle};
///
/// let rect = Rectangle::new(LatLng::new(0.0, 0.0), LatLng::new(3.0, 3.0)).unwrap();
/// assert_eq!(rect.lat_span(), 3.0);
/// assert!(Rectangle::new(LatLng::new(1.0, 0.0), LatLng::new(1.0, 3.0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "LatLngBounds", try_from = "LatLngBounds")]
pub struct Rectangle {
    rect: Rect,
}

impl Rectangle {
    /// Create a rectangle from its southwest and northeast corners.
    pub fn new(southwest: LatLng, northeast: LatLng) -> Result<Self, RectangleError> {
        for corner in [southwest, northeast] {
            if !corner.is_finite() {
                return Err(RectangleError::NonFinite {
                    lat: corner.latitude,
                    lon: corner.longitude,
                });
            }
        }

        if southwest.latitude >= northeast.latitude || southwest.longitude >= northeast.longitude {
            return Err(RectangleError::Degenerate {
                southwest,
                northeast,
            });
        }

        Ok(Self {
            rect: Rect::new(
                coord! { x: southwest.longitude, y: southwest.latitude },
                coord! { x: northeast.longitude, y: northeast.latitude },
            ),
        })
    }

    /// Create a rectangle from a `geo::Rect` (x = longitude, y = latitude).
    pub fn from_rect(rect: Rect) -> Result<Self, RectangleError> {
        Self::new(
            LatLng::new(rect.min().y, rect.min().x),
            LatLng::new(rect.max().y, rect.max().x),
        )
    }

    pub fn southwest(&self) -> LatLng {
        LatLng::new(self.rect.min().y, self.rect.min().x)
    }

    pub fn northeast(&self) -> LatLng {
        LatLng::new(self.rect.max().y, self.rect.max().x)
    }

    pub fn lat_span(&self) -> f64 {
        self.rect.height()
    }

    pub fn lon_span(&self) -> f64 {
        self.rect.width()
    }

    /// Area in square degrees.
    pub fn area(&self) -> f64 {
        self.lat_span() * self.lon_span()
    }

    /// Great-circle length of the southwest-northeast diagonal, in meters.
    pub fn diagonal_meters(&self) -> f64 {
        Haversine.distance(self.southwest().to_point(), self.northeast().to_point())
    }

    pub fn as_rect(&self) -> &Rect {
        &self.rect
    }

    /// Split into a `divisions × divisions` grid that exactly tiles `self`.
    ///
    /// Cells are ordered row by row from south to north, west to east within
    /// a row. Interior edges are shared bit-for-bit between neighbours and the
    /// outer edges are this rectangle's own, so the cells never overlap and
    /// leave no gaps.
    ///
    /// # Errors
    ///
    /// `ZeroDivisions` when `divisions == 0`, and `Degenerate` when the
    /// rectangle is too small for floating-point arithmetic to produce
    /// `divisions` distinct edges.
    pub fn subdivide(&self, divisions: usize) -> Result<Vec<Rectangle>, RectangleError> {
        if divisions == 0 {
            return Err(RectangleError::ZeroDivisions);
        }

        let sw = self.southwest();
        let ne = self.northeast();
        let lat_edges = grid_edges(sw.latitude, ne.latitude, divisions);
        let lon_edges = grid_edges(sw.longitude, ne.longitude, divisions);

        let mut cells = Vec::with_capacity(divisions * divisions);
        for lat in lat_edges.windows(2) {
            for lon in lon_edges.windows(2) {
                cells.push(Rectangle::new(
                    LatLng::new(lat[0], lon[0]),
                    LatLng::new(lat[1], lon[1]),
                )?);
            }
        }
        Ok(cells)
    }
}

impl From<Rectangle> for LatLngBounds {
    fn from(rect: Rectangle) -> Self {
        Self {
            low: rect.southwest(),
            high: rect.northeast(),
        }
    }
}

impl TryFrom<LatLngBounds> for Rectangle {
    type Error = RectangleError;

    fn try_from(bounds: LatLngBounds) -> Result<Self, Self::Error> {
        Rectangle::new(bounds.low, bounds.high)
    }
}

impl std::fmt::Display for Rectangle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.southwest(), self.northeast())
    }
}

/// `divisions + 1` monotone edges from `min` to `max`, with both ends exact.
fn grid_edges(min: f64, max: f64, divisions: usize) -> Vec<f64> {
    let span = max - min;
    (0..=divisions)
        .map(|i| {
            if i == divisions {
                max
            } else {
                min + span * (i as f64) / (divisions as f64)
            }
        })
        .collect()
}
