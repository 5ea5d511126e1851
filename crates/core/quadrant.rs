//! Seeding a sweep: split a region's bounding box into a grid and keep the
//! cells that touch the region.

use geo::{BoundingRect, Intersects, MultiPolygon};
use gridsweep_types::rect::Rectangle;

/// Splits a boundary's bounding box into `divisions × divisions` cells.
#[derive(Debug, Clone, Copy)]
pub struct QuadrantGenerator {
    divisions: usize,
}

impl QuadrantGenerator {
    pub fn new(divisions: usize) -> Self {
        Self { divisions }
    }

    pub fn divisions(&self) -> usize {
        self.divisions
    }

    /// Cells of the boundary's bounding-box grid that intersect the boundary.
    ///
    /// Callers must not rely on the order of the returned cells. An empty or
    /// zero-area boundary, or `divisions == 0`, yields no cells.
    ///
    /// # Examples
    ///
    /// ```
    /// use geo::{MultiPolygon, polygon};
    /// use gridsweep::QuadrantGenerator;
    ///
    /// let square = polygon![
    ///     (x: 0.0, y: 0.0), (x: 3.0, y: 0.0), (x: 3.0, y: 3.0), (x: 0.0, y: 3.0),
    /// ];
    /// let cells = QuadrantGenerator::new(3).generate(&MultiPolygon::new(vec![square]));
    /// assert_eq!(cells.len(), 9);
    /// ```
    pub fn generate(&self, boundary: &MultiPolygon<f64>) -> Vec<Rectangle> {
        let Some(bounds) = boundary.bounding_rect() else {
            return Vec::new();
        };

        let Ok(extent) = Rectangle::from_rect(bounds) else {
            log::warn!("Boundary has a zero-area bounding box, no quadrants generated");
            return Vec::new();
        };

        let cells = match extent.subdivide(self.divisions) {
            Ok(cells) => cells,
            Err(e) => {
                log::warn!("Cannot split boundary extent {}: {}", extent, e);
                return Vec::new();
            }
        };

        let total = cells.len();
        let kept: Vec<Rectangle> = cells
            .into_iter()
            .filter(|cell| boundary.intersects(&cell.as_rect().to_polygon()))
            .collect();

        log::info!(
            "Generated {} of {} quadrants intersecting the boundary",
            kept.len(),
            total
        );
        kept
    }
}
