//! Common traits defining interfaces for coverage planning

use crate::common::types::*;
use crate::mapping::OccupancyGrid;

/// Trait for coverage path planning algorithms
pub trait CoveragePlanner {
    /// Extend a single seed point into an ordered coverage path.
    ///
    /// The first point of the returned path is always `seed`. Planners never
    /// fail; a degenerate map yields a path holding only the seed.
    fn plan(&self, grid: &OccupancyGrid, seed: Point2D) -> Path2D;
}
