//! Ordered collection of validated waypoints
//!
//! Insertion order is the path order. Every stored point was navigable on
//! the bound grid when it was inserted; rebinding to another grid clears the
//! store instead of re-validating.

use std::sync::Arc;

use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::common::{Point2D, WaypointRejection};
use crate::mapping::OccupancyGrid;
use crate::mission_planning::export::ExportedWaypoint;

#[derive(Debug, Clone)]
pub struct WaypointStore {
    grid: Arc<OccupancyGrid>,
    points: Vec<Point2D>,
}

impl WaypointStore {
    pub fn new(grid: Arc<OccupancyGrid>) -> Self {
        Self { grid, points: Vec::new() }
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Meters per cell of the bound grid
    pub fn resolution(&self) -> f64 {
        self.grid.resolution()
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Option<Point2D> {
        self.points.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Append `(x, y)` if it lies on a navigable cell.
    /// A rejected point leaves the store untouched.
    pub fn try_add(&mut self, x: f64, y: f64) -> Result<(), WaypointRejection> {
        if self.grid.containing_cell(x, y).is_none() {
            return Err(WaypointRejection::OutOfBounds);
        }
        if !self.grid.is_navigable(x, y) {
            return Err(WaypointRejection::NotNavigable);
        }
        self.points.push(Point2D::new(x, y));
        Ok(())
    }

    pub fn add(&mut self, x: f64, y: f64) -> bool {
        self.try_add(x, y).is_ok()
    }

    /// Add each point through `try_add`; returns the points that were accepted
    pub fn extend_validated<I>(&mut self, points: I) -> Vec<Point2D>
    where
        I: IntoIterator<Item = Point2D>,
    {
        points
            .into_iter()
            .filter(|p| self.try_add(p.x, p.y).is_ok())
            .collect()
    }

    /// Remove the stored point closest to `(x, y)`. Ties go to the earliest
    /// inserted point.
    pub fn remove_nearest(&mut self, x: f64, y: f64) -> Option<Point2D> {
        let query = Point2D::new(x, y);
        let index = self
            .points
            .iter()
            .position_min_by_key(|p| OrderedFloat(p.squared_distance(&query)))?;
        Some(self.points.remove(index))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Bind to a new grid, discarding every stored point
    pub fn rebind(&mut self, grid: Arc<OccupancyGrid>) {
        self.grid = grid;
        self.points.clear();
    }

    /// Stored points in real-world meters, named `wp1..wpN`
    pub fn export_meters(&self) -> Vec<ExportedWaypoint> {
        self.points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let (x_m, y_m) = self.grid.to_meters(p);
                ExportedWaypoint::new(i + 1, x_m, y_m)
            })
            .collect()
    }
}
