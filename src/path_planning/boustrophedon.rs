//! Boustrophedon (back-and-forth) coverage path planning
//!
//! Extends a single seed point into a lawn-mower sweep over the navigable
//! region of an occupancy grid. Each lane samples up to a fixed number of
//! evenly spaced points between the row borders, then the sweep advances one
//! lane spacing toward the top of the raster and reverses direction.
//!
//! The sweep does not minimise turns or travel distance and assumes each row
//! of the region is roughly convex. With `RowRangeMode::RowExtent` a row
//! holding two disjoint navigable segments is treated as one span, so
//! transition points may land over blocked terrain; individual samples are
//! still checked. `RowRangeMode::ConnectedRun` keeps each lane on the run
//! under the vehicle instead.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::common::{CoverageError, CoveragePlanner, CoverageResult, Path2D, Point2D};
use crate::mapping::{OccupancyGrid, RowRangeMode};

/// Configuration for the boustrophedon planner. Distances are in meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoustrophedonConfig {
    /// Vertical distance advanced between lanes
    pub lane_spacing: f64,
    /// Clearance kept from the border a lane starts from
    pub leading_margin: f64,
    /// Clearance kept from the border a lane approaches
    pub trailing_margin: f64,
    /// Minimum spacing between samples within a lane
    pub min_sample_spacing: f64,
    pub max_samples_per_row: usize,
    pub row_range: RowRangeMode,
}

impl Default for BoustrophedonConfig {
    fn default() -> Self {
        Self {
            lane_spacing: 3.0,
            leading_margin: 1.0,
            trailing_margin: 0.5,
            min_sample_spacing: 0.5,
            max_samples_per_row: 4,
            row_range: RowRangeMode::RowExtent,
        }
    }
}

impl BoustrophedonConfig {
    pub fn validate(&self) -> CoverageResult<()> {
        let distances = [
            ("lane_spacing", self.lane_spacing),
            ("leading_margin", self.leading_margin),
            ("trailing_margin", self.trailing_margin),
            ("min_sample_spacing", self.min_sample_spacing),
        ];
        for (name, value) in distances {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoverageError::InvalidParameter(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// Horizontal direction of the current lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepDirection {
    Right,
    Left,
}

impl SweepDirection {
    pub fn reversed(self) -> Self {
        match self {
            SweepDirection::Right => SweepDirection::Left,
            SweepDirection::Left => SweepDirection::Right,
        }
    }
}

/// Condition that ended a sweep. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Current row lies outside the grid
    OutOfBounds,
    /// Current row has no navigable cell
    NoNavigableCells,
    /// Margins leave no room to sample the current row
    DegenerateRow,
    /// Next lane would lie above row 0
    TopReached,
    /// Next lane has no navigable cell
    NextRowUnreachable,
}

/// Result of one planning call
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageReport {
    pub path: Path2D,
    /// Rows that were sampled (including rows where every sample was blocked)
    pub lanes: usize,
    pub termination: Termination,
}

/// Boustrophedon coverage planner with distances converted to cell units
#[derive(Debug, Clone)]
pub struct BoustrophedonPlanner {
    config: BoustrophedonConfig,
    resolution: f64,
    lane_spacing: f64,
    leading_margin: f64,
    trailing_margin: f64,
    min_sample_spacing: f64,
}

impl BoustrophedonPlanner {
    /// Create a planner for maps of the given resolution (meters per cell)
    pub fn new(config: BoustrophedonConfig, resolution: f64) -> CoverageResult<Self> {
        config.validate()?;
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(CoverageError::InvalidParameter(format!(
                "resolution must be positive, got {}",
                resolution
            )));
        }

        Ok(Self {
            lane_spacing: config.lane_spacing / resolution,
            leading_margin: config.leading_margin / resolution,
            trailing_margin: config.trailing_margin / resolution,
            min_sample_spacing: config.min_sample_spacing / resolution,
            resolution,
            config,
        })
    }

    pub fn for_grid(grid: &OccupancyGrid, config: BoustrophedonConfig) -> CoverageResult<Self> {
        Self::new(config, grid.resolution())
    }

    pub fn config(&self) -> &BoustrophedonConfig {
        &self.config
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Lane spacing in cells
    pub fn lane_spacing_cells(&self) -> f64 {
        self.lane_spacing
    }

    /// Plan a sweep from `seed` and report how it ended
    pub fn plan_with_report(&self, grid: &OccupancyGrid, seed: Point2D) -> CoverageReport {
        let mut path = Path2D::new();
        path.push(seed);

        let mut current = seed;
        let mut direction = SweepDirection::Right;
        let mut lanes = 0;

        let termination = loop {
            let row = match grid.row_index(current.y) {
                Some(row) => row,
                None => break Termination::OutOfBounds,
            };
            let (x_min, x_max) = match self.row_bounds(grid, current.y, current.x) {
                Some(bounds) => bounds,
                None => break Termination::NoNavigableCells,
            };
            let (x_start, x_end) = match self.lane_extent(current.x, x_min, x_max, direction) {
                Some(extent) => extent,
                None => break Termination::DegenerateRow,
            };

            lanes += 1;
            if let Some(last_x) = self.sample_lane(grid, row, x_start, x_end, &mut path) {
                current.x = last_x;
            }

            let y_next = current.y - self.lane_spacing;
            if y_next < 0.0 {
                break Termination::TopReached;
            }
            if !self.next_row_reachable(grid, y_next, current.x) {
                break Termination::NextRowUnreachable;
            }

            path.push(Point2D::new(current.x, y_next));
            current.y = y_next;
            direction = direction.reversed();
        };

        debug!(
            "Coverage sweep from ({:.1}, {:.1}): {} points over {} lanes, stopped: {:?}",
            seed.x,
            seed.y,
            path.len(),
            lanes,
            termination
        );

        CoverageReport { path, lanes, termination }
    }

    fn row_bounds(&self, grid: &OccupancyGrid, y: f64, x: f64) -> Option<(f64, f64)> {
        let (lo, hi) = match self.config.row_range {
            RowRangeMode::RowExtent => grid.navigable_range(y)?,
            RowRangeMode::ConnectedRun => grid.navigable_run(y, x)?,
        };
        Some((lo as f64, hi as f64))
    }

    fn next_row_reachable(&self, grid: &OccupancyGrid, y: f64, x: f64) -> bool {
        match self.config.row_range {
            RowRangeMode::RowExtent => grid.navigable_range(y).is_some(),
            RowRangeMode::ConnectedRun => match (grid.column_index(x), grid.row_index(y)) {
                (Some(col), Some(row)) => grid.cell(col, row).map_or(false, |c| c.is_navigable()),
                _ => false,
            },
        }
    }

    /// Start and end x of a lane, or `None` when the margins overlap
    fn lane_extent(
        &self,
        x: f64,
        x_min: f64,
        x_max: f64,
        direction: SweepDirection,
    ) -> Option<(f64, f64)> {
        match direction {
            SweepDirection::Right => {
                let x_start = x.max(x_min + self.leading_margin);
                let x_end = x_max - self.trailing_margin;
                if x_end <= x_start {
                    return None;
                }
                Some((x_start, x_end))
            }
            SweepDirection::Left => {
                let x_start = x.min(x_max - self.leading_margin);
                let x_end = x_min + self.trailing_margin;
                if x_end >= x_start {
                    return None;
                }
                Some((x_start, x_end))
            }
        }
    }

    /// Append evenly spaced samples from `x_start` to `x_end` until the first
    /// blocked one. Returns the x of the last appended sample.
    fn sample_lane(
        &self,
        grid: &OccupancyGrid,
        row: usize,
        x_start: f64,
        x_end: f64,
        path: &mut Path2D,
    ) -> Option<f64> {
        let available_width = (x_end - x_start).abs();
        let fitting = (available_width / self.min_sample_spacing).floor() + 1.0;
        let num_points = fitting.min(self.config.max_samples_per_row as f64) as usize;
        let step = if num_points > 1 {
            (x_end - x_start) / (num_points - 1) as f64
        } else {
            0.0
        };

        let mut last_x = None;
        for i in 0..num_points {
            let x = x_start + i as f64 * step;
            let navigable = grid
                .column_index(x)
                .and_then(|col| grid.cell(col, row))
                .map_or(false, |c| c.is_navigable());
            if !navigable {
                debug!("Lane at row {} blocked at x = {:.1} after {} samples", row, x, i);
                break;
            }
            path.push(Point2D::new(x, row as f64));
            last_x = Some(x);
        }
        last_x
    }
}

impl CoveragePlanner for BoustrophedonPlanner {
    fn plan(&self, grid: &OccupancyGrid, seed: Point2D) -> Path2D {
        self.plan_with_report(grid, seed).path
    }
}
