//! coverage_planning - boustrophedon coverage paths over occupancy grids
//!
//! This crate loads grayscale maps into occupancy grids, plans lawnmower
//! style sweeps from a seed waypoint and exports the resulting waypoints
//! in real-world meters.

// Core modules
pub mod common;
pub mod config;

// Algorithm modules
pub mod mapping;
pub mod path_planning;
pub mod mission_planning;

// Re-export common types for convenience
pub use common::{Point2D, Path2D, CoveragePlanner};
pub use common::{CoverageError, CoverageResult, WaypointRejection};
pub use config::CoverageSettings;
pub use mapping::{CellState, MapMetadata, NavigabilityPolicy, OccupancyGrid, RowRangeMode};
pub use mission_planning::{CoverageSession, WaypointStore};
pub use path_planning::{BoustrophedonConfig, BoustrophedonPlanner, CoverageReport, Termination};
