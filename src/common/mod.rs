//! Common types, traits, and error definitions for coverage_planning
//!
//! This module provides the foundational building blocks shared by the
//! occupancy grid, the coverage planner and the waypoint store.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
