// Mapping module: occupancy grid and map metadata

pub mod map_metadata;
pub mod occupancy_grid;

pub use map_metadata::*;
pub use occupancy_grid::*;
