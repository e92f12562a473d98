// Mission planning module: waypoint management, export and the coverage session

pub mod export;
pub mod session;
pub mod waypoint_store;

pub use export::{ExportedWaypoint, WaypointExport};
pub use session::*;
pub use waypoint_store::*;
