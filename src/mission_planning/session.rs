//! Coverage planning session
//!
//! Bundles the loaded grid, the waypoint store bound to it and the planner
//! configured for its resolution. Front ends drive a session through plain
//! method calls: place or remove waypoints, extend a seed into a coverage
//! sweep, export the result.

use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};

use crate::common::{CoveragePlanner, CoverageResult, Point2D, WaypointRejection};
use crate::mapping::OccupancyGrid;
use crate::mission_planning::export::{self, WaypointExport};
use crate::mission_planning::waypoint_store::WaypointStore;
use crate::path_planning::{BoustrophedonConfig, BoustrophedonPlanner};

pub struct CoverageSession {
    map_name: String,
    grid: Arc<OccupancyGrid>,
    store: WaypointStore,
    planner: BoustrophedonPlanner,
}

impl CoverageSession {
    pub fn new(
        map_name: impl Into<String>,
        grid: OccupancyGrid,
        config: BoustrophedonConfig,
    ) -> CoverageResult<Self> {
        let planner = BoustrophedonPlanner::for_grid(&grid, config)?;
        let grid = Arc::new(grid);
        Ok(Self {
            map_name: map_name.into(),
            store: WaypointStore::new(Arc::clone(&grid)),
            grid,
            planner,
        })
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub fn planner(&self) -> &BoustrophedonPlanner {
        &self.planner
    }

    pub fn waypoints(&self) -> &[Point2D] {
        self.store.points()
    }

    /// Swap in a newly loaded map. All waypoints are discarded.
    pub fn replace_grid(
        &mut self,
        map_name: impl Into<String>,
        grid: OccupancyGrid,
    ) -> CoverageResult<()> {
        self.planner = BoustrophedonPlanner::for_grid(&grid, self.planner.config().clone())?;
        self.grid = Arc::new(grid);
        self.store.rebind(Arc::clone(&self.grid));
        self.map_name = map_name.into();
        info!("Switched to map {}", self.map_name);
        Ok(())
    }

    pub fn try_add_point(&mut self, x: f64, y: f64) -> Result<(), WaypointRejection> {
        self.store.try_add(x, y)
    }

    pub fn add_point(&mut self, x: f64, y: f64) -> bool {
        match self.try_add_point(x, y) {
            Ok(()) => true,
            Err(reason) => {
                warn!("Rejected waypoint ({:.1}, {:.1}): {}", x, y, reason);
                false
            }
        }
    }

    pub fn remove_nearest(&mut self, x: f64, y: f64) -> Option<Point2D> {
        self.store.remove_nearest(x, y)
    }

    pub fn clear(&mut self) {
        self.store.clear();
    }

    /// Extend the waypoint at `seed_index` into a coverage sweep and append
    /// the whole sweep, seed first, to the store. Sweep points failing
    /// validation are skipped. Returns the appended points; empty when there
    /// is no such waypoint.
    pub fn plan_coverage(&mut self, seed_index: usize) -> Vec<Point2D> {
        let seed = match self.store.get(seed_index) {
            Some(seed) => seed,
            None => {
                warn!(
                    "No waypoint at index {} to start coverage from ({} stored)",
                    seed_index,
                    self.store.len()
                );
                return Vec::new();
            }
        };

        let path = self.planner.plan(&self.grid, seed);
        let planned = path.len();
        let appended = self.store.extend_validated(path);

        info!(
            "Coverage from ({:.1}, {:.1}): appended {} of {} planned points",
            seed.x,
            seed.y,
            appended.len(),
            planned
        );
        appended
    }

    pub fn export(&self) -> WaypointExport {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        WaypointExport {
            map_name: self.map_name.clone(),
            timestamp,
            resolution: self.grid.resolution(),
            lane_spacing: self.planner.config().lane_spacing,
            points: self.store.export_meters(),
        }
    }

    /// Write the waypoint file; `false` when there was nothing to write
    pub fn save_waypoints<P: AsRef<Path>>(&self, path: P) -> CoverageResult<bool> {
        export::save_waypoints(path, &self.store.export_meters())
    }

    /// Append waypoints from a file, converting meters back to grid space.
    /// Returns how many were accepted.
    pub fn load_waypoints<P: AsRef<Path>>(&mut self, path: P) -> CoverageResult<usize> {
        let loaded = export::load_waypoints(path)?;
        let total = loaded.len();
        let points = loaded
            .iter()
            .map(|wp| self.grid.from_meters(wp.x_m, wp.y_m))
            .collect::<Vec<_>>();
        let accepted = self.store.extend_validated(points).len();
        if accepted < total {
            warn!("{} of {} loaded waypoints are not navigable on this map", total - accepted, total);
        }
        Ok(accepted)
    }
}
