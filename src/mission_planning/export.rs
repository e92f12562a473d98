//! Waypoint export: the text file handed to the vehicle and the structured
//! record handed to persistence.
//!
//! File layout (coordinates in meters, two decimals):
//!
//! ```text
//! # Boat navigation waypoints
//! waypoints:
//!   - point1.00_19.00:
//!       x: 1.00
//!       y: 19.00
//!       name: wp1
//! ```

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::common::CoverageResult;

pub const WAYPOINT_FILE_HEADER: &str = "# Boat navigation waypoints";

/// One waypoint in real-world meters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedWaypoint {
    /// 1-based position in the path
    pub index: usize,
    pub name: String,
    pub x_m: f64,
    pub y_m: f64,
}

impl ExportedWaypoint {
    pub fn new(index: usize, x_m: f64, y_m: f64) -> Self {
        Self {
            index,
            name: format!("wp{}", index),
            x_m,
            y_m,
        }
    }
}

/// Record handed to a persistence / upload collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointExport {
    pub map_name: String,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    /// Meters per cell
    pub resolution: f64,
    /// Lane spacing in meters
    pub lane_spacing: f64,
    pub points: Vec<ExportedWaypoint>,
}

impl WaypointExport {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

pub fn write_waypoints<W: Write>(writer: &mut W, waypoints: &[ExportedWaypoint]) -> io::Result<()> {
    writeln!(writer, "{}", WAYPOINT_FILE_HEADER)?;
    writeln!(writer, "waypoints:")?;
    for wp in waypoints {
        writeln!(writer, "  - point{:.2}_{:.2}:", wp.x_m, wp.y_m)?;
        writeln!(writer, "      x: {:.2}", wp.x_m)?;
        writeln!(writer, "      y: {:.2}", wp.y_m)?;
        writeln!(writer, "      name: {}", wp.name)?;
    }
    Ok(())
}

/// Write a waypoint file. Nothing is written for an empty list; returns
/// whether a file was produced.
pub fn save_waypoints<P: AsRef<Path>>(path: P, waypoints: &[ExportedWaypoint]) -> CoverageResult<bool> {
    let path = path.as_ref();
    if waypoints.is_empty() {
        return Ok(false);
    }

    let mut writer = BufWriter::new(File::create(path)?);
    write_waypoints(&mut writer, waypoints)?;
    writer.flush()?;

    info!("Saved {} waypoints to {}", waypoints.len(), path.display());
    Ok(true)
}

#[derive(Debug, Deserialize)]
struct WaypointFile {
    #[serde(default)]
    waypoints: Vec<BTreeMap<String, WaypointEntry>>,
}

#[derive(Debug, Deserialize)]
struct WaypointEntry {
    x: f64,
    y: f64,
    name: String,
}

/// Parse a waypoint file back into meters, renumbering in file order
pub fn parse_waypoints(yaml: &str) -> CoverageResult<Vec<ExportedWaypoint>> {
    let file: WaypointFile = serde_yaml::from_str(yaml)?;
    Ok(file
        .waypoints
        .into_iter()
        .flat_map(|entry| entry.into_values())
        .enumerate()
        .map(|(i, e)| ExportedWaypoint {
            index: i + 1,
            name: e.name,
            x_m: e.x,
            y_m: e.y,
        })
        .collect())
}

pub fn load_waypoints<P: AsRef<Path>>(path: P) -> CoverageResult<Vec<ExportedWaypoint>> {
    let contents = std::fs::read_to_string(path)?;
    parse_waypoints(&contents)
}
