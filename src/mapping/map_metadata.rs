//! Map metadata in ROS-style YAML
//!
//! A map is a grayscale raster plus a small YAML file naming it and giving
//! its resolution:
//!
//! ```yaml
//! image: map.pgm
//! resolution: 0.05
//! name: Paris Area 1
//! navigability:
//!   type: strict
//! ```
//!
//! Unknown keys (`origin`, `occupied_thresh`, ...) are ignored so stock ROS
//! map files load unchanged.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::{CoverageError, CoverageResult};
use crate::mapping::{NavigabilityPolicy, OccupancyGrid};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMetadata {
    /// Raster filename, relative to the YAML file
    pub image: String,

    /// Meters per cell
    pub resolution: f64,

    /// Display name; defaults to the image file stem
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub navigability: NavigabilityPolicy,
}

impl MapMetadata {
    pub fn from_yaml(yaml: &str) -> CoverageResult<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| CoverageError::LoadError(format!("invalid map metadata: {}", e)))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> CoverageResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CoverageError::LoadError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_yaml(&contents)
    }

    pub fn map_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => Path::new(&self.image)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.image.clone()),
        }
    }

    /// Raster path resolved against the directory holding the YAML file
    pub fn image_path(&self, yaml_path: &Path) -> PathBuf {
        let yaml_dir = yaml_path.parent().unwrap_or_else(|| Path::new("."));
        yaml_dir.join(&self.image)
    }
}

/// Load a map YAML and the raster it points at
pub fn load_map<P: AsRef<Path>>(yaml_path: P) -> CoverageResult<(MapMetadata, OccupancyGrid)> {
    let yaml_path = yaml_path.as_ref();
    let metadata = MapMetadata::load(yaml_path)?;
    let grid = OccupancyGrid::load(
        metadata.image_path(yaml_path),
        metadata.resolution,
        metadata.navigability,
    )?;
    Ok((metadata, grid))
}
