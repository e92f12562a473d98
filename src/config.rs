//! Application configuration loaded from YAML
//!
//! ```yaml
//! resolution: 0.05
//! navigability:
//!   type: strict
//! coverage:
//!   lane_spacing: 3.0
//!   max_samples_per_row: 4
//! output: waypoints.yaml
//! ```
//!
//! Every section is optional and falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::{CoverageError, CoverageResult};
use crate::mapping::{load_map, NavigabilityPolicy, OccupancyGrid};
use crate::mission_planning::CoverageSession;
use crate::path_planning::BoustrophedonConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageSettings {
    /// Meters per cell for bare rasters loaded without map metadata
    pub resolution: f64,

    /// Classification of bare rasters; map metadata carries its own
    pub navigability: NavigabilityPolicy,

    pub coverage: BoustrophedonConfig,

    /// Waypoint file written by the command-line tool
    pub output: PathBuf,
}

impl Default for CoverageSettings {
    fn default() -> Self {
        Self {
            resolution: 0.05,
            navigability: NavigabilityPolicy::Strict,
            coverage: BoustrophedonConfig::default(),
            output: PathBuf::from("waypoints.yaml"),
        }
    }
}

impl CoverageSettings {
    /// Load settings from a YAML file
    pub fn load(path: &Path) -> CoverageResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| CoverageError::ConfigError(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate settings from a YAML string
    pub fn from_yaml(yaml: &str) -> CoverageResult<Self> {
        let settings: Self =
            serde_yaml::from_str(yaml).map_err(|e| CoverageError::ConfigError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> CoverageResult<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(CoverageError::InvalidParameter(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        self.coverage.validate()
    }

    /// Open a session on a map given either as map metadata (`.yaml`/`.yml`)
    /// or as a bare raster
    pub fn open_session(&self, map_path: &Path) -> CoverageResult<CoverageSession> {
        let is_metadata = map_path
            .extension()
            .map_or(false, |ext| ext == "yaml" || ext == "yml");

        let (map_name, grid) = if is_metadata {
            let (metadata, grid) = load_map(map_path)?;
            (metadata.map_name(), grid)
        } else {
            let grid = OccupancyGrid::load(map_path, self.resolution, self.navigability)?;
            let name = map_path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| map_path.display().to_string());
            (name, grid)
        };

        CoverageSession::new(map_name, grid, self.coverage.clone())
    }
}
