// Occupancy grid for coverage planning
// Raster of navigable / blocked cells loaded from a grayscale map

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::{GrayImage, ImageReader};
use itertools::{Itertools, MinMaxResult};
use log::info;
use nalgebra::DMatrix;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::common::{CoverageError, CoverageResult, Point2D};

/// Raster value of a free (navigable) cell
pub const NAVIGABLE_VALUE: u8 = 255;
/// Raster value of an unknown cell
pub const UNKNOWN_VALUE: u8 = 205;
/// Raster value of an obstacle cell
pub const OBSTACLE_VALUE: u8 = 0;
/// Lowest raster value treated as navigable by the legacy policy
pub const LEGACY_NAVIGABLE_THRESHOLD: u8 = 205;

/// State of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellState {
    Navigable,
    /// Obstacle or unknown
    Blocked,
}

impl CellState {
    pub fn is_navigable(self) -> bool {
        self == CellState::Navigable
    }
}

/// How raw raster values are classified into cell states
///
/// In YAML: `{ type: strict }` or `{ type: threshold, min_value: 205 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigabilityPolicy {
    /// Only `NAVIGABLE_VALUE` is navigable
    #[default]
    Strict,
    /// Every value `>= min_value` is navigable
    Threshold { min_value: u8 },
}

impl NavigabilityPolicy {
    pub fn legacy() -> Self {
        NavigabilityPolicy::Threshold { min_value: LEGACY_NAVIGABLE_THRESHOLD }
    }

    pub fn classify(&self, value: u8) -> CellState {
        let navigable = match *self {
            NavigabilityPolicy::Strict => value == NAVIGABLE_VALUE,
            NavigabilityPolicy::Threshold { min_value } => value >= min_value,
        };
        if navigable {
            CellState::Navigable
        } else {
            CellState::Blocked
        }
    }
}

/// How the navigable extent of a row is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowRangeMode {
    /// First and last navigable column of the whole row. Spans blocked gaps
    /// in non-convex rows.
    #[default]
    RowExtent,
    /// Contiguous navigable run around the current position
    ConnectedRun,
}

/// Immutable 2D raster of cell states with a physical resolution.
///
/// Cells are addressed as `(row = y, col = x)`; row 0 is the top of the raster.
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyGrid {
    cells: DMatrix<CellState>,
    resolution: f64,
}

impl OccupancyGrid {
    /// Build a grid from row-major cell states
    pub fn from_cells(
        width: usize,
        height: usize,
        resolution: f64,
        cells: Vec<CellState>,
    ) -> CoverageResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoverageError::LoadError(format!(
                "map has zero size ({}x{})",
                width, height
            )));
        }
        if cells.len() != width * height {
            return Err(CoverageError::LoadError(format!(
                "expected {} cells for a {}x{} map, got {}",
                width * height,
                width,
                height,
                cells.len()
            )));
        }
        if !(resolution.is_finite() && resolution > 0.0) {
            return Err(CoverageError::InvalidParameter(format!(
                "resolution must be positive, got {}",
                resolution
            )));
        }

        Ok(Self {
            cells: DMatrix::from_row_slice(height, width, &cells),
            resolution,
        })
    }

    /// Classify a row-major grayscale raster
    pub fn from_raster(
        width: usize,
        height: usize,
        resolution: f64,
        raster: &[u8],
        policy: NavigabilityPolicy,
    ) -> CoverageResult<Self> {
        let cells = raster.iter().map(|&v| policy.classify(v)).collect();
        Self::from_cells(width, height, resolution, cells)
    }

    pub fn from_image(
        image: &GrayImage,
        resolution: f64,
        policy: NavigabilityPolicy,
    ) -> CoverageResult<Self> {
        Self::from_raster(
            image.width() as usize,
            image.height() as usize,
            resolution,
            image.as_raw(),
            policy,
        )
    }

    /// Load a grayscale raster (PGM or any format the decoder recognises)
    pub fn load<P: AsRef<Path>>(
        path: P,
        resolution: f64,
        policy: NavigabilityPolicy,
    ) -> CoverageResult<Self> {
        let path = path.as_ref();
        let load_error =
            |e: &dyn std::fmt::Display| CoverageError::LoadError(format!("{}: {}", path.display(), e));

        let image = ImageReader::open(path)
            .map_err(|e| load_error(&e))?
            .with_guessed_format()
            .map_err(|e| load_error(&e))?
            .decode()
            .map_err(|e| load_error(&e))?
            .into_luma8();

        let grid = Self::from_image(&image, resolution, policy)?;
        info!(
            "Loaded map {} ({}x{} cells, {} m/cell, {} navigable)",
            path.display(),
            grid.width(),
            grid.height(),
            grid.resolution(),
            grid.navigable_count()
        );
        Ok(grid)
    }

    /// Write the grid as a binary PGM (navigable = 255, blocked = 0)
    pub fn save_pgm<P: AsRef<Path>>(&self, path: P) -> CoverageResult<()> {
        let mut file = BufWriter::new(File::create(path)?);
        writeln!(file, "P5")?;
        writeln!(file, "{} {}", self.width(), self.height())?;
        writeln!(file, "255")?;

        let pixels: Vec<u8> = (0..self.height())
            .flat_map(|row| (0..self.width()).map(move |col| (row, col)))
            .map(|(row, col)| match self.cells[(row, col)] {
                CellState::Navigable => NAVIGABLE_VALUE,
                CellState::Blocked => OBSTACLE_VALUE,
            })
            .collect();
        file.write_all(&pixels)?;
        file.flush()?;
        Ok(())
    }

    pub fn width(&self) -> usize {
        self.cells.ncols()
    }

    pub fn height(&self) -> usize {
        self.cells.nrows()
    }

    /// Meters per cell
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<CellState> {
        self.cells.get((row, col)).copied()
    }

    pub fn navigable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_navigable()).count()
    }

    /// Cell containing `(x, y)`, with coordinates truncated
    pub fn containing_cell(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        if !(x.is_finite() && y.is_finite()) || x < 0.0 || y < 0.0 {
            return None;
        }
        let (col, row) = (x as usize, y as usize);
        if col >= self.width() || row >= self.height() {
            return None;
        }
        Some((col, row))
    }

    /// True iff `(x, y)` is inside the grid and its containing cell is navigable
    pub fn is_navigable(&self, x: f64, y: f64) -> bool {
        match self.containing_cell(x, y) {
            Some((col, row)) => self.cells[(row, col)].is_navigable(),
            None => false,
        }
    }

    /// Row index for a sample height, rounding half to even
    pub fn row_index(&self, y: f64) -> Option<usize> {
        round_to_index(y, self.height())
    }

    /// Column index for a sample position, rounding half to even
    pub fn column_index(&self, x: f64) -> Option<usize> {
        round_to_index(x, self.width())
    }

    /// First and last navigable column of the row at rounded `y`.
    ///
    /// This is a min/max over the whole row: blocked gaps between two
    /// navigable segments are spanned.
    pub fn navigable_range(&self, y: f64) -> Option<(usize, usize)> {
        let row = self.row_index(y)?;
        match self
            .cells
            .row(row)
            .iter()
            .positions(|c| c.is_navigable())
            .minmax()
        {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(col) => Some((col, col)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }

    /// Contiguous navigable runs of the row at rounded `y`, left to right
    pub fn navigable_runs(&self, y: f64) -> Vec<(usize, usize)> {
        let row = match self.row_index(y) {
            Some(row) => row,
            None => return Vec::new(),
        };

        let mut runs = Vec::new();
        let mut start = None;
        for (col, cell) in self.cells.row(row).iter().enumerate() {
            match (cell.is_navigable(), start) {
                (true, None) => start = Some(col),
                (false, Some(s)) => {
                    runs.push((s, col - 1));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            runs.push((s, self.width() - 1));
        }
        runs
    }

    /// Run of the row at rounded `y` containing `x`, or the nearest one.
    /// Equidistant runs resolve to the leftmost.
    pub fn navigable_run(&self, y: f64, x: f64) -> Option<(usize, usize)> {
        self.navigable_runs(y)
            .into_iter()
            .min_by_key(|&(lo, hi)| OrderedFloat(gap_to_run(x, lo, hi)))
    }

    /// Grid-space point to real-world meters. Raster row 0 is the top while
    /// world Y grows upward.
    pub fn to_meters(&self, point: &Point2D) -> (f64, f64) {
        (
            point.x * self.resolution,
            (self.height() as f64 - point.y) * self.resolution,
        )
    }

    /// Inverse of `to_meters`
    pub fn from_meters(&self, x_m: f64, y_m: f64) -> Point2D {
        Point2D::new(
            x_m / self.resolution,
            self.height() as f64 - y_m / self.resolution,
        )
    }
}

fn round_to_index(value: f64, len: usize) -> Option<usize> {
    if !value.is_finite() {
        return None;
    }
    let rounded = value.round_ties_even();
    if rounded < 0.0 || rounded >= len as f64 {
        return None;
    }
    Some(rounded as usize)
}

fn gap_to_run(x: f64, lo: usize, hi: usize) -> f64 {
    let (lo, hi) = (lo as f64, hi as f64);
    if x < lo {
        lo - x
    } else if x > hi {
        x - hi
    } else {
        0.0
    }
}

/// Build a grid from text rows: `.` navigable, anything else blocked
#[cfg(test)]
pub(crate) fn grid_from_rows(rows: &[&str], resolution: f64) -> OccupancyGrid {
    let height = rows.len();
    let width = rows[0].len();
    let cells = rows
        .iter()
        .flat_map(|r| r.chars())
        .map(|c| if c == '.' { CellState::Navigable } else { CellState::Blocked })
        .collect();
    OccupancyGrid::from_cells(width, height, resolution, cells).unwrap()
}

/// Fully navigable `width` x `height` grid at 0.05 m/cell
#[cfg(test)]
pub(crate) fn open_grid(width: usize, height: usize) -> OccupancyGrid {
    OccupancyGrid::from_cells(width, height, 0.05, vec![CellState::Navigable; width * height])
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_pgm(path: &Path, width: usize, height: usize, data: &[u8]) {
        let mut bytes = format!("P5\n{} {}\n255\n", width, height).into_bytes();
        bytes.extend_from_slice(data);
        std::fs::write(path, bytes).unwrap();
    }

    #[test]
    fn test_strict_policy() {
        let policy = NavigabilityPolicy::Strict;
        assert_eq!(policy.classify(NAVIGABLE_VALUE), CellState::Navigable);
        assert_eq!(policy.classify(254), CellState::Blocked);
        assert_eq!(policy.classify(UNKNOWN_VALUE), CellState::Blocked);
        assert_eq!(policy.classify(OBSTACLE_VALUE), CellState::Blocked);
    }

    #[test]
    fn test_legacy_policy() {
        let policy = NavigabilityPolicy::legacy();
        assert_eq!(policy.classify(UNKNOWN_VALUE), CellState::Navigable);
        assert_eq!(policy.classify(230), CellState::Navigable);
        assert_eq!(policy.classify(204), CellState::Blocked);
    }

    #[test]
    fn test_policy_from_yaml() {
        let strict: NavigabilityPolicy = serde_yaml::from_str("type: strict\n").unwrap();
        assert_eq!(strict, NavigabilityPolicy::Strict);

        let legacy: NavigabilityPolicy =
            serde_yaml::from_str("type: threshold\nmin_value: 205\n").unwrap();
        assert_eq!(legacy, NavigabilityPolicy::legacy());

        let yaml = serde_yaml::to_string(&NavigabilityPolicy::legacy()).unwrap();
        assert_eq!(serde_yaml::from_str::<NavigabilityPolicy>(&yaml).unwrap(), legacy);
    }

    #[test]
    fn test_zero_size_is_load_error() {
        let result = OccupancyGrid::from_raster(0, 4, 0.05, &[], NavigabilityPolicy::Strict);
        assert!(matches!(result, Err(CoverageError::LoadError(_))));
    }

    #[test]
    fn test_cell_count_mismatch_is_load_error() {
        let result = OccupancyGrid::from_raster(3, 3, 0.05, &[255; 8], NavigabilityPolicy::Strict);
        assert!(matches!(result, Err(CoverageError::LoadError(_))));
    }

    #[test]
    fn test_invalid_resolution() {
        let result = OccupancyGrid::from_raster(1, 1, 0.0, &[255], NavigabilityPolicy::Strict);
        assert!(matches!(result, Err(CoverageError::InvalidParameter(_))));
    }

    #[test]
    fn test_row_major_layout() {
        // 3 wide, 2 high: only (x=2, y=0) and (x=0, y=1) navigable
        let raster = [0, 0, 255, 255, 0, 0];
        let grid =
            OccupancyGrid::from_raster(3, 2, 0.05, &raster, NavigabilityPolicy::Strict).unwrap();
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.cell(2, 0), Some(CellState::Navigable));
        assert_eq!(grid.cell(0, 1), Some(CellState::Navigable));
        assert_eq!(grid.cell(0, 0), Some(CellState::Blocked));
        assert_eq!(grid.cell(3, 0), None);
        assert_eq!(grid.navigable_count(), 2);
    }

    #[test]
    fn test_is_navigable_bounds() {
        let grid = open_grid(10, 5);
        assert!(grid.is_navigable(0.0, 0.0));
        assert!(grid.is_navigable(9.99, 4.99));
        assert!(!grid.is_navigable(10.0, 0.0));
        assert!(!grid.is_navigable(0.0, 5.0));
        assert!(!grid.is_navigable(-0.1, 0.0));
        assert!(!grid.is_navigable(0.0, -0.5));
        assert!(!grid.is_navigable(f64::NAN, 1.0));
        assert!(!grid.is_navigable(1.0, f64::INFINITY));
    }

    #[test]
    fn test_is_navigable_truncates() {
        let grid = grid_from_rows(&["..#", "..."], 0.05);
        assert!(grid.is_navigable(1.9, 0.2));
        assert!(!grid.is_navigable(2.1, 0.9));
        assert!(grid.is_navigable(2.1, 1.0));
    }

    #[test]
    fn test_navigable_range() {
        let grid = grid_from_rows(&["#..#..##", "########", "........"], 0.05);
        assert_eq!(grid.navigable_range(0.0), Some((1, 5)));
        assert_eq!(grid.navigable_range(1.0), None);
        assert_eq!(grid.navigable_range(2.0), Some((0, 7)));
        assert_eq!(grid.navigable_range(3.0), None);
        assert_eq!(grid.navigable_range(-1.0), None);
    }

    #[test]
    fn test_navigable_range_rounds_half_to_even() {
        let grid = grid_from_rows(&["#.#", "###", ".##", "..."], 0.05);
        // 0.5 -> 0, 1.5 -> 2, 2.5 -> 2, 3.4 -> 3
        assert_eq!(grid.navigable_range(0.5), Some((1, 1)));
        assert_eq!(grid.navigable_range(1.5), Some((0, 0)));
        assert_eq!(grid.navigable_range(2.5), Some((0, 0)));
        assert_eq!(grid.navigable_range(3.4), Some((0, 2)));
        assert_eq!(grid.navigable_range(-0.4), Some((1, 1)));
        assert_eq!(grid.navigable_range(3.5), None);
    }

    #[test]
    fn test_navigable_runs() {
        let grid = grid_from_rows(&["..##...#.."], 0.05);
        assert_eq!(grid.navigable_runs(0.0), vec![(0, 1), (4, 6), (8, 9)]);
        assert_eq!(grid.navigable_run(0.0, 5.0), Some((4, 6)));
        assert_eq!(grid.navigable_run(0.0, 7.0), Some((4, 6)));
        // Equidistant from (0, 1) and (4, 6)
        assert_eq!(grid.navigable_run(0.0, 2.5), Some((0, 1)));
        assert_eq!(grid.navigable_run(1.0, 5.0), None);
    }

    #[test]
    fn test_meter_conversion() {
        let grid = open_grid(400, 400);
        let (x_m, y_m) = grid.to_meters(&Point2D::new(20.0, 20.0));
        assert!((x_m - 1.0).abs() < 1e-9);
        assert!((y_m - 19.0).abs() < 1e-9);

        let back = grid.from_meters(x_m, y_m);
        assert!((back.x - 20.0).abs() < 1e-9);
        assert!((back.y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_load_pgm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.pgm");
        write_pgm(&path, 4, 2, &[0, 205, 255, 255, 255, 0, 205, 255]);

        let grid = OccupancyGrid::load(&path, 0.05, NavigabilityPolicy::Strict).unwrap();
        assert_eq!((grid.width(), grid.height()), (4, 2));
        assert_eq!(grid.navigable_range(0.0), Some((2, 3)));
        assert_eq!(grid.navigable_count(), 4);

        let legacy = OccupancyGrid::load(&path, 0.05, NavigabilityPolicy::legacy()).unwrap();
        assert_eq!(legacy.navigable_range(0.0), Some((1, 3)));
        assert_eq!(legacy.navigable_count(), 6);
    }

    #[test]
    fn test_load_missing_file() {
        let result = OccupancyGrid::load("does/not/exist.pgm", 0.05, NavigabilityPolicy::Strict);
        assert!(matches!(result, Err(CoverageError::LoadError(_))));
    }

    #[test]
    fn test_load_garbage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.pgm");
        std::fs::write(&path, b"not an image").unwrap();
        let result = OccupancyGrid::load(&path, 0.05, NavigabilityPolicy::Strict);
        assert!(matches!(result, Err(CoverageError::LoadError(_))));
    }

    #[test]
    fn test_save_pgm_round_trip() {
        let grid = grid_from_rows(&[".#..", "##.."], 0.05);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.pgm");
        grid.save_pgm(&path).unwrap();

        let loaded = OccupancyGrid::load(&path, 0.05, NavigabilityPolicy::Strict).unwrap();
        assert_eq!(loaded, grid);
    }
}
