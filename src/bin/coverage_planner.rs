//! Plan a boustrophedon coverage sweep over a map and write the waypoint file.
//!
//! Usage:
//!   coverage_planner --map maps/harbour.yaml --seed-x 50 --seed-y 190
//!   coverage_planner --map harbour.pgm --resolution 0.1 --seed-x 12 --seed-y 80 -o sweep.yaml

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use coverage_planning::config::CoverageSettings;
use coverage_planning::NavigabilityPolicy;

/// Boustrophedon coverage planner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Map metadata (.yaml) or grayscale raster
    #[arg(short, long)]
    map: PathBuf,

    /// Settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed column in grid cells
    #[arg(long)]
    seed_x: f64,

    /// Seed row in grid cells (rows grow downward)
    #[arg(long)]
    seed_y: f64,

    /// Meters per cell for bare rasters
    #[arg(long)]
    resolution: Option<f64>,

    /// Treat unknown cells (>= 205) as navigable in bare rasters
    #[arg(long)]
    legacy_threshold: bool,

    /// Waypoint file to write
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the classified grid as a PGM
    #[arg(long)]
    grid_out: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let mut settings = match &args.config {
        Some(path) => CoverageSettings::load(path)?,
        None => CoverageSettings::default(),
    };
    if let Some(resolution) = args.resolution {
        settings.resolution = resolution;
    }
    if args.legacy_threshold {
        settings.navigability = NavigabilityPolicy::legacy();
    }
    if let Some(output) = args.output {
        settings.output = output;
    }
    settings.validate()?;

    let mut session = settings.open_session(&args.map)?;
    if let Some(path) = &args.grid_out {
        session.grid().save_pgm(path)?;
        info!("Wrote classified grid to {}", path.display());
    }

    if let Err(reason) = session.try_add_point(args.seed_x, args.seed_y) {
        error!("Seed ({}, {}): {}", args.seed_x, args.seed_y, reason);
        return Err(reason.to_string().into());
    }

    let appended = session.plan_coverage(0);
    info!(
        "Planned {} waypoints on {} ({} from the sweep)",
        session.waypoints().len(),
        session.map_name(),
        appended.len()
    );

    if session.save_waypoints(&settings.output)? {
        println!(
            "Wrote {} waypoints to {}",
            session.waypoints().len(),
            settings.output.display()
        );
    }
    Ok(())
}
