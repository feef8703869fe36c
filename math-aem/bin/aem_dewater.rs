//! Construction dewatering simulator
//!
//! Solves a well-field study with the analytic element method and writes
//! water-table cells and contours as GeoJSON-style JSON.
//!
//! Usage:
//!   cargo run --release --bin aem-dewater -- --config configs/example_well_field.json
//!   cargo run --release --bin aem-dewater -- --help

use clap::Parser;
use math_aem::contour::GridSpec;
use math_aem::wellfield::{self, WellFieldConfig, create_output_json};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "aem-dewater")]
#[command(about = "Steady-state dewatering well-field simulator (analytic element method)", long_about = None)]
struct Args {
    /// Path to JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON file path
    #[arg(short, long, default_value = "output.json")]
    output: PathBuf,

    /// Override the solver timeout in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        println!("Loading configuration from: {}", config_path.display());
        WellFieldConfig::from_file(config_path)?
    } else {
        println!("No configuration file specified, using default four-well excavation");
        create_default_config()
    };
    if let Some(timeout) = args.timeout {
        config.solver.timeout_secs = Some(timeout);
    }
    config.solver.verbose |= args.verbose;

    print_config_summary(&config);

    println!("\n=== Running Study ===");
    let result = wellfield::run(&config)?;

    println!("Water-table cells: {}", result.cells.len());
    println!(
        "Contours: {} segments on {} levels",
        result.contours.segments.len(),
        result.contours.levels.len()
    );
    if let Some((lo, hi)) = result.elevation_range() {
        println!("Water table: {:.2} to {:.2}", lo, hi);
    }
    for (i, h) in result.well_heads.iter().enumerate() {
        println!("  Well {}: head {:.2}", i + 1, h);
    }
    if let Some(desired) = config.aquifer.desired_elevation {
        let reached = result.well_heads.iter().all(|&h| h <= desired);
        println!(
            "Desired elevation {:.2} {} at the wells",
            desired,
            if reached { "reached" } else { "not reached" }
        );
    }
    println!("Elapsed: {:.3} s", result.elapsed_secs);

    // Save results
    let output_data = create_output_json(&config, &result);
    println!("\nSaving results to: {}", args.output.display());
    fs::write(&args.output, serde_json::to_string_pretty(&output_data)?)?;
    println!("Done!");

    Ok(())
}

fn create_default_config() -> WellFieldConfig {
    WellFieldConfig::with_wells(
        vec![0.0, 100.0, 100.0, 0.0],
        vec![0.0, 0.0, 100.0, 100.0],
        GridSpec::new(-150.0, 250.0, -150.0, 250.0, 10.0),
    )
}

fn print_config_summary(config: &WellFieldConfig) {
    println!("\n=== Configuration Summary ===");
    println!(
        "Aquifer: k = {}, bedrock = {}, initial water table = {}",
        config.aquifer.k, config.aquifer.bedrock, config.aquifer.initial_elevation
    );
    println!(
        "Wells: {} (total flow {}, {} each, radius {})",
        config.wells.len(),
        config.total_flow,
        config.well_rate(),
        config.well_radius
    );
    println!(
        "Grid: x = [{}, {}], y = [{}, {}], cell = {}",
        config.grid.x_min,
        config.grid.x_max,
        config.grid.y_min,
        config.grid.y_max,
        config.grid.cell_side
    );
    println!("Contour levels: {}", config.contour_levels);
    if let Some(timeout) = config.solver.timeout_secs {
        println!("Solver timeout: {} s", timeout);
    }
    if !config.metadata.description.is_empty() {
        println!("Description: {}", config.metadata.description);
    }
}
