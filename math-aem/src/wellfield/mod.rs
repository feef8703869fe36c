//! Construction-dewatering well fields
//!
//! A study is a homogeneous single-layer aquifer, a reference head offset from
//! the first well and a set of wells sharing a total discharge. Running it
//! yields water-table cells and contour lines over a query window.

mod config;
mod output;

pub use config::{
    AquiferConfig, MetadataConfig, ReferenceConfig, SolverConfig, WellFieldConfig, WellsConfig,
};
pub use output::{
    STATUS_MESSAGE, contours_feature_collection, create_output_json,
    water_table_feature_collection,
};

use std::time::Instant;

use crate::contour::{ContourSet, GridCell, water_table_cells};
use crate::error::Result;
use crate::model::SolvedModel;

/// Outcome of a well-field study
#[derive(Debug, Clone)]
pub struct WellFieldResult {
    /// Solved model, for further queries
    pub model: SolvedModel,
    /// Water-table cells, by column then row
    pub cells: Vec<GridCell>,
    /// Contours of the query window
    pub contours: ContourSet,
    /// Discharge of each well
    pub well_rate: f64,
    /// Reference point
    pub reference_point: [f64; 2],
    /// Reference head
    pub reference_head: f64,
    /// Head just outside each well screen, in configuration order
    pub well_heads: Vec<f64>,
    /// Wall-clock time of the study in seconds
    pub elapsed_secs: f64,
}

impl WellFieldResult {
    /// Lowest and highest cell elevation
    pub fn elevation_range(&self) -> Option<(f64, f64)> {
        let mut values = self.cells.iter().map(|c| c.elevation);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Build, solve and post-process a well-field study
pub fn run(config: &WellFieldConfig) -> Result<WellFieldResult> {
    let start = Instant::now();
    let (model, _) = config.to_model()?;
    log::info!(
        "Well field: {} wells at {} each, reference head {}",
        config.wells.len(),
        config.well_rate(),
        config.reference_head()
    );

    let solved = model.solve_with(&config.solve_options())?;

    let cells = water_table_cells(&solved, 0, &config.grid)?;
    let contours = solved
        .head_grid(0, &config.grid)?
        .contours(config.contour_levels);
    let well_heads = config
        .wells
        .points()
        .map(|(x, y)| solved.head(0, x + config.well_radius, y))
        .collect::<Result<Vec<_>>>()?;
    log::info!(
        "Computed {} water-table cells and {} contour segments on {} levels",
        cells.len(),
        contours.segments.len(),
        contours.levels.len()
    );

    Ok(WellFieldResult {
        model: solved,
        cells,
        contours,
        well_rate: config.well_rate(),
        reference_point: config.reference_point()?,
        reference_head: config.reference_head(),
        well_heads,
        elapsed_secs: start.elapsed().as_secs_f64(),
    })
}
