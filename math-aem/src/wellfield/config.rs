//! JSON configuration for dewatering well-field studies

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::contour::{GridSpec, MAX_CONTOUR_LEVELS};
use crate::element::{Constant, ElementId, Well};
use crate::error::{AemError, Result};
use crate::model::{Model, SolveOptions};

/// Complete well-field configuration loaded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellFieldConfig {
    /// Aquifer properties
    pub aquifer: AquiferConfig,
    /// Well coordinates
    pub wells: WellsConfig,
    /// Combined discharge of all wells, split evenly
    pub total_flow: f64,
    /// Radius of every well
    #[serde(default = "default_well_radius")]
    pub well_radius: f64,
    /// Reference head placement
    #[serde(default)]
    pub reference: ReferenceConfig,
    /// Query window and cell size
    pub grid: GridSpec,
    /// Number of contour levels
    #[serde(default = "default_contour_levels")]
    pub contour_levels: usize,
    /// Solver configuration
    #[serde(default)]
    pub solver: SolverConfig,
    /// Study metadata
    #[serde(default)]
    pub metadata: MetadataConfig,
}

/// Single-layer aquifer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AquiferConfig {
    /// Hydraulic conductivity
    pub k: f64,
    /// Bedrock elevation, bottom of the aquifer
    pub bedrock: f64,
    /// Initial water-table elevation, top of the aquifer
    pub initial_elevation: f64,
    /// Target water-table elevation, reported only
    #[serde(default)]
    pub desired_elevation: Option<f64>,
}

/// Well coordinates as parallel arrays
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WellsConfig {
    /// X coordinates
    pub x: Vec<f64>,
    /// Y coordinates
    pub y: Vec<f64>,
}

impl WellsConfig {
    /// Number of wells
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether no well is configured
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Coordinate pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }
}

/// Placement of the reference head
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    /// Offset of the reference point from the first well
    #[serde(default = "default_reference_offset")]
    pub offset: [f64; 2],
    /// Reference head, the initial water table if absent
    #[serde(default)]
    pub head: Option<f64>,
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            offset: default_reference_offset(),
            head: None,
        }
    }
}

/// Solver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Abort the solve after this many seconds
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    /// Log solver progress
    #[serde(default)]
    pub verbose: bool,
}

/// Study metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Study description
    #[serde(default)]
    pub description: String,
    /// Author name
    #[serde(default)]
    pub author: String,
    /// Study date
    #[serde(default)]
    pub date: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            description: String::new(),
            author: String::new(),
            date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

fn default_well_radius() -> f64 {
    0.5
}

fn default_reference_offset() -> [f64; 2] {
    [500.0, 500.0]
}

fn default_contour_levels() -> usize {
    10
}

impl WellFieldConfig {
    /// Configuration with the default study values around the given wells
    pub fn with_wells(x: Vec<f64>, y: Vec<f64>, grid: GridSpec) -> Self {
        Self {
            aquifer: AquiferConfig {
                k: 0.000231,
                bedrock: 0.0,
                initial_elevation: 100.0,
                desired_elevation: Some(70.0),
            },
            wells: WellsConfig { x, y },
            total_flow: 2.0,
            well_radius: default_well_radius(),
            reference: ReferenceConfig::default(),
            grid,
            contour_levels: default_contour_levels(),
            solver: SolverConfig::default(),
            metadata: MetadataConfig::default(),
        }
    }

    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parse configuration from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save configuration to JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Check the configuration before building a model
    pub fn validate(&self) -> Result<()> {
        if self.wells.is_empty() {
            return Err(AemError::InvalidParameters(
                "at least one well is required".to_string(),
            ));
        }
        if self.wells.x.len() != self.wells.y.len() {
            return Err(AemError::InvalidParameters(format!(
                "well coordinates mismatch: {} x vs {} y",
                self.wells.x.len(),
                self.wells.y.len()
            )));
        }
        if self.wells.points().any(|(x, y)| !(x.is_finite() && y.is_finite())) {
            return Err(AemError::InvalidParameters(
                "well coordinates must be finite".to_string(),
            ));
        }
        if !self.total_flow.is_finite() {
            return Err(AemError::InvalidParameters(format!(
                "total flow must be finite, got {}",
                self.total_flow
            )));
        }
        if !(self.well_radius.is_finite() && self.well_radius > 0.0) {
            return Err(AemError::InvalidParameters(format!(
                "well radius must be positive, got {}",
                self.well_radius
            )));
        }
        let [dx, dy] = self.reference.offset;
        if !(dx.is_finite() && dy.is_finite()) {
            return Err(AemError::InvalidParameters(
                "reference offset must be finite".to_string(),
            ));
        }
        if self.reference.head.is_some_and(|h| !h.is_finite()) {
            return Err(AemError::InvalidParameters(
                "reference head must be finite".to_string(),
            ));
        }
        if self.aquifer.desired_elevation.is_some_and(|h| !h.is_finite()) {
            return Err(AemError::InvalidParameters(
                "desired elevation must be finite".to_string(),
            ));
        }
        if self.contour_levels > MAX_CONTOUR_LEVELS {
            return Err(AemError::InvalidParameters(format!(
                "{} contour levels exceed the limit of {}",
                self.contour_levels, MAX_CONTOUR_LEVELS
            )));
        }
        if self.solver.timeout_secs.is_some_and(|t| !(t.is_finite() && t > 0.0)) {
            return Err(AemError::InvalidParameters(
                "solver timeout must be a positive number of seconds".to_string(),
            ));
        }
        self.grid.validate()
    }

    /// Discharge of each well
    pub fn well_rate(&self) -> f64 {
        self.total_flow / self.wells.len() as f64
    }

    /// Reference point: first well plus offset
    pub fn reference_point(&self) -> Result<[f64; 2]> {
        let (x, y) = self.wells.points().next().ok_or_else(|| {
            AemError::InvalidParameters("at least one well is required".to_string())
        })?;
        Ok([x + self.reference.offset[0], y + self.reference.offset[1]])
    }

    /// Reference head, the initial water table unless overridden
    pub fn reference_head(&self) -> f64 {
        self.reference.head.unwrap_or(self.aquifer.initial_elevation)
    }

    /// Build the single-layer model: one reference head and the wells
    ///
    /// Returns the model with the element ids of the wells.
    pub fn to_model(&self) -> Result<(Model, Vec<ElementId>)> {
        self.validate()?;
        let mut model = Model::single_layer(
            self.aquifer.k,
            self.aquifer.bedrock,
            self.aquifer.initial_elevation,
        )?;

        let [xr, yr] = self.reference_point()?;
        model.add_element(Constant::new(xr, yr, self.reference_head(), 0).with_label("Reference"));

        let rate = self.well_rate();
        let wells = self
            .wells
            .points()
            .enumerate()
            .map(|(i, (x, y))| {
                model.add_element(
                    Well::new(x, y, rate, self.well_radius, 0).with_label(format!("Well {}", i + 1)),
                )
            })
            .collect();
        Ok((model, wells))
    }

    /// Solve options from the solver section
    pub fn solve_options(&self) -> SolveOptions {
        let options = SolveOptions::new().with_verbose(self.solver.verbose);
        match self
            .solver
            .timeout_secs
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        {
            Some(timeout) => options.with_timeout(timeout),
            None => options,
        }
    }
}
