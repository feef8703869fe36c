//! # AEM: Analytic Element Method for steady groundwater flow
//!
//! Superposes closed-form flow elements (constant-head references, wells,
//! aquifer regions) in a single potential field, solves the coupled linear
//! system for the unknown strengths and evaluates heads, discharge and
//! water-table contours.
//!
//! ## Features
//!
//! - Constant-head reference (`Constant`), interior-average (`ConstantInside`)
//!   and fixed particular-solution (`ConstantStar`) elements
//! - Wells with known discharge
//! - Polygonal inhomogeneity regions with their own aquifer properties
//! - Dense LU solve with cancellation and deadlines
//! - Head grids and marching-squares contours, parallel with Rayon
//! - JSON well-field configuration and GeoJSON-style output
//!
//! # Example
//!
//! ```
//! use math_aem::{Constant, Model, Well};
//!
//! let mut model = Model::single_layer(0.000231, 0.0, 100.0).unwrap();
//! model.add_element(Constant::new(500.0, 500.0, 100.0, 0));
//! model.add_element(Well::new(0.0, 0.0, 2.0, 0.5, 0));
//!
//! let solved = model.solve().unwrap();
//! let h = solved.head(0, 500.0, 500.0).unwrap();
//! assert!((h - 100.0).abs() < 1e-8);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)] // Scientific code often has many parameters

pub mod aquifer;
pub mod contour;
pub mod element;
pub mod equation;
pub mod error;
pub mod model;
pub mod parallel;
pub mod solver;
pub mod wellfield;

// Re-exports
pub use aquifer::{AquiferData, AquiferId, AquiferSystem, LayerType};
pub use contour::{ContourSegment, ContourSet, GridCell, GridSpec, HeadGrid};
pub use element::{
    AnalyticElement, Constant, ConstantInside, ConstantStar, Element, ElementBase, ElementId, Well,
};
pub use error::{AemError, Result};
pub use model::{Model, SolveOptions, SolvedModel};
pub use solver::CancelToken;
pub use wellfield::{WellFieldConfig, WellFieldResult};

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
