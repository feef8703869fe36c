//! Well with a known discharge
//!
//! Potential of a well with discharge `Q` (positive for extraction) and
//! radius `rw` in its own aquifer:
//!
//! Φ(r) = Q / (2π) · ln(r / rw),  r = max(|x - xw|, rw)
//!
//! The discharge is the negative gradient of Φ, so it vanishes for `r < rw`.
//!
//! The well has no unknowns; it only enters the right-hand side of the
//! equations of other elements.

use ndarray::{Array2, Array3};
use std::f64::consts::PI;
use std::fmt;

use super::{AnalyticElement, ElementBase, ElementId};
use crate::aquifer::{AquiferData, AquiferSystem};
use crate::error::{AemError, Result};

/// Constructor arguments of a [`Well`]
#[derive(Debug, Clone, Copy, PartialEq)]
struct WellInput {
    /// Well x
    xw: f64,
    /// Well y
    yw: f64,
    /// Discharge, positive for extraction
    qw: f64,
    /// Well radius
    rw: f64,
    /// Screened layer
    layer: usize,
}

/// Well with known discharge
#[derive(Debug, Clone)]
pub struct Well {
    base: ElementBase,
    input: WellInput,
}

impl Well {
    /// Create a well screened in `layer`
    pub fn new(xw: f64, yw: f64, qw: f64, rw: f64, layer: usize) -> Self {
        Self {
            base: ElementBase::new("Well", 1, 0, vec![layer]),
            input: WellInput {
                xw,
                yw,
                qw,
                rw,
                layer,
            },
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.label = Some(label.into());
        self
    }
}

impl AnalyticElement for Well {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn initialize(&mut self, id: ElementId, aquifers: &mut AquiferSystem) -> Result<()> {
        let WellInput { xw, yw, qw, rw, .. } = self.input;
        if !(rw.is_finite() && rw > 0.0) {
            return Err(AemError::InvalidParameters(format!(
                "{}: radius must be positive, got {}",
                self, rw
            )));
        }
        if !qw.is_finite() {
            return Err(AemError::InvalidParameters(format!(
                "{}: discharge must be finite",
                self
            )));
        }
        if !(xw.is_finite() && yw.is_finite()) {
            return Err(AemError::InvalidParameters(format!(
                "{}: location must be finite",
                self
            )));
        }
        let aq = aquifers.find_aquifer_data(xw, yw);
        self.base.register(id, aq, aquifers)?;

        self.base.xc = vec![xw + rw];
        self.base.yc = vec![yw];
        self.base.parameters = Array2::from_elem((1, 1), qw);
        Ok(())
    }

    fn potinf(&self, x: f64, y: f64, aq: &AquiferData) -> Array2<f64> {
        let mut rv = Array2::zeros((1, aq.naq()));
        if self.base.in_aquifer(aq) {
            let WellInput { xw, yw, rw, layer, .. } = self.input;
            let r = (x - xw).hypot(y - yw).max(rw);
            rv[[0, layer]] = (r / rw).ln() / (2.0 * PI);
        }
        rv
    }

    fn disinf(&self, x: f64, y: f64, aq: &AquiferData) -> Array3<f64> {
        let mut rv = Array3::zeros((2, 1, aq.naq()));
        if self.base.in_aquifer(aq) {
            let WellInput { xw, yw, rw, layer, .. } = self.input;
            let (dx, dy) = (x - xw, y - yw);
            let d = dx.hypot(dy);
            // Potential is flat inside the screen
            if d >= rw {
                let scale = -1.0 / (2.0 * PI * d * d);
                rv[[0, 0, layer]] = dx * scale;
                rv[[1, 0, layer]] = dy * scale;
            }
        }
        rv
    }
}

impl fmt::Display for Well {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at ({}, {}) with discharge {}",
            self.base.label.as_deref().unwrap_or(self.base.name),
            self.input.xw,
            self.input.yw,
            self.input.qw
        )
    }
}
