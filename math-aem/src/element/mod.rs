//! Analytic elements
//!
//! Every element contributes to the potential of the aquifer it sits in,
//! through unit influence functions scaled by its parameters. Elements with
//! unknown parameters also contribute one block of rows to the global system.
//!
//! The set of element kinds is closed: [`Element`] is the tagged union stored
//! in the model's arena, each variant implements [`AnalyticElement`].

mod constant;
mod well;

pub use constant::{Constant, ConstantInside, ConstantStar};
pub use well::Well;

use ndarray::{Array1, Array2, Array3};
use std::fmt;

use crate::aquifer::{AquiferData, AquiferId, AquiferSystem};
use crate::equation::{EquationContext, head_equation};
use crate::error::{AemError, Result};

/// Index of an element in the model's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

impl ElementId {
    /// Registration position
    pub fn index(self) -> usize {
        self.0
    }
}

/// State shared by every element kind
#[derive(Debug, Clone)]
pub struct ElementBase {
    /// Kind name used in messages
    pub name: &'static str,
    /// Optional user label
    pub label: Option<String>,
    /// Number of parameters per layer
    pub nparam: usize,
    /// Number of unknown parameters solved for (`<= nparam`)
    pub nunknowns: usize,
    /// Layers the element acts on
    pub layers: Vec<usize>,
    /// Aquifer the element sits in, resolved at initialization
    pub aq: Option<AquiferId>,
    /// Control point x-coordinates
    pub xc: Vec<f64>,
    /// Control point y-coordinates
    pub yc: Vec<f64>,
    /// Target potential per layer for the head equation
    pub pc: Array1<f64>,
    /// Parameters, rows = parameters, columns = assigned layers
    pub parameters: Array2<f64>,
    pub(crate) eq_offset: usize,
}

impl ElementBase {
    /// Create the shared state with zeroed parameters
    pub fn new(name: &'static str, nparam: usize, nunknowns: usize, layers: Vec<usize>) -> Self {
        debug_assert!(nunknowns <= nparam);
        let parameters = Array2::zeros((nparam, layers.len()));
        Self {
            name,
            label: None,
            nparam,
            nunknowns,
            layers,
            aq: None,
            xc: Vec::new(),
            yc: Vec::new(),
            pc: Array1::zeros(0),
            parameters,
            eq_offset: 0,
        }
    }

    /// Number of control points
    pub fn ncp(&self) -> usize {
        self.xc.len()
    }

    /// First row and column of this element's block in the global system
    pub fn eq_offset(&self) -> usize {
        self.eq_offset
    }

    /// Whether `aq` is the aquifer this element sits in
    pub fn in_aquifer(&self, aq: &AquiferData) -> bool {
        self.aq == Some(aq.id())
    }

    /// Bind the element to an aquifer and register it there
    pub(crate) fn register(
        &mut self,
        id: ElementId,
        aq: AquiferId,
        aquifers: &mut AquiferSystem,
    ) -> Result<()> {
        let data = aquifers.get_mut(aq).ok_or_else(|| {
            AemError::InvalidParameters(format!(
                "{} refers to unknown aquifer {}",
                self.name, aq.0
            ))
        })?;
        if let Some(&layer) = self.layers.iter().find(|&&l| l >= data.naq()) {
            return Err(AemError::LayerOutOfRange {
                layer,
                naq: data.naq(),
            });
        }
        data.add_element(id);
        self.aq = Some(aq);
        Ok(())
    }
}

/// Capabilities of an analytic element
pub trait AnalyticElement {
    /// Shared element state
    fn base(&self) -> &ElementBase;

    /// Shared element state, mutable
    fn base_mut(&mut self) -> &mut ElementBase;

    /// Resolve the aquifer, register with it and set control points and
    /// initial parameters
    fn initialize(&mut self, id: ElementId, aquifers: &mut AquiferSystem) -> Result<()>;

    /// Unit potential influence at `(x, y)`, shape `[nparam, aq.naq()]`
    ///
    /// Zero when `aq` is not the element's own aquifer.
    fn potinf(&self, x: f64, y: f64, aq: &AquiferData) -> Array2<f64>;

    /// Unit discharge influence at `(x, y)`, shape `[2, nparam, aq.naq()]`
    fn disinf(&self, x: f64, y: f64, aq: &AquiferData) -> Array3<f64>;

    /// Potential at `(x, y)` per layer of `aq`
    fn potential(&self, x: f64, y: f64, aq: &AquiferData) -> Array1<f64> {
        let base = self.base();
        let rv = self.potinf(x, y, aq);
        let mut pot = Array1::zeros(aq.naq());
        for (i, &layer) in base.layers.iter().enumerate() {
            if layer < aq.naq() {
                for p in 0..base.nparam {
                    pot[layer] += rv[[p, layer]] * base.parameters[[p, i]];
                }
            }
        }
        pot
    }

    /// Discharge vector at `(x, y)`, shape `[2, aq.naq()]`
    fn discharge(&self, x: f64, y: f64, aq: &AquiferData) -> Array2<f64> {
        let base = self.base();
        let rv = self.disinf(x, y, aq);
        let mut qxy = Array2::zeros((2, aq.naq()));
        for (i, &layer) in base.layers.iter().enumerate() {
            if layer < aq.naq() {
                for d in 0..2 {
                    for p in 0..base.nparam {
                        qxy[[d, layer]] += rv[[d, p, layer]] * base.parameters[[p, i]];
                    }
                }
            }
        }
        qxy
    }

    /// Unit potential influence restricted to `layers`, shape `[layers.len(), nparam]`
    ///
    /// The aquifer is the one containing `(x, y)`.
    fn potinflayers(
        &self,
        x: f64,
        y: f64,
        layers: &[usize],
        aquifers: &AquiferSystem,
    ) -> Array2<f64> {
        let aq = aquifers.at(x, y);
        let rv = self.potinf(x, y, aq);
        let nparam = self.base().nparam;
        let mut out = Array2::zeros((layers.len(), nparam));
        for (i, &layer) in layers.iter().enumerate() {
            if layer < aq.naq() {
                for p in 0..nparam {
                    out[[i, p]] = rv[[p, layer]];
                }
            }
        }
        out
    }

    /// Potential restricted to `layers`; the aquifer is the one containing `(x, y)`
    fn potentiallayers(
        &self,
        x: f64,
        y: f64,
        layers: &[usize],
        aquifers: &AquiferSystem,
    ) -> Array1<f64> {
        let aq = aquifers.at(x, y);
        let pot = self.potential(x, y, aq);
        Array1::from_iter(
            layers
                .iter()
                .map(|&layer| if layer < aq.naq() { pot[layer] } else { 0.0 }),
        )
    }

    /// Row block and right-hand side of this element's equations
    ///
    /// Defaults to the head equation at the control points.
    fn equation(
        &self,
        _id: ElementId,
        ctx: &EquationContext<'_>,
    ) -> Result<(Array2<f64>, Array1<f64>)> {
        head_equation(self, ctx)
    }

    /// Store solved unknowns in column 0 of the parameters
    fn setparams(&mut self, sol: &[f64]) {
        let base = self.base_mut();
        debug_assert_eq!(sol.len(), base.nunknowns);
        for (p, &value) in sol.iter().enumerate() {
            base.parameters[[p, 0]] = value;
        }
    }
}

/// Any element that can be added to a model
#[derive(Debug, Clone)]
pub enum Element {
    /// Reference head at a point
    Constant(Constant),
    /// Average-potential constraint inside an inhomogeneity
    ConstantInside(ConstantInside),
    /// Fixed particular solution of a semi-confined aquifer
    ConstantStar(ConstantStar),
    /// Well with known discharge
    Well(Well),
}

impl Element {
    fn as_dyn(&self) -> &dyn AnalyticElement {
        match self {
            Element::Constant(e) => e,
            Element::ConstantInside(e) => e,
            Element::ConstantStar(e) => e,
            Element::Well(e) => e,
        }
    }

    fn as_dyn_mut(&mut self) -> &mut dyn AnalyticElement {
        match self {
            Element::Constant(e) => e,
            Element::ConstantInside(e) => e,
            Element::ConstantStar(e) => e,
            Element::Well(e) => e,
        }
    }

    /// Kind name of the element
    pub fn name(&self) -> &'static str {
        self.base().name
    }
}

impl AnalyticElement for Element {
    fn base(&self) -> &ElementBase {
        self.as_dyn().base()
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        self.as_dyn_mut().base_mut()
    }

    fn initialize(&mut self, id: ElementId, aquifers: &mut AquiferSystem) -> Result<()> {
        self.as_dyn_mut().initialize(id, aquifers)
    }

    fn potinf(&self, x: f64, y: f64, aq: &AquiferData) -> Array2<f64> {
        self.as_dyn().potinf(x, y, aq)
    }

    fn disinf(&self, x: f64, y: f64, aq: &AquiferData) -> Array3<f64> {
        self.as_dyn().disinf(x, y, aq)
    }

    fn potential(&self, x: f64, y: f64, aq: &AquiferData) -> Array1<f64> {
        self.as_dyn().potential(x, y, aq)
    }

    fn discharge(&self, x: f64, y: f64, aq: &AquiferData) -> Array2<f64> {
        self.as_dyn().discharge(x, y, aq)
    }

    fn potinflayers(
        &self,
        x: f64,
        y: f64,
        layers: &[usize],
        aquifers: &AquiferSystem,
    ) -> Array2<f64> {
        self.as_dyn().potinflayers(x, y, layers, aquifers)
    }

    fn potentiallayers(
        &self,
        x: f64,
        y: f64,
        layers: &[usize],
        aquifers: &AquiferSystem,
    ) -> Array1<f64> {
        self.as_dyn().potentiallayers(x, y, layers, aquifers)
    }

    fn equation(
        &self,
        id: ElementId,
        ctx: &EquationContext<'_>,
    ) -> Result<(Array2<f64>, Array1<f64>)> {
        self.as_dyn().equation(id, ctx)
    }

    fn setparams(&mut self, sol: &[f64]) {
        self.as_dyn_mut().setparams(sol)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Constant(e) => write!(f, "{e}"),
            Element::ConstantInside(e) => write!(f, "{e}"),
            Element::ConstantStar(e) => write!(f, "{e}"),
            Element::Well(e) => write!(f, "{e}"),
        }
    }
}

impl From<Constant> for Element {
    fn from(e: Constant) -> Self {
        Element::Constant(e)
    }
}

impl From<ConstantInside> for Element {
    fn from(e: ConstantInside) -> Self {
        Element::ConstantInside(e)
    }
}

impl From<ConstantStar> for Element {
    fn from(e: ConstantStar) -> Self {
        Element::ConstantStar(e)
    }
}

impl From<Well> for Element {
    fn from(e: Well) -> Self {
        Element::Well(e)
    }
}
