//! Constant-type elements
//!
//! The potential of an aquifer is only defined up to an additive constant.
//! [`Constant`] pins it with a reference head at one point. [`ConstantInside`]
//! ties the constant of an inhomogeneity interior to the average potential at
//! its control points, and [`ConstantStar`] carries the fixed particular
//! solution of a semi-confined aquifer. None of them carries discharge.

use ndarray::{Array1, Array2, Array3, Axis};
use std::fmt;

use super::{AnalyticElement, ElementBase, ElementId};
use crate::aquifer::{AquiferData, AquiferId, AquiferSystem, LayerType};
use crate::equation::EquationContext;
use crate::error::{AemError, Result};

/// Unit influence of a single constant on the given layers of its own aquifer
fn constant_potinf(base: &ElementBase, aq: &AquiferData) -> Array2<f64> {
    let mut rv = Array2::zeros((1, aq.naq()));
    if base.in_aquifer(aq) {
        for &layer in &base.layers {
            if layer < aq.naq() {
                rv[[0, layer]] = 1.0;
            }
        }
    }
    rv
}

/// Constructor arguments of a [`Constant`]
#[derive(Debug, Clone, Copy, PartialEq)]
struct ConstantInput {
    /// Reference point x
    xr: f64,
    /// Reference point y
    yr: f64,
    /// Head at the reference point
    hr: f64,
    /// Layer the head applies to
    layer: usize,
}

/// Reference head `hr` at `(xr, yr)`
///
/// One parameter, one unknown: the additive constant of the potential in its
/// aquifer. Only valid where the top layer is an aquifer layer.
#[derive(Debug, Clone)]
pub struct Constant {
    base: ElementBase,
    input: ConstantInput,
}

impl Constant {
    /// Create a reference head element
    pub fn new(xr: f64, yr: f64, hr: f64, layer: usize) -> Self {
        Self {
            base: ElementBase::new("Constant", 1, 1, vec![layer]),
            input: ConstantInput { xr, yr, hr, layer },
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.label = Some(label.into());
        self
    }
}

impl AnalyticElement for Constant {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn initialize(&mut self, id: ElementId, aquifers: &mut AquiferSystem) -> Result<()> {
        let ConstantInput { xr, yr, hr, layer } = self.input;
        if !(xr.is_finite() && yr.is_finite()) {
            return Err(AemError::InvalidParameters(format!(
                "{}: reference point must be finite",
                self
            )));
        }
        if !hr.is_finite() {
            return Err(AemError::InvalidParameters(format!(
                "{}: reference head must be finite",
                self
            )));
        }
        let aq = aquifers.find_aquifer_data(xr, yr);
        if aquifers.at(xr, yr).ltype != LayerType::Aquifer {
            return Err(AemError::InvalidPlacement {
                element: self.to_string(),
                reason: "Constant element added to area that is semi-confined".to_string(),
            });
        }
        self.base.register(id, aq, aquifers)?;

        let t = aquifers.at(xr, yr).t[layer];
        self.base.xc = vec![xr];
        self.base.yc = vec![yr];
        self.base.pc = Array1::from_elem(1, hr * t);
        self.base.parameters = Array2::from_elem((1, 1), hr * t);
        Ok(())
    }

    fn potinf(&self, _x: f64, _y: f64, aq: &AquiferData) -> Array2<f64> {
        constant_potinf(&self.base, aq)
    }

    fn disinf(&self, _x: f64, _y: f64, aq: &AquiferData) -> Array3<f64> {
        Array3::zeros((2, 1, aq.naq()))
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} at ({}, {}) with head {}",
            self.base.label.as_deref().unwrap_or(self.base.name),
            self.input.xr,
            self.input.yr,
            self.input.hr
        )
    }
}

/// Constructor arguments of a [`ConstantInside`]
#[derive(Debug, Clone, PartialEq)]
struct ConstantInsideInput {
    /// Control point x-coordinates
    xc: Vec<f64>,
    /// Control point y-coordinates
    yc: Vec<f64>,
}

/// Constant of an inhomogeneity interior
///
/// Its equation requires the potential of all other elements, summed over
/// the control points, to vanish; the total potential there then averages to
/// this element's own parameter.
#[derive(Debug, Clone)]
pub struct ConstantInside {
    base: ElementBase,
    input: ConstantInsideInput,
}

impl ConstantInside {
    /// Create the element from its control points
    pub fn new(xc: Vec<f64>, yc: Vec<f64>) -> Self {
        Self {
            base: ElementBase::new("ConstantInside", 1, 1, vec![0]),
            input: ConstantInsideInput { xc, yc },
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.label = Some(label.into());
        self
    }
}

impl AnalyticElement for ConstantInside {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn initialize(&mut self, id: ElementId, aquifers: &mut AquiferSystem) -> Result<()> {
        let ConstantInsideInput { xc, yc } = &self.input;
        if xc.is_empty() || xc.len() != yc.len() {
            return Err(AemError::InvalidParameters(format!(
                "{} needs matching, non-empty control points (got {} x, {} y)",
                self.base.name,
                xc.len(),
                yc.len()
            )));
        }
        if xc.iter().chain(yc).any(|v| !v.is_finite()) {
            return Err(AemError::InvalidParameters(format!(
                "{}: control points must be finite",
                self.base.name
            )));
        }
        let aq = aquifers.find_aquifer_data(xc[0], yc[0]);
        let naq = aquifers.at(xc[0], yc[0]).naq();
        self.base.layers = (0..naq).collect();
        self.base.parameters = Array2::zeros((1, naq));
        self.base.register(id, aq, aquifers)?;

        self.base.xc = xc.clone();
        self.base.yc = yc.clone();
        Ok(())
    }

    fn potinf(&self, _x: f64, _y: f64, aq: &AquiferData) -> Array2<f64> {
        let mut rv = Array2::zeros((1, aq.naq()));
        if self.base.in_aquifer(aq) {
            rv[[0, 0]] = 1.0;
        }
        rv
    }

    fn disinf(&self, _x: f64, _y: f64, aq: &AquiferData) -> Array3<f64> {
        Array3::zeros((2, 1, aq.naq()))
    }

    fn equation(
        &self,
        id: ElementId,
        ctx: &EquationContext<'_>,
    ) -> Result<(Array2<f64>, Array1<f64>)> {
        let mut mat = Array2::zeros((1, ctx.neq));
        let mut rhs = Array1::zeros(1);
        for icp in 0..self.base.ncp() {
            let (x, y) = (self.base.xc[icp], self.base.yc[icp]);
            for (index, e) in ctx.elements.iter().enumerate() {
                let eb = e.base();
                if eb.nunknowns > 0 {
                    if ElementId(index) != id {
                        let inf = e
                            .potinflayers(x, y, &self.base.layers, ctx.aquifers)
                            .sum_axis(Axis(0));
                        for p in 0..eb.nunknowns {
                            mat[[0, eb.eq_offset + p]] += inf[p];
                        }
                    }
                } else {
                    rhs[0] -= e
                        .potentiallayers(x, y, &self.base.layers, ctx.aquifers)
                        .sum();
                }
            }
        }
        Ok((mat, rhs))
    }
}

impl fmt::Display for ConstantInside {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} with {} control point(s)",
            self.base.label.as_deref().unwrap_or(self.base.name),
            self.input.xc.len()
        )
    }
}

/// Constructor arguments of a [`ConstantStar`]
#[derive(Debug, Clone, Copy, PartialEq)]
struct ConstantStarInput {
    /// Head of the particular solution
    hstar: f64,
    /// Aquifer carrying the particular solution
    aq: usize,
}

/// Fixed particular solution `hstar` of a semi-confined aquifer
///
/// No unknowns: it only adds the known potential `hstar * T` throughout its
/// aquifer and never enters the solution vector.
#[derive(Debug, Clone)]
pub struct ConstantStar {
    base: ElementBase,
    input: ConstantStarInput,
    potstar: Array1<f64>,
}

impl ConstantStar {
    /// Create the particular solution for aquifer `aq`
    pub fn new(hstar: f64, aq: AquiferId) -> Self {
        Self {
            base: ElementBase::new("ConstantStar", 1, 0, vec![0]),
            input: ConstantStarInput { hstar, aq: aq.0 },
            potstar: Array1::zeros(0),
        }
    }

    /// Attach a label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.base.label = Some(label.into());
        self
    }
}

impl AnalyticElement for ConstantStar {
    fn base(&self) -> &ElementBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ElementBase {
        &mut self.base
    }

    fn initialize(&mut self, id: ElementId, aquifers: &mut AquiferSystem) -> Result<()> {
        let aq = AquiferId(self.input.aq);
        if !self.input.hstar.is_finite() {
            return Err(AemError::InvalidParameters(format!(
                "{}: head must be finite",
                self
            )));
        }
        if let Some(existing) = aquifers.get(aq).and_then(|data| data.constant_star()) {
            return Err(AemError::InvalidPlacement {
                element: self.to_string(),
                reason: format!(
                    "aquifer {} already has a particular solution (element {})",
                    aq.0, existing.0
                ),
            });
        }
        self.base.register(id, aq, aquifers)?;

        let data = aquifers
            .get_mut(aq)
            .ok_or_else(|| AemError::InvalidParameters(format!("unknown aquifer {}", aq.0)))?;
        data.set_constant_star(id);
        self.base.parameters = Array2::zeros((1, 1));
        self.potstar = &data.t * self.input.hstar;
        Ok(())
    }

    fn potinf(&self, _x: f64, _y: f64, aq: &AquiferData) -> Array2<f64> {
        Array2::zeros((1, aq.naq()))
    }

    fn disinf(&self, _x: f64, _y: f64, aq: &AquiferData) -> Array3<f64> {
        Array3::zeros((2, 1, aq.naq()))
    }

    /// The particular solution cannot be written as unit influence times a
    /// parameter, so the potential is returned directly
    fn potential(&self, _x: f64, _y: f64, aq: &AquiferData) -> Array1<f64> {
        if self.base.in_aquifer(aq) {
            self.potstar.clone()
        } else {
            Array1::zeros(aq.naq())
        }
    }
}

impl fmt::Display for ConstantStar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} with head {}",
            self.base.label.as_deref().unwrap_or(self.base.name),
            self.input.hstar
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system_with_inhomogeneity() -> (AquiferSystem, AquiferId) {
        let background = AquiferData::new(&[1.0], &[0.0], &[10.0]).unwrap();
        let mut system = AquiferSystem::new(background);
        let inhom = AquiferData::new(&[2.0], &[0.0], &[10.0])
            .unwrap()
            .with_layer_type(LayerType::Leaky);
        let id = system
            .add_inhomogeneity(
                inhom,
                vec![[100.0, 100.0], [200.0, 100.0], [200.0, 200.0], [100.0, 200.0]],
            )
            .unwrap();
        (system, id)
    }

    #[test]
    fn test_constant_initialize() {
        let (mut system, _) = system_with_inhomogeneity();
        let mut c = Constant::new(10.0, 20.0, 5.0, 0);
        c.initialize(ElementId(0), &mut system).unwrap();

        assert_eq!(c.base().aq, Some(AquiferId::BACKGROUND));
        assert_eq!(c.base().xc, vec![10.0]);
        assert_eq!(c.base().yc, vec![20.0]);
        assert_eq!(c.base().pc[0], 50.0);
        assert_eq!(c.base().parameters[[0, 0]], 50.0);
        assert_eq!(system.background().elements(), &[ElementId(0)]);
    }

    #[test]
    fn test_constant_in_semi_confined_area() {
        let (mut system, id) = system_with_inhomogeneity();
        let mut c = Constant::new(150.0, 150.0, 5.0, 0);
        let err = c.initialize(ElementId(0), &mut system).unwrap_err();

        assert!(matches!(err, AemError::InvalidPlacement { .. }));
        assert!(system.get(id).unwrap().elements().is_empty());
    }

    #[test]
    fn test_constant_rejects_non_finite_input() {
        let (mut system, _) = system_with_inhomogeneity();
        for c in [
            Constant::new(0.0, 0.0, f64::NAN, 0),
            Constant::new(f64::INFINITY, 0.0, 5.0, 0),
            Constant::new(0.0, f64::NEG_INFINITY, 5.0, 0),
        ] {
            let mut c = c;
            let err = c.initialize(ElementId(0), &mut system).unwrap_err();
            assert!(matches!(err, AemError::InvalidParameters(_)));
        }
        assert!(system.background().elements().is_empty());

        let mut ci = ConstantInside::new(vec![150.0, f64::NAN], vec![150.0, 150.0]);
        assert!(ci.initialize(ElementId(1), &mut system).is_err());
        let mut cs = ConstantStar::new(f64::INFINITY, AquiferId::BACKGROUND);
        assert!(cs.initialize(ElementId(2), &mut system).is_err());
    }

    #[test]
    fn test_constant_inside_potinf_own_aquifer_only() {
        let (mut system, id) = system_with_inhomogeneity();
        let mut ci = ConstantInside::new(vec![150.0], vec![150.0]);
        ci.initialize(ElementId(0), &mut system).unwrap();

        let own = ci.potinf(150.0, 150.0, system.get(id).unwrap());
        assert_eq!(own.shape(), &[1, 1]);
        assert_eq!(own[[0, 0]], 1.0);

        let foreign = ci.potinf(0.0, 0.0, system.background());
        assert!(foreign.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_constant_star_potinf_zero_in_own_aquifer() {
        let (mut system, id) = system_with_inhomogeneity();
        let mut cs = ConstantStar::new(4.0, id);
        cs.initialize(ElementId(0), &mut system).unwrap();

        let inhom = system.get(id).unwrap();
        assert!(cs.potinf(150.0, 150.0, inhom).iter().all(|&v| v == 0.0));
        assert!(cs.potinf(0.0, 0.0, system.background()).iter().all(|&v| v == 0.0));
        assert_ne!(cs.potential(150.0, 150.0, inhom)[0], 0.0);
    }

    #[test]
    fn test_constant_potinf_own_aquifer_only() {
        let (mut system, id) = system_with_inhomogeneity();
        let mut c = Constant::new(10.0, 20.0, 5.0, 0);
        c.initialize(ElementId(0), &mut system).unwrap();

        let own = c.potinf(0.0, 0.0, system.background());
        assert_eq!(own[[0, 0]], 1.0);

        let foreign = c.potinf(150.0, 150.0, system.get(id).unwrap());
        assert!(foreign.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_constant_inside_layers_and_control_points() {
        let (mut system, id) = system_with_inhomogeneity();
        let mut ci = ConstantInside::new(vec![120.0, 180.0], vec![150.0, 150.0]);
        ci.initialize(ElementId(3), &mut system).unwrap();

        assert_eq!(ci.base().aq, Some(id));
        assert_eq!(ci.base().ncp(), 2);
        assert_eq!(ci.base().layers, vec![0]);
        assert_eq!(system.get(id).unwrap().elements(), &[ElementId(3)]);
    }

    #[test]
    fn test_constant_inside_rejects_empty_points() {
        let (mut system, _) = system_with_inhomogeneity();
        let mut ci = ConstantInside::new(vec![], vec![]);
        assert!(ci.initialize(ElementId(0), &mut system).is_err());
    }

    #[test]
    fn test_constant_star_potential() {
        let (mut system, id) = system_with_inhomogeneity();
        let mut cs = ConstantStar::new(4.0, id);
        cs.initialize(ElementId(1), &mut system).unwrap();

        let inhom = system.get(id).unwrap();
        assert_eq!(inhom.constant_star(), Some(ElementId(1)));
        // T = 2 * 10
        assert_eq!(cs.potential(150.0, 150.0, inhom)[0], 80.0);
        assert!(cs.potinf(150.0, 150.0, inhom).iter().all(|&v| v == 0.0));
        assert_eq!(cs.potential(0.0, 0.0, system.background())[0], 0.0);
    }

    #[test]
    fn test_constant_star_twice_in_one_aquifer() {
        let (mut system, id) = system_with_inhomogeneity();
        let mut first = ConstantStar::new(4.0, id);
        first.initialize(ElementId(0), &mut system).unwrap();
        let mut second = ConstantStar::new(5.0, id);
        let err = second.initialize(ElementId(1), &mut system).unwrap_err();
        assert!(matches!(err, AemError::InvalidPlacement { .. }));
    }

    #[test]
    fn test_disinf_is_zero() {
        let (mut system, id) = system_with_inhomogeneity();
        let mut c = Constant::new(10.0, 20.0, 5.0, 0);
        c.initialize(ElementId(0), &mut system).unwrap();
        let mut ci = ConstantInside::new(vec![150.0], vec![150.0]);
        ci.initialize(ElementId(1), &mut system).unwrap();
        let mut cs = ConstantStar::new(4.0, id);
        cs.initialize(ElementId(2), &mut system).unwrap();

        for aq in system.iter() {
            for &(x, y) in &[(0.0, 0.0), (10.0, 20.0), (150.0, 150.0), (-1e6, 3e5)] {
                for rv in [c.disinf(x, y, aq), ci.disinf(x, y, aq), cs.disinf(x, y, aq)] {
                    assert_eq!(rv.shape(), &[2, 1, aq.naq()]);
                    assert!(rv.iter().all(|&v| v == 0.0));
                }
            }
        }
    }

    #[test]
    fn test_display() {
        let c = Constant::new(1.0, 2.0, 3.0, 0);
        assert_eq!(c.to_string(), "Constant at (1, 2) with head 3");
        let c = c.with_label("anchor");
        assert_eq!(c.to_string(), "anchor at (1, 2) with head 3");
        let cs = ConstantStar::new(4.5, AquiferId::BACKGROUND);
        assert_eq!(cs.to_string(), "ConstantStar with head 4.5");
    }
}
