//! Global system assembly
//!
//! Every element with unknowns owns a contiguous block of rows and columns in
//! the `Neq × Neq` system, starting at the offset assigned when it was added
//! to the model. Blocks are computed independently and copied into place.

use ndarray::{Array1, Array2, s};

use crate::aquifer::AquiferSystem;
use crate::element::{AnalyticElement, Element, ElementId};
use crate::error::{AemError, Result};
use crate::parallel::parallel_map_indexed;
use crate::solver::CancelToken;

/// Read-only view of an initialized model used to build equations
#[derive(Debug, Clone, Copy)]
pub struct EquationContext<'a> {
    /// All elements in registration order
    pub elements: &'a [Element],
    /// Aquifer registry
    pub aquifers: &'a AquiferSystem,
    /// Total number of unknowns
    pub neq: usize,
}

/// Head equation at the element's control points
///
/// One row per control point and assigned layer: the unit influences of all
/// elements with unknowns at their block columns. The right-hand side is the
/// target potential minus the potential of all elements without unknowns.
pub fn head_equation<E: AnalyticElement + ?Sized>(
    element: &E,
    ctx: &EquationContext<'_>,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let base = element.base();
    let nlayers = base.layers.len();
    let nrows = base.ncp() * nlayers;
    if nrows != base.nunknowns {
        return Err(AemError::DimensionMismatch {
            expected: base.nunknowns,
            got: nrows,
        });
    }
    if base.pc.len() != nlayers {
        return Err(AemError::DimensionMismatch {
            expected: nlayers,
            got: base.pc.len(),
        });
    }

    let mut mat = Array2::zeros((nrows, ctx.neq));
    let mut rhs = Array1::zeros(nrows);
    for icp in 0..base.ncp() {
        let (x, y) = (base.xc[icp], base.yc[icp]);
        let rows = icp * nlayers..(icp + 1) * nlayers;
        rhs.slice_mut(s![rows.clone()]).assign(&base.pc);
        for e in ctx.elements {
            let eb = e.base();
            if eb.nunknowns > 0 {
                let inf = e.potinflayers(x, y, &base.layers, ctx.aquifers);
                let cols = eb.eq_offset..eb.eq_offset + eb.nunknowns;
                mat.slice_mut(s![rows.clone(), cols])
                    .assign(&inf.slice(s![.., ..eb.nunknowns]));
            } else {
                let pot = e.potentiallayers(x, y, &base.layers, ctx.aquifers);
                let mut block = rhs.slice_mut(s![rows.clone()]);
                block -= &pot;
            }
        }
    }
    Ok((mat, rhs))
}

/// Assemble the global matrix and right-hand side
///
/// Each element with unknowns contributes its equation block at its offset.
/// The token is checked before each block.
pub fn assemble_system(
    ctx: &EquationContext<'_>,
    cancel: &CancelToken,
) -> Result<(Array2<f64>, Array1<f64>)> {
    let blocks = parallel_map_indexed(ctx.elements.len(), |index| {
        let e = &ctx.elements[index];
        if e.base().nunknowns == 0 {
            return Ok(None);
        }
        if cancel.is_cancelled() {
            return Err(AemError::Cancelled);
        }
        e.equation(ElementId(index), ctx).map(Some)
    });

    let mut mat = Array2::zeros((ctx.neq, ctx.neq));
    let mut rhs = Array1::zeros(ctx.neq);
    for (e, block) in ctx.elements.iter().zip(blocks) {
        let Some((block_mat, block_rhs)) = block? else {
            continue;
        };
        let eb = e.base();
        if block_mat.dim() != (eb.nunknowns, ctx.neq) {
            return Err(AemError::DimensionMismatch {
                expected: eb.nunknowns * ctx.neq,
                got: block_mat.len(),
            });
        }
        if block_rhs.len() != eb.nunknowns {
            return Err(AemError::DimensionMismatch {
                expected: eb.nunknowns,
                got: block_rhs.len(),
            });
        }
        let rows = eb.eq_offset..eb.eq_offset + eb.nunknowns;
        mat.slice_mut(s![rows.clone(), ..]).assign(&block_mat);
        rhs.slice_mut(s![rows]).assign(&block_rhs);
        log::debug!("assembled {} rows for {}", eb.nunknowns, e);
    }
    Ok((mat, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aquifer::AquiferData;
    use crate::element::{Constant, ConstantInside, ConstantStar, Well};
    use approx::assert_relative_eq;

    fn initialized(mut elements: Vec<Element>) -> (Vec<Element>, AquiferSystem, usize) {
        let mut aquifers =
            AquiferSystem::new(AquiferData::new(&[2.0], &[0.0], &[10.0]).unwrap());
        let mut neq = 0;
        for (i, e) in elements.iter_mut().enumerate() {
            e.base_mut().eq_offset = neq;
            neq += e.base().nunknowns;
            e.initialize(ElementId(i), &mut aquifers).unwrap();
        }
        (elements, aquifers, neq)
    }

    #[test]
    fn test_single_constant_system() {
        let (elements, aquifers, neq) = initialized(vec![Constant::new(0.0, 0.0, 5.0, 0).into()]);
        let ctx = EquationContext {
            elements: &elements,
            aquifers: &aquifers,
            neq,
        };
        let (mat, rhs) = assemble_system(&ctx, &CancelToken::new()).unwrap();
        assert_eq!(mat.dim(), (1, 1));
        assert_eq!(mat[[0, 0]], 1.0);
        // hr * T = 5 * 20
        assert_eq!(rhs[0], 100.0);
    }

    #[test]
    fn test_known_elements_move_to_rhs() {
        let (elements, aquifers, neq) = initialized(vec![
            Constant::new(100.0, 0.0, 5.0, 0).into(),
            Well::new(0.0, 0.0, 1.0, 0.5, 0).into(),
            ConstantStar::new(0.5, crate::aquifer::AquiferId::BACKGROUND).into(),
        ]);
        assert_eq!(neq, 1);
        let ctx = EquationContext {
            elements: &elements,
            aquifers: &aquifers,
            neq,
        };
        let (_, rhs) = assemble_system(&ctx, &CancelToken::new()).unwrap();
        let well = (100.0f64 / 0.5).ln() / (2.0 * std::f64::consts::PI);
        assert_relative_eq!(rhs[0], 100.0 - well - 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_inside_row() {
        let (elements, aquifers, neq) = initialized(vec![
            Constant::new(0.0, 0.0, 5.0, 0).into(),
            ConstantInside::new(vec![10.0, 20.0], vec![0.0, 0.0]).into(),
        ]);
        let ctx = EquationContext {
            elements: &elements,
            aquifers: &aquifers,
            neq,
        };
        let (mat, rhs) = assemble_system(&ctx, &CancelToken::new()).unwrap();
        assert_eq!(mat.dim(), (2, 2));
        // Constant row sees both constants
        assert_eq!(mat.row(0).to_vec(), vec![1.0, 1.0]);
        // ConstantInside row: other element summed over 2 control points, own column zero
        assert_eq!(mat.row(1).to_vec(), vec![2.0, 0.0]);
        assert_eq!(rhs[1], 0.0);
    }

    #[test]
    fn test_assemble_cancelled() {
        let (elements, aquifers, neq) = initialized(vec![Constant::new(0.0, 0.0, 5.0, 0).into()]);
        let ctx = EquationContext {
            elements: &elements,
            aquifers: &aquifers,
            neq,
        };
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            assemble_system(&ctx, &token),
            Err(AemError::Cancelled)
        ));
    }

    #[test]
    fn test_head_equation_checks_target_length() {
        let (mut elements, aquifers, neq) =
            initialized(vec![Constant::new(0.0, 0.0, 5.0, 0).into()]);
        elements[0].base_mut().pc = Array1::zeros(2);
        let ctx = EquationContext {
            elements: &elements,
            aquifers: &aquifers,
            neq,
        };
        assert!(matches!(
            head_equation(&elements[0], &ctx),
            Err(AemError::DimensionMismatch { .. })
        ));
    }
}
