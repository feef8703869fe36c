//! Model registry, solve driver and solved-model queries
//!
//! A [`Model`] collects aquifers and elements. [`Model::solve`] consumes it,
//! initializes every element, assembles and solves the linear system and
//! returns a [`SolvedModel`], the only type that answers head and discharge
//! queries.

use ndarray::{Array1, Array2, s};
use std::time::{Duration, Instant};

use crate::aquifer::{AquiferData, AquiferId, AquiferSystem};
use crate::contour::{GridSpec, HeadGrid, head_grid};
use crate::element::{AnalyticElement, Element, ElementId};
use crate::equation::{EquationContext, assemble_system};
use crate::error::{AemError, Result};
use crate::parallel::is_parallel_available;
use crate::solver::{CancelToken, lu_solve};

/// 5-point Gauss-Legendre rule on [-1, 1]
const GAUSS5_X: [f64; 5] = [
    -0.906_179_845_938_664,
    -0.538_469_310_105_683,
    0.0,
    0.538_469_310_105_683,
    0.906_179_845_938_664,
];
const GAUSS5_W: [f64; 5] = [
    0.236_926_885_056_189,
    0.478_628_670_499_366,
    0.568_888_888_888_889,
    0.478_628_670_499_366,
    0.236_926_885_056_189,
];

/// Options for [`Model::solve_with`]
#[derive(Debug, Clone, Default)]
pub struct SolveOptions {
    /// Cancellation flag and deadline, checked during assembly and LU
    pub cancel: CancelToken,
    /// Log progress at info level
    pub verbose: bool,
}

impl SolveOptions {
    /// Default options: no deadline, quiet
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the solve `timeout` from now
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.cancel = self.cancel.with_timeout(timeout);
        self
    }

    /// Cancel the solve once `deadline` has passed
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.cancel = self.cancel.with_deadline(deadline);
        self
    }

    /// Use an externally controlled token
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Enable verbose output
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// An unsolved model: aquifers plus registered elements
#[derive(Debug, Clone)]
pub struct Model {
    aquifers: AquiferSystem,
    elements: Vec<Element>,
    neq: usize,
}

impl Model {
    /// Create a model around its background aquifer
    pub fn new(background: AquiferData) -> Self {
        Self {
            aquifers: AquiferSystem::new(background),
            elements: Vec::new(),
            neq: 0,
        }
    }

    /// Single-layer confined model with conductivity `k` between `zb` and `zt`
    pub fn single_layer(k: f64, zb: f64, zt: f64) -> Result<Self> {
        Ok(Self::new(AquiferData::new(&[k], &[zb], &[zt])?))
    }

    /// Add a polygonal inhomogeneity, see [`AquiferSystem::add_inhomogeneity`]
    pub fn add_inhomogeneity(
        &mut self,
        data: AquiferData,
        boundary: Vec<[f64; 2]>,
    ) -> Result<AquiferId> {
        self.aquifers.add_inhomogeneity(data, boundary)
    }

    /// Register an element and reserve its block of unknowns
    ///
    /// No duplicate detection: two constant-head elements in one aquifer make
    /// the system singular.
    pub fn add_element(&mut self, element: impl Into<Element>) -> ElementId {
        let mut element = element.into();
        let id = ElementId(self.elements.len());
        element.base_mut().eq_offset = self.neq;
        self.neq += element.base().nunknowns;
        log::debug!("added {} as element {}", element, id.0);
        self.elements.push(element);
        id
    }

    /// Registered elements
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Aquifer registry
    pub fn aquifers(&self) -> &AquiferSystem {
        &self.aquifers
    }

    /// Total number of unknowns
    pub fn neq(&self) -> usize {
        self.neq
    }

    /// Solve with default options
    pub fn solve(self) -> Result<SolvedModel> {
        self.solve_with(&SolveOptions::default())
    }

    /// Initialize, assemble, solve and distribute the solution
    pub fn solve_with(mut self, options: &SolveOptions) -> Result<SolvedModel> {
        if options.cancel.is_cancelled() {
            return Err(AemError::Cancelled);
        }
        let start = Instant::now();

        for (index, element) in self.elements.iter_mut().enumerate() {
            element.initialize(ElementId(index), &mut self.aquifers)?;
        }

        if options.verbose {
            log::info!(
                "Solving AEM model: {} elements, {} aquifers, {} unknowns (parallel: {})",
                self.elements.len(),
                self.aquifers.len(),
                self.neq,
                is_parallel_available()
            );
        }

        if self.neq == 0 {
            log::warn!("model has no unknowns; heads are not tied to a reference");
            return Ok(SolvedModel {
                aquifers: self.aquifers,
                elements: self.elements,
                solution: Array1::zeros(0),
            });
        }

        let (matrix, rhs) = {
            let ctx = EquationContext {
                elements: &self.elements,
                aquifers: &self.aquifers,
                neq: self.neq,
            };
            assemble_system(&ctx, &options.cancel)?
        };
        let solution = lu_solve(&matrix, &rhs, &options.cancel)?;

        for element in self.elements.iter_mut() {
            let (offset, n) = (element.base().eq_offset, element.base().nunknowns);
            if n > 0 {
                let values = solution.slice(s![offset..offset + n]).to_vec();
                element.setparams(&values);
            }
        }

        if options.verbose {
            log::info!(
                "Solution complete in {:.3} ms",
                start.elapsed().as_secs_f64() * 1e3
            );
        }

        Ok(SolvedModel {
            aquifers: self.aquifers,
            elements: self.elements,
            solution,
        })
    }
}

/// A solved model answering potential, head and discharge queries
#[derive(Debug, Clone)]
pub struct SolvedModel {
    aquifers: AquiferSystem,
    elements: Vec<Element>,
    solution: Array1<f64>,
}

impl SolvedModel {
    /// Total potential per layer of the aquifer containing `(x, y)`
    pub fn potential(&self, x: f64, y: f64) -> Array1<f64> {
        let aq = self.aquifers.at(x, y);
        let mut pot = Array1::zeros(aq.naq());
        for id in aq.elements() {
            pot += &self.elements[id.0].potential(x, y, aq);
        }
        pot
    }

    /// Head in `layer` at `(x, y)`
    pub fn head(&self, layer: usize, x: f64, y: f64) -> Result<f64> {
        let aq = self.aquifers.at(x, y);
        if layer >= aq.naq() {
            return Err(AemError::LayerOutOfRange {
                layer,
                naq: aq.naq(),
            });
        }
        Ok(self.potential(x, y)[layer] / aq.t[layer])
    }

    /// Heads in all layers at `(x, y)`
    pub fn heads(&self, x: f64, y: f64) -> Array1<f64> {
        let aq = self.aquifers.at(x, y);
        self.potential(x, y) / &aq.t
    }

    /// Discharge vector per layer at `(x, y)`, shape `[2, naq]`
    pub fn discharge(&self, x: f64, y: f64) -> Array2<f64> {
        let aq = self.aquifers.at(x, y);
        let mut qxy = Array2::zeros((2, aq.naq()));
        for id in aq.elements() {
            qxy += &self.elements[id.0].discharge(x, y, aq);
        }
        qxy
    }

    /// Heads of `layer` on a regular grid
    pub fn head_grid(&self, layer: usize, spec: &GridSpec) -> Result<HeadGrid> {
        head_grid(self, layer, spec)
    }

    /// Outward normal discharge through a closed polygon in `layer`
    ///
    /// Each edge is split into `points_per_edge` panels integrated with a
    /// 5-point Gauss-Legendre rule. Orientation of the vertices does not
    /// matter. Extraction inside the polygon gives a negative flux.
    pub fn normal_flux_through_polygon(
        &self,
        layer: usize,
        polygon: &[[f64; 2]],
        points_per_edge: usize,
    ) -> Result<f64> {
        if polygon.len() < 3 {
            return Err(AemError::InvalidParameters(format!(
                "flux boundary needs at least 3 vertices, got {}",
                polygon.len()
            )));
        }
        let naq = self.aquifers.background().naq();
        if layer >= naq {
            return Err(AemError::LayerOutOfRange { layer, naq });
        }
        let panels = points_per_edge.max(1);

        // Outward normal of edge (dx, dy) is (dy, -dx) for counter-clockwise vertices
        let sign = if signed_area(polygon) >= 0.0 { 1.0 } else { -1.0 };

        let mut flux = 0.0;
        for i in 0..polygon.len() {
            let [x0, y0] = polygon[i];
            let [x1, y1] = polygon[(i + 1) % polygon.len()];
            let (dx, dy) = ((x1 - x0) / panels as f64, (y1 - y0) / panels as f64);
            for p in 0..panels {
                let (px, py) = (x0 + p as f64 * dx, y0 + p as f64 * dy);
                for (&xi, &w) in GAUSS5_X.iter().zip(GAUSS5_W.iter()) {
                    let t = 0.5 * (xi + 1.0);
                    let q = self.discharge(px + t * dx, py + t * dy);
                    if layer < q.ncols() {
                        // |edge| * (n . q) with the length folded into (dy, -dx)
                        flux += 0.5 * w * sign * (q[[0, layer]] * dy - q[[1, layer]] * dx);
                    }
                }
            }
        }
        Ok(flux)
    }

    /// Solved unknowns in registration order
    pub fn solution(&self) -> &Array1<f64> {
        &self.solution
    }

    /// Elements with their solved parameters
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Look up one element
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    /// Aquifer registry
    pub fn aquifers(&self) -> &AquiferSystem {
        &self.aquifers
    }
}

/// Shoelace area, positive for counter-clockwise vertices
fn signed_area(polygon: &[[f64; 2]]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| {
            let [x0, y0] = polygon[i];
            let [x1, y1] = polygon[(i + 1) % n];
            x0 * y1 - x1 * y0
        })
        .sum::<f64>()
        * 0.5
}
