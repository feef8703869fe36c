//! Water-table grids and contour tracing
//!
//! Two outputs are derived from a solved model:
//!
//! - square water-table cells tagged with the head at their centre
//! - contour segments of a regular head grid, traced by marching squares

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{AemError, Result};
use crate::model::SolvedModel;
use crate::parallel::{parallel_map, parallel_map_indexed};

/// Upper bound on evaluated points per grid
pub const MAX_GRID_POINTS: usize = 4_000_000;

/// Upper bound on contour levels per grid
pub const MAX_CONTOUR_LEVELS: usize = 1_000;

/// Rectangular query window and cell size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    /// West edge
    pub x_min: f64,
    /// East edge
    pub x_max: f64,
    /// South edge
    pub y_min: f64,
    /// North edge
    pub y_max: f64,
    /// Side length of a square cell
    pub cell_side: f64,
}

impl GridSpec {
    /// Create a grid specification
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64, cell_side: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            cell_side,
        }
    }

    /// Check bounds, cell size and grid size
    pub fn validate(&self) -> Result<()> {
        let values = [self.x_min, self.x_max, self.y_min, self.y_max, self.cell_side];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(AemError::InvalidParameters(
                "grid bounds and cell side must be finite".to_string(),
            ));
        }
        if self.cell_side <= 0.0 {
            return Err(AemError::InvalidParameters(format!(
                "cell side must be positive, got {}",
                self.cell_side
            )));
        }
        if self.x_max <= self.x_min || self.y_max <= self.y_min {
            return Err(AemError::InvalidParameters(format!(
                "empty grid window x=[{}, {}], y=[{}, {}]",
                self.x_min, self.x_max, self.y_min, self.y_max
            )));
        }
        let c = self.cell_side;
        let nx = arange_len(self.x_min - c, self.x_max + c, c);
        let ny = arange_len(self.y_min - c, self.y_max + c, c);
        if nx.saturating_mul(ny) > MAX_GRID_POINTS {
            return Err(AemError::InvalidParameters(format!(
                "grid of {} x {} cells exceeds {} points",
                nx, ny, MAX_GRID_POINTS
            )));
        }
        Ok(())
    }

    /// West edges of the water-table cells, one cell beyond the window on each side
    pub fn cell_columns(&self) -> Vec<f64> {
        arange(
            self.x_min - self.cell_side,
            self.x_max + self.cell_side,
            self.cell_side,
        )
    }

    /// South edges of the water-table cells
    pub fn cell_rows(&self) -> Vec<f64> {
        arange(
            self.y_min - self.cell_side,
            self.y_max + self.cell_side,
            self.cell_side,
        )
    }

    /// Number of contour-grid nodes along x and y, at least 2 each
    ///
    /// `span / cell_side` truncated to an integer.
    pub fn node_counts(&self) -> (usize, usize) {
        let n = |span: f64| ((span.abs() / self.cell_side).floor() as usize).max(2);
        (n(self.x_max - self.x_min), n(self.y_max - self.y_min))
    }
}

/// Number of values in `arange(start, stop, step)`
fn arange_len(start: f64, stop: f64, step: f64) -> usize {
    let n = ((stop - start) / step).ceil();
    if n.is_finite() && n > 0.0 {
        n as usize
    } else {
        0
    }
}

/// Values `start, start + step, ...` below `stop`
fn arange(start: f64, stop: f64, step: f64) -> Vec<f64> {
    (0..arange_len(start, stop, step))
        .map(|i| start + i as f64 * step)
        .collect()
}

/// Square water-table cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Closed ring: SW, SE, NE, NW, SW
    pub polygon: [[f64; 2]; 5],
    /// Cell centre
    pub center: [f64; 2],
    /// Head at the centre
    pub elevation: f64,
}

/// Water-table cells covering the window plus one cell on each side
///
/// Cells are ordered by column, then row.
pub fn water_table_cells(
    model: &SolvedModel,
    layer: usize,
    spec: &GridSpec,
) -> Result<Vec<GridCell>> {
    spec.validate()?;
    let c = spec.cell_side;
    let rows = spec.cell_rows();
    let corners: Vec<[f64; 2]> = spec
        .cell_columns()
        .into_iter()
        .flat_map(|x| rows.iter().map(move |&y| [x, y]))
        .collect();

    parallel_map(&corners, |&[x, y]| -> Result<GridCell> {
        let center = [x + 0.5 * c, y + 0.5 * c];
        Ok(GridCell {
            polygon: [[x, y], [x + c, y], [x + c, y + c], [x, y + c], [x, y]],
            center,
            elevation: model.head(layer, center[0], center[1])?,
        })
    })
    .into_iter()
    .collect()
}

/// Heads on a regular grid of nodes, `head[[j, i]]` at `(x[i], y[j])`
#[derive(Debug, Clone, PartialEq)]
pub struct HeadGrid {
    /// Node x-coordinates, increasing
    pub x: Array1<f64>,
    /// Node y-coordinates, increasing
    pub y: Array1<f64>,
    /// Heads, shape `[ny, nx]`
    pub head: Array2<f64>,
}

impl HeadGrid {
    /// Wrap precomputed heads
    pub fn new(x: Array1<f64>, y: Array1<f64>, head: Array2<f64>) -> Result<Self> {
        if head.dim() != (y.len(), x.len()) {
            return Err(AemError::DimensionMismatch {
                expected: y.len() * x.len(),
                got: head.len(),
            });
        }
        Ok(Self { x, y, head })
    }

    /// Smallest head
    pub fn min(&self) -> f64 {
        self.head.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Largest head
    pub fn max(&self) -> f64 {
        self.head.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// `n` evenly spaced contours between the grid extremes
    pub fn contours(&self, n: usize) -> ContourSet {
        let levels = contour_levels(self.min(), self.max(), n);
        let segments = trace_contours(self, &levels);
        ContourSet { levels, segments }
    }
}

/// Evaluate `layer` heads on the window's node grid
pub fn head_grid(model: &SolvedModel, layer: usize, spec: &GridSpec) -> Result<HeadGrid> {
    spec.validate()?;
    let (nx, ny) = spec.node_counts();
    let x = Array1::linspace(spec.x_min, spec.x_max, nx);
    let y = Array1::linspace(spec.y_min, spec.y_max, ny);

    let values = parallel_map_indexed(nx * ny, |k| model.head(layer, x[k % nx], y[k / nx]))
        .into_iter()
        .collect::<Result<Vec<f64>>>()?;
    let got = values.len();
    let head = Array2::from_shape_vec((ny, nx), values).map_err(|_| {
        AemError::DimensionMismatch {
            expected: nx * ny,
            got,
        }
    })?;
    log::debug!("evaluated {} x {} head grid", nx, ny);
    HeadGrid::new(x, y, head)
}

/// `n` levels evenly spaced strictly between `min` and `max`
///
/// Empty for a flat or non-finite range. `n` is capped at
/// [`MAX_CONTOUR_LEVELS`].
pub fn contour_levels(min: f64, max: f64, n: usize) -> Vec<f64> {
    let n = n.min(MAX_CONTOUR_LEVELS);
    if n == 0 || !(min.is_finite() && max.is_finite()) || max <= min {
        return Vec::new();
    }
    let step = (max - min) / (n as f64 + 1.0);
    (1..=n).map(|i| min + i as f64 * step).collect()
}

/// Straight piece of a contour line inside one grid cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContourSegment {
    /// Head along the segment
    pub level: f64,
    /// First end point
    pub start: [f64; 2],
    /// Second end point
    pub end: [f64; 2],
}

/// Traced contour levels
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContourSet {
    /// Levels in increasing order
    pub levels: Vec<f64>,
    /// Segments of all levels, grouped by level
    pub segments: Vec<ContourSegment>,
}

impl ContourSet {
    /// Segments of one level
    pub fn segments_at(&self, level: f64) -> impl Iterator<Item = &ContourSegment> {
        self.segments.iter().filter(move |s| s.level == level)
    }

    /// Whether no segment was traced
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Marching squares over every cell of the grid for each level
///
/// Saddle cells are resolved with the average of the four corners.
pub fn trace_contours(grid: &HeadGrid, levels: &[f64]) -> Vec<ContourSegment> {
    parallel_map(levels, |&level| trace_level(grid, level))
        .into_iter()
        .flatten()
        .collect()
}

fn trace_level(grid: &HeadGrid, level: f64) -> Vec<ContourSegment> {
    let (ny, nx) = grid.head.dim();
    let mut segments = Vec::new();
    for j in 0..ny.saturating_sub(1) {
        for i in 0..nx.saturating_sub(1) {
            // Counter-clockwise from the south-west corner
            let corners = [
                ([grid.x[i], grid.y[j]], grid.head[[j, i]]),
                ([grid.x[i + 1], grid.y[j]], grid.head[[j, i + 1]]),
                ([grid.x[i + 1], grid.y[j + 1]], grid.head[[j + 1, i + 1]]),
                ([grid.x[i], grid.y[j + 1]], grid.head[[j + 1, i]]),
            ];
            if corners.iter().any(|(_, v)| !v.is_finite()) {
                continue;
            }

            let mut case = 0;
            for (bit, (_, v)) in corners.iter().enumerate() {
                if *v >= level {
                    case |= 1 << bit;
                }
            }

            // Edge k joins corner k and corner k + 1
            let mut crossings = Vec::with_capacity(4);
            for k in 0..4 {
                let (pa, a) = corners[k];
                let (pb, b) = corners[(k + 1) % 4];
                if (a >= level) != (b >= level) {
                    let t = (level - a) / (b - a);
                    crossings.push([pa[0] + t * (pb[0] - pa[0]), pa[1] + t * (pb[1] - pa[1])]);
                }
            }

            let mut push = |start: [f64; 2], end: [f64; 2]| {
                segments.push(ContourSegment { level, start, end });
            };
            match crossings.len() {
                2 => push(crossings[0], crossings[1]),
                4 => {
                    let center = corners.iter().map(|(_, v)| v).sum::<f64>() / 4.0;
                    // Cut off the two corners that are not joined through the centre
                    if (case == 0b0101) == (center >= level) {
                        push(crossings[0], crossings[1]);
                        push(crossings[2], crossings[3]);
                    } else {
                        push(crossings[3], crossings[0]);
                        push(crossings[1], crossings[2]);
                    }
                }
                _ => {}
            }
        }
    }
    segments
}
