//! Aquifer properties and the aquifer registry
//!
//! A model has one background aquifer that extends to infinity and any number
//! of polygonal inhomogeneities with their own properties. Elements are stored
//! in the model's arena; aquifers only keep [`ElementId`] indices of the
//! elements located inside them.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::element::ElementId;
use crate::error::{AemError, Result};

/// Index of an aquifer in an [`AquiferSystem`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AquiferId(pub(crate) usize);

impl AquiferId {
    /// The background aquifer of every system
    pub const BACKGROUND: AquiferId = AquiferId(0);

    /// Position in the registry
    pub fn index(self) -> usize {
        self.0
    }
}

/// Type of the uppermost layer of an aquifer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayerType {
    /// Aquifer layer on top (unconfined or confined, "a")
    #[default]
    #[serde(rename = "a")]
    Aquifer,
    /// Leaky layer on top, the aquifer is semi-confined ("l")
    #[serde(rename = "l")]
    Leaky,
}

/// Physical properties of one aquifer region
#[derive(Debug, Clone)]
pub struct AquiferData {
    pub(crate) id: AquiferId,
    /// Hydraulic conductivity per layer
    pub k: Array1<f64>,
    /// Bottom elevation per layer
    pub zb: Array1<f64>,
    /// Top elevation per layer
    pub zt: Array1<f64>,
    /// Transmissivity per layer, `k * (zt - zb)`
    pub t: Array1<f64>,
    /// Type of the top layer
    pub ltype: LayerType,
    region: Option<Vec<[f64; 2]>>,
    elements: Vec<ElementId>,
    constant_star: Option<ElementId>,
}

impl AquiferData {
    /// Create aquifer data from per-layer conductivity and elevations
    ///
    /// All slices must have the same, non-zero length; every layer needs a
    /// positive conductivity and `zt > zb`.
    pub fn new(k: &[f64], zb: &[f64], zt: &[f64]) -> Result<Self> {
        let naq = k.len();
        if naq == 0 {
            return Err(AemError::InvalidParameters(
                "aquifer needs at least one layer".to_string(),
            ));
        }
        if zb.len() != naq || zt.len() != naq {
            return Err(AemError::InvalidParameters(format!(
                "layer arrays differ in length: k={}, zb={}, zt={}",
                naq,
                zb.len(),
                zt.len()
            )));
        }
        for i in 0..naq {
            if !(k[i].is_finite() && k[i] > 0.0) {
                return Err(AemError::InvalidParameters(format!(
                    "conductivity of layer {} must be positive, got {}",
                    i, k[i]
                )));
            }
            if zt[i].is_nan() || zb[i].is_nan() || zt[i] <= zb[i] {
                return Err(AemError::InvalidParameters(format!(
                    "top of layer {} ({}) must lie above its bottom ({})",
                    i, zt[i], zb[i]
                )));
            }
        }

        let k = Array1::from_vec(k.to_vec());
        let zb = Array1::from_vec(zb.to_vec());
        let zt = Array1::from_vec(zt.to_vec());
        let t = &k * &(&zt - &zb);

        Ok(Self {
            id: AquiferId::BACKGROUND,
            k,
            zb,
            zt,
            t,
            ltype: LayerType::Aquifer,
            region: None,
            elements: Vec::new(),
            constant_star: None,
        })
    }

    /// Set the type of the top layer
    pub fn with_layer_type(mut self, ltype: LayerType) -> Self {
        self.ltype = ltype;
        self
    }

    /// Identity of this aquifer in its registry
    pub fn id(&self) -> AquiferId {
        self.id
    }

    /// Number of layers
    pub fn naq(&self) -> usize {
        self.k.len()
    }

    /// Register an element located in this aquifer
    pub fn add_element(&mut self, element: ElementId) {
        self.elements.push(element);
    }

    /// Elements registered with this aquifer, in registration order
    pub fn elements(&self) -> &[ElementId] {
        &self.elements
    }

    /// The `ConstantStar` carrying this aquifer's particular solution
    pub fn constant_star(&self) -> Option<ElementId> {
        self.constant_star
    }

    pub(crate) fn set_constant_star(&mut self, element: ElementId) {
        self.constant_star = Some(element);
    }

    /// Boundary polygon of an inhomogeneity, `None` for the background
    pub fn region(&self) -> Option<&[[f64; 2]]> {
        self.region.as_deref()
    }

    /// Whether the point lies inside this aquifer's region
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self.region() {
            Some(polygon) => point_in_polygon(x, y, polygon),
            None => true,
        }
    }
}

/// Registry of the background aquifer and its inhomogeneities
#[derive(Debug, Clone)]
pub struct AquiferSystem {
    aquifers: Vec<AquiferData>,
}

impl AquiferSystem {
    /// Create a system from its background aquifer
    pub fn new(mut background: AquiferData) -> Self {
        background.id = AquiferId::BACKGROUND;
        background.region = None;
        Self {
            aquifers: vec![background],
        }
    }

    /// Add a polygonal inhomogeneity
    ///
    /// Inhomogeneities must not overlap; where they do, the one added first
    /// owns the shared area.
    pub fn add_inhomogeneity(
        &mut self,
        mut data: AquiferData,
        boundary: Vec<[f64; 2]>,
    ) -> Result<AquiferId> {
        if boundary.len() < 3 {
            return Err(AemError::InvalidParameters(format!(
                "inhomogeneity boundary needs at least 3 vertices, got {}",
                boundary.len()
            )));
        }
        let id = AquiferId(self.aquifers.len());
        data.id = id;
        data.region = Some(boundary);
        self.aquifers.push(data);
        Ok(id)
    }

    /// Aquifer containing the point
    pub fn find_aquifer_data(&self, x: f64, y: f64) -> AquiferId {
        self.aquifers[1..]
            .iter()
            .find(|aq| aq.contains(x, y))
            .map_or(AquiferId::BACKGROUND, |aq| aq.id)
    }

    /// Look up an aquifer
    pub fn get(&self, id: AquiferId) -> Option<&AquiferData> {
        self.aquifers.get(id.0)
    }

    /// Look up an aquifer for modification
    pub fn get_mut(&mut self, id: AquiferId) -> Option<&mut AquiferData> {
        self.aquifers.get_mut(id.0)
    }

    /// Aquifer data at a point
    pub fn at(&self, x: f64, y: f64) -> &AquiferData {
        &self.aquifers[self.find_aquifer_data(x, y).0]
    }

    /// The background aquifer
    pub fn background(&self) -> &AquiferData {
        &self.aquifers[0]
    }

    /// Number of aquifers, background included
    pub fn len(&self) -> usize {
        self.aquifers.len()
    }

    /// Always false: a system has at least its background aquifer
    pub fn is_empty(&self) -> bool {
        self.aquifers.is_empty()
    }

    /// Iterate over all aquifers
    pub fn iter(&self) -> impl Iterator<Item = &AquiferData> {
        self.aquifers.iter()
    }
}

/// Even-odd ray casting test
fn point_in_polygon(x: f64, y: f64, polygon: &[[f64; 2]]) -> bool {
    let n = polygon.len();
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let [xi, yi] = polygon[i];
        let [xj, yj] = polygon[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}
