//! Engine configuration.
//!
//! All fields have defaults, so a YAML document only needs to name the
//! options it changes:
//!
//! ```yaml
//! distance_penalty: 0.5
//! connectivity: eighteen
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GrowCutError, GrowCutResult};

/// Seed distance. Must stay well below any accumulated path cost for seeds to
/// keep their labels, and above zero so the heap warm-up sentinel sorts first.
pub const DEFAULT_EPSILON: f32 = 1e-3;

/// Geometry comparison tolerance as a fraction of the mean voxel spacing.
pub const DEFAULT_GEOMETRY_TOLERANCE: f64 = 0.01;

/// Voxel neighborhood used for propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// Face neighbors only.
    Six,
    /// Face and edge neighbors.
    Eighteen,
    /// Face, edge and corner neighbors.
    #[default]
    TwentySix,
}

impl Connectivity {
    pub fn neighbor_count(self) -> usize {
        match self {
            Connectivity::Six => 6,
            Connectivity::Eighteen => 18,
            Connectivity::TwentySix => 26,
        }
    }

    /// Whether offset `(dx, dy, dz)` with components in `-1..=1` belongs to
    /// this neighborhood.
    pub fn includes(self, offset: [i32; 3]) -> bool {
        let nonzero = offset.iter().filter(|&&c| c != 0).count();
        let max_nonzero = match self {
            Connectivity::Six => 1,
            Connectivity::Eighteen => 2,
            Connectivity::TwentySix => 3,
        };
        (1..=max_nonzero).contains(&nonzero)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowCutConfig {
    /// Spatial regularization: cost added per unit of physical step length.
    /// Zero means intensity-only cost.
    pub distance_penalty: f64,
    pub connectivity: Connectivity,
    pub epsilon: f32,
    pub geometry_tolerance: f64,
}

impl Default for GrowCutConfig {
    fn default() -> Self {
        Self {
            distance_penalty: 0.0,
            connectivity: Connectivity::default(),
            epsilon: DEFAULT_EPSILON,
            geometry_tolerance: DEFAULT_GEOMETRY_TOLERANCE,
        }
    }
}

impl GrowCutConfig {
    pub fn with_distance_penalty(mut self, distance_penalty: f64) -> Self {
        self.distance_penalty = distance_penalty;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = connectivity;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f32) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn from_yaml(text: &str) -> GrowCutResult<Self> {
        let config: Self = serde_yml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> GrowCutResult<()> {
        if !(self.distance_penalty.is_finite() && self.distance_penalty >= 0.0) {
            return Err(GrowCutError::InvalidConfig(format!(
                "distance_penalty must be finite and non-negative, got {}",
                self.distance_penalty
            )));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(GrowCutError::InvalidConfig(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }
        if !(self.geometry_tolerance.is_finite() && self.geometry_tolerance >= 0.0) {
            return Err(GrowCutError::InvalidConfig(format!(
                "geometry_tolerance must be finite and non-negative, got {}",
                self.geometry_tolerance
            )));
        }
        Ok(())
    }

    /// Whether distances computed under `other` are comparable with distances
    /// computed under `self`.
    pub(crate) fn same_cost_model(&self, other: &GrowCutConfig) -> bool {
        self.distance_penalty == other.distance_penalty
            && self.connectivity == other.connectivity
            && self.epsilon == other.epsilon
    }
}
