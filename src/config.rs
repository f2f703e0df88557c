//! Global configuration constants and the serializable space configuration.

use serde::{Deserialize, Serialize};

use crate::utils::math::Vect;

/// Number of solver iterations performed per step.
pub const DEFAULT_ITERATIONS: usize = 10;

/// Penetration depth that is tolerated without positional correction.
pub const DEFAULT_COLLISION_SLOP: f64 = 0.1;

/// Number of steps an arbiter is kept after its shapes stop touching.
pub const DEFAULT_COLLISION_PERSISTENCE: u32 = 3;

/// Fraction of velocity kept per second. 1.0 disables damping.
pub const DEFAULT_DAMPING: f64 = 1.0;

/// Cell size used when switching to a spatial hash without explicit parameters.
pub const DEFAULT_SPATIAL_HASH_DIM: f64 = 100.0;

/// Expected object count used to size the spatial hash table.
pub const DEFAULT_SPATIAL_HASH_COUNT: usize = 1000;

/// Distance beyond touching within which clipped polygon points are still reported.
/// These speculative contacts only stop the approach that would close the gap.
pub const CONTACT_MARGIN: f64 = 0.1;

/// Hard upper bound on contact points per arbiter.
pub const MAX_CONTACTS_PER_ARBITER: usize = 2;

/// Fraction of overlap left uncorrected after one second: 10% corrected every 1/60 s.
pub fn default_collision_bias() -> f64 {
    (1.0_f64 - 0.1).powf(60.0)
}

/// Same decay rate as [`default_collision_bias`], applied to joint error.
pub fn default_error_bias() -> f64 {
    default_collision_bias()
}

/// Broad-phase strategy used for the dynamic shape index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IndexStrategy {
    BBTree,
    SpatialHash { dim: f64, count: usize },
}

impl Default for IndexStrategy {
    fn default() -> Self {
        IndexStrategy::BBTree
    }
}

/// Global simulation parameters of a [`crate::Space`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    pub gravity: Vect,
    pub damping: f64,
    pub iterations: usize,
    pub collision_slop: f64,
    pub collision_bias: f64,
    pub collision_persistence: u32,
    /// Speed below which a body counts as idle. Zero derives it from gravity.
    pub idle_speed_threshold: f64,
    /// Idle time after which a group of bodies falls asleep. Infinity disables sleeping.
    pub sleep_time_threshold: f64,
    pub enable_contact_graph: bool,
    pub index: IndexStrategy,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            gravity: Vect::ZERO,
            damping: DEFAULT_DAMPING,
            iterations: DEFAULT_ITERATIONS,
            collision_slop: DEFAULT_COLLISION_SLOP,
            collision_bias: default_collision_bias(),
            collision_persistence: DEFAULT_COLLISION_PERSISTENCE,
            idle_speed_threshold: 0.0,
            sleep_time_threshold: f64::INFINITY,
            enable_contact_graph: false,
            index: IndexStrategy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn default_bias_corrects_ten_percent_per_frame() {
        let per_frame = default_collision_bias().powf(1.0 / 60.0);
        assert_relative_eq!(per_frame, 0.9, epsilon = 1e-12);
    }

    #[test]
    fn defaults_disable_sleeping() {
        let config = SpaceConfig::default();
        assert!(config.sleep_time_threshold.is_infinite());
        assert_eq!(config.iterations, DEFAULT_ITERATIONS);
        assert_eq!(config.index, IndexStrategy::BBTree);
    }
}
