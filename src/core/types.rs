use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::utils::math::Vect;

/// Layer bitmask. Two shapes can only collide if their masks share a bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layers(pub u32);

impl Layers {
    pub const ALL: Layers = Layers(u32::MAX);
    pub const NONE: Layers = Layers(0);

    pub fn intersects(self, other: Layers) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for Layers {
    fn default() -> Self {
        Self::ALL
    }
}

/// Shapes sharing a non-zero group never collide with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Group(pub u64);

impl Group {
    pub const NONE: Group = Group(0);

    pub fn shares(self, other: Group) -> bool {
        self.0 != 0 && self.0 == other.0
    }
}

/// User tag selecting which collision handler runs for a pair of shapes.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct CollisionType(pub u64);

/// Group and layer pair deciding whether two shapes are eligible to collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CollisionFilter {
    pub group: Group,
    pub layers: Layers,
}

impl CollisionFilter {
    pub const ALL: CollisionFilter = CollisionFilter {
        group: Group::NONE,
        layers: Layers::ALL,
    };

    pub fn new(group: Group, layers: Layers) -> Self {
        Self { group, layers }
    }

    /// True when the two filters forbid any interaction.
    pub fn rejects(&self, other: &CollisionFilter) -> bool {
        self.group.shares(other.group) || !self.layers.intersects(other.layers)
    }
}

/// Surface coefficients of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Restitution; 0 gives no bounce, 1 a perfect bounce.
    pub elasticity: f64,
    /// Coulomb friction coefficient.
    pub friction: f64,
    /// Tangential velocity of the surface, used for conveyor belts.
    pub surface_velocity: Vect,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            elasticity: 0.0,
            friction: 0.0,
            surface_velocity: Vect::ZERO,
        }
    }
}

impl Material {
    pub fn new(elasticity: f64, friction: f64) -> Self {
        Self {
            elasticity,
            friction,
            ..Self::default()
        }
    }

    pub fn rubber() -> Self {
        Self::new(0.8, 1.0)
    }

    pub fn steel() -> Self {
        Self::new(0.4, 0.45)
    }

    pub fn ice() -> Self {
        Self::new(0.05, 0.03)
    }

    /// Pair coefficients are the product of both shapes' coefficients.
    pub fn combine_pair(a: &Self, b: &Self) -> MaterialPair {
        MaterialPair {
            elasticity: a.elasticity * b.elasticity,
            friction: a.friction * b.friction,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialPair {
    pub elasticity: f64,
    pub friction: f64,
}

/// Process-unique identity of a [`crate::Space`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpaceId(u64);

impl SpaceId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_zero_never_shares() {
        assert!(!Group::NONE.shares(Group::NONE));
        assert!(Group(3).shares(Group(3)));
        assert!(!Group(3).shares(Group(4)));
    }

    #[test]
    fn filter_requires_common_layer_and_distinct_group() {
        let a = CollisionFilter::new(Group(1), Layers(0b01));
        let b = CollisionFilter::new(Group(2), Layers(0b11));
        let c = CollisionFilter::new(Group(1), Layers::ALL);
        let none = CollisionFilter::new(Group::NONE, Layers::NONE);

        assert!(!a.rejects(&b));
        assert!(a.rejects(&c), "same group");
        assert!(none.rejects(&CollisionFilter::ALL), "no layers");
    }

    #[test]
    fn pair_coefficients_multiply() {
        let pair = Material::combine_pair(&Material::rubber(), &Material::steel());
        assert!((pair.elasticity - 0.32).abs() < 1e-12);
        assert!((pair.friction - 0.45).abs() < 1e-12);
        assert_eq!(Material::rubber().surface_velocity, Vect::ZERO);
    }

    #[test]
    fn space_ids_are_unique() {
        assert_ne!(SpaceId::next(), SpaceId::next());
    }
}
