//! Persistent contact state between a pair of shapes.

use crate::utils::{
    allocator::{BodyId, ShapeId},
    math::Vect,
};

/// Single contact point produced by the narrowphase and refined by the solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// World-space contact point.
    pub p: Vect,
    /// Unit normal pointing from the first shape to the second.
    pub n: Vect,
    /// Penetration depth, positive when overlapping.
    pub depth: f64,
    /// Feature identifier used to match contacts across steps.
    pub hash: u64,

    pub(crate) r1: Vect,
    pub(crate) r2: Vect,
    pub(crate) n_mass: f64,
    pub(crate) t_mass: f64,
    pub(crate) bounce: f64,

    pub(crate) jn_acc: f64,
    pub(crate) jt_acc: f64,
    pub(crate) j_bias: f64,
    pub(crate) bias: f64,
}

impl Contact {
    pub fn new(p: Vect, n: Vect, depth: f64, hash: u64) -> Self {
        Self {
            p,
            n,
            depth,
            hash,
            r1: Vect::ZERO,
            r2: Vect::ZERO,
            n_mass: 0.0,
            t_mass: 0.0,
            bounce: 0.0,
            jn_acc: 0.0,
            jt_acc: 0.0,
            j_bias: 0.0,
            bias: 0.0,
        }
    }
}

/// Unordered pair of shapes, the key of the contact cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapePair(ShapeId, ShapeId);

impl ShapePair {
    pub fn new(a: ShapeId, b: ShapeId) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn contains(&self, shape: ShapeId) -> bool {
        self.0 == shape || self.1 == shape
    }

    pub fn first(&self) -> ShapeId {
        self.0
    }

    pub fn second(&self) -> ShapeId {
        self.1
    }
}

/// Contact information exposed to callbacks and shape queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    pub point: Vect,
    pub normal: Vect,
    pub depth: f64,
}

/// Snapshot of an arbiter's contacts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPointSet {
    pub points: Vec<ContactPoint>,
}

impl ContactPointSet {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Lifecycle of a cached arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbiterState {
    /// Shapes started touching this step.
    FirstCollision,
    /// Shapes were touching on the previous step as well.
    Normal,
    /// A handler rejected the pair; it stays rejected until the shapes separate.
    Ignore,
    /// Shapes are no longer touching but the arbiter is kept for persistence.
    Cached,
    /// Both bodies are asleep; contacts are retained for waking.
    Sleeping,
}

/// Collision state between two shapes, kept alive for as long as they touch.
///
/// Shapes and bodies are stored in the order of the collision handler that
/// processes the pair, so a handler registered for `(a, b)` always sees a shape
/// of type `a` first. Contact normals point from the first shape to the second.
#[derive(Debug, Clone)]
pub struct Arbiter {
    pub(crate) shape_a: ShapeId,
    pub(crate) shape_b: ShapeId,
    pub(crate) body_a: BodyId,
    pub(crate) body_b: BodyId,

    pub(crate) contacts: Vec<Contact>,

    /// Combined elasticity; may be overridden from a begin or pre-solve handler.
    pub e: f64,
    /// Combined friction coefficient.
    pub u: f64,
    /// Relative surface velocity used for conveyor-belt style friction.
    pub surface_vr: Vect,

    pub(crate) stamp: u64,
    pub(crate) state: ArbiterState,
}

impl Arbiter {
    pub(crate) fn new(shape_a: ShapeId, body_a: BodyId, shape_b: ShapeId, body_b: BodyId) -> Self {
        Self {
            shape_a,
            shape_b,
            body_a,
            body_b,
            contacts: Vec::new(),
            e: 0.0,
            u: 0.0,
            surface_vr: Vect::ZERO,
            stamp: 0,
            state: ArbiterState::FirstCollision,
        }
    }

    /// Replaces the contacts with a fresh narrowphase result, carrying accumulated
    /// impulses over to contacts with a matching feature hash.
    pub(crate) fn update(&mut self, mut contacts: Vec<Contact>, pair: &ArbiterPairInfo) {
        for new in contacts.iter_mut() {
            if let Some(old) = self.contacts.iter().find(|old| old.hash == new.hash) {
                new.jn_acc = old.jn_acc;
                new.jt_acc = old.jt_acc;
            }
        }
        self.contacts = contacts;

        self.shape_a = pair.shape_a;
        self.shape_b = pair.shape_b;
        self.body_a = pair.body_a;
        self.body_b = pair.body_b;

        self.e = pair.elasticity;
        self.u = pair.friction;
        self.surface_vr = pair.surface_vr;

        if self.state == ArbiterState::Cached {
            self.state = ArbiterState::FirstCollision;
        }
    }

    pub(crate) fn contacts_mut(&mut self) -> &mut [Contact] {
        &mut self.contacts
    }

    pub fn state(&self) -> ArbiterState {
        self.state
    }

    pub fn count(&self) -> usize {
        self.contacts.len()
    }

    /// Contact normal `i`, pointing from the first shape to the second.
    pub fn normal(&self, i: usize) -> Vect {
        self.contacts[i].n
    }

    pub fn point(&self, i: usize) -> Vect {
        self.contacts[i].p
    }

    pub fn depth(&self, i: usize) -> f64 {
        self.contacts[i].depth
    }

    pub fn contact_point_set(&self) -> ContactPointSet {
        ContactPointSet {
            points: self
                .contacts
                .iter()
                .map(|c| ContactPoint {
                    point: c.p,
                    normal: c.n,
                    depth: c.depth,
                })
                .collect(),
        }
    }

    pub fn shapes(&self) -> (ShapeId, ShapeId) {
        (self.shape_a, self.shape_b)
    }

    pub fn bodies(&self) -> (BodyId, BodyId) {
        (self.body_a, self.body_b)
    }

    pub fn elasticity(&self) -> f64 {
        self.e
    }

    pub fn set_elasticity(&mut self, elasticity: f64) {
        self.e = elasticity;
    }

    pub fn friction(&self) -> f64 {
        self.u
    }

    pub fn set_friction(&mut self, friction: f64) {
        self.u = friction;
    }

    pub fn surface_velocity(&self) -> Vect {
        self.surface_vr
    }

    pub fn set_surface_velocity(&mut self, surface_vr: Vect) {
        self.surface_vr = surface_vr;
    }

    /// Rejects the pair until the shapes stop touching. Meant for begin and pre-solve handlers.
    pub fn ignore(&mut self) {
        self.state = ArbiterState::Ignore;
    }

    pub fn is_first_contact(&self) -> bool {
        self.state == ArbiterState::FirstCollision
    }

    /// Normal impulse applied to the first body during the last step.
    pub fn total_impulse(&self) -> Vect {
        -self.contacts.iter().map(|c| c.n * c.jn_acc).sum::<Vect>()
    }

    /// Normal plus friction impulse applied to the first body during the last step.
    pub fn total_impulse_with_friction(&self) -> Vect {
        -self
            .contacts
            .iter()
            .map(|c| c.n.rotate(Vect::new(c.jn_acc, c.jt_acc)))
            .sum::<Vect>()
    }

    /// Estimate of the kinetic energy lost to the collision during the last step.
    pub fn total_ke(&self) -> f64 {
        let e_coef = (1.0 - self.e) / (1.0 + self.e);
        self.contacts
            .iter()
            .map(|c| {
                let normal = if c.n_mass > 0.0 {
                    e_coef * c.jn_acc * c.jn_acc / c.n_mass
                } else {
                    0.0
                };
                let tangent = if c.t_mass > 0.0 {
                    c.jt_acc * c.jt_acc / c.t_mass
                } else {
                    0.0
                };
                normal + tangent
            })
            .sum()
    }

    pub(crate) fn other_body(&self, body: BodyId) -> BodyId {
        if self.body_a == body {
            self.body_b
        } else {
            self.body_a
        }
    }
}

/// Everything the space knows about a pair before calling the narrowphase.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ArbiterPairInfo {
    pub shape_a: ShapeId,
    pub shape_b: ShapeId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub elasticity: f64,
    pub friction: f64,
    pub surface_vr: Vect,
}
