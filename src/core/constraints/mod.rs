//! Joints restricting the relative motion of two bodies.
//!
//! Every joint follows the same per-step protocol driven by the space:
//! `pre_step` once, `apply_cached_impulse` once for warm starting, then
//! `apply_impulse` once per solver iteration.

mod damped_rotary_spring;
mod damped_spring;
mod gear;
mod groove;
mod pin;
mod pivot;
mod ratchet;
mod rotary_limit;
mod simple_motor;
mod slide;

pub use damped_rotary_spring::{default_spring_torque, DampedRotarySpring, SpringTorqueFunc};
pub use damped_spring::{default_spring_force, DampedSpring, SpringForceFunc};
pub use gear::GearJoint;
pub use groove::GrooveJoint;
pub use pin::PinJoint;
pub use pivot::PivotJoint;
pub use ratchet::RatchetJoint;
pub use rotary_limit::RotaryLimitJoint;
pub use simple_motor::SimpleMotor;
pub use slide::SlideJoint;

use crate::{
    config::default_error_bias,
    core::{body::Body, types::SpaceId},
    utils::{
        allocator::{BodyId, ConstraintId},
        math::Vect,
    },
};

/// Limits shared by every joint for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SolveParams {
    /// Largest impulse the joint may apply this step (`max_force * dt`).
    pub j_max: f64,
    pub max_bias: f64,
    pub error_bias: f64,
}

/// Solver protocol implemented by every joint kind.
pub(crate) trait JointSolver {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolveParams);
    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64);
    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, dt: f64);
    fn impulse(&self) -> f64;
}

/// Joint-specific data.
#[derive(Debug, Clone)]
pub enum ConstraintKind {
    Pin(PinJoint),
    Slide(SlideJoint),
    Pivot(PivotJoint),
    Groove(GrooveJoint),
    Gear(GearJoint),
    Ratchet(RatchetJoint),
    RotaryLimit(RotaryLimitJoint),
    SimpleMotor(SimpleMotor),
    DampedSpring(DampedSpring),
    DampedRotarySpring(DampedRotarySpring),
}

impl ConstraintKind {
    fn solver(&self) -> &dyn JointSolver {
        match self {
            ConstraintKind::Pin(joint) => joint,
            ConstraintKind::Slide(joint) => joint,
            ConstraintKind::Pivot(joint) => joint,
            ConstraintKind::Groove(joint) => joint,
            ConstraintKind::Gear(joint) => joint,
            ConstraintKind::Ratchet(joint) => joint,
            ConstraintKind::RotaryLimit(joint) => joint,
            ConstraintKind::SimpleMotor(joint) => joint,
            ConstraintKind::DampedSpring(joint) => joint,
            ConstraintKind::DampedRotarySpring(joint) => joint,
        }
    }

    fn solver_mut(&mut self) -> &mut dyn JointSolver {
        match self {
            ConstraintKind::Pin(joint) => joint,
            ConstraintKind::Slide(joint) => joint,
            ConstraintKind::Pivot(joint) => joint,
            ConstraintKind::Groove(joint) => joint,
            ConstraintKind::Gear(joint) => joint,
            ConstraintKind::Ratchet(joint) => joint,
            ConstraintKind::RotaryLimit(joint) => joint,
            ConstraintKind::SimpleMotor(joint) => joint,
            ConstraintKind::DampedSpring(joint) => joint,
            ConstraintKind::DampedRotarySpring(joint) => joint,
        }
    }
}

/// A joint between two bodies registered with the same space.
///
/// Constructors read the bodies' current state (ids, and positions or angles for
/// joints that capture an initial configuration), so both bodies must already be
/// registered with a space, either simulated or rogue.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub(crate) id: Option<ConstraintId>,
    pub(crate) space: Option<SpaceId>,

    a: BodyId,
    b: BodyId,

    max_force: f64,
    max_bias: f64,
    error_bias: f64,

    kind: ConstraintKind,
}

fn registered_id(body: &Body) -> BodyId {
    match body.id() {
        Some(id) => id,
        None => panic!("Joint bodies must be registered with a space before creating the joint"),
    }
}

impl Constraint {
    fn new(a: &Body, b: &Body, kind: ConstraintKind) -> Self {
        Self {
            id: None,
            space: None,
            a: registered_id(a),
            b: registered_id(b),
            max_force: f64::INFINITY,
            max_bias: f64::INFINITY,
            error_bias: default_error_bias(),
            kind,
        }
    }

    /// Keeps the anchors at their current distance.
    pub fn pin(a: &Body, b: &Body, anchr1: Vect, anchr2: Vect) -> Self {
        Self::new(a, b, ConstraintKind::Pin(PinJoint::new(a, b, anchr1, anchr2)))
    }

    /// Keeps the anchor distance within `[min, max]`.
    pub fn slide(a: &Body, b: &Body, anchr1: Vect, anchr2: Vect, min: f64, max: f64) -> Self {
        Self::new(
            a,
            b,
            ConstraintKind::Slide(SlideJoint::new(anchr1, anchr2, min, max)),
        )
    }

    /// Pins both bodies together at the world-space point `pivot`.
    pub fn pivot(a: &Body, b: &Body, pivot: Vect) -> Self {
        let anchr1 = a.world_to_local(pivot);
        let anchr2 = b.world_to_local(pivot);
        Self::pivot_with_anchors(a, b, anchr1, anchr2)
    }

    /// Pins local anchor `anchr1` on `a` to local anchor `anchr2` on `b`.
    pub fn pivot_with_anchors(a: &Body, b: &Body, anchr1: Vect, anchr2: Vect) -> Self {
        Self::new(a, b, ConstraintKind::Pivot(PivotJoint::new(anchr1, anchr2)))
    }

    /// Constrains `anchr2` on `b` to slide along the groove `groove_a`-`groove_b` on `a`.
    pub fn groove(
        a: &Body,
        b: &Body,
        groove_a: Vect,
        groove_b: Vect,
        anchr2: Vect,
    ) -> Self {
        Self::new(
            a,
            b,
            ConstraintKind::Groove(GrooveJoint::new(groove_a, groove_b, anchr2)),
        )
    }

    /// Keeps `angle_b - ratio * angle_a` equal to `phase`.
    pub fn gear(a: &Body, b: &Body, phase: f64, ratio: f64) -> Self {
        Self::new(a, b, ConstraintKind::Gear(GearJoint::new(phase, ratio)))
    }

    /// Lets the relative angle advance freely in one direction, ticking at every `ratchet` radians.
    pub fn ratchet(a: &Body, b: &Body, phase: f64, ratchet: f64) -> Self {
        Self::new(
            a,
            b,
            ConstraintKind::Ratchet(RatchetJoint::new(a, b, phase, ratchet)),
        )
    }

    /// Keeps `angle_b - angle_a` within `[min, max]`.
    pub fn rotary_limit(a: &Body, b: &Body, min: f64, max: f64) -> Self {
        Self::new(
            a,
            b,
            ConstraintKind::RotaryLimit(RotaryLimitJoint::new(min, max)),
        )
    }

    /// Drives `w_b - w_a` toward `rate`.
    pub fn simple_motor(a: &Body, b: &Body, rate: f64) -> Self {
        Self::new(a, b, ConstraintKind::SimpleMotor(SimpleMotor::new(rate)))
    }

    pub fn damped_spring(
        a: &Body,
        b: &Body,
        anchr1: Vect,
        anchr2: Vect,
        rest_length: f64,
        stiffness: f64,
        damping: f64,
    ) -> Self {
        Self::new(
            a,
            b,
            ConstraintKind::DampedSpring(DampedSpring::new(
                anchr1,
                anchr2,
                rest_length,
                stiffness,
                damping,
            )),
        )
    }

    pub fn damped_rotary_spring(a: &Body, b: &Body, rest_angle: f64, stiffness: f64, damping: f64) -> Self {
        Self::new(
            a,
            b,
            ConstraintKind::DampedRotarySpring(DampedRotarySpring::new(rest_angle, stiffness, damping)),
        )
    }

    pub fn id(&self) -> Option<ConstraintId> {
        self.id
    }

    pub fn space(&self) -> Option<SpaceId> {
        self.space
    }

    pub fn a(&self) -> BodyId {
        self.a
    }

    pub fn b(&self) -> BodyId {
        self.b
    }

    pub fn kind(&self) -> &ConstraintKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ConstraintKind {
        &mut self.kind
    }

    /// Largest force the joint may apply. Defaults to infinity.
    pub fn max_force(&self) -> f64 {
        self.max_force
    }

    pub fn set_max_force(&mut self, max_force: f64) {
        self.max_force = max_force;
    }

    /// Largest speed at which joint error is corrected. Defaults to infinity.
    pub fn max_bias(&self) -> f64 {
        self.max_bias
    }

    pub fn set_max_bias(&mut self, max_bias: f64) {
        self.max_bias = max_bias;
    }

    /// Fraction of joint error left uncorrected after one second.
    pub fn error_bias(&self) -> f64 {
        self.error_bias
    }

    pub fn set_error_bias(&mut self, error_bias: f64) {
        self.error_bias = error_bias;
    }

    /// Magnitude of the impulse applied during the last step.
    pub fn impulse(&self) -> f64 {
        self.kind.solver().impulse()
    }

    pub(crate) fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64) {
        let params = SolveParams {
            j_max: self.max_force * dt,
            max_bias: self.max_bias,
            error_bias: self.error_bias,
        };
        self.kind.solver_mut().pre_step(a, b, dt, &params);
    }

    pub(crate) fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        self.kind.solver_mut().apply_cached_impulse(a, b, dt_coef);
    }

    pub(crate) fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, dt: f64) {
        self.kind.solver_mut().apply_impulse(a, b, dt);
    }

    pub(crate) fn other_body(&self, body: BodyId) -> BodyId {
        if self.a == body {
            self.b
        } else {
            self.a
        }
    }
}
