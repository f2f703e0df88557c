use crate::{
    collision::arbiter::ShapePair,
    core::types::SpaceId,
    utils::{
        allocator::{BodyId, ConstraintId, ShapeId},
        math::{for_angle, Vect, VectExt},
    },
};

/// Velocity integration hook: `(body, gravity, damping, dt)`.
pub type VelocityFunc = fn(&mut Body, Vect, f64, f64);

/// Position integration hook: `(body, dt)`.
pub type PositionFunc = fn(&mut Body, f64);

/// Contact-graph bookkeeping used for sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ComponentNode {
    /// Set while the body belongs to a flood-filled component; retained only while asleep.
    pub root: Option<BodyId>,
    pub next: Option<BodyId>,
    pub idle_time: f64,
}

/// Rigid body state.
///
/// Bodies are created standalone and registered with a [`crate::Space`]. A body that is
/// registered but not simulated by a space is "rogue": its motion is driven by the caller.
/// Static bodies have infinite mass and moment and never move or sleep.
#[derive(Debug, Clone)]
pub struct Body {
    pub(crate) id: Option<BodyId>,
    pub(crate) space: Option<SpaceId>,

    mass: f64,
    mass_inv: f64,
    moment: f64,
    moment_inv: f64,

    /// Position of the center of gravity.
    pub p: Vect,
    pub v: Vect,
    /// Force accumulator. Not reset by the space.
    pub f: Vect,

    angle: f64,
    rot: Vect,
    pub w: f64,
    /// Torque accumulator. Not reset by the space.
    pub t: f64,

    pub(crate) v_bias: Vect,
    pub(crate) w_bias: f64,

    /// Maximum linear speed applied by the default velocity integrator.
    pub v_limit: f64,
    /// Maximum angular speed applied by the default velocity integrator.
    pub w_limit: f64,

    pub velocity_func: VelocityFunc,
    pub position_func: PositionFunc,

    is_static: bool,
    pub(crate) node: ComponentNode,

    pub(crate) shapes: Vec<ShapeId>,
    pub(crate) constraints: Vec<ConstraintId>,
    pub(crate) arbiters: Vec<ShapePair>,
}

impl Body {
    /// Creates a dynamic body. Either value may be infinite for bodies that should not
    /// translate or rotate.
    pub fn new(mass: f64, moment: f64) -> Self {
        let mut body = Self {
            id: None,
            space: None,
            mass: 0.0,
            mass_inv: 0.0,
            moment: 0.0,
            moment_inv: 0.0,
            p: Vect::ZERO,
            v: Vect::ZERO,
            f: Vect::ZERO,
            angle: 0.0,
            rot: Vect::X,
            w: 0.0,
            t: 0.0,
            v_bias: Vect::ZERO,
            w_bias: 0.0,
            v_limit: f64::INFINITY,
            w_limit: f64::INFINITY,
            velocity_func: Body::update_velocity,
            position_func: Body::update_position,
            is_static: false,
            node: ComponentNode::default(),
            shapes: Vec::new(),
            constraints: Vec::new(),
            arbiters: Vec::new(),
        };
        body.set_mass(mass);
        body.set_moment(moment);
        body
    }

    /// Creates a static body.
    pub fn new_static() -> Self {
        let mut body = Self::new(f64::INFINITY, f64::INFINITY);
        body.is_static = true;
        body.node.idle_time = f64::INFINITY;
        body
    }

    /// Creates an infinite-mass body meant to be moved by the caller.
    pub fn new_kinematic() -> Self {
        Self::new(f64::INFINITY, f64::INFINITY)
    }

    pub fn id(&self) -> Option<BodyId> {
        self.id
    }

    /// The space simulating this body, `None` while rogue.
    pub fn space(&self) -> Option<SpaceId> {
        self.space
    }

    pub fn is_rogue(&self) -> bool {
        self.space.is_none()
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn is_sleeping(&self) -> bool {
        self.node.root.is_some()
    }

    pub fn idle_time(&self) -> f64 {
        self.node.idle_time
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn mass_inv(&self) -> f64 {
        self.mass_inv
    }

    pub fn set_mass(&mut self, mass: f64) {
        assert!(mass > 0.0, "Mass must be positive and non-zero.");
        self.mass = mass;
        self.mass_inv = 1.0 / mass;
    }

    pub fn moment(&self) -> f64 {
        self.moment
    }

    pub fn moment_inv(&self) -> f64 {
        self.moment_inv
    }

    pub fn set_moment(&mut self, moment: f64) {
        assert!(moment > 0.0, "Moment of inertia must be positive and non-zero.");
        self.moment = moment;
        self.moment_inv = 1.0 / moment;
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    /// Sets the angle and keeps the rotation vector in sync.
    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
        self.rot = for_angle(angle);
    }

    /// Unit vector `(cos θ, sin θ)` of the current angle.
    pub fn rotation(&self) -> Vect {
        self.rot
    }

    pub fn kinetic_energy(&self) -> f64 {
        // Guard against 0 * inf for static and kinematic bodies.
        let vsq = self.v.length_squared();
        let wsq = self.w * self.w;
        (if vsq != 0.0 { vsq * self.mass } else { 0.0 })
            + (if wsq != 0.0 { wsq * self.moment } else { 0.0 })
    }

    pub fn local_to_world(&self, v: Vect) -> Vect {
        self.p + self.rot.rotate(v)
    }

    pub fn world_to_local(&self, v: Vect) -> Vect {
        (v - self.p).unrotate(self.rot)
    }

    /// Adds `force` at world-space offset `r` from the center of gravity.
    pub fn apply_force(&mut self, force: Vect, r: Vect) {
        self.f += force;
        self.t += r.cross(force);
    }

    /// Applies impulse `j` at world-space offset `r` from the center of gravity.
    pub fn apply_impulse(&mut self, j: Vect, r: Vect) {
        self.v += j * self.mass_inv;
        self.w += self.moment_inv * r.cross(j);
    }

    pub(crate) fn apply_bias_impulse(&mut self, j: Vect, r: Vect) {
        self.v_bias += j * self.mass_inv;
        self.w_bias += self.moment_inv * r.cross(j);
    }

    pub fn reset_forces(&mut self) {
        self.f = Vect::ZERO;
        self.t = 0.0;
    }

    pub fn velocity_at_world_point(&self, point: Vect) -> Vect {
        let r = point - self.p;
        self.v + r.perp() * self.w
    }

    pub fn velocity_at_local_point(&self, point: Vect) -> Vect {
        let r = self.rot.rotate(point);
        self.v + r.perp() * self.w
    }

    /// Default velocity integrator.
    pub fn update_velocity(body: &mut Body, gravity: Vect, damping: f64, dt: f64) {
        body.v = (body.v * damping + (gravity + body.f * body.mass_inv) * dt)
            .clamp_length_max(body.v_limit);

        let w_limit = body.w_limit;
        body.w = (body.w * damping + body.t * body.moment_inv * dt).clamp(-w_limit, w_limit);

        body.sanity_check();
    }

    /// Default position integrator. Consumes the bias velocities.
    pub fn update_position(body: &mut Body, dt: f64) {
        body.p += (body.v + body.v_bias) * dt;
        body.set_angle(body.angle + (body.w + body.w_bias) * dt);

        body.v_bias = Vect::ZERO;
        body.w_bias = 0.0;

        body.sanity_check();
    }

    pub(crate) fn set_static(&mut self, is_static: bool) {
        self.is_static = is_static;
        self.node.idle_time = if is_static { f64::INFINITY } else { 0.0 };
    }

    fn sanity_check(&self) {
        debug_assert!(
            self.p.is_finite() && self.v.is_finite() && self.angle.is_finite() && self.w.is_finite(),
            "Body's state is not finite: p={:?} v={:?} angle={} w={}",
            self.p,
            self.v,
            self.angle,
            self.w
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn velocity_update_follows_damped_rule() {
        let mut body = Body::new(2.0, 1.0);
        body.v = Vect::new(4.0, 0.0);
        body.w = 2.0;
        body.f = Vect::new(0.0, 2.0);
        body.t = 3.0;

        Body::update_velocity(&mut body, Vect::new(0.0, -10.0), 0.5, 0.1);
        assert_relative_eq!(body.v.x, 2.0);
        assert_relative_eq!(body.v.y, (-10.0 + 1.0) * 0.1);
        assert_relative_eq!(body.w, 1.0 + 0.3);
    }

    #[test]
    fn position_update_consumes_bias() {
        let mut body = Body::new(1.0, 1.0);
        body.v = Vect::new(1.0, 0.0);
        body.v_bias = Vect::new(0.0, 1.0);
        body.w = FRAC_PI_2;
        Body::update_position(&mut body, 1.0);

        assert_relative_eq!(body.p.x, 1.0);
        assert_relative_eq!(body.p.y, 1.0);
        assert_relative_eq!(body.angle(), FRAC_PI_2);
        assert_relative_eq!(body.rotation().y, 1.0);
        assert_eq!(body.v_bias, Vect::ZERO);
    }

    #[test]
    fn velocity_limits_clamp() {
        let mut body = Body::new(1.0, 1.0);
        body.v_limit = 1.0;
        body.w_limit = 0.5;
        body.v = Vect::new(10.0, 0.0);
        body.w = -4.0;
        Body::update_velocity(&mut body, Vect::ZERO, 1.0, 0.1);
        assert_relative_eq!(body.v.length(), 1.0);
        assert_relative_eq!(body.w, -0.5);
    }

    #[test]
    fn impulses_and_point_velocities() {
        let mut body = Body::new(1.0, 2.0);
        body.apply_impulse(Vect::new(0.0, 2.0), Vect::new(1.0, 0.0));
        assert_relative_eq!(body.v.y, 2.0);
        assert_relative_eq!(body.w, 1.0);

        let at = body.velocity_at_world_point(body.p + Vect::new(1.0, 0.0));
        assert_relative_eq!(at.y, 3.0);
        assert_relative_eq!(body.velocity_at_local_point(Vect::new(1.0, 0.0)).y, 3.0);
    }

    #[test]
    fn local_world_round_trip() {
        let mut body = Body::new(1.0, 1.0);
        body.p = Vect::new(3.0, 4.0);
        body.set_angle(FRAC_PI_2);
        let world = body.local_to_world(Vect::new(1.0, 0.0));
        assert_relative_eq!(world.x, 3.0, epsilon = 1e-12);
        assert_relative_eq!(world.y, 5.0, epsilon = 1e-12);
        let local = body.world_to_local(world);
        assert_relative_eq!(local.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(local.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn static_bodies_have_no_kinetic_energy() {
        let body = Body::new_static();
        assert!(body.is_static());
        assert!(body.is_rogue());
        assert_eq!(body.kinetic_energy(), 0.0);
        assert_eq!(body.mass_inv(), 0.0);
    }

    #[test]
    fn forces_accumulate_torque() {
        let mut body = Body::new(1.0, 1.0);
        body.apply_force(Vect::new(0.0, 1.0), Vect::new(2.0, 0.0));
        assert_relative_eq!(body.t, 2.0);
        body.reset_forces();
        assert_eq!(body.f, Vect::ZERO);
        assert_eq!(body.t, 0.0);
    }
}
