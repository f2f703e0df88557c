use crate::{
    core::body::Body,
    dynamics::solver::{apply_impulses, bias_coef, inverse_or_zero, k_scalar, normal_relative_velocity},
    utils::math::Vect,
};

use super::{JointSolver, SolveParams};

/// Keeps two anchor points at a fixed distance, like a massless rod.
#[derive(Debug, Clone, PartialEq)]
pub struct PinJoint {
    /// Anchor in the local frame of body A.
    pub anchr1: Vect,
    /// Anchor in the local frame of body B.
    pub anchr2: Vect,
    /// Distance the joint maintains, measured when the joint was created.
    pub dist: f64,

    r1: Vect,
    r2: Vect,
    n: Vect,
    n_mass: f64,
    jn_acc: f64,
    jn_max: f64,
    bias: f64,
}

impl PinJoint {
    pub(crate) fn new(a: &Body, b: &Body, anchr1: Vect, anchr2: Vect) -> Self {
        let p1 = a.local_to_world(anchr1);
        let p2 = b.local_to_world(anchr2);
        let dist = p1.distance(p2);
        if dist == 0.0 {
            log::warn!("Created a zero length pin joint; a pivot joint is more stable");
        }

        Self {
            anchr1,
            anchr2,
            dist,
            r1: Vect::ZERO,
            r2: Vect::ZERO,
            n: Vect::ZERO,
            n_mass: 0.0,
            jn_acc: 0.0,
            jn_max: 0.0,
            bias: 0.0,
        }
    }
}

impl JointSolver for PinJoint {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolveParams) {
        self.r1 = a.rotation().rotate(self.anchr1);
        self.r2 = b.rotation().rotate(self.anchr2);

        let delta = (b.p + self.r2) - (a.p + self.r1);
        let dist = delta.length();
        self.n = if dist > 0.0 { delta / dist } else { Vect::ZERO };

        self.n_mass = inverse_or_zero(k_scalar(a, b, self.r1, self.r2, self.n));

        let max_bias = params.max_bias;
        self.bias = (-bias_coef(params.error_bias, dt) * (dist - self.dist) / dt).clamp(-max_bias, max_bias);
        self.jn_max = params.j_max;
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        let j = self.n * (self.jn_acc * dt_coef);
        apply_impulses(a, b, self.r1, self.r2, j);
    }

    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, _dt: f64) {
        let vrn = normal_relative_velocity(a, b, self.r1, self.r2, self.n);

        let jn = (self.bias - vrn) * self.n_mass;
        let jn_old = self.jn_acc;
        self.jn_acc = (jn_old + jn).clamp(-self.jn_max, self.jn_max);

        apply_impulses(a, b, self.r1, self.r2, self.n * (self.jn_acc - jn_old));
    }

    fn impulse(&self) -> f64 {
        self.jn_acc.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        tests::{registered, solve},
        Constraint, ConstraintKind,
    };
    use crate::{core::body::Body, utils::math::Vect};
    use approx::assert_relative_eq;

    #[test]
    fn pin_distance_is_measured_from_anchors() {
        let a = registered(Body::new(1.0, 1.0), 0);
        let mut b = registered(Body::new(1.0, 1.0), 1);
        b.p = Vect::new(4.0, 3.0);

        let joint = Constraint::pin(&a, &b, Vect::ZERO, Vect::ZERO);
        let ConstraintKind::Pin(pin) = joint.kind() else {
            panic!("expected a pin joint");
        };
        assert_relative_eq!(pin.dist, 5.0);
    }

    #[test]
    fn separating_bodies_are_held_at_distance() {
        let mut a = registered(Body::new(1.0, 1.0), 0);
        let mut b = registered(Body::new(1.0, 1.0), 1);
        b.p = Vect::new(2.0, 0.0);
        let mut joint = Constraint::pin(&a, &b, Vect::ZERO, Vect::ZERO);

        a.v = Vect::new(-1.0, 0.0);
        b.v = Vect::new(1.0, 0.0);
        solve(&mut joint, &mut a, &mut b, 30);

        assert_relative_eq!(a.p.distance(b.p), 2.0, epsilon = 0.05);
        assert_relative_eq!(b.v.x - a.v.x, 0.0, epsilon = 0.05);
    }
}
