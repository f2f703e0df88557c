use glam::DMat2;

use crate::{
    core::body::Body,
    dynamics::solver::{apply_impulses, bias_coef, k_tensor, relative_velocity},
    utils::math::{Vect, VectExt},
};

use super::{JointSolver, SolveParams};

/// Pins an anchor on body B to a line segment (the groove) on body A.
#[derive(Debug, Clone, PartialEq)]
pub struct GrooveJoint {
    groove_n: Vect,
    groove_a: Vect,
    groove_b: Vect,
    pub anchr2: Vect,

    groove_tn: Vect,
    clamp: f64,
    r1: Vect,
    r2: Vect,
    k: DMat2,
    j_acc: Vect,
    j_max_len: f64,
    bias: Vect,
}

impl GrooveJoint {
    pub(crate) fn new(groove_a: Vect, groove_b: Vect, anchr2: Vect) -> Self {
        Self {
            groove_n: (groove_b - groove_a).normalize_or_zero().perp(),
            groove_a,
            groove_b,
            anchr2,
            groove_tn: Vect::ZERO,
            clamp: 0.0,
            r1: Vect::ZERO,
            r2: Vect::ZERO,
            k: DMat2::ZERO,
            j_acc: Vect::ZERO,
            j_max_len: 0.0,
            bias: Vect::ZERO,
        }
    }

    pub fn groove_a(&self) -> Vect {
        self.groove_a
    }

    pub fn groove_b(&self) -> Vect {
        self.groove_b
    }

    pub fn set_groove(&mut self, groove_a: Vect, groove_b: Vect) {
        self.groove_a = groove_a;
        self.groove_b = groove_b;
        self.groove_n = (groove_b - groove_a).normalize_or_zero().perp();
    }

    /// Restricts an impulse to the groove normal unless the anchor sits at an end.
    fn constrain(&self, j: Vect) -> Vect {
        let n = self.groove_tn;
        let clamped = if self.clamp * j.cross(n) > 0.0 {
            j
        } else {
            j.project_onto(n)
        };
        clamped.clamp_length_max(self.j_max_len)
    }
}

impl JointSolver for GrooveJoint {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolveParams) {
        let ta = a.local_to_world(self.groove_a);
        let tb = a.local_to_world(self.groove_b);

        let n = a.rotation().rotate(self.groove_n);
        let d = ta.dot(n);

        self.groove_tn = n;
        self.r2 = b.rotation().rotate(self.anchr2);

        // Position of the anchor along the groove.
        let td = (b.p + self.r2).cross(n);
        if td <= ta.cross(n) {
            self.clamp = 1.0;
            self.r1 = ta - a.p;
        } else if td >= tb.cross(n) {
            self.clamp = -1.0;
            self.r1 = tb - a.p;
        } else {
            self.clamp = 0.0;
            self.r1 = (n.perp() * -td + n * d) - a.p;
        }

        self.k = k_tensor(a, b, self.r1, self.r2);
        self.j_max_len = params.j_max;

        let delta = (b.p + self.r2) - (a.p + self.r1);
        self.bias = (delta * (-bias_coef(params.error_bias, dt) / dt)).clamp_length_max(params.max_bias);
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        apply_impulses(a, b, self.r1, self.r2, self.j_acc * dt_coef);
    }

    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, _dt: f64) {
        let vr = relative_velocity(a, b, self.r1, self.r2);

        let j = self.k * (self.bias - vr);
        let j_old = self.j_acc;
        self.j_acc = self.constrain(j_old + j);

        apply_impulses(a, b, self.r1, self.r2, self.j_acc - j_old);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.length()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        tests::{registered, solve},
        Constraint,
    };
    use crate::{core::body::Body, utils::math::Vect};
    use approx::assert_relative_eq;

    fn groove_setup(b_pos: Vect, b_vel: Vect) -> (Constraint, Body, Body) {
        let a = registered(Body::new_static(), 0);
        let mut b = registered(Body::new(1.0, 1.0), 1);
        b.p = b_pos;
        b.v = b_vel;
        let joint = Constraint::groove(&a, &b, Vect::new(-2.0, 0.0), Vect::new(2.0, 0.0), Vect::ZERO);
        (joint, a, b)
    }

    #[test]
    fn anchor_slides_freely_along_the_groove() {
        let (mut joint, mut a, mut b) = groove_setup(Vect::ZERO, Vect::new(1.0, -1.0));
        solve(&mut joint, &mut a, &mut b, 30);
        assert_relative_eq!(b.v.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(b.p.y, 0.0, epsilon = 0.02);
    }

    #[test]
    fn groove_end_stops_the_anchor() {
        let (mut joint, mut a, mut b) = groove_setup(Vect::new(1.9, 0.0), Vect::new(3.0, 0.0));
        solve(&mut joint, &mut a, &mut b, 60);
        assert!(b.p.x < 2.1, "anchor ran past the groove end: {}", b.p.x);
    }
}
