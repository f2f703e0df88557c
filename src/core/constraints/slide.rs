use crate::{
    core::body::Body,
    dynamics::solver::{apply_impulses, bias_coef, inverse_or_zero, k_scalar, relative_velocity},
    utils::math::Vect,
};

use super::{JointSolver, SolveParams};

/// Keeps the anchor distance within `[min, max]`, like a chain.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideJoint {
    pub anchr1: Vect,
    pub anchr2: Vect,
    pub min: f64,
    pub max: f64,

    r1: Vect,
    r2: Vect,
    n: Vect,
    n_mass: f64,
    jn_acc: f64,
    jn_max: f64,
    bias: f64,
}

impl SlideJoint {
    pub(crate) fn new(anchr1: Vect, anchr2: Vect, min: f64, max: f64) -> Self {
        Self {
            anchr1,
            anchr2,
            min,
            max,
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

impl JointSolver for SlideJoint {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolveParams) {
        self.r1 = a.rotation().rotate(self.anchr1);
        self.r2 = b.rotation().rotate(self.anchr2);

        let delta = (b.p + self.r2) - (a.p + self.r1);
        let dist = delta.length();
        let mut pdist = 0.0;
        if dist > self.max {
            pdist = dist - self.max;
            self.n = delta.normalize_or_zero();
        } else if dist < self.min {
            pdist = self.min - dist;
            self.n = -delta.normalize_or_zero();
        } else {
            self.n = Vect::ZERO;
            self.jn_acc = 0.0;
        }

        self.n_mass = inverse_or_zero(k_scalar(a, b, self.r1, self.r2, self.n));

        let max_bias = params.max_bias;
        self.bias = (-bias_coef(params.error_bias, dt) * pdist / dt).clamp(-max_bias, max_bias);
        self.jn_max = params.j_max;
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        let j = self.n * (self.jn_acc * dt_coef);
        apply_impulses(a, b, self.r1, self.r2, j);
    }

    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, _dt: f64) {
        // Within range.
        if self.n == Vect::ZERO {
            return;
        }

        let vrn = relative_velocity(a, b, self.r1, self.r2).dot(self.n);

        let jn = (self.bias - vrn) * self.n_mass;
        let jn_old = self.jn_acc;
        self.jn_acc = (jn_old + jn).clamp(-self.jn_max, 0.0);

        apply_impulses(a, b, self.r1, self.r2, self.n * (self.jn_acc - jn_old));
    }

    fn impulse(&self) -> f64 {
        self.jn_acc.abs()
    }
}
