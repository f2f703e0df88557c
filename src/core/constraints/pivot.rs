use glam::DMat2;

use crate::{
    core::body::Body,
    dynamics::solver::{apply_impulses, bias_coef, k_tensor, relative_velocity},
    utils::math::Vect,
};

use super::{JointSolver, SolveParams};

/// Holds an anchor on each body at the same world position.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotJoint {
    pub anchr1: Vect,
    pub anchr2: Vect,

    r1: Vect,
    r2: Vect,
    k: DMat2,
    j_acc: Vect,
    j_max_len: f64,
    bias: Vect,
}

impl PivotJoint {
    pub(crate) fn new(anchr1: Vect, anchr2: Vect) -> Self {
        Self {
            anchr1,
            anchr2,
            r1: Vect::ZERO,
            r2: Vect::ZERO,
            k: DMat2::ZERO,
            j_acc: Vect::ZERO,
            j_max_len: 0.0,
            bias: Vect::ZERO,
        }
    }
}

impl JointSolver for PivotJoint {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolveParams) {
        self.r1 = a.rotation().rotate(self.anchr1);
        self.r2 = b.rotation().rotate(self.anchr2);

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
        self.j_acc = (self.j_acc + j).clamp_length_max(self.j_max_len);

        apply_impulses(a, b, self.r1, self.r2, self.j_acc - j_old);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.length()
    }
}
