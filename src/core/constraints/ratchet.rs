use crate::{
    core::body::Body,
    dynamics::solver::{bias_coef, inverse_or_zero},
};

use super::{JointSolver, SolveParams};

/// Like a socket wrench: the relative angle may move freely in the direction of
/// `ratchet` but is caught at every tooth when moving back.
#[derive(Debug, Clone, PartialEq)]
pub struct RatchetJoint {
    /// Relative angle of the last tooth passed.
    pub angle: f64,
    pub phase: f64,
    /// Angular distance between teeth. The sign selects the free direction.
    pub ratchet: f64,

    i_sum: f64,
    bias: f64,
    j_acc: f64,
    j_max: f64,
}

impl RatchetJoint {
    pub(crate) fn new(a: &Body, b: &Body, phase: f64, ratchet: f64) -> Self {
        Self {
            angle: b.angle() - a.angle(),
            phase,
            ratchet,
            i_sum: 0.0,
            bias: 0.0,
            j_acc: 0.0,
            j_max: 0.0,
        }
    }
}

impl JointSolver for RatchetJoint {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolveParams) {
        let delta = b.angle() - a.angle();
        let diff = self.angle - delta;

        let mut pdist = 0.0;
        if diff * self.ratchet > 0.0 {
            pdist = diff;
        } else {
            self.angle = ((delta - self.phase) / self.ratchet).floor() * self.ratchet + self.phase;
        }

        self.i_sum = inverse_or_zero(a.moment_inv() + b.moment_inv());
        self.bias = (-bias_coef(params.error_bias, dt) * pdist / dt).clamp(-params.max_bias, params.max_bias);
        self.j_max = params.j_max;

        if self.bias == 0.0 {
            self.j_acc = 0.0;
        }
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        let j = self.j_acc * dt_coef;
        a.w -= j * a.moment_inv();
        b.w += j * b.moment_inv();
    }

    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, _dt: f64) {
        if self.bias == 0.0 {
            return;
        }

        let wr = b.w - a.w;
        let ratchet = self.ratchet;

        let j = -(self.bias + wr) * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = ((j_old + j) * ratchet).clamp(0.0, self.j_max * ratchet.abs()) / ratchet;
        let j = self.j_acc - j_old;

        a.w -= j * a.moment_inv();
        b.w += j * b.moment_inv();
    }

    fn impulse(&self) -> f64 {
        self.j_acc.abs()
    }
}
