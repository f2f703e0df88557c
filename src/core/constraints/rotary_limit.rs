use crate::{
    core::body::Body,
    dynamics::solver::{bias_coef, inverse_or_zero},
};

use super::{JointSolver, SolveParams};

/// Keeps the relative angle `angle_b - angle_a` within `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RotaryLimitJoint {
    pub min: f64,
    pub max: f64,

    i_sum: f64,
    bias: f64,
    j_acc: f64,
    j_max: f64,
}

impl RotaryLimitJoint {
    pub(crate) fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            i_sum: 0.0,
            bias: 0.0,
            j_acc: 0.0,
            j_max: 0.0,
        }
    }
}

impl JointSolver for RotaryLimitJoint {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolveParams) {
        let dist = b.angle() - a.angle();
        let pdist = if dist > self.max {
            self.max - dist
        } else if dist < self.min {
            self.min - dist
        } else {
            0.0
        };

        self.i_sum = inverse_or_zero(a.moment_inv() + b.moment_inv());
        self.bias = (-bias_coef(params.error_bias, dt) * pdist / dt).clamp(-params.max_bias, params.max_bias);
        self.j_max = params.j_max;

        // Inside the limits: nothing to push against, drop the warm start.
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

        let j = -(self.bias + wr) * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = if self.bias < 0.0 {
            (j_old + j).clamp(0.0, self.j_max)
        } else {
            (j_old + j).clamp(-self.j_max, 0.0)
        };
        let j = self.j_acc - j_old;

        a.w -= j * a.moment_inv();
        b.w += j * b.moment_inv();
    }

    fn impulse(&self) -> f64 {
        self.j_acc.abs()
    }
}
