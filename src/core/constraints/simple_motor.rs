use crate::{core::body::Body, dynamics::solver::inverse_or_zero};

use super::{JointSolver, SolveParams};

/// Drives the relative angular velocity of two bodies toward `rate`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleMotor {
    pub rate: f64,

    i_sum: f64,
    j_acc: f64,
    j_max: f64,
}

impl SimpleMotor {
    pub(crate) fn new(rate: f64) -> Self {
        Self {
            rate,
            i_sum: 0.0,
            j_acc: 0.0,
            j_max: 0.0,
        }
    }
}

impl JointSolver for SimpleMotor {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, _dt: f64, params: &SolveParams) {
        self.i_sum = inverse_or_zero(a.moment_inv() + b.moment_inv());
        self.j_max = params.j_max;
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        let j = self.j_acc * dt_coef;
        a.w -= j * a.moment_inv();
        b.w += j * b.moment_inv();
    }

    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, _dt: f64) {
        let wr = b.w - a.w - self.rate;

        let j = -wr * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = (j_old + j).clamp(-self.j_max, self.j_max);
        let j = self.j_acc - j_old;

        a.w -= j * a.moment_inv();
        b.w += j * b.moment_inv();
    }

    fn impulse(&self) -> f64 {
        self.j_acc.abs()
    }
}
