use crate::{
    core::body::Body,
    dynamics::solver::{bias_coef, inverse_or_zero},
};

use super::{JointSolver, SolveParams};

/// Keeps the angular velocity ratio of two bodies constant.
#[derive(Debug, Clone, PartialEq)]
pub struct GearJoint {
    pub phase: f64,
    pub ratio: f64,

    i_sum: f64,
    bias: f64,
    j_acc: f64,
    j_max: f64,
}

impl GearJoint {
    pub(crate) fn new(phase: f64, ratio: f64) -> Self {
        Self {
            phase,
            ratio,
            i_sum: 0.0,
            bias: 0.0,
            j_acc: 0.0,
            j_max: 0.0,
        }
    }

    fn apply(&self, a: &mut Body, b: &mut Body, j: f64) {
        a.w -= j * a.moment_inv() * self.ratio;
        b.w += j * b.moment_inv();
    }
}

impl JointSolver for GearJoint {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, params: &SolveParams) {
        self.i_sum = inverse_or_zero(a.moment_inv() * self.ratio * self.ratio + b.moment_inv());

        let error = b.angle() - self.ratio * a.angle() - self.phase;
        self.bias = (-bias_coef(params.error_bias, dt) * error / dt).clamp(-params.max_bias, params.max_bias);
        self.j_max = params.j_max;
    }

    fn apply_cached_impulse(&mut self, a: &mut Body, b: &mut Body, dt_coef: f64) {
        self.apply(a, b, self.j_acc * dt_coef);
    }

    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, _dt: f64) {
        let wr = b.w - self.ratio * a.w;

        let j = (self.bias - wr) * self.i_sum;
        let j_old = self.j_acc;
        self.j_acc = (j_old + j).clamp(-self.j_max, self.j_max);

        self.apply(a, b, self.j_acc - j_old);
    }

    fn impulse(&self) -> f64 {
        self.j_acc.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{
        tests::{registered, solve},
        Constraint,
    };
    use crate::core::body::Body;
    use approx::assert_relative_eq;

    #[test]
    fn geared_bodies_spin_at_the_ratio() {
        let mut a = registered(Body::new(1.0, 1.0), 0);
        let mut b = registered(Body::new(1.0, 1.0), 1);
        a.w = 2.0;

        let mut joint = Constraint::gear(&a, &b, 0.0, 2.0);
        solve(&mut joint, &mut a, &mut b, 30);
        assert_relative_eq!(b.w, 2.0 * a.w, epsilon = 0.05);
        assert_relative_eq!(b.angle(), 2.0 * a.angle(), epsilon = 0.05);
    }
}
