use crate::{core::body::Body, dynamics::solver::inverse_or_zero};

use super::{JointSolver, SolveParams};

/// Spring torque as a function of the relative angle `angle_b - angle_a`.
pub type SpringTorqueFunc = fn(&DampedRotarySpring, f64) -> f64;

pub fn default_spring_torque(spring: &DampedRotarySpring, relative_angle: f64) -> f64 {
    (spring.rest_angle - relative_angle) * spring.stiffness
}

/// Angular counterpart of [`super::DampedSpring`].
#[derive(Debug, Clone)]
pub struct DampedRotarySpring {
    pub rest_angle: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub spring_torque_func: SpringTorqueFunc,

    target_wrn: f64,
    w_coef: f64,
    i_sum: f64,
    j_acc: f64,
}

impl DampedRotarySpring {
    pub(crate) fn new(rest_angle: f64, stiffness: f64, damping: f64) -> Self {
        Self {
            rest_angle,
            stiffness,
            damping,
            spring_torque_func: default_spring_torque,
            target_wrn: 0.0,
            w_coef: 0.0,
            i_sum: 0.0,
            j_acc: 0.0,
        }
    }
}

impl JointSolver for DampedRotarySpring {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, _params: &SolveParams) {
        let moment = a.moment_inv() + b.moment_inv();
        self.i_sum = inverse_or_zero(moment);
        self.w_coef = 1.0 - (-self.damping * dt * moment).exp();
        self.target_wrn = 0.0;

        let j_spring = (self.spring_torque_func)(self, b.angle() - a.angle()) * dt;
        self.j_acc = j_spring;
        a.w -= j_spring * a.moment_inv();
        b.w += j_spring * b.moment_inv();
    }

    fn apply_cached_impulse(&mut self, _a: &mut Body, _b: &mut Body, _dt_coef: f64) {}

    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, _dt: f64) {
        let wrn = b.w - a.w;

        let w_damp = (self.target_wrn - wrn) * self.w_coef;
        self.target_wrn = wrn + w_damp;

        let j_damp = w_damp * self.i_sum;
        self.j_acc += j_damp;
        a.w -= j_damp * a.moment_inv();
        b.w += j_damp * b.moment_inv();
    }

    fn impulse(&self) -> f64 {
        self.j_acc
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
    fn twisted_spring_unwinds_toward_rest_angle() {
        let mut a = registered(Body::new_static(), 0);
        let mut b = registered(Body::new(1.0, 1.0), 1);
        b.set_angle(1.0);

        let mut joint = Constraint::damped_rotary_spring(&a, &b, 0.25, 30.0, 4.0);
        solve(&mut joint, &mut a, &mut b, 1);
        assert!(b.w < 0.0);

        solve(&mut joint, &mut a, &mut b, 600);
        assert_relative_eq!(b.angle(), 0.25, epsilon = 0.01);
        assert_relative_eq!(a.w, 0.0);
    }
}
