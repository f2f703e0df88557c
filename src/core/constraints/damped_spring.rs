use crate::{
    core::body::Body,
    dynamics::solver::{apply_impulses, inverse_or_zero, k_scalar, normal_relative_velocity},
    utils::math::Vect,
};

use super::{JointSolver, SolveParams};

/// Spring force as a function of the current anchor distance.
pub type SpringForceFunc = fn(&DampedSpring, f64) -> f64;

/// Hooke's law: pulls toward `rest_length` with strength `stiffness`.
pub fn default_spring_force(spring: &DampedSpring, dist: f64) -> f64 {
    (spring.rest_length - dist) * spring.stiffness
}

/// A spring with velocity damping between two anchors.
///
/// The spring force is applied as an impulse once per step; damping is solved
/// implicitly so even large coefficients stay stable.
#[derive(Debug, Clone)]
pub struct DampedSpring {
    pub anchr1: Vect,
    pub anchr2: Vect,
    pub rest_length: f64,
    pub stiffness: f64,
    pub damping: f64,
    pub spring_force_func: SpringForceFunc,

    target_vrn: f64,
    v_coef: f64,

    r1: Vect,
    r2: Vect,
    n_mass: f64,
    n: Vect,
    j_acc: f64,
}

impl DampedSpring {
    pub(crate) fn new(anchr1: Vect, anchr2: Vect, rest_length: f64, stiffness: f64, damping: f64) -> Self {
        Self {
            anchr1,
            anchr2,
            rest_length,
            stiffness,
            damping,
            spring_force_func: default_spring_force,
            target_vrn: 0.0,
            v_coef: 0.0,
            r1: Vect::ZERO,
            r2: Vect::ZERO,
            n_mass: 0.0,
            n: Vect::ZERO,
            j_acc: 0.0,
        }
    }
}

impl JointSolver for DampedSpring {
    fn pre_step(&mut self, a: &mut Body, b: &mut Body, dt: f64, _params: &SolveParams) {
        self.r1 = a.rotation().rotate(self.anchr1);
        self.r2 = b.rotation().rotate(self.anchr2);

        let delta = (b.p + self.r2) - (a.p + self.r1);
        let dist = delta.length();
        self.n = if dist != 0.0 { delta / dist } else { Vect::ZERO };

        let k = k_scalar(a, b, self.r1, self.r2, self.n);
        self.n_mass = inverse_or_zero(k);

        self.target_vrn = 0.0;
        self.v_coef = 1.0 - (-self.damping * dt * k).exp();

        let j_spring = (self.spring_force_func)(self, dist) * dt;
        self.j_acc = j_spring;
        apply_impulses(a, b, self.r1, self.r2, self.n * j_spring);
    }

    fn apply_cached_impulse(&mut self, _a: &mut Body, _b: &mut Body, _dt_coef: f64) {}

    fn apply_impulse(&mut self, a: &mut Body, b: &mut Body, _dt: f64) {
        let n = self.n;
        let vrn = normal_relative_velocity(a, b, self.r1, self.r2, n);

        let v_damp = (self.target_vrn - vrn) * self.v_coef;
        self.target_vrn = vrn + v_damp;

        let j_damp = v_damp * self.n_mass;
        self.j_acc += j_damp;
        apply_impulses(a, b, self.r1, self.r2, n * j_damp);
    }

    fn impulse(&self) -> f64 {
        self.j_acc
    }
}
