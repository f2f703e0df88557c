//! Sequential impulse solver for contacts, plus the impulse helpers shared with joints.

use glam::DMat2;

use crate::{
    collision::arbiter::Arbiter,
    core::body::Body,
    utils::math::{Vect, VectExt},
};

/// Velocity of `b` relative to `a` at the offsets `r1` and `r2`.
#[inline]
pub(crate) fn relative_velocity(a: &Body, b: &Body, r1: Vect, r2: Vect) -> Vect {
    (b.v + r2.perp() * b.w) - (a.v + r1.perp() * a.w)
}

#[inline]
pub(crate) fn normal_relative_velocity(a: &Body, b: &Body, r1: Vect, r2: Vect, n: Vect) -> f64 {
    relative_velocity(a, b, r1, r2).dot(n)
}

/// Applies `j` to `b` and `-j` to `a`.
#[inline]
pub(crate) fn apply_impulses(a: &mut Body, b: &mut Body, r1: Vect, r2: Vect, j: Vect) {
    a.apply_impulse(-j, r1);
    b.apply_impulse(j, r2);
}

#[inline]
pub(crate) fn apply_bias_impulses(a: &mut Body, b: &mut Body, r1: Vect, r2: Vect, j: Vect) {
    a.apply_bias_impulse(-j, r1);
    b.apply_bias_impulse(j, r2);
}

/// Inverse effective mass along `n`.
pub(crate) fn k_scalar(a: &Body, b: &Body, r1: Vect, r2: Vect, n: Vect) -> f64 {
    let rcn1 = r1.cross(n);
    let rcn2 = r2.cross(n);
    a.mass_inv() + b.mass_inv() + a.moment_inv() * rcn1 * rcn1 + b.moment_inv() * rcn2 * rcn2
}

/// `1 / k`, or zero when the constraint cannot be solved.
#[inline]
pub(crate) fn inverse_or_zero(k: f64) -> f64 {
    if k != 0.0 && k.is_finite() {
        1.0 / k
    } else {
        0.0
    }
}

/// Effective mass tensor for a point-to-point constraint; zero if singular.
pub(crate) fn k_tensor(a: &Body, b: &Body, r1: Vect, r2: Vect) -> DMat2 {
    let m_sum = a.mass_inv() + b.mass_inv();
    let mut k11 = m_sum;
    let mut k12 = 0.0;
    let mut k22 = m_sum;

    for (i_inv, r) in [(a.moment_inv(), r1), (b.moment_inv(), r2)] {
        k11 += r.y * r.y * i_inv;
        k12 += -r.x * r.y * i_inv;
        k22 += r.x * r.x * i_inv;
    }

    let k = DMat2::from_cols(Vect::new(k11, k12), Vect::new(k12, k22));
    let det = k.determinant();
    if det != 0.0 && det.is_finite() {
        k.inverse()
    } else {
        DMat2::ZERO
    }
}

/// Fraction of positional error corrected over `dt`.
#[inline]
pub(crate) fn bias_coef(error_bias: f64, dt: f64) -> f64 {
    1.0 - error_bias.powf(dt)
}

/// Contact solving parameters shared by every arbiter in a step.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ContactSolver {
    pub dt: f64,
    pub slop: f64,
    pub bias_coef: f64,
}

impl ContactSolver {
    pub fn new(dt: f64, slop: f64, collision_bias: f64) -> Self {
        Self {
            dt,
            slop,
            bias_coef: bias_coef(collision_bias, dt),
        }
    }

    /// Computes offsets, effective masses and target velocities.
    pub fn pre_step(&self, arb: &mut Arbiter, a: &Body, b: &Body) {
        let e = arb.e;
        for con in arb.contacts_mut() {
            con.r1 = con.p - a.p;
            con.r2 = con.p - b.p;

            con.n_mass = inverse_or_zero(k_scalar(a, b, con.r1, con.r2, con.n));
            con.t_mass = inverse_or_zero(k_scalar(a, b, con.r1, con.r2, con.n.perp()));

            con.bias = self.bias_coef * (con.depth - self.slop).max(0.0) / self.dt;
            con.j_bias = 0.0;

            con.bounce = if con.depth < 0.0 {
                // Speculative contact: approaching is fine as long as the gap doesn't close.
                -con.depth / self.dt
            } else {
                normal_relative_velocity(a, b, con.r1, con.r2, con.n) * e
            };
        }
    }

    /// Re-applies last step's impulses scaled by `dt_coef`. Skipped for new contacts.
    pub fn apply_cached_impulse(arb: &Arbiter, a: &mut Body, b: &mut Body, dt_coef: f64) {
        if arb.is_first_contact() {
            return;
        }

        for con in &arb.contacts {
            let j = con.n.rotate(Vect::new(con.jn_acc, con.jt_acc));
            apply_impulses(a, b, con.r1, con.r2, j * dt_coef);
        }
    }

    /// One Gauss-Seidel pass over the arbiter's contacts.
    pub fn apply_impulse(arb: &mut Arbiter, a: &mut Body, b: &mut Body) {
        let surface_vr = arb.surface_vr;
        let friction = arb.u;

        for con in arb.contacts_mut() {
            let n = con.n;
            let r1 = con.r1;
            let r2 = con.r2;

            let vb1 = a.v_bias + r1.perp() * a.w_bias;
            let vb2 = b.v_bias + r2.perp() * b.w_bias;
            let vbn = (vb2 - vb1).dot(n);

            let jbn = (con.bias - vbn) * con.n_mass;
            let jbn_old = con.j_bias;
            con.j_bias = (jbn_old + jbn).max(0.0);
            apply_bias_impulses(a, b, r1, r2, n * (con.j_bias - jbn_old));

            let vr = relative_velocity(a, b, r1, r2);
            let vrn = vr.dot(n);

            let jn = -(con.bounce + vrn) * con.n_mass;
            let jn_old = con.jn_acc;
            con.jn_acc = (jn_old + jn).max(0.0);

            let vrt = (vr + surface_vr).dot(n.perp());
            let jt_max = friction * con.jn_acc;
            let jt = -vrt * con.t_mass;
            let jt_old = con.jt_acc;
            con.jt_acc = (jt_old + jt).clamp(-jt_max, jt_max);

            apply_impulses(
                a,
                b,
                r1,
                r2,
                n.rotate(Vect::new(con.jn_acc - jn_old, con.jt_acc - jt_old)),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collision::arbiter::{ArbiterPairInfo, Contact},
        utils::allocator::{BodyId, ShapeId},
    };
    use approx::assert_relative_eq;

    fn resting_pair() -> (Arbiter, Body, Body) {
        let ground = Body::new_static();
        let mut ball = Body::new(1.0, 1.0);
        ball.p = Vect::new(0.0, 1.0);
        ball.v = Vect::new(0.0, -2.0);

        let info = ArbiterPairInfo {
            shape_a: ShapeId::new(0, 0),
            shape_b: ShapeId::new(1, 0),
            body_a: BodyId::new(0, 0),
            body_b: BodyId::new(1, 0),
            elasticity: 0.0,
            friction: 0.5,
            surface_vr: Vect::ZERO,
        };
        let mut arb = Arbiter::new(info.shape_a, info.body_a, info.shape_b, info.body_b);
        arb.update(vec![Contact::new(Vect::ZERO, Vect::Y, 0.05, 0)], &info);
        (arb, ground, ball)
    }

    #[test]
    fn normal_impulse_stops_approach_and_never_pulls() {
        let (mut arb, mut ground, mut ball) = resting_pair();
        let solver = ContactSolver::new(1.0 / 60.0, 0.1, 0.1);
        solver.pre_step(&mut arb, &ground, &ball);

        for _ in 0..10 {
            ContactSolver::apply_impulse(&mut arb, &mut ground, &mut ball);
        }
        assert_relative_eq!(ball.v.y, 0.0, epsilon = 1e-9);
        assert!(arb.contacts[0].jn_acc > 0.0);
        // Depth is below the slop, so no positional correction.
        assert_relative_eq!(ball.v_bias.y, 0.0);

        ball.v = Vect::new(0.0, 5.0);
        solver.pre_step(&mut arb, &ground, &ball);
        arb.contacts[0].jn_acc = 0.0;
        ContactSolver::apply_impulse(&mut arb, &mut ground, &mut ball);
        assert_relative_eq!(arb.contacts[0].jn_acc, 0.0);
        assert_relative_eq!(ball.v.y, 5.0);
    }

    #[test]
    fn speculative_contact_only_limits_closing_speed() {
        let (mut arb, mut ground, mut ball) = resting_pair();
        arb.contacts[0].depth = -0.05;
        let solver = ContactSolver::new(1.0 / 60.0, 0.1, 0.1);

        // 2 units/s closes less than the 0.05 gap in one step.
        solver.pre_step(&mut arb, &ground, &ball);
        ContactSolver::apply_impulse(&mut arb, &mut ground, &mut ball);
        assert_relative_eq!(ball.v.y, -2.0);
        assert_relative_eq!(arb.contacts[0].jn_acc, 0.0);

        ball.v = Vect::new(0.0, -6.0);
        solver.pre_step(&mut arb, &ground, &ball);
        for _ in 0..10 {
            ContactSolver::apply_impulse(&mut arb, &mut ground, &mut ball);
        }
        assert_relative_eq!(ball.v.y, -3.0, epsilon = 1e-9);
        assert_relative_eq!(ball.v_bias.y, 0.0);
    }

    #[test]
    fn friction_is_bounded_by_normal_impulse() {
        let (mut arb, mut ground, mut ball) = resting_pair();
        ball.v = Vect::new(10.0, -1.0);
        let solver = ContactSolver::new(1.0 / 60.0, 0.1, 0.1);
        solver.pre_step(&mut arb, &ground, &ball);
        for _ in 0..10 {
            ContactSolver::apply_impulse(&mut arb, &mut ground, &mut ball);
        }
        let con = arb.contacts[0];
        assert!(con.jt_acc.abs() <= 0.5 * con.jn_acc + 1e-12);
        assert!(ball.v.x < 10.0);
    }

    #[test]
    fn k_tensor_of_two_infinite_bodies_is_zero() {
        let a = Body::new_static();
        let b = Body::new_static();
        assert_eq!(k_tensor(&a, &b, Vect::X, Vect::Y), DMat2::ZERO);
        assert_relative_eq!(inverse_or_zero(k_scalar(&a, &b, Vect::X, Vect::Y, Vect::X)), 0.0);
    }

    #[test]
    fn bias_coef_matches_closed_form() {
        assert_relative_eq!(bias_coef(0.5, 2.0), 0.75);
        assert_relative_eq!(bias_coef(0.1, 0.0), 0.0);
    }
}
