//! Additional 2D vector helpers layered on top of `glam`.
//!
//! Rotations are stored as unit vectors `(cos θ, sin θ)`; composing two of them is
//! a complex multiply (`DVec2::rotate`), undoing one is [`VectExt::unrotate`].

use glam::DVec2;

/// Engine vector type.
pub type Vect = DVec2;

pub trait VectExt {
    /// Z component of the 3D cross product.
    fn cross(self, other: Self) -> f64;
    /// Clockwise perpendicular `(y, -x)`.
    fn rperp(self) -> Self;
    /// Inverse of `DVec2::rotate`.
    fn unrotate(self, rot: Self) -> Self;
    /// Spherical interpolation between two unit vectors.
    fn spherical_lerp(self, other: Self, t: f64) -> Self;
    /// Spherical interpolation towards `other` by at most `angle` radians.
    fn spherical_lerp_const(self, other: Self, angle: f64) -> Self;
    /// Moves towards `other` by at most `distance`.
    fn lerp_const(self, other: Self, distance: f64) -> Self;
    fn near(self, other: Self, distance: f64) -> bool;
}

impl VectExt for DVec2 {
    #[inline]
    fn cross(self, other: Self) -> f64 {
        self.perp_dot(other)
    }

    #[inline]
    fn rperp(self) -> Self {
        DVec2::new(self.y, -self.x)
    }

    #[inline]
    fn unrotate(self, rot: Self) -> Self {
        DVec2::new(self.x * rot.x + self.y * rot.y, self.y * rot.x - self.x * rot.y)
    }

    fn spherical_lerp(self, other: Self, t: f64) -> Self {
        let omega = self.dot(other).clamp(-1.0, 1.0).acos();
        if omega < 1e-3 {
            return self.lerp(other, t);
        }
        let denom = 1.0 / omega.sin();
        self * (((1.0 - t) * omega).sin() * denom) + other * ((t * omega).sin() * denom)
    }

    fn spherical_lerp_const(self, other: Self, angle: f64) -> Self {
        let omega = self.dot(other).clamp(-1.0, 1.0).acos();
        if omega == 0.0 {
            return self;
        }
        self.spherical_lerp(other, angle.min(omega) / omega)
    }

    fn lerp_const(self, other: Self, distance: f64) -> Self {
        self + (other - self).clamp_length_max(distance)
    }

    #[inline]
    fn near(self, other: Self, distance: f64) -> bool {
        self.distance_squared(other) < distance * distance
    }
}

/// Unit rotation vector for `angle` radians.
#[inline]
pub fn for_angle(angle: f64) -> Vect {
    DVec2::new(angle.cos(), angle.sin())
}

/// Closest point to `p` on segment `a`-`b`.
pub fn closest_point_on_segment(p: Vect, a: Vect, b: Vect) -> Vect {
    let delta = a - b;
    let len_sq = delta.length_squared();
    if len_sq == 0.0 {
        return a;
    }
    let t = (delta.dot(p - b) / len_sq).clamp(0.0, 1.0);
    b + delta * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn rotate_and_unrotate_are_inverse() {
        let rot = for_angle(0.7);
        let v = DVec2::new(3.0, -2.0);
        let back = rot.rotate(v).unrotate(rot);
        assert_abs_diff_eq!(back.x, v.x, epsilon = 1e-12);
        assert_abs_diff_eq!(back.y, v.y, epsilon = 1e-12);
    }

    #[test]
    fn cross_matches_perp_dot() {
        assert_abs_diff_eq!(DVec2::X.cross(DVec2::Y), 1.0);
        assert_abs_diff_eq!(DVec2::Y.cross(DVec2::X), -1.0);
        assert_eq!(DVec2::X.perp(), DVec2::Y);
        assert_eq!(DVec2::X.rperp(), -DVec2::Y);
    }

    #[test]
    fn spherical_lerp_halfway_between_axes() {
        let mid = DVec2::X.spherical_lerp(DVec2::Y, 0.5);
        assert_abs_diff_eq!(mid.length(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(mid.x, mid.y, epsilon = 1e-12);

        let limited = DVec2::X.spherical_lerp_const(DVec2::Y, FRAC_PI_2 / 3.0);
        assert_abs_diff_eq!(limited.to_angle(), FRAC_PI_2 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn lerp_const_caps_distance() {
        let v = DVec2::ZERO.lerp_const(DVec2::new(10.0, 0.0), 2.5);
        assert_abs_diff_eq!(v.x, 2.5);
        let w = DVec2::ZERO.lerp_const(DVec2::new(1.0, 0.0), 2.5);
        assert_abs_diff_eq!(w.x, 1.0);
    }

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let a = DVec2::new(0.0, 0.0);
        let b = DVec2::new(10.0, 0.0);
        assert_eq!(closest_point_on_segment(DVec2::new(-5.0, 3.0), a, b), a);
        assert_eq!(closest_point_on_segment(DVec2::new(4.0, 3.0), a, b), DVec2::new(4.0, 0.0));
    }
}
