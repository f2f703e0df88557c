use serde::{Deserialize, Serialize};

use crate::utils::math::Vect;

/// Axis-aligned bounding box stored as left/bottom/right/top.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BB {
    pub l: f64,
    pub b: f64,
    pub r: f64,
    pub t: f64,
}

impl BB {
    pub fn new(l: f64, b: f64, r: f64, t: f64) -> Self {
        Self { l, b, r, t }
    }

    /// Box of the given half extents centered on `center`.
    pub fn for_extents(center: Vect, half_width: f64, half_height: f64) -> Self {
        Self::new(
            center.x - half_width,
            center.y - half_height,
            center.x + half_width,
            center.y + half_height,
        )
    }

    pub fn for_circle(p: Vect, radius: f64) -> Self {
        Self::for_extents(p, radius, radius)
    }

    pub fn intersects(&self, other: &BB) -> bool {
        self.l <= other.r && other.l <= self.r && self.b <= other.t && other.b <= self.t
    }

    /// Returns true if `other` lies completely within this box.
    pub fn contains(&self, other: &BB) -> bool {
        self.l <= other.l && self.r >= other.r && self.b <= other.b && self.t >= other.t
    }

    pub fn contains_vect(&self, v: Vect) -> bool {
        self.l <= v.x && self.r >= v.x && self.b <= v.y && self.t >= v.y
    }

    pub fn merge(&self, other: &BB) -> BB {
        BB::new(
            self.l.min(other.l),
            self.b.min(other.b),
            self.r.max(other.r),
            self.t.max(other.t),
        )
    }

    /// Smallest box containing both this box and `v`.
    pub fn expand(&self, v: Vect) -> BB {
        BB::new(
            self.l.min(v.x),
            self.b.min(v.y),
            self.r.max(v.x),
            self.t.max(v.y),
        )
    }

    pub fn center(&self) -> Vect {
        Vect::new((self.l + self.r) * 0.5, (self.b + self.t) * 0.5)
    }

    pub fn area(&self) -> f64 {
        (self.r - self.l) * (self.t - self.b)
    }

    /// Area of the box that would contain both boxes.
    pub fn merged_area(&self, other: &BB) -> f64 {
        (self.r.max(other.r) - self.l.min(other.l)) * (self.t.max(other.t) - self.b.min(other.b))
    }

    /// Manhattan distance between the box centers, scaled by two.
    pub fn proximity(&self, other: &BB) -> f64 {
        (self.l + self.r - other.l - other.r).abs() + (self.b + self.t - other.b - other.t).abs()
    }

    /// Fraction along `a`-`b` at which the segment enters the box, or infinity on a miss.
    pub fn segment_query(&self, a: Vect, b: Vect) -> f64 {
        let (tx_min, tx_max) = slab(self.l, self.r, a.x, b.x);
        let (ty_min, ty_max) = slab(self.b, self.t, a.y, b.y);

        let t_min = tx_min.max(ty_min);
        let t_max = tx_max.min(ty_max);

        if 0.0 <= t_max && t_min <= t_max && t_min <= 1.0 {
            t_min.max(0.0)
        } else {
            f64::INFINITY
        }
    }

    pub fn intersects_segment(&self, a: Vect, b: Vect) -> bool {
        self.segment_query(a, b).is_finite()
    }

    pub fn clamp_vect(&self, v: Vect) -> Vect {
        Vect::new(v.x.clamp(self.l, self.r), v.y.clamp(self.b, self.t))
    }

    /// Wraps `v` into the box as if its edges were periodic.
    pub fn wrap_vect(&self, v: Vect) -> Vect {
        let ix = (self.r - self.l).abs();
        let mod_x = (v.x - self.l) % ix;
        let x = if mod_x > 0.0 { mod_x } else { mod_x + ix };

        let iy = (self.t - self.b).abs();
        let mod_y = (v.y - self.b) % iy;
        let y = if mod_y > 0.0 { mod_y } else { mod_y + iy };

        Vect::new(x + self.l, y + self.b)
    }
}

/// Entry/exit parameters of a 1D ray against the interval `[min, max]`.
fn slab(min: f64, max: f64, from: f64, to: f64) -> (f64, f64) {
    let inv = 1.0 / (to - from);
    let t1 = if min == from {
        f64::NEG_INFINITY
    } else {
        (min - from) * inv
    };
    let t2 = if max == from {
        f64::INFINITY
    } else {
        (max - from) * inv
    };
    (t1.min(t2), t1.max(t2))
}
