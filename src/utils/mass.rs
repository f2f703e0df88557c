//! Moment of inertia and area formulas for the supported shape kinds.
//!
//! Polygon helpers expect clockwise winding; a clockwise polygon has positive area.

use std::f64::consts::PI;

use crate::{
    core::bb::BB,
    utils::math::{Vect, VectExt},
};

/// Moment of inertia for a hollow circle (`r1` inner, `r2` outer) whose center is `offset`
/// from the body's center of gravity. A solid circle has `r1 == 0`.
pub fn moment_for_circle(mass: f64, r1: f64, r2: f64, offset: Vect) -> f64 {
    mass * (0.5 * (r1 * r1 + r2 * r2) + offset.length_squared())
}

pub fn area_for_circle(r1: f64, r2: f64) -> f64 {
    PI * (r1 * r1 - r2 * r2).abs()
}

/// Moment of inertia for a thin line segment.
pub fn moment_for_segment(mass: f64, a: Vect, b: Vect) -> f64 {
    let offset = (a + b) * 0.5;
    mass * (b.distance_squared(a) / 12.0 + offset.length_squared())
}

/// Area of a capsule of radius `radius` around segment `a`-`b`.
pub fn area_for_segment(a: Vect, b: Vect, radius: f64) -> f64 {
    radius * (PI * radius + 2.0 * a.distance(b))
}

/// Moment of inertia for a solid polygon, `offset` is added to every vertex.
pub fn moment_for_poly(mass: f64, verts: &[Vect], offset: Vect) -> f64 {
    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    let count = verts.len();
    for i in 0..count {
        let v1 = verts[i] + offset;
        let v2 = verts[(i + 1) % count] + offset;

        let a = v2.cross(v1);
        let b = v1.dot(v1) + v1.dot(v2) + v2.dot(v2);

        sum1 += a * b;
        sum2 += a;
    }

    (mass * sum1) / (6.0 * sum2)
}

/// Signed area of a polygon; positive for clockwise winding.
pub fn area_for_poly(verts: &[Vect]) -> f64 {
    let count = verts.len();
    let area: f64 = (0..count)
        .map(|i| verts[i].cross(verts[(i + 1) % count]))
        .sum();
    -area / 2.0
}

pub fn centroid_for_poly(verts: &[Vect]) -> Vect {
    let mut sum = 0.0;
    let mut vsum = Vect::ZERO;
    let count = verts.len();
    for i in 0..count {
        let v1 = verts[i];
        let v2 = verts[(i + 1) % count];
        let cross = v1.cross(v2);

        sum += cross;
        vsum += (v1 + v2) * cross;
    }

    vsum / (3.0 * sum)
}

/// Translates the polygon so its centroid sits at the origin.
pub fn recenter_poly(verts: &mut [Vect]) {
    let centroid = centroid_for_poly(verts);
    for v in verts.iter_mut() {
        *v -= centroid;
    }
}

/// Moment of inertia for a solid box centered on the body.
pub fn moment_for_box(mass: f64, width: f64, height: f64) -> f64 {
    mass * (width * width + height * height) / 12.0
}

/// Moment of inertia for a solid box given in body-local coordinates.
pub fn moment_for_box2(mass: f64, bb: BB) -> f64 {
    let width = bb.r - bb.l;
    let height = bb.t - bb.b;
    let offset = bb.center();
    moment_for_box(mass, width, height) + mass * offset.length_squared()
}
