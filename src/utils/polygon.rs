//! Polygon utilities: convex hull and winding/convexity validation.

use std::cmp::Ordering;

use crate::utils::math::{Vect, VectExt};

/// Returns true if `verts` describe a convex polygon wound clockwise.
///
/// Fewer than three vertices never form a valid polygon.
pub fn poly_validate(verts: &[Vect]) -> bool {
    let count = verts.len();
    if count < 3 {
        return false;
    }

    (0..count).all(|i| {
        let a = verts[i];
        let b = verts[(i + 1) % count];
        let c = verts[(i + 2) % count];
        (b - a).cross(c - b) <= 0.0
    })
}

/// Computes the clockwise convex hull of `verts`.
///
/// Returns the hull together with the index in `verts` of the hull's first vertex.
/// Vertices closer than `tolerance` to the line through their neighbours are dropped,
/// so a tolerance of zero produces the exact hull without collinear points.
pub fn convex_hull(verts: &[Vect], tolerance: f64) -> (Vec<Vect>, usize) {
    if verts.len() < 3 {
        return (verts.to_vec(), 0);
    }

    let mut order: Vec<usize> = (0..verts.len()).collect();
    order.sort_by(|&i, &j| {
        let (a, b) = (verts[i], verts[j]);
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });

    // Monotone chain, counter-clockwise lower then upper hull.
    let mut hull: Vec<usize> = Vec::with_capacity(verts.len() * 2);
    for pass in 0..2 {
        let start = hull.len();
        let iter: Box<dyn Iterator<Item = &usize>> = if pass == 0 {
            Box::new(order.iter())
        } else {
            Box::new(order.iter().rev())
        };
        for &index in iter {
            while hull.len() >= start + 2 {
                let a = verts[hull[hull.len() - 2]];
                let b = verts[hull[hull.len() - 1]];
                if (b - a).cross(verts[index] - a) <= 0.0 {
                    hull.pop();
                } else {
                    break;
                }
            }
            hull.push(index);
        }
        hull.pop();
    }

    // Reverse to clockwise while keeping the leftmost point first.
    if hull.len() > 1 {
        hull[1..].reverse();
    }

    let mut points: Vec<Vect> = hull.iter().map(|&i| verts[i]).collect();
    if tolerance > 0.0 {
        simplify(&mut points, &mut hull, tolerance);
    }

    let first = hull.first().copied().unwrap_or(0);
    (points, first)
}

fn simplify(points: &mut Vec<Vect>, sources: &mut Vec<usize>, tolerance: f64) {
    let mut i = 0;
    while points.len() > 3 && i < points.len() {
        let count = points.len();
        let prev = points[(i + count - 1) % count];
        let next = points[(i + 1) % count];
        let edge = next - prev;
        let len = edge.length();
        let dist = if len > 0.0 {
            edge.cross(points[i] - prev).abs() / len
        } else {
            points[i].distance(prev)
        };

        if dist <= tolerance {
            points.remove(i);
            sources.remove(i);
            i = i.saturating_sub(1);
        } else {
            i += 1;
        }
    }
}
