//! Point and segment queries against individual shapes.

use crate::{
    collision::arbiter::ContactPointSet,
    utils::{
        allocator::ShapeId,
        math::{closest_point_on_segment, Vect, VectExt},
    },
};

/// Distances below this use the feature normal instead of the point delta as gradient.
const MAGIC_EPSILON: f64 = 1e-5;

/// Result of a nearest-point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPointQueryInfo {
    /// Queried shape, `None` for a shape not registered with a space.
    pub shape: Option<ShapeId>,
    /// Closest point on the shape's surface.
    pub point: Vect,
    /// Distance to the surface; negative when the query point is inside.
    pub distance: f64,
    /// Gradient of the distance field at the query point.
    pub gradient: Vect,
}

/// Result of a segment (ray) query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentQueryInfo {
    pub shape: Option<ShapeId>,
    /// Hit fraction along the query segment in `[0, 1]`.
    pub t: f64,
    /// Surface normal at the hit point.
    pub n: Vect,
}

impl SegmentQueryInfo {
    pub fn hit_point(&self, a: Vect, b: Vect) -> Vect {
        a.lerp(b, self.t)
    }

    pub fn hit_distance(&self, a: Vect, b: Vect) -> f64 {
        a.distance(b) * self.t
    }
}

/// Result of a shape-overlap query.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeQueryInfo {
    pub shape: ShapeId,
    pub contacts: ContactPointSet,
}

pub(crate) fn circle_nearest_point(center: Vect, radius: f64, p: Vect) -> (Vect, f64, Vect) {
    let delta = p - center;
    let d = delta.length();
    let g = if d > MAGIC_EPSILON {
        delta / d
    } else {
        Vect::Y
    };
    (center + g * radius, d - radius, g)
}

pub(crate) fn segment_nearest_point(
    a: Vect,
    b: Vect,
    normal: Vect,
    radius: f64,
    p: Vect,
) -> (Vect, f64, Vect) {
    let closest = closest_point_on_segment(p, a, b);
    let delta = p - closest;
    let d = delta.length();
    if d > MAGIC_EPSILON {
        let g = delta / d;
        (closest + g * radius, d - radius, g)
    } else {
        (closest, d - radius, normal)
    }
}

/// `verts` are the world-space vertices and `normals[i]` belongs to edge `i -> i + 1`.
pub(crate) fn poly_nearest_point(
    verts: &[Vect],
    normals: &[Vect],
    radius: f64,
    p: Vect,
) -> (Vect, f64, Vect) {
    let count = verts.len();
    let mut min_dist = f64::INFINITY;
    let mut closest_point = Vect::ZERO;
    let mut closest_normal = Vect::ZERO;
    let mut outside = false;

    for i in 0..count {
        let v0 = verts[i];
        let v1 = verts[(i + 1) % count];
        if normals[i].dot(p - v0) > 0.0 {
            outside = true;
        }

        let closest = closest_point_on_segment(p, v0, v1);
        let dist = p.distance(closest);
        if dist < min_dist {
            min_dist = dist;
            closest_point = closest;
            closest_normal = normals[i];
        }
    }

    let dist = if outside { min_dist } else { -min_dist };
    let g = if min_dist > MAGIC_EPSILON {
        (p - closest_point) / dist
    } else {
        closest_normal
    };

    (closest_point + g * radius, dist - radius, g)
}

/// Segment query against a circle, also used for rounded vertices and segment caps.
pub(crate) fn circle_segment_query(center: Vect, radius: f64, a: Vect, b: Vect) -> Option<(f64, Vect)> {
    let da = a - center;
    let db = b - center;

    let qa = da.dot(da) - 2.0 * da.dot(db) + db.dot(db);
    let qb = -2.0 * da.dot(da) + 2.0 * da.dot(db);
    let qc = da.dot(da) - radius * radius;

    let det = qb * qb - 4.0 * qa * qc;
    if det < 0.0 || qa == 0.0 {
        return None;
    }

    let t = (-qb - det.sqrt()) / (2.0 * qa);
    if (0.0..=1.0).contains(&t) {
        Some((t, da.lerp(db, t).normalize_or_zero()))
    } else {
        None
    }
}

pub(crate) fn segment_segment_query(
    seg_a: Vect,
    seg_b: Vect,
    normal: Vect,
    radius: f64,
    a: Vect,
    b: Vect,
) -> Option<(f64, Vect)> {
    let d = (seg_a - a).dot(normal);
    let flipped_n = if d > 0.0 { -normal } else { normal };
    let offset = flipped_n * radius - a;

    // Endpoints relative to `a`, pushed out by the segment thickness.
    let rel_a = seg_a + offset;
    let rel_b = seg_b + offset;
    let delta = b - a;

    if delta.cross(rel_a) * delta.cross(rel_b) <= 0.0 {
        let d_offset = d + if d > 0.0 { -radius } else { radius };
        let ad = -d_offset;
        let bd = delta.dot(normal) - d_offset;

        if ad * bd < 0.0 {
            return Some((ad / (ad - bd), flipped_n));
        }
        None
    } else if radius != 0.0 {
        let cap_a = circle_segment_query(seg_a, radius, a, b);
        let cap_b = circle_segment_query(seg_b, radius, a, b);
        match (cap_a, cap_b) {
            (Some(ha), Some(hb)) => Some(if ha.0 < hb.0 { ha } else { hb }),
            (hit, None) | (None, hit) => hit,
        }
    } else {
        None
    }
}

pub(crate) fn poly_segment_query(
    verts: &[Vect],
    normals: &[Vect],
    radius: f64,
    a: Vect,
    b: Vect,
) -> Option<(f64, Vect)> {
    let count = verts.len();
    let mut best: Option<(f64, Vect)> = None;

    for i in 0..count {
        let n = normals[i];
        let an = a.dot(n);
        let d = n.dot(verts[i]) + radius - an;
        if d > 0.0 {
            continue;
        }

        let bn = b.dot(n);
        let t = d / (bn - an);
        if !(0.0..=1.0).contains(&t) {
            continue;
        }

        // Project onto the edge direction to check the hit lies within the face.
        let point = a.lerp(b, t);
        let along = -n.cross(point);
        let min = -n.cross(verts[i]);
        let max = -n.cross(verts[(i + 1) % count]);
        if min <= along && along <= max && best.map_or(true, |(best_t, _)| t < best_t) {
            best = Some((t, n));
        }
    }

    if radius > 0.0 {
        for &v in verts {
            if let Some(hit) = circle_segment_query(v, radius, a, b) {
                if best.map_or(true, |(best_t, _)| hit.0 < best_t) {
                    best = Some(hit);
                }
            }
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> (Vec<Vect>, Vec<Vect>) {
        let verts = vec![
            Vect::new(-1.0, -1.0),
            Vect::new(-1.0, 1.0),
            Vect::new(1.0, 1.0),
            Vect::new(1.0, -1.0),
        ];
        let normals = vec![-Vect::X, Vect::Y, Vect::X, -Vect::Y];
        (verts, normals)
    }

    #[test]
    fn circle_ray_hits_near_side() {
        let (t, n) = circle_segment_query(Vect::ZERO, 1.0, Vect::new(-3.0, 0.0), Vect::new(3.0, 0.0))
            .expect("ray through center hits");
        assert_relative_eq!(t, 2.0 / 6.0, epsilon = 1e-12);
        assert_relative_eq!(n.x, -1.0, epsilon = 1e-12);

        assert!(circle_segment_query(Vect::ZERO, 1.0, Vect::new(-3.0, 2.0), Vect::new(3.0, 2.0)).is_none());
    }

    #[test]
    fn poly_nearest_point_inside_is_negative() {
        let (verts, normals) = unit_box();
        let (point, dist, g) = poly_nearest_point(&verts, &normals, 0.0, Vect::new(0.5, 0.0));
        assert_relative_eq!(dist, -0.5, epsilon = 1e-12);
        assert_relative_eq!(point.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(g.x, 1.0, epsilon = 1e-12);

        let (_, outside, _) = poly_nearest_point(&verts, &normals, 0.0, Vect::new(3.0, 0.0));
        assert_relative_eq!(outside, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn poly_ray_reports_entry_face() {
        let (verts, normals) = unit_box();
        let (t, n) = poly_segment_query(&verts, &normals, 0.0, Vect::new(0.0, 5.0), Vect::new(0.0, -5.0))
            .expect("vertical ray hits the top face");
        assert_relative_eq!(t, 0.4, epsilon = 1e-12);
        assert_eq!(n, Vect::Y);
    }

    #[test]
    fn thick_segment_query_hits_offset_surface() {
        let hit = segment_segment_query(
            Vect::new(-1.0, 0.0),
            Vect::new(1.0, 0.0),
            Vect::Y,
            0.5,
            Vect::new(0.0, 2.0),
            Vect::new(0.0, -2.0),
        )
        .expect("vertical ray crosses the capsule");
        assert_relative_eq!(hit.0, 1.5 / 4.0, epsilon = 1e-12);
        assert_eq!(hit.1, Vect::Y);

        let cap = segment_segment_query(
            Vect::new(-1.0, 0.0),
            Vect::new(1.0, 0.0),
            Vect::Y,
            0.5,
            Vect::new(3.0, 0.0),
            Vect::new(0.0, 0.0),
        )
        .expect("ray along the axis hits the end cap");
        assert_relative_eq!(cap.0, 1.5 / 3.0, epsilon = 1e-12);
    }
}
