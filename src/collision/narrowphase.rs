//! Exact intersection tests between pairs of shapes.
//!
//! Every routine reports at most [`MAX_CONTACTS_PER_ARBITER`] contacts whose normals
//! point from the first shape towards the second. Segments and polygons share a
//! rounded-hull separating axis test; a segment is a two-vertex hull whose faces are
//! its two sides.

use crate::{
    collision::{
        arbiter::Contact,
        clipping::{clip_segment, ClipVertex, Plane},
    },
    config::{CONTACT_MARGIN, MAX_CONTACTS_PER_ARBITER},
    core::shape::{CircleGeometry, PolyGeometry, SegmentGeometry, Shape, ShapeGeometry},
    utils::math::{Vect, VectExt},
};

/// Reference face selection favours the first hull unless the second is clearly better.
const REFERENCE_TOLERANCE: f64 = 1e-9;

/// Collides two shapes. The returned normals point from `a` to `b`.
pub fn collide(a: &Shape, b: &Shape) -> Vec<Contact> {
    if a.kind() > b.kind() {
        let mut contacts = collide(b, a);
        for contact in &mut contacts {
            contact.n = -contact.n;
        }
        return contacts;
    }

    let contacts = match (a.geometry(), b.geometry()) {
        (ShapeGeometry::Circle(ca), ShapeGeometry::Circle(cb)) => circle_to_circle(ca, cb),
        (ShapeGeometry::Circle(circle), ShapeGeometry::Segment(seg)) => {
            circle_to_segment(circle, seg)
        }
        (ShapeGeometry::Circle(circle), ShapeGeometry::Poly(poly)) => circle_to_poly(circle, poly),
        (ShapeGeometry::Segment(sa), ShapeGeometry::Segment(sb)) => {
            hull_to_hull(&Hull::from_segment(sa), &Hull::from_segment(sb))
        }
        (ShapeGeometry::Segment(seg), ShapeGeometry::Poly(poly)) => {
            hull_to_hull(&Hull::from_segment(seg), &Hull::from_poly(poly))
        }
        (ShapeGeometry::Poly(pa), ShapeGeometry::Poly(pb)) => {
            hull_to_hull(&Hull::from_poly(pa), &Hull::from_poly(pb))
        }
        _ => unreachable!("shape pair is ordered by kind"),
    };

    debug_assert!(contacts.len() <= MAX_CONTACTS_PER_ARBITER);
    contacts
}

/// Contact between two rounded points, used for circles, capsule ends and rounded corners.
fn circle_to_circle_query(p1: Vect, p2: Vect, r1: f64, r2: f64, hash: u64) -> Option<Contact> {
    let min_dist = r1 + r2;
    let delta = p2 - p1;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist {
        return None;
    }

    let dist = dist_sq.sqrt();
    let n = if dist > 0.0 { delta / dist } else { Vect::X };
    let depth = min_dist - dist;
    // Midway between the two surfaces.
    let point = p1 + n * (r1 - depth * 0.5);
    Some(Contact::new(point, n, depth, hash))
}

fn circle_to_circle(a: &CircleGeometry, b: &CircleGeometry) -> Vec<Contact> {
    circle_to_circle_query(a.world_center(), b.world_center(), a.radius(), b.radius(), 0)
        .into_iter()
        .collect()
}

fn circle_to_segment(circle: &CircleGeometry, seg: &SegmentGeometry) -> Vec<Contact> {
    let seg_a = seg.world_a();
    let seg_delta = seg.world_b() - seg_a;
    let center = circle.world_center();

    let len_sq = seg_delta.length_squared();
    let closest_t = if len_sq > 0.0 {
        (seg_delta.dot(center - seg_a) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let closest = seg_a + seg_delta * closest_t;

    let Some(contact) = circle_to_circle_query(center, closest, circle.radius(), seg.radius(), 0)
    else {
        return Vec::new();
    };

    // End caps next to a neighbouring segment are handled by that segment.
    let n = contact.n;
    if (closest_t == 0.0 && n.dot(seg.a_tangent()) < 0.0)
        || (closest_t == 1.0 && n.dot(seg.b_tangent()) < 0.0)
    {
        return Vec::new();
    }

    vec![contact]
}

fn circle_to_poly(circle: &CircleGeometry, poly: &PolyGeometry) -> Vec<Contact> {
    let verts = poly.world_verts();
    let normals = poly.world_normals();
    let count = verts.len();
    let center = circle.world_center();
    let radius = circle.radius() + poly.radius();

    let mut min_index = 0;
    let mut min = f64::NEG_INFINITY;
    for i in 0..count {
        let dist = normals[i].dot(center - verts[i]) - radius;
        if dist > 0.0 {
            return Vec::new();
        }
        if dist > min {
            min = dist;
            min_index = i;
        }
    }

    let n = normals[min_index];
    let a = verts[min_index];
    let b = verts[(min_index + 1) % count];
    let dta = n.cross(a);
    let dtb = n.cross(b);
    let dt = n.cross(center);

    let contact = if dt < dtb {
        circle_to_circle_query(center, b, circle.radius(), poly.radius(), 0)
    } else if dt < dta {
        let depth = -min;
        let point = center - n * (circle.radius() - depth * 0.5);
        Some(Contact::new(point, -n, depth, 0))
    } else {
        circle_to_circle_query(center, a, circle.radius(), poly.radius(), 0)
    };

    contact.into_iter().collect()
}

/// Convex vertex loop with outward edge normals and a rounding radius.
struct Hull<'a> {
    verts: std::borrow::Cow<'a, [Vect]>,
    normals: std::borrow::Cow<'a, [Vect]>,
    radius: f64,
}

impl<'a> Hull<'a> {
    fn from_poly(poly: &'a PolyGeometry) -> Self {
        Self {
            verts: poly.world_verts().into(),
            normals: poly.world_normals().into(),
            radius: poly.radius(),
        }
    }

    fn from_segment(seg: &SegmentGeometry) -> Hull<'static> {
        let n = seg.world_normal();
        Hull {
            verts: vec![seg.world_a(), seg.world_b()].into(),
            normals: vec![n, -n].into(),
            radius: seg.radius(),
        }
    }

    fn count(&self) -> usize {
        self.verts.len()
    }

    fn vert(&self, index: usize) -> Vect {
        self.verts[index % self.verts.len()]
    }
}

/// Face of `a` with the largest separation from `b`'s vertices. Ties keep the first face.
fn find_max_separation(a: &Hull, b: &Hull) -> (usize, f64) {
    let mut best_index = 0;
    let mut best = f64::NEG_INFINITY;
    for i in 0..a.count() {
        let n = a.normals[i];
        let v = a.verts[i];
        let sep = b
            .verts
            .iter()
            .map(|&w| n.dot(w - v))
            .fold(f64::INFINITY, f64::min);
        if sep > best {
            best = sep;
            best_index = i;
        }
    }
    (best_index, best)
}

/// Distance between the hull cores. When the closest features are two vertices, also
/// returns the closest point on each hull and a feature hash.
fn closest_vertices(a: &Hull, b: &Hull) -> (f64, Option<(Vect, Vect, u64)>) {
    let mut best = f64::INFINITY;
    let mut vertex_pair = None;

    let mut visit = |from: &Hull, to: &Hull, swapped: bool| {
        for (j, &p) in to.verts.iter().enumerate() {
            for i in 0..from.count() {
                let e0 = from.vert(i);
                let e1 = from.vert(i + 1);
                let delta = e1 - e0;
                let len_sq = delta.length_squared();
                let t = if len_sq > 0.0 {
                    (delta.dot(p - e0) / len_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let q = e0 + delta * t;
                let dist = q.distance(p);
                if dist < best {
                    best = dist;
                    vertex_pair = if t == 0.0 || t == 1.0 {
                        let edge_vertex = if t == 0.0 { i } else { (i + 1) % from.count() };
                        let hash = feature_hash(swapped, edge_vertex as u32, j as u32) | VERTEX_PAIR_TAG;
                        Some(if swapped { (p, q, hash) } else { (q, p, hash) })
                    } else {
                        None
                    };
                }
            }
        }
    };

    visit(a, b, false);
    visit(b, a, true);
    (best, vertex_pair)
}

const VERTEX_PAIR_TAG: u64 = 1 << 63;
const CLIP_TAG: u32 = 1 << 15;

fn feature_hash(reference_on_b: bool, reference: u32, incident: u32) -> u64 {
    ((reference_on_b as u64) << 62) | ((reference as u64) << 32) | incident as u64
}

fn hull_to_hull(a: &Hull, b: &Hull) -> Vec<Contact> {
    let total_radius = a.radius + b.radius;

    let (edge_a, sep_a) = find_max_separation(a, b);
    if sep_a > total_radius {
        return Vec::new();
    }
    let (edge_b, sep_b) = find_max_separation(b, a);
    if sep_b > total_radius {
        return Vec::new();
    }

    // Rounded cores that don't overlap may touch corner to corner, where no face
    // normal is the true contact normal.
    if sep_a.max(sep_b) > 0.0 {
        let (dist, vertex_pair) = closest_vertices(a, b);
        if dist >= total_radius {
            return Vec::new();
        }
        if let Some((pa, pb, hash)) = vertex_pair {
            return circle_to_circle_query(pa, pb, a.radius, b.radius, hash)
                .into_iter()
                .collect();
        }
    }

    let flip = sep_b > sep_a + REFERENCE_TOLERANCE;
    let (reference, incident, ref_edge) = if flip { (b, a, edge_b) } else { (a, b, edge_a) };

    let n = reference.normals[ref_edge];
    let v1 = reference.vert(ref_edge);
    let v2 = reference.vert(ref_edge + 1);

    // Incident edge: the face most anti-parallel to the reference normal.
    let mut inc_edge = 0;
    let mut min_dot = f64::INFINITY;
    for (i, normal) in incident.normals.iter().enumerate() {
        let dot = n.dot(*normal);
        if dot < min_dot {
            min_dot = dot;
            inc_edge = i;
        }
    }
    let inc_next = (inc_edge + 1) % incident.count();
    let points = [
        ClipVertex {
            v: incident.vert(inc_edge),
            id: inc_edge as u32,
        },
        ClipVertex {
            v: incident.vert(inc_next),
            id: inc_next as u32,
        },
    ];

    let tangent = (v2 - v1).normalize_or_zero();
    let Some(points) = clip_segment(points, Plane::from_point_normal(v1, -tangent), CLIP_TAG)
    else {
        return Vec::new();
    };
    let Some(points) = clip_segment(points, Plane::from_point_normal(v2, tangent), CLIP_TAG | 1)
    else {
        return Vec::new();
    };

    let normal = if flip { -n } else { n };
    points
        .iter()
        .filter_map(|cv| {
            let sep = n.dot(cv.v - v1);
            // Keep the lifted end of a resting face so the pair doesn't rock between corners.
            if sep > total_radius + CONTACT_MARGIN {
                return None;
            }
            let depth = total_radius - sep;
            let point = cv.v + n * ((reference.radius - sep - incident.radius) * 0.5);
            let hash = feature_hash(flip, ref_edge as u32, cv.id);
            Some(Contact::new(point, normal, depth, hash))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{allocator::BodyId, math::for_angle};
    use approx::assert_relative_eq;

    fn placed(mut shape: Shape, pos: Vect, angle: f64) -> Shape {
        shape.update(pos, for_angle(angle));
        shape
    }

    fn body() -> BodyId {
        BodyId::new(0, 0)
    }

    #[test]
    fn overlapping_circles_produce_single_contact() {
        let a = placed(Shape::circle(body(), 1.0, Vect::ZERO), Vect::ZERO, 0.0);
        let b = placed(Shape::circle(body(), 1.0, Vect::ZERO), Vect::new(1.5, 0.0), 0.0);

        let contacts = collide(&a, &b);
        assert_eq!(contacts.len(), 1);
        let c = contacts[0];
        assert_relative_eq!(c.depth, 0.5, epsilon = 1e-12);
        assert_relative_eq!(c.n.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(c.p.x, 0.75, epsilon = 1e-12);

        let far = placed(Shape::circle(body(), 1.0, Vect::ZERO), Vect::new(2.5, 0.0), 0.0);
        assert!(collide(&a, &far).is_empty());
    }

    #[test]
    fn swapped_arguments_flip_normal() {
        let circle = placed(Shape::circle(body(), 1.0, Vect::ZERO), Vect::new(0.0, 1.0), 0.0);
        let floor = placed(Shape::boxed(body(), 10.0, 1.0), Vect::ZERO, 0.0);

        let forward = collide(&circle, &floor);
        let backward = collide(&floor, &circle);
        assert_eq!(forward.len(), 1);
        assert_relative_eq!(forward[0].n.y, -1.0, epsilon = 1e-12);
        assert_relative_eq!(backward[0].n.y, 1.0, epsilon = 1e-12);
        assert_relative_eq!(forward[0].depth, 0.5, epsilon = 1e-12);
        assert_relative_eq!(forward[0].p.y, 0.25, epsilon = 1e-12);
    }

    #[test]
    fn circle_against_poly_corner() {
        let boxed = placed(Shape::boxed(body(), 2.0, 2.0), Vect::ZERO, 0.0);
        let circle = placed(Shape::circle(body(), 0.5, Vect::ZERO), Vect::new(1.3, 1.3), 0.0);
        let contacts = collide(&circle, &boxed);
        assert_eq!(contacts.len(), 1);
        let n = contacts[0].n;
        assert_relative_eq!(n.x, n.y, epsilon = 1e-12);
        assert!(n.x < 0.0, "normal points from circle into the box");
    }

    #[test]
    fn box_resting_on_box_gives_two_contacts() {
        let ground = placed(Shape::boxed(body(), 10.0, 1.0), Vect::ZERO, 0.0);
        let crate_box = placed(Shape::boxed(body(), 1.0, 1.0), Vect::new(0.0, 0.9), 0.0);

        let contacts = collide(&ground, &crate_box);
        assert_eq!(contacts.len(), 2);
        for c in &contacts {
            assert_relative_eq!(c.n.y, 1.0, epsilon = 1e-12);
            assert_relative_eq!(c.depth, 0.1, epsilon = 1e-9);
        }
        assert_ne!(contacts[0].hash, contacts[1].hash);
    }

    #[test]
    fn slightly_tilted_box_keeps_its_lifted_corner() {
        let ground = placed(Shape::boxed(body(), 10.0, 1.0), Vect::ZERO, 0.0);
        let angle: f64 = 0.05;
        let (sin, cos) = angle.sin_cos();
        let low = 0.5 * sin + 0.5 * cos;
        let high = -0.5 * sin + 0.5 * cos;
        let tilted = placed(Shape::boxed(body(), 1.0, 1.0), Vect::new(0.0, 0.5 + low - 0.01), angle);

        let mut depths: Vec<f64> = collide(&ground, &tilted).iter().map(|c| c.depth).collect();
        depths.sort_by(f64::total_cmp);
        assert_eq!(depths.len(), 2);
        assert_relative_eq!(depths[1], 0.01, epsilon = 1e-9);
        assert_relative_eq!(depths[0], 0.01 - (low - high), epsilon = 1e-9);
        assert!(depths[0] < 0.0);
    }

    #[test]
    fn rotated_box_corner_gives_one_contact() {
        let ground = placed(Shape::boxed(body(), 10.0, 1.0), Vect::ZERO, 0.0);
        let diamond = placed(
            Shape::boxed(body(), 1.0, 1.0),
            Vect::new(0.0, 0.5 + std::f64::consts::SQRT_2 * 0.5 - 0.05),
            std::f64::consts::FRAC_PI_4,
        );
        let contacts = collide(&ground, &diamond);
        assert_eq!(contacts.len(), 1);
        assert_relative_eq!(contacts[0].depth, 0.05, epsilon = 1e-9);
    }

    #[test]
    fn capsule_end_to_end_uses_vertex_normal() {
        let a = placed(
            Shape::segment(body(), Vect::new(-1.0, 0.0), Vect::new(1.0, 0.0), 0.5),
            Vect::ZERO,
            0.0,
        );
        let b = placed(
            Shape::segment(body(), Vect::new(-1.0, 0.0), Vect::new(1.0, 0.0), 0.5),
            Vect::new(2.6, 0.6),
            0.0,
        );
        let contacts = collide(&a, &b);
        assert_eq!(contacts.len(), 1);
        let n = contacts[0].n;
        assert_relative_eq!(n.x, 0.6 / 0.6f64.hypot(0.6), epsilon = 1e-9);
        assert_relative_eq!(n.y, 0.6 / 0.6f64.hypot(0.6), epsilon = 1e-9);

        let apart = placed(
            Shape::segment(body(), Vect::new(-1.0, 0.0), Vect::new(1.0, 0.0), 0.5),
            Vect::new(2.8, 0.8),
            0.0,
        );
        assert!(collide(&a, &apart).is_empty(), "corner gap exceeds the radii");
    }

    #[test]
    fn circle_on_segment_respects_neighbor_tangent() {
        let mut seg = Shape::segment(body(), Vect::new(0.0, 0.0), Vect::new(2.0, 0.0), 0.0);
        seg.update(Vect::ZERO, Vect::X);
        let circle = placed(Shape::circle(body(), 0.5, Vect::ZERO), Vect::new(-0.3, 0.3), 0.0);
        assert_eq!(collide(&circle, &seg).len(), 1);

        seg.set_neighbors(Vect::new(-2.0, 0.0), Vect::new(4.0, 0.0));
        seg.update(Vect::ZERO, Vect::X);
        assert!(collide(&circle, &seg).is_empty());
    }
}
