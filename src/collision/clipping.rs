use crate::utils::math::Vect;

/// Point produced while clipping, tagged with the feature it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipVertex {
    pub v: Vect,
    pub id: u32,
}

/// Half-plane `normal · x <= distance`.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    normal: Vect,
    distance: f64,
}

impl Plane {
    pub fn from_point_normal(point: Vect, normal: Vect) -> Self {
        let n = normal.normalize_or_zero();
        Self {
            normal: n,
            distance: n.dot(point),
        }
    }

    pub fn signed_distance(&self, point: Vect) -> f64 {
        self.normal.dot(point) - self.distance
    }
}

/// Clips a two-point segment against `plane`, keeping the part behind it.
///
/// Returns `None` if fewer than two points survive. Points created at the
/// intersection take `clip_id` as their feature id.
pub fn clip_segment(points: [ClipVertex; 2], plane: Plane, clip_id: u32) -> Option<[ClipVertex; 2]> {
    let [first, second] = points;
    let d0 = plane.signed_distance(first.v);
    let d1 = plane.signed_distance(second.v);

    let mut out = [first; 2];
    let mut count = 0;

    if d0 <= 0.0 {
        out[count] = first;
        count += 1;
    }
    if d1 <= 0.0 {
        out[count] = second;
        count += 1;
    }

    if d0 * d1 < 0.0 {
        let alpha = d0 / (d0 - d1);
        out[count] = ClipVertex {
            v: first.v + (second.v - first.v) * alpha,
            id: clip_id,
        };
        count += 1;
    }

    (count == 2).then_some(out)
}
