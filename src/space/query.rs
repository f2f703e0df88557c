//! Spatial queries against every shape of a space, awake, sleeping and static.

use super::Space;
use crate::{
    collision::{
        arbiter::{ContactPoint, ContactPointSet},
        broadphase::SpatialIndex,
        narrowphase,
        queries::{NearestPointQueryInfo, SegmentQueryInfo, ShapeQueryInfo},
    },
    core::{bb::BB, shape::Shape, types::CollisionFilter},
    utils::{allocator::ShapeId, math::Vect},
};

impl Space {
    /// Shapes from both indexes whose bounds overlap `bb`, in id order.
    fn shapes_in_bb(&self, bb: BB) -> Vec<ShapeId> {
        let mut ids = self.active_shapes.query(bb);
        ids.extend(self.static_shapes.query(bb));
        ids.sort_unstable();
        ids
    }

    fn filtered<'a>(
        &'a self,
        ids: Vec<ShapeId>,
        filter: &'a CollisionFilter,
    ) -> impl Iterator<Item = (ShapeId, &'a Shape)> + 'a {
        ids.into_iter().filter_map(move |id| {
            self.shapes
                .get(id)
                .filter(|shape| !shape.filter.rejects(filter))
                .map(|shape| (id, shape))
        })
    }

    /// Shapes containing `point`.
    pub fn point_query(&self, point: Vect, filter: CollisionFilter) -> Vec<ShapeId> {
        let bb = BB::new(point.x, point.y, point.x, point.y);
        self.filtered(self.shapes_in_bb(bb), &filter)
            .filter(|(_, shape)| shape.point_query(point))
            .map(|(id, _)| id)
            .collect()
    }

    /// First non-sensor shape containing `point`.
    pub fn point_query_first(&self, point: Vect, filter: CollisionFilter) -> Option<ShapeId> {
        self.point_query(point, filter)
            .into_iter()
            .find(|&id| self.shapes.get(id).is_some_and(|shape| !shape.sensor))
    }

    /// Shapes within `max_distance` of `point`, with the nearest point on each.
    pub fn nearest_point_query(
        &self,
        point: Vect,
        max_distance: f64,
        filter: CollisionFilter,
    ) -> Vec<NearestPointQueryInfo> {
        let bb = BB::for_circle(point, max_distance.max(0.0));
        self.filtered(self.shapes_in_bb(bb), &filter)
            .map(|(_, shape)| shape.nearest_point_query(point))
            .filter(|info| info.distance < max_distance)
            .collect()
    }

    /// Closest non-sensor shape within `max_distance` of `point`.
    pub fn nearest_point_query_nearest(
        &self,
        point: Vect,
        max_distance: f64,
        filter: CollisionFilter,
    ) -> Option<NearestPointQueryInfo> {
        self.nearest_point_query(point, max_distance, filter)
            .into_iter()
            .filter(|info| {
                info.shape
                    .and_then(|id| self.shapes.get(id))
                    .is_some_and(|shape| !shape.sensor)
            })
            .min_by(|x, y| x.distance.total_cmp(&y.distance))
    }

    /// Every shape crossed by the segment `a -> b`, nearest first.
    pub fn segment_query(&self, a: Vect, b: Vect, filter: CollisionFilter) -> Vec<SegmentQueryInfo> {
        let mut ids = self.active_shapes.segment_query(a, b);
        ids.extend(self.static_shapes.segment_query(a, b));

        let mut hits: Vec<SegmentQueryInfo> = self
            .filtered(ids, &filter)
            .filter_map(|(_, shape)| shape.segment_query(a, b))
            .collect();
        hits.sort_by(|x, y| x.t.total_cmp(&y.t).then(x.shape.cmp(&y.shape)));
        hits
    }

    /// First non-sensor shape crossed by the segment `a -> b`.
    pub fn segment_query_first(&self, a: Vect, b: Vect, filter: CollisionFilter) -> Option<SegmentQueryInfo> {
        self.segment_query(a, b, filter).into_iter().find(|info| {
            info.shape
                .and_then(|id| self.shapes.get(id))
                .is_some_and(|shape| !shape.sensor)
        })
    }

    /// Shapes whose bounding box overlaps `bb`.
    pub fn bb_query(&self, bb: BB, filter: CollisionFilter) -> Vec<ShapeId> {
        self.filtered(self.shapes_in_bb(bb), &filter)
            .filter(|(_, shape)| shape.bb().intersects(&bb))
            .map(|(id, _)| id)
            .collect()
    }

    /// Shapes overlapping `shape`, with the contacts they would generate.
    ///
    /// The shape does not need to be in the space. If its body is registered here,
    /// its geometry is refreshed from the body first; shapes on the same body and
    /// the shape itself are skipped.
    pub fn shape_query(&self, shape: &Shape) -> Vec<ShapeQueryInfo> {
        let mut query = shape.clone();
        if let Some(body) = self.bodies.get(query.body()) {
            query.cache_bb(body);
        }

        self.shapes_in_bb(query.bb())
            .into_iter()
            .filter_map(|id| self.shapes.get(id).map(|other| (id, other)))
            .filter(|(id, other)| {
                query.id != Some(*id)
                    && other.body() != query.body()
                    && !other.filter.rejects(&query.filter)
            })
            .filter_map(|(id, other)| {
                let points: Vec<ContactPoint> = narrowphase::collide(&query, other)
                    .iter()
                    .filter(|c| c.depth >= 0.0)
                    .map(|c| ContactPoint {
                        point: c.p,
                        normal: c.n,
                        depth: c.depth,
                    })
                    .collect();
                if points.is_empty() {
                    return None;
                }
                Some(ShapeQueryInfo {
                    shape: id,
                    contacts: ContactPointSet { points },
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            bb::BB,
            body::Body,
            shape::Shape,
            types::{CollisionFilter, Layers},
        },
        utils::math::Vect,
        Space,
    };
    use approx::assert_relative_eq;

    fn space_with_ground() -> (Space, crate::utils::allocator::ShapeId) {
        let mut space = Space::new();
        let ground = space.static_body();
        let id = space.add_shape(Shape::segment(ground, Vect::new(-10.0, 0.0), Vect::new(10.0, 0.0), 0.0));
        (space, id)
    }

    #[test]
    fn ray_hits_the_ground() {
        let (space, ground) = space_with_ground();
        let hit = space
            .segment_query_first(Vect::new(0.0, 5.0), Vect::new(0.0, -5.0), CollisionFilter::ALL)
            .expect("ray crosses the ground");
        assert_eq!(hit.shape, Some(ground));
        assert_relative_eq!(hit.t, 0.5, epsilon = 1e-9);
        assert_relative_eq!(hit.n.y, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn empty_layers_never_match() {
        let (space, _) = space_with_ground();
        let filter = CollisionFilter {
            layers: Layers::NONE,
            ..CollisionFilter::ALL
        };
        assert!(space.bb_query(BB::new(-1.0, -1.0, 1.0, 1.0), filter).is_empty());
        assert!(space.segment_query(Vect::new(0.0, 5.0), Vect::new(0.0, -5.0), filter).is_empty());
    }

    #[test]
    fn nearest_point_reports_distance() {
        let mut space = Space::new();
        let body = space.add_body(Body::new(1.0, 1.0));
        let circle = space.add_shape(Shape::circle(body, 1.0, Vect::ZERO));

        let info = space
            .nearest_point_query_nearest(Vect::new(3.0, 0.0), 5.0, CollisionFilter::ALL)
            .expect("circle is in range");
        assert_eq!(info.shape, Some(circle));
        assert_relative_eq!(info.distance, 2.0, epsilon = 1e-9);
        assert!(space.nearest_point_query(Vect::new(3.0, 0.0), 1.5, CollisionFilter::ALL).is_empty());

        assert_eq!(space.point_query(Vect::new(0.5, 0.0), CollisionFilter::ALL), vec![circle]);
        assert!(space.point_query_first(Vect::new(1.5, 0.0), CollisionFilter::ALL).is_none());
    }

    #[test]
    fn shape_query_finds_overlaps() {
        let (space, ground) = space_with_ground();
        let mut probe_body = Body::new(1.0, 1.0);
        probe_body.p = Vect::new(0.0, 0.5);
        let mut probe = Shape::circle(crate::utils::allocator::BodyId::new(99, 0), 1.0, Vect::ZERO);
        probe.cache_bb(&probe_body);

        let hits = space.shape_query(&probe);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].shape, ground);
        assert_relative_eq!(hits[0].contacts.points[0].depth, 0.5, epsilon = 1e-9);
    }
}
