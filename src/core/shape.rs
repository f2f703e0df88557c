use serde::{Deserialize, Serialize};

use crate::{
    collision::queries::{self, NearestPointQueryInfo, SegmentQueryInfo},
    core::{
        bb::BB,
        body::Body,
        types::{CollisionFilter, CollisionType, Group, Layers, Material, SpaceId},
    },
    error::{GeometryError, GeometryResult},
    utils::{
        allocator::{BodyId, ShapeId},
        math::Vect,
        polygon::poly_validate,
    },
};

/// Discriminant of a shape, ordered the way narrow-phase routines expect their inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Circle,
    Segment,
    Poly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleGeometry {
    offset: Vect,
    radius: f64,
    tc: Vect,
}

impl CircleGeometry {
    /// Center in body-local coordinates.
    pub fn offset(&self) -> Vect {
        self.offset
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Center in world coordinates as of the last [`Shape::update`].
    pub fn world_center(&self) -> Vect {
        self.tc
    }
}

/// Line segment with rounded ends of the given radius.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentGeometry {
    a: Vect,
    b: Vect,
    n: Vect,
    radius: f64,
    a_tangent: Vect,
    b_tangent: Vect,
    ta: Vect,
    tb: Vect,
    tn: Vect,
    t_a_tangent: Vect,
    t_b_tangent: Vect,
}

impl SegmentGeometry {
    pub fn a(&self) -> Vect {
        self.a
    }

    pub fn b(&self) -> Vect {
        self.b
    }

    /// Body-local normal, `perp(b - a)` normalized.
    pub fn normal(&self) -> Vect {
        self.n
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn world_a(&self) -> Vect {
        self.ta
    }

    pub fn world_b(&self) -> Vect {
        self.tb
    }

    pub fn world_normal(&self) -> Vect {
        self.tn
    }

    /// World-space direction from `a` towards the previous neighbour's endpoint.
    pub(crate) fn a_tangent(&self) -> Vect {
        self.t_a_tangent
    }

    pub(crate) fn b_tangent(&self) -> Vect {
        self.t_b_tangent
    }
}

/// Convex polygon with clockwise winding. Edge `i` runs from vertex `i` to `i + 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolyGeometry {
    verts: Vec<Vect>,
    normals: Vec<Vect>,
    radius: f64,
    t_verts: Vec<Vect>,
    t_normals: Vec<Vect>,
}

impl PolyGeometry {
    fn new(verts: Vec<Vect>, radius: f64) -> Self {
        let count = verts.len();
        let normals: Vec<Vect> = (0..count)
            .map(|i| (verts[(i + 1) % count] - verts[i]).normalize_or_zero().perp())
            .collect();
        Self {
            t_verts: verts.clone(),
            t_normals: normals.clone(),
            verts,
            normals,
            radius,
        }
    }

    pub fn count(&self) -> usize {
        self.verts.len()
    }

    pub fn vert(&self, index: usize) -> Vect {
        self.verts[index]
    }

    pub fn verts(&self) -> &[Vect] {
        &self.verts
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn world_verts(&self) -> &[Vect] {
        &self.t_verts
    }

    pub fn world_normals(&self) -> &[Vect] {
        &self.t_normals
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeGeometry {
    Circle(CircleGeometry),
    Segment(SegmentGeometry),
    Poly(PolyGeometry),
}

impl ShapeGeometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            ShapeGeometry::Circle(_) => ShapeKind::Circle,
            ShapeGeometry::Segment(_) => ShapeKind::Segment,
            ShapeGeometry::Poly(_) => ShapeKind::Poly,
        }
    }
}

/// Collision geometry attached to a body.
#[derive(Debug, Clone)]
pub struct Shape {
    pub(crate) id: Option<ShapeId>,
    pub(crate) space: Option<SpaceId>,
    body: BodyId,
    geometry: ShapeGeometry,
    bb: BB,

    pub material: Material,
    /// Sensors report collisions to handlers but never generate a physical response.
    pub sensor: bool,
    pub collision_type: CollisionType,
    pub filter: CollisionFilter,
}

impl Shape {
    fn with_geometry(body: BodyId, geometry: ShapeGeometry) -> Self {
        Self {
            id: None,
            space: None,
            body,
            geometry,
            bb: BB::default(),
            material: Material::default(),
            sensor: false,
            collision_type: CollisionType::default(),
            filter: CollisionFilter::default(),
        }
    }

    /// Circle of `radius` centered at `offset` in body coordinates.
    pub fn circle(body: BodyId, radius: f64, offset: Vect) -> Self {
        Self::with_geometry(
            body,
            ShapeGeometry::Circle(CircleGeometry {
                offset,
                radius,
                tc: offset,
            }),
        )
    }

    /// Segment from `a` to `b` in body coordinates, rounded by `radius`.
    pub fn segment(body: BodyId, a: Vect, b: Vect, radius: f64) -> Self {
        let n = (b - a).normalize_or_zero().perp();
        Self::with_geometry(
            body,
            ShapeGeometry::Segment(SegmentGeometry {
                a,
                b,
                n,
                radius,
                a_tangent: Vect::ZERO,
                b_tangent: Vect::ZERO,
                ta: a,
                tb: b,
                tn: n,
                t_a_tangent: Vect::ZERO,
                t_b_tangent: Vect::ZERO,
            }),
        )
    }

    /// Convex polygon from clockwise `verts`, each translated by `offset`.
    pub fn poly(body: BodyId, verts: &[Vect], offset: Vect) -> GeometryResult<Self> {
        Self::poly_with_radius(body, verts, offset, 0.0)
    }

    /// Polygon whose edges are rounded by `radius`.
    pub fn poly_with_radius(
        body: BodyId,
        verts: &[Vect],
        offset: Vect,
        radius: f64,
    ) -> GeometryResult<Self> {
        let verts = Self::checked_verts(verts, offset)?;
        Ok(Self::with_geometry(
            body,
            ShapeGeometry::Poly(PolyGeometry::new(verts, radius)),
        ))
    }

    /// Box of the given size centered on the body.
    pub fn boxed(body: BodyId, width: f64, height: f64) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::box_bb(body, BB::new(-hw, -hh, hw, hh))
    }

    /// Box covering `bb` in body coordinates.
    pub fn box_bb(body: BodyId, bb: BB) -> Self {
        let verts = vec![
            Vect::new(bb.l, bb.b),
            Vect::new(bb.l, bb.t),
            Vect::new(bb.r, bb.t),
            Vect::new(bb.r, bb.b),
        ];
        Self::with_geometry(body, ShapeGeometry::Poly(PolyGeometry::new(verts, 0.0)))
    }

    fn checked_verts(verts: &[Vect], offset: Vect) -> GeometryResult<Vec<Vect>> {
        if verts.len() < 3 {
            return Err(GeometryError::TooFewVertices { count: verts.len() });
        }
        if !poly_validate(verts) {
            return Err(GeometryError::NotConvexClockwise);
        }
        Ok(verts.iter().map(|&v| v + offset).collect())
    }

    pub fn id(&self) -> Option<ShapeId> {
        self.id
    }

    pub fn space(&self) -> Option<SpaceId> {
        self.space
    }

    pub fn body(&self) -> BodyId {
        self.body
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn geometry(&self) -> &ShapeGeometry {
        &self.geometry
    }

    /// Bounding box as of the last [`Shape::update`] or [`Shape::cache_bb`].
    pub fn bb(&self) -> BB {
        self.bb
    }

    pub fn elasticity(&self) -> f64 {
        self.material.elasticity
    }

    pub fn set_elasticity(&mut self, elasticity: f64) {
        self.material.elasticity = elasticity;
    }

    pub fn friction(&self) -> f64 {
        self.material.friction
    }

    pub fn set_friction(&mut self, friction: f64) {
        self.material.friction = friction;
    }

    pub fn surface_velocity(&self) -> Vect {
        self.material.surface_velocity
    }

    pub fn set_surface_velocity(&mut self, surface_velocity: Vect) {
        self.material.surface_velocity = surface_velocity;
    }

    pub fn group(&self) -> Group {
        self.filter.group
    }

    pub fn set_group(&mut self, group: Group) {
        self.filter.group = group;
    }

    pub fn layers(&self) -> Layers {
        self.filter.layers
    }

    pub fn set_layers(&mut self, layers: Layers) {
        self.filter.layers = layers;
    }

    /// Replaces a polygon's vertices. Panics if the shape is not a polygon.
    pub fn set_verts(&mut self, verts: &[Vect], offset: Vect) -> GeometryResult<()> {
        let verts = Self::checked_verts(verts, offset)?;
        match &mut self.geometry {
            ShapeGeometry::Poly(poly) => {
                *poly = PolyGeometry::new(verts, poly.radius);
                Ok(())
            }
            _ => panic!("set_verts called on a shape that is not a polygon"),
        }
    }

    pub fn set_radius(&mut self, radius: f64) {
        match &mut self.geometry {
            ShapeGeometry::Circle(circle) => circle.radius = radius,
            ShapeGeometry::Segment(seg) => seg.radius = radius,
            ShapeGeometry::Poly(poly) => poly.radius = radius,
        }
    }

    /// Moves a circle's center; panics for other kinds.
    pub fn set_circle_offset(&mut self, offset: Vect) {
        match &mut self.geometry {
            ShapeGeometry::Circle(circle) => circle.offset = offset,
            _ => panic!("set_circle_offset called on a shape that is not a circle"),
        }
    }

    /// Moves a segment's endpoints; panics for other kinds.
    pub fn set_endpoints(&mut self, a: Vect, b: Vect) {
        match &mut self.geometry {
            ShapeGeometry::Segment(seg) => {
                seg.a = a;
                seg.b = b;
                seg.n = (b - a).normalize_or_zero().perp();
            }
            _ => panic!("set_endpoints called on a shape that is not a segment"),
        }
    }

    /// Tells a segment about the neighbouring segments' far endpoints so circles rolling
    /// across the joint don't catch on its end caps. Panics for other kinds.
    pub fn set_neighbors(&mut self, prev: Vect, next: Vect) {
        match &mut self.geometry {
            ShapeGeometry::Segment(seg) => {
                seg.a_tangent = prev - seg.a;
                seg.b_tangent = next - seg.b;
            }
            _ => panic!("set_neighbors called on a shape that is not a segment"),
        }
    }

    /// Recomputes the world geometry and bounding box from the body's transform.
    pub fn cache_bb(&mut self, body: &Body) -> BB {
        self.update(body.p, body.rotation())
    }

    /// Recomputes the world geometry and bounding box for position `pos` and unit rotation `rot`.
    pub fn update(&mut self, pos: Vect, rot: Vect) -> BB {
        self.bb = match &mut self.geometry {
            ShapeGeometry::Circle(circle) => {
                circle.tc = pos + rot.rotate(circle.offset);
                BB::for_circle(circle.tc, circle.radius)
            }
            ShapeGeometry::Segment(seg) => {
                seg.ta = pos + rot.rotate(seg.a);
                seg.tb = pos + rot.rotate(seg.b);
                seg.tn = rot.rotate(seg.n);
                seg.t_a_tangent = rot.rotate(seg.a_tangent);
                seg.t_b_tangent = rot.rotate(seg.b_tangent);

                let (l, r) = min_max(seg.ta.x, seg.tb.x);
                let (b, t) = min_max(seg.ta.y, seg.tb.y);
                let rad = seg.radius;
                BB::new(l - rad, b - rad, r + rad, t + rad)
            }
            ShapeGeometry::Poly(poly) => {
                let mut bb = BB::new(
                    f64::INFINITY,
                    f64::INFINITY,
                    f64::NEG_INFINITY,
                    f64::NEG_INFINITY,
                );
                for (local, world) in poly.verts.iter().zip(poly.t_verts.iter_mut()) {
                    *world = pos + rot.rotate(*local);
                    bb = bb.expand(*world);
                }
                for (local, world) in poly.normals.iter().zip(poly.t_normals.iter_mut()) {
                    *world = rot.rotate(*local);
                }
                let rad = poly.radius;
                BB::new(bb.l - rad, bb.b - rad, bb.r + rad, bb.t + rad)
            }
        };
        self.bb
    }

    /// Distance from `p` to the shape's surface; negative inside.
    pub fn nearest_point_query(&self, p: Vect) -> NearestPointQueryInfo {
        let (point, distance, gradient) = match &self.geometry {
            ShapeGeometry::Circle(circle) => queries::circle_nearest_point(circle.tc, circle.radius, p),
            ShapeGeometry::Segment(seg) => {
                queries::segment_nearest_point(seg.ta, seg.tb, seg.tn, seg.radius, p)
            }
            ShapeGeometry::Poly(poly) => {
                queries::poly_nearest_point(&poly.t_verts, &poly.t_normals, poly.radius, p)
            }
        };

        NearestPointQueryInfo {
            shape: self.id,
            point,
            distance,
            gradient,
        }
    }

    pub fn point_query(&self, p: Vect) -> bool {
        self.nearest_point_query(p).distance < 0.0
    }

    /// First intersection of the directed segment `a`-`b` with the shape.
    pub fn segment_query(&self, a: Vect, b: Vect) -> Option<SegmentQueryInfo> {
        let hit = match &self.geometry {
            ShapeGeometry::Circle(circle) => {
                queries::circle_segment_query(circle.tc, circle.radius, a, b)
            }
            ShapeGeometry::Segment(seg) => {
                queries::segment_segment_query(seg.ta, seg.tb, seg.tn, seg.radius, a, b)
            }
            ShapeGeometry::Poly(poly) => {
                queries::poly_segment_query(&poly.t_verts, &poly.t_normals, poly.radius, a, b)
            }
        };

        hit.map(|(t, n)| SegmentQueryInfo {
            shape: self.id,
            t,
            n,
        })
    }
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}
