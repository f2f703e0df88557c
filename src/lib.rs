//! Particle Accelerator 2D – a rigid-body physics engine for Rust.
//!
//! Bodies carry mass and motion, shapes attached to them collide, and joints
//! constrain pairs of bodies. A [`Space`] owns all of them and advances the
//! simulation with a sequential-impulse solver that keeps contact impulses
//! between steps, so stacks settle quickly and idle groups of bodies can fall
//! asleep.
//!
//! ```
//! use particle_accelerator_2d::{Body, Shape, Space, Vect};
//!
//! let mut space = Space::new();
//! space.set_gravity(Vect::new(0.0, -100.0));
//!
//! let ground = space.static_body();
//! space.add_shape(Shape::segment(ground, Vect::new(-20.0, 0.0), Vect::new(20.0, 0.0), 0.0));
//!
//! let mut ball = Body::new(1.0, particle_accelerator_2d::moment_for_circle(1.0, 0.0, 1.0, Vect::ZERO));
//! ball.p = Vect::new(0.0, 10.0);
//! let ball = space.add_body(ball);
//! space.add_shape(Shape::circle(ball, 1.0, Vect::ZERO));
//!
//! for _ in 0..120 {
//!     space.step(1.0 / 60.0);
//! }
//! assert!(space.body(ball).map_or(false, |b| b.p.y < 10.0));
//! ```

pub mod collision;
pub mod config;
pub mod core;
pub(crate) mod dynamics;
pub mod error;
pub mod space;
pub mod utils;

pub use collision::{
    Arbiter, ArbiterState, ContactPoint, ContactPointSet, NearestPointQueryInfo, SegmentQueryInfo,
    ShapeQueryInfo,
};
pub use config::{IndexStrategy, SpaceConfig};
pub use core::{
    constraints::{
        default_spring_force, default_spring_torque, DampedRotarySpring, DampedSpring, GearJoint,
        GrooveJoint, PinJoint, PivotJoint, RatchetJoint, RotaryLimitJoint, SimpleMotor, SlideJoint,
        SpringForceFunc, SpringTorqueFunc,
    },
    Body, CollisionFilter, CollisionType, Constraint, ConstraintKind, Group, Layers, Material,
    PositionFunc, Shape, ShapeGeometry, ShapeKind, SpaceId, VelocityFunc, BB,
};
pub use error::{GeometryError, GeometryResult, SpaceError};
pub use space::{CollisionHandler, PostStepKey, Space};
pub use utils::{
    allocator::{Arena, BodyId, ConstraintId, GenerationalId, ShapeId},
    mass::{
        area_for_circle, area_for_poly, area_for_segment, centroid_for_poly, moment_for_box,
        moment_for_box2, moment_for_circle, moment_for_poly, moment_for_segment, recenter_poly,
    },
    math::{for_angle, Vect, VectExt},
    polygon::{convex_hull, poly_validate},
    profiling::StepProfile,
};
