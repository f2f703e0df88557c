//! Utility helpers: math extensions, the generational arena, geometry helpers,
//! logging and profiling.

pub mod allocator;
pub mod logging;
pub mod mass;
pub mod math;
pub mod polygon;
pub mod profiling;

pub use allocator::{Arena, BodyId, ConstraintId, GenerationalId, ShapeId};
pub use math::*;
