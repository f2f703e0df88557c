//! Collision detection: broad-phase indexes, narrow-phase routines, arbiters and queries.

pub mod arbiter;
pub mod bbtree;
pub mod broadphase;
pub(crate) mod clipping;
pub mod narrowphase;
pub mod queries;
pub mod spatial_hash;

pub use arbiter::{Arbiter, ArbiterState, Contact, ContactPoint, ContactPointSet};
pub use broadphase::{BroadPhase, SpatialIndex};
pub use queries::{NearestPointQueryInfo, SegmentQueryInfo, ShapeQueryInfo};
