//! Bodies, shapes, joints and the small value types they share.

pub mod bb;
pub mod body;
pub mod constraints;
pub mod shape;
pub mod types;

pub use bb::BB;
pub use body::{Body, PositionFunc, VelocityFunc};
pub use constraints::{Constraint, ConstraintKind};
pub use shape::{Shape, ShapeGeometry, ShapeKind};
pub use types::{CollisionFilter, CollisionType, Group, Layers, Material, MaterialPair, SpaceId};
