//! Error types for recoverable engine failures.
//!
//! Misuse of the API (removing an object that was never added, mutating a locked
//! space, stale handles) panics instead; these errors cover conditions a caller is
//! expected to check.

use thiserror::Error;

use crate::space::PostStepKey;

/// Errors raised while building shape geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    /// A polygon needs at least three vertices.
    #[error("Polygon needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },

    /// Vertices must describe a convex polygon with clockwise winding.
    #[error("Polygon is concave or has a counter-clockwise winding")]
    NotConvexClockwise,
}

/// Errors raised by space operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpaceError {
    /// A post-step callback is already pending for this key.
    #[error("A post-step callback is already registered for key {0:?}")]
    PostStepKeyInUse(PostStepKey),
}

/// Result type for shape construction.
pub type GeometryResult<T> = std::result::Result<T, GeometryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GeometryError::TooFewVertices { count: 2 };
        assert_eq!(format!("{err}"), "Polygon needs at least 3 vertices, got 2");

        let err = SpaceError::PostStepKeyInUse(PostStepKey::User(7));
        assert!(format!("{err}").contains("User(7)"));
    }
}
