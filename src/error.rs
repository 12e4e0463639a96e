//! Error types.
use thiserror::Error;

/// Errors raised while validating grid construction input.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum GridError {
    #[error("grid dimensions must be non-zero, got {x}x{y}x{z}")]
    EmptyDimensions { x: u32, y: u32, z: u32 },

    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),

    #[error("grid of {0} cells exceeds the addressable range")]
    TooLarge(u64),
}

/// Errors raised by collision queries.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CollisionError {
    #[error("collider shape {0} is not supported")]
    UnsupportedShape(crate::collision::ColliderKind),
}
