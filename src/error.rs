//! Error types for scene construction.

use thiserror::Error;

use crate::physics::group::{BodyHandle, GroupHandle};

/// Errors raised while building or addressing a physics scene.
///
/// Simulation itself never fails: degenerate runtime input is skipped.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("mass must be positive and finite, got {0}")]
    InvalidMass(f32),

    #[error("restitution must lie in [0, 1], got {0}")]
    InvalidRestitution(f32),

    #[error("friction must be non-negative and finite, got {0}")]
    InvalidFriction(f32),

    #[error("a group needs at least one body")]
    EmptyGroup,

    #[error("unknown body handle {0:?}")]
    UnknownBody(BodyHandle),

    #[error("unknown group handle {0:?}")]
    UnknownGroup(GroupHandle),

    #[error("body {0:?} already belongs to a group")]
    BodyAlreadyGrouped(BodyHandle),

    #[error("vertex buffer of {len} bytes is not a multiple of the {stride}-byte vertex stride")]
    MalformedVertexBuffer { len: usize, stride: usize },
}
