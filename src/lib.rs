//! Clump physics
//!
//! A small CPU rigid-body core for box-bounded bodies that can be clustered into
//! groups sharing one collision response.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **geometry** - Object-space mesh data handed in by the host, boxes
//! 2. **physics** - Bodies, groups, bounding volumes, SAT detection, impulse resolution
//! 3. **error** - Construction errors
//!
//! Rendering, asset loading and scene scripting stay with the host, which reads
//! back each body's world transform after [`PhysicsWorld::tick`].

pub mod error;
pub mod geometry;
pub mod physics;

// Re-export commonly used types
pub use error::PhysicsError;

pub use geometry::{Aabb, MeshData, Vertex};

pub use physics::bounding::{BoundingType, BoundingVolume};
pub use physics::contact::ContactReport;
pub use physics::group::{BodyHandle, Group, GroupHandle};
pub use physics::rigid_body::{BodyDesc, Mass, RigidBody, StepOutcome};
pub use physics::{PhysicsConfig, PhysicsWorld};

// Re-export glam for convenience
pub use glam;
