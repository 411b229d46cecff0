//! Geometry consumed by the physics core
//!
//! Meshes are supplied by the host as read-only object-space vertex lists.
//! The physics core only ever reads them to fit bounding volumes.

mod mesh;

pub use mesh::{MeshData, Vertex};

use glam::{Mat4, Vec3};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a new AABB.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from a set of points.
    ///
    /// Returns `None` when the iterator is empty.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Get the center of the AABB.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size of the AABB.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Half of the size along each axis.
    pub fn half_extents(&self) -> Vec3 {
        self.size() * 0.5
    }

    /// Transform mapping the unit cube `[-1, 1]^3` onto this box.
    pub fn unit_cube_transform(&self) -> Mat4 {
        Mat4::from_translation(self.center()) * Mat4::from_scale(self.half_extents())
    }

    /// This box scaled about its center, keeping every half extent at least `min_half`.
    pub fn scaled(&self, scale: Vec3, min_half: f32) -> Self {
        let center = self.center();
        let half = (self.half_extents() * scale).max(Vec3::splat(min_half));
        Self::new(center - half, center + half)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self {
            min: Vec3::ZERO,
            max: Vec3::ZERO,
        }
    }
}
