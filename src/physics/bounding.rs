//! Oriented bounding boxes used for collision detection.

use glam::{Mat3, Mat4, Vec3};

use crate::geometry::{Aabb, MeshData};

/// Boxes thinner than this are padded so their transform stays invertible.
const MIN_HALF_EXTENT: f32 = 1e-4;

/// Corners of the unit cube `[-1, 1]^3`. Bit 0 selects x, bit 1 y, bit 2 z.
pub const UNIT_CORNERS: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, 1.0, 1.0),
];

/// The 12 cube edges as index pairs into [`UNIT_CORNERS`].
pub const BOX_EDGES: [(usize, usize); 12] = [
    // Along x
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    // Along y
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    // Along z
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// How a body's bounding box is derived from its mesh each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundingType {
    /// The body transform itself, for meshes that are the canonical `[-1, 1]` box.
    Exact,
    /// An object-space box fit once to the mesh, rotating rigidly with the body.
    #[default]
    Model,
    /// World-space min/max of the transformed vertices, refit every tick.
    AxisAligned,
}

/// A world-space box: transform of the unit cube, its corners and its face normals.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingVolume {
    transform: Mat4,
    corners: [Vec3; 8],
    normals: Vec<Vec3>,
}

impl BoundingVolume {
    /// Build the volume for one tick.
    ///
    /// `model_box` is the body's cached object-space box and is only read for
    /// [`BoundingType::Model`]. Returns `None` for an empty mesh or a transform
    /// that collapses the box.
    pub fn build(
        kind: BoundingType,
        body_transform: Mat4,
        bounding_scale: Vec3,
        mesh: &MeshData,
        model_box: Option<Aabb>,
        tolerance: f32,
    ) -> Option<Self> {
        if mesh.is_empty() {
            return None;
        }

        let transform = match kind {
            BoundingType::Exact => body_transform * Mat4::from_scale(bounding_scale),
            BoundingType::Model => {
                let model_box = model_box?.scaled(bounding_scale, MIN_HALF_EXTENT);
                body_transform * model_box.unit_cube_transform()
            }
            BoundingType::AxisAligned => {
                let world = Aabb::from_points(
                    mesh.positions()
                        .iter()
                        .map(|p| body_transform.transform_point3(*p)),
                )?;
                world.scaled(bounding_scale, MIN_HALF_EXTENT).unit_cube_transform()
            }
        };

        Self::from_transform(transform, tolerance)
    }

    /// Derive corners and unique face normals from a unit-cube transform.
    pub fn from_transform(transform: Mat4, tolerance: f32) -> Option<Self> {
        let linear = Mat3::from_mat4(transform);
        // Invertibility relative to the column lengths
        let scale = linear.x_axis.length() * linear.y_axis.length() * linear.z_axis.length();
        if !transform.is_finite() || linear.determinant().abs() <= f32::EPSILON * scale {
            tracing::debug!("skipping degenerate bounding transform {:?}", transform);
            return None;
        }

        let corners = UNIT_CORNERS.map(|c| transform.transform_point3(c));

        let normal_matrix = linear.inverse().transpose();
        let mut normals = Vec::with_capacity(3);
        for axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let normal = (normal_matrix * axis).normalize_or_zero();
            if normal != Vec3::ZERO {
                push_unique_axis(&mut normals, normal, tolerance);
            }
        }

        Some(Self {
            transform,
            corners,
            normals,
        })
    }

    /// Transform mapping the unit cube onto this volume.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// World-space corners, indexed like [`UNIT_CORNERS`].
    pub fn corners(&self) -> &[Vec3; 8] {
        &self.corners
    }

    /// Unit-length, mutually non-parallel world-space face normals (at most 3).
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Center of the box in world space.
    pub fn center(&self) -> Vec3 {
        self.transform.transform_point3(Vec3::ZERO)
    }

    /// Scalar range of the corners projected onto `axis`.
    #[inline]
    pub fn project(&self, axis: Vec3) -> (f32, f32) {
        self.corners
            .iter()
            .map(|c| c.dot(axis))
            .fold((f32::MAX, f32::MIN), |(min, max), d| (min.min(d), max.max(d)))
    }
}

/// Append `axis` unless it is parallel or antiparallel to an axis already present.
pub(crate) fn push_unique_axis(axes: &mut Vec<Vec3>, axis: Vec3, tolerance: f32) {
    if axes.iter().all(|a| a.dot(axis).abs() < 1.0 - tolerance) {
        axes.push(axis);
    }
}
