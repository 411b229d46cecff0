//! Mesh geometry
//!
//! Object-space vertex data shared between the host and the physics core.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use super::Aabb;
use crate::error::PhysicsError;

/// Vertex with position and normal.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }
}

/// Read-only object-space mesh: vertex positions and normals.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
}

impl MeshData {
    /// Create a mesh from parallel position and normal lists.
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>) -> Self {
        Self { positions, normals }
    }

    /// Create a mesh with no vertices. Bodies using it never collide.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a mesh from interleaved vertices.
    pub fn from_vertices(vertices: &[Vertex]) -> Self {
        let (positions, normals) = vertices
            .iter()
            .map(|v| (Vec3::from(v.position), Vec3::from(v.normal)))
            .unzip();
        Self { positions, normals }
    }

    /// Create a mesh from a raw vertex buffer laid out as [`Vertex`].
    pub fn from_vertex_bytes(bytes: &[u8]) -> Result<Self, PhysicsError> {
        let stride = std::mem::size_of::<Vertex>();
        if bytes.len() % stride != 0 {
            return Err(PhysicsError::MalformedVertexBuffer {
                len: bytes.len(),
                stride,
            });
        }
        let vertices: Vec<Vertex> = bytes
            .chunks_exact(stride)
            .map(bytemuck::pod_read_unaligned)
            .collect();
        Ok(Self::from_vertices(&vertices))
    }

    /// The canonical box mesh: 24 vertices spanning `[-1, 1]^3`, four per face.
    pub fn cube() -> Self {
        let mut vertices = Vec::with_capacity(24);
        for axis in 0..3 {
            for sign in [1.0f32, -1.0] {
                let mut normal = [0.0; 3];
                normal[axis] = sign;
                let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
                for (a, b) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                    let mut position = [0.0; 3];
                    position[axis] = sign;
                    position[u] = a;
                    position[v] = b;
                    vertices.push(Vertex::new(position, normal));
                }
            }
        }
        Self::from_vertices(&vertices)
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Object-space bounds of the vertex positions.
    pub fn bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().copied())
    }
}
