//! Rigid bodies and their per-tick integration.

use std::cell::OnceCell;
use std::f32::consts::TAU;
use std::sync::Arc;

use glam::{Mat4, Vec3};

use crate::error::PhysicsError;
use crate::geometry::{Aabb, MeshData};

use super::bounding::{BoundingType, BoundingVolume};
use super::group::Group;
use super::PhysicsConfig;

/// Axis used to build a rotation when the axis-angle vector is zero.
const PLACEHOLDER_AXIS: Vec3 = Vec3::X;

/// Mass of a body. `Infinite` marks immovable geometry such as walls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mass {
    Finite(f32),
    Infinite,
}

impl Mass {
    /// Finite mass value, `None` for infinite mass.
    #[inline]
    pub fn value(self) -> Option<f32> {
        match self {
            Mass::Finite(m) => Some(m),
            Mass::Infinite => None,
        }
    }

    #[inline]
    pub fn inverse(self) -> f32 {
        match self {
            Mass::Finite(m) => 1.0 / m,
            Mass::Infinite => 0.0,
        }
    }

    pub fn is_infinite(self) -> bool {
        matches!(self, Mass::Infinite)
    }
}

impl Default for Mass {
    fn default() -> Self {
        Mass::Finite(1.0)
    }
}

/// Construction parameters for a [`RigidBody`].
#[derive(Debug, Clone)]
pub struct BodyDesc {
    /// Object-space geometry. Default: the `[-1, 1]` cube.
    pub mesh: Arc<MeshData>,
    /// Default: origin.
    pub position: Vec3,
    /// Default: zero.
    pub velocity: Vec3,
    /// Acceleration applied on top of gravity. Default: zero.
    pub acceleration: Vec3,
    /// Per-body gravity that ignores world gravity changes. Default: `None`.
    pub gravity: Option<Vec3>,
    /// Initial orientation as an axis-angle vector. Default: zero.
    pub orientation: Vec3,
    /// Default: zero.
    pub angular_velocity: Vec3,
    /// Default: zero.
    pub angular_acceleration: Vec3,
    /// Static model-space rotation (axis-angle) applied before scale. Default: zero.
    pub model_rotation: Vec3,
    /// Default: one.
    pub scale: Vec3,
    /// Default: `Mass::Finite(1.0)`.
    pub mass: Mass,
    /// Default: 0.03.
    pub friction: f32,
    /// In `[0, 1]`. Default: 0.8.
    pub restitution: f32,
    /// Walls never receive impulses or positional correction. Default: false.
    pub wall: bool,
    /// Default: [`BoundingType::Model`].
    pub bounding_type: BoundingType,
    /// Multiplier on the bounding box size. Default: one.
    pub bounding_scale: Vec3,
    /// Whether collisions may spin this body's group. Default: true.
    pub rotation_response: bool,
}

impl Default for BodyDesc {
    fn default() -> Self {
        Self {
            mesh: Arc::new(MeshData::cube()),
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            gravity: None,
            orientation: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            angular_acceleration: Vec3::ZERO,
            model_rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            mass: Mass::default(),
            friction: 0.03,
            restitution: 0.8,
            wall: false,
            bounding_type: BoundingType::default(),
            bounding_scale: Vec3::ONE,
            rotation_response: true,
        }
    }
}

impl BodyDesc {
    /// A movable body with the given mesh and mass.
    pub fn dynamic(mesh: Arc<MeshData>, mass: f32) -> Self {
        Self {
            mesh,
            mass: Mass::Finite(mass),
            ..Default::default()
        }
    }

    /// An immovable, gravity-free wall.
    pub fn wall(mesh: Arc<MeshData>) -> Self {
        Self {
            mesh,
            mass: Mass::Infinite,
            gravity: Some(Vec3::ZERO),
            wall: true,
            ..Default::default()
        }
    }

    fn validate(&self) -> Result<(), PhysicsError> {
        if let Mass::Finite(m) = self.mass {
            if !(m.is_finite() && m > 0.0) {
                return Err(PhysicsError::InvalidMass(m));
            }
        }
        if !(0.0..=1.0).contains(&self.restitution) {
            return Err(PhysicsError::InvalidRestitution(self.restitution));
        }
        if !(self.friction.is_finite() && self.friction >= 0.0) {
            return Err(PhysicsError::InvalidFriction(self.friction));
        }
        Ok(())
    }
}

/// A simulated body with its own mesh, transform and bounding volume.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub position: Vec3,
    pub velocity: Vec3,
    /// Total linear acceleration, gravity included.
    pub acceleration: Vec3,
    /// Gravity component currently contained in `acceleration`.
    pub gravity: Vec3,
    /// When set, world gravity changes leave `gravity` untouched.
    pub custom_gravity: bool,
    /// Axis-angle orientation: direction is the axis, length the angle.
    pub orientation: Vec3,
    pub angular_velocity: Vec3,
    pub angular_acceleration: Vec3,
    pub model_rotation: Vec3,
    /// Position relative to the group's center of mass, used as rotation pivot.
    pub pivot_offset: Vec3,
    pub scale: Vec3,
    pub mass: Mass,
    pub friction: f32,
    pub restitution: f32,
    pub wall: bool,
    pub bounding_type: BoundingType,
    pub bounding_scale: Vec3,
    pub rotation_response: bool,
    /// Set while the body took part in a resolved contact this tick.
    pub in_contact: bool,
    /// Host transform applied between translation and rotation.
    pub pre_transform: Option<Mat4>,
    /// Host transform applied outside everything, e.g. a moving parent.
    pub post_transform: Option<Mat4>,
    mesh: Arc<MeshData>,
    model_box: OnceCell<Option<Aabb>>,
    transform: Mat4,
    bounding: Option<BoundingVolume>,
}

impl RigidBody {
    /// Create a body, resolving gravity against the world configuration.
    pub fn new(desc: BodyDesc, config: &PhysicsConfig) -> Result<Self, PhysicsError> {
        desc.validate()?;

        let gravity = desc.gravity.unwrap_or(config.gravity);
        let mut body = Self {
            position: desc.position,
            velocity: desc.velocity,
            acceleration: desc.acceleration + gravity,
            gravity,
            custom_gravity: desc.gravity.is_some(),
            orientation: desc.orientation,
            angular_velocity: desc.angular_velocity,
            angular_acceleration: desc.angular_acceleration,
            model_rotation: desc.model_rotation,
            pivot_offset: Vec3::ZERO,
            scale: desc.scale,
            mass: desc.mass,
            friction: desc.friction,
            restitution: desc.restitution,
            wall: desc.wall,
            bounding_type: desc.bounding_type,
            bounding_scale: desc.bounding_scale,
            rotation_response: desc.rotation_response,
            in_contact: false,
            pre_transform: None,
            post_transform: None,
            mesh: desc.mesh,
            model_box: OnceCell::new(),
            transform: Mat4::IDENTITY,
            bounding: None,
        };
        body.update_transform();
        body.update_bounding(config.parallel_tolerance);
        Ok(body)
    }

    /// Advance the body by `dt` seconds, then rebuild transform and bounding volume.
    pub fn integrate(&mut self, config: &PhysicsConfig, dt: f32) {
        if !self.wall {
            self.angular_velocity *= (1.0 - config.angular_damping * dt).max(0.0);
        }

        // Gravity is held back for a tick after a contact so resting bodies do not sink
        let acceleration = if self.in_contact {
            self.acceleration - self.gravity
        } else {
            self.acceleration
        };
        self.velocity += acceleration * dt;
        self.angular_velocity += self.angular_acceleration * dt;

        self.velocity = self.velocity.clamp_length_max(config.max_velocity);
        self.angular_velocity = self
            .angular_velocity
            .clamp_length_max(config.max_rotation_velocity);

        self.position += self.velocity * dt;
        self.orientation += self.angular_velocity * dt;
        let angle = self.orientation.length();
        if angle > TAU {
            let wrapped = angle - (angle / TAU).floor() * TAU;
            self.orientation *= wrapped / angle;
        }

        self.update_transform();
        self.update_bounding(config.parallel_tolerance);
    }

    /// Rebuild the world transform from position, orientation, pivot, model rotation and scale.
    pub fn update_transform(&mut self) {
        let mut transform = Mat4::from_translation(self.position);
        if let Some(post) = self.post_transform {
            transform = post * transform;
        }
        if let Some(pre) = self.pre_transform {
            transform *= pre;
        }
        self.transform = transform
            * Mat4::from_translation(-self.pivot_offset)
            * axis_angle_rotation(self.orientation)
            * Mat4::from_translation(self.pivot_offset)
            * axis_angle_rotation(self.model_rotation)
            * Mat4::from_scale(self.scale);
    }

    /// Rebuild the bounding volume from the current transform.
    pub fn update_bounding(&mut self, tolerance: f32) {
        let model_box = match self.bounding_type {
            BoundingType::Model => self.model_box(),
            _ => None,
        };
        self.bounding = BoundingVolume::build(
            self.bounding_type,
            self.transform,
            self.bounding_scale,
            &self.mesh,
            model_box,
            tolerance,
        );
    }

    /// World transform for rendering.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Current bounding volume, `None` when the body cannot collide.
    pub fn bounding(&self) -> Option<&BoundingVolume> {
        self.bounding.as_ref()
    }

    pub fn mesh(&self) -> &Arc<MeshData> {
        &self.mesh
    }

    /// Object-space box fit to the mesh, computed on first use.
    pub fn model_box(&self) -> Option<Aabb> {
        *self.model_box.get_or_init(|| self.mesh.bounds())
    }

    #[inline]
    pub fn inverse_mass(&self) -> f32 {
        self.mass.inverse()
    }

    /// Per-axis inverse inertia `12 / (m (h_j² + h_k²))` from the scaled model-box half extents.
    ///
    /// `None` for immovable bodies and bodies without a model box.
    pub fn inverse_inertia(&self) -> Option<Vec3> {
        let mass = self.mass.value()?;
        let h = self.model_box()?.half_extents() * self.scale.abs();
        let sq = h * h;
        let axis = |a: f32, b: f32| {
            let denom = mass * (a + b);
            if denom > f32::EPSILON {
                12.0 / denom
            } else {
                0.0
            }
        };
        Some(Vec3::new(axis(sq.y, sq.z), axis(sq.x, sq.z), axis(sq.x, sq.y)))
    }

    /// Fold the group rotation about the pivot into the position so the body
    /// keeps its world placement while rotating about its own origin.
    pub fn bake_pivot(&mut self, tolerance: f32) {
        let swung = axis_angle_rotation(self.orientation).transform_vector3(self.pivot_offset);
        self.position += swung - self.pivot_offset;
        self.pivot_offset = Vec3::ZERO;
        self.update_transform();
        self.update_bounding(tolerance);
    }

    /// Replace the gravity component of the acceleration, unless this body has its own.
    pub fn set_world_gravity(&mut self, gravity: Vec3) {
        if self.custom_gravity {
            return;
        }
        self.acceleration += gravity - self.gravity;
        self.gravity = gravity;
    }
}

/// Rotation matrix for an axis-angle vector.
pub fn axis_angle_rotation(rotation: Vec3) -> Mat4 {
    let angle = rotation.length();
    let axis = if angle > f32::EPSILON {
        rotation / angle
    } else {
        PLACEHOLDER_AXIS
    };
    Mat4::from_axis_angle(axis, angle)
}

/// Result of a [`step_group`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Integrated,
    /// `dt` exceeded the configured ceiling (or was invalid) and nothing moved.
    Skipped,
}

/// Integrate every member of every group by `dt`.
///
/// A `dt` above `config.max_delta_time` is dropped in full.
///
/// # Panics
///
/// Panics if a member handle is out of bounds for `bodies`.
pub fn step_group(
    groups: &[Group],
    bodies: &mut [RigidBody],
    config: &PhysicsConfig,
    dt: f32,
) -> StepOutcome {
    if !(dt.is_finite() && dt >= 0.0 && dt <= config.max_delta_time) {
        tracing::debug!("skipping physics step with dt = {}", dt);
        return StepOutcome::Skipped;
    }

    for group in groups {
        for handle in group.members() {
            bodies[handle.index()].integrate(config, dt);
        }
    }
    StepOutcome::Integrated
}

/// Point every body without its own gravity at `gravity`.
pub fn override_gravity<'a>(bodies: impl IntoIterator<Item = &'a mut RigidBody>, gravity: Vec3) {
    for body in bodies {
        body.set_world_gravity(gravity);
    }
}
