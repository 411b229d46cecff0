//! CPU rigid-body physics for clustered box bodies.
//!
//! # Architecture
//!
//! Each tick runs two stages:
//!
//! 1. Integrate every grouped body (velocity, position, rotation, transform,
//!    bounding volume). Ticks longer than [`PhysicsConfig::max_delta_time`] are
//!    dropped whole.
//! 2. For every unordered pair of groups, in ascending index order, run the full
//!    separating axis test on every member pair and resolve each contact in place
//!    (impulse, friction, angular response, positional correction).
//!
//! Detection is exhaustive and pairwise; there is no broadphase.

pub mod bounding;
pub mod contact;
pub mod group;
pub mod narrowphase;
pub mod rigid_body;
pub mod solver;

use std::f32::consts::PI;

use glam::Vec3;

use crate::error::PhysicsError;

use self::contact::ContactReport;
use self::group::{BodyHandle, Group, GroupHandle};
use self::rigid_body::{BodyDesc, RigidBody, StepOutcome};

/// Configuration for the physics simulation.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity for bodies without their own. Default: (0, -9.81, 0).
    pub gravity: Vec3,
    /// Longest accepted step in seconds; longer steps are skipped. Default: 0.05.
    pub max_delta_time: f32,
    /// Linear speed cap. Default: 100.
    pub max_velocity: f32,
    /// Angular speed cap in rad/s. Default: 4π.
    pub max_rotation_velocity: f32,
    /// Angular damping rate per second for non-wall bodies. Default: 0.7.
    pub angular_damping: f32,
    /// Weight of the rotational terms in the collision impulse. Default: 0.5.
    pub rotation_blend: f32,
    /// Axes with `|dot| >= 1 - parallel_tolerance` count as parallel. Default: 1e-4.
    pub parallel_tolerance: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            max_delta_time: 0.05,
            max_velocity: 100.0,
            max_rotation_velocity: 4.0 * PI,
            angular_damping: 0.7,
            rotation_blend: 0.5,
            parallel_tolerance: 1e-4,
        }
    }
}

/// The physics world: a body arena, the groups over it and the configuration.
///
/// Bodies added with [`add_body`](Self::add_body) take part in the simulation
/// once they belong to a group.
#[derive(Debug, Default)]
pub struct PhysicsWorld {
    config: PhysicsConfig,
    bodies: Vec<RigidBody>,
    groups: Vec<Group>,
    contacts: Vec<ContactReport>,
}

impl PhysicsWorld {
    /// Create an empty physics world with the given configuration.
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            bodies: Vec::new(),
            groups: Vec::new(),
            contacts: Vec::new(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Create a body that is not yet part of any group.
    pub fn add_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError> {
        let body = RigidBody::new(desc, &self.config)?;
        self.bodies.push(body);
        Ok(BodyHandle(self.bodies.len() - 1))
    }

    /// Group existing bodies and initialize their rotation pivots.
    ///
    /// Every handle must be known and not already part of a group.
    pub fn add_group(&mut self, members: Vec<BodyHandle>) -> Result<GroupHandle, PhysicsError> {
        for (i, &handle) in members.iter().enumerate() {
            if handle.index() >= self.bodies.len() {
                return Err(PhysicsError::UnknownBody(handle));
            }
            if members[..i].contains(&handle) || self.groups.iter().any(|g| g.contains(handle)) {
                return Err(PhysicsError::BodyAlreadyGrouped(handle));
            }
        }

        let group = Group::new(members)?;
        group.update_pivots(&mut self.bodies);
        tracing::debug!("group {} created with {} bodies", self.groups.len(), group.members().len());
        self.groups.push(group);
        Ok(GroupHandle(self.groups.len() - 1))
    }

    /// Create a body in its own single-member group.
    pub fn spawn(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError> {
        let handle = self.add_body(desc)?;
        self.groups.push(Group::single(handle));
        Ok(handle)
    }

    /// Create several bodies as one group. Nothing is added if any description is invalid.
    pub fn spawn_group(
        &mut self,
        descs: impl IntoIterator<Item = BodyDesc>,
    ) -> Result<GroupHandle, PhysicsError> {
        let new_bodies = descs
            .into_iter()
            .map(|desc| RigidBody::new(desc, &self.config))
            .collect::<Result<Vec<_>, _>>()?;
        if new_bodies.is_empty() {
            return Err(PhysicsError::EmptyGroup);
        }

        let first = self.bodies.len();
        self.bodies.extend(new_bodies);
        let members = (first..self.bodies.len()).map(BodyHandle).collect();
        self.add_group(members)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle.index())
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle.index())
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn group(&self, handle: GroupHandle) -> Option<&Group> {
        self.groups.get(handle.index())
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Contacts resolved by the latest detection pass.
    pub fn contacts(&self) -> &[ContactReport] {
        &self.contacts
    }

    /// Integrate every grouped body by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> StepOutcome {
        rigid_body::step_group(&self.groups, &mut self.bodies, &self.config, dt)
    }

    /// Detect and resolve contacts between all group pairs. Returns the number of
    /// resolved contacts.
    pub fn detect_and_resolve(&mut self) -> usize {
        self.contacts = solver::detect_and_resolve(&self.groups, &mut self.bodies, &self.config);
        self.contacts.len()
    }

    /// [`step`](Self::step) followed by [`detect_and_resolve`](Self::detect_and_resolve)
    /// when the step was not skipped.
    pub fn tick(&mut self, dt: f32) -> StepOutcome {
        let outcome = self.step(dt);
        if outcome == StepOutcome::Integrated {
            self.detect_and_resolve();
        }
        outcome
    }

    /// Whether any members of the two groups overlap. Mutates nothing.
    pub fn detect_only(&self, a: GroupHandle, b: GroupHandle) -> Result<bool, PhysicsError> {
        let group_a = self.group(a).ok_or(PhysicsError::UnknownGroup(a))?;
        let group_b = self.group(b).ok_or(PhysicsError::UnknownGroup(b))?;
        Ok(narrowphase::detect_only(group_a, group_b, &self.bodies))
    }

    /// Change world gravity. Bodies with their own gravity keep it.
    pub fn override_gravity(&mut self, gravity: Vec3) {
        self.config.gravity = gravity;
        rigid_body::override_gravity(self.bodies.iter_mut(), gravity);
    }

    /// Split every group into single-body groups. Bodies keep their world placement.
    pub fn ungroup(&mut self) {
        for body in &mut self.bodies {
            body.bake_pivot(self.config.parallel_tolerance);
        }
        self.groups = group::ungroup(&self.groups);
        tracing::debug!("ungrouped into {} groups", self.groups.len());
    }

    /// Drop every body and group.
    pub fn clear(&mut self) {
        self.bodies.clear();
        self.groups.clear();
        self.contacts.clear();
    }
}
