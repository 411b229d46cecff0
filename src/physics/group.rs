//! Composite bodies: clusters of rigid bodies sharing one collision response.

use glam::Vec3;

use crate::error::PhysicsError;

use super::rigid_body::RigidBody;

/// Index of a body in the world's body arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub(crate) usize);

impl BodyHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a group in the world's group list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupHandle(pub(crate) usize);

impl GroupHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An ordered, non-empty cluster of bodies that moves as one mechanical unit.
///
/// Every member keeps its own bounding volume for detection, but a contact on
/// any member changes the velocity of all members identically.
///
/// # Panics
///
/// Methods taking a body slice index it with the member handles and panic if a
/// handle is out of bounds, e.g. when the slice belongs to another world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    members: Vec<BodyHandle>,
}

impl Group {
    /// Create a group. Fails if `members` is empty.
    pub fn new(members: Vec<BodyHandle>) -> Result<Self, PhysicsError> {
        if members.is_empty() {
            return Err(PhysicsError::EmptyGroup);
        }
        Ok(Self { members })
    }

    /// A group holding a single body.
    pub fn single(body: BodyHandle) -> Self {
        Self {
            members: vec![body],
        }
    }

    pub fn members(&self) -> &[BodyHandle] {
        &self.members
    }

    pub fn contains(&self, body: BodyHandle) -> bool {
        self.members.contains(&body)
    }

    /// Iterate over the member bodies.
    pub fn bodies<'a>(&'a self, bodies: &'a [RigidBody]) -> impl Iterator<Item = &'a RigidBody> + 'a {
        self.members.iter().map(move |h| &bodies[h.0])
    }

    /// Sum of member masses, or `None` if any member is immovable.
    pub fn total_mass(&self, bodies: &[RigidBody]) -> Option<f32> {
        self.bodies(bodies).map(|b| b.mass.value()).sum()
    }

    /// `1 / Σ mass`, or zero when any member has infinite mass.
    pub fn inverse_mass(&self, bodies: &[RigidBody]) -> f32 {
        match self.total_mass(bodies) {
            Some(total) if total > 0.0 => 1.0 / total,
            _ => 0.0,
        }
    }

    /// Mass-weighted mean of member positions.
    ///
    /// Groups containing an immovable member use the plain mean.
    pub fn center_of_mass(&self, bodies: &[RigidBody]) -> Vec3 {
        match self.total_mass(bodies) {
            Some(total) if total > 0.0 => {
                self.bodies(bodies)
                    .map(|b| b.position * b.mass.value().unwrap_or(0.0))
                    .sum::<Vec3>()
                    / total
            }
            _ => self.bodies(bodies).map(|b| b.position).sum::<Vec3>() / self.members.len() as f32,
        }
    }

    /// Whether every member accepts rotational response.
    pub fn rotation_enabled(&self, bodies: &[RigidBody]) -> bool {
        self.bodies(bodies).all(|b| b.rotation_response && !b.wall)
    }

    /// Per-axis inverse inertia summed over the members.
    ///
    /// `None` when a member is immovable or has no model-space box.
    pub fn inverse_inertia(&self, bodies: &[RigidBody]) -> Option<Vec3> {
        self.bodies(bodies).map(RigidBody::inverse_inertia).sum()
    }

    /// Re-express every member's pivot offset relative to the group's center of mass.
    pub fn update_pivots(&self, bodies: &mut [RigidBody]) {
        let center = self.center_of_mass(bodies);
        for handle in &self.members {
            let body = &mut bodies[handle.0];
            body.pivot_offset = body.position - center;
        }
    }
}

/// Split every group into single-body groups, preserving member order.
pub fn ungroup(groups: &[Group]) -> Vec<Group> {
    groups
        .iter()
        .flat_map(|g| g.members.iter().copied().map(Group::single))
        .collect()
}
