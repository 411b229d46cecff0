//! Sequential impulse resolution between groups of bodies.
//!
//! Contacts are resolved one at a time, in place, in ascending group-pair order.
//! A resolved pair changes the velocities and positions seen by later pairs in
//! the same pass.

use glam::Vec3;

use super::contact::{estimate_contact_point, ContactInfo, ContactReport};
use super::group::{BodyHandle, Group};
use super::narrowphase::sat_contact;
use super::rigid_body::RigidBody;
use super::PhysicsConfig;

/// One side of a contact: the touching body and the group that answers for it.
struct Side<'a> {
    group: &'a Group,
    inv_mass: f32,
    center: Vec3,
    position: Vec3,
    velocity: Vec3,
    immovable: bool,
}

impl<'a> Side<'a> {
    fn new(group: &'a Group, body: BodyHandle, bodies: &[RigidBody]) -> Self {
        let rb = &bodies[body.index()];
        let inv_mass = if rb.wall {
            0.0
        } else {
            group.inverse_mass(bodies)
        };
        Self {
            group,
            inv_mass,
            center: group.center_of_mass(bodies),
            position: rb.position,
            velocity: rb.velocity,
            immovable: inv_mass == 0.0,
        }
    }

    /// Rotational response data, or `None` when this side does not rotate.
    fn rotation(
        &self,
        contact_point: Option<Vec3>,
        normal: Vec3,
        bodies: &[RigidBody],
        blend: f32,
    ) -> Option<Rotation> {
        if self.immovable || !self.group.rotation_enabled(bodies) {
            return None;
        }
        let inv_inertia = self.group.inverse_inertia(bodies)?;
        let lever = (self.center - contact_point?).normalize_or_zero();
        if lever == Vec3::ZERO {
            return None;
        }
        let lever_cross_n = lever.cross(normal);
        Some(Rotation {
            inv_inertia,
            arm: -lever,
            term: (inv_inertia * lever_cross_n).dot(lever_cross_n) * blend,
        })
    }

    /// Apply a linear impulse (and its spin, if any) to every member of the group.
    fn apply_impulse(
        &self,
        impulse: Vec3,
        rotation: Option<&Rotation>,
        bodies: &mut [RigidBody],
    ) {
        if self.immovable {
            return;
        }
        let delta_v = impulse * self.inv_mass;
        let delta_w = rotation.map(|r| r.inv_inertia * r.arm.cross(impulse));
        for handle in self.group.members() {
            let body = &mut bodies[handle.index()];
            if body.wall {
                continue;
            }
            body.velocity += delta_v;
            if let Some(delta_w) = delta_w {
                body.angular_velocity += delta_w;
            }
        }
        if rotation.is_some() {
            self.group.update_pivots(bodies);
        }
    }

    fn translate(&self, offset: Vec3, bodies: &mut [RigidBody]) {
        if self.immovable {
            return;
        }
        for handle in self.group.members() {
            let body = &mut bodies[handle.index()];
            if !body.wall {
                body.position += offset;
            }
        }
    }

    fn mark_in_contact(&self, bodies: &mut [RigidBody]) {
        for handle in self.group.members() {
            bodies[handle.index()].in_contact = true;
        }
    }
}

struct Rotation {
    inv_inertia: Vec3,
    /// Unit vector from the group's center of mass to the contact point.
    arm: Vec3,
    term: f32,
}

/// Resolve one detected contact between `body_a` (in `group_a`) and `body_b` (in `group_b`).
///
/// Applies restitution and friction impulses, rotational response where the
/// group allows it, and pushes the groups apart by the penetration depth.
/// Returns `None` when neither side can move.
///
/// # Panics
///
/// Panics if a handle in either group is out of bounds for `bodies`.
pub fn resolve_contact(
    group_a: &Group,
    body_a: BodyHandle,
    group_b: &Group,
    body_b: BodyHandle,
    info: ContactInfo,
    bodies: &mut [RigidBody],
    config: &PhysicsConfig,
) -> Option<ContactReport> {
    let a = Side::new(group_a, body_a, bodies);
    let b = Side::new(group_b, body_b, bodies);
    if a.immovable && b.immovable {
        return None;
    }

    let mut normal = info.normal;
    if normal.dot(b.position - a.position) < 0.0 {
        normal = -normal;
    }

    let (rb_a, rb_b) = (&bodies[body_a.index()], &bodies[body_b.index()]);
    let restitution = rb_a.restitution.min(rb_b.restitution);
    let friction = rb_a.friction.max(rb_b.friction);

    let (point_a, point_b) = match (rb_a.bounding(), rb_b.bounding()) {
        (Some(va), Some(vb)) => (estimate_contact_point(va, vb), estimate_contact_point(vb, va)),
        _ => (None, None),
    };
    let blend = config.rotation_blend;
    let rot_a = a.rotation(point_a, normal, bodies, blend);
    let rot_b = b.rotation(point_b, normal, bodies, blend);

    let closing_speed = (a.velocity - b.velocity).dot(normal);
    let denominator = a.inv_mass
        + b.inv_mass
        + rot_a.as_ref().map_or(0.0, |r| r.term)
        + rot_b.as_ref().map_or(0.0, |r| r.term);

    // Already separating: no normal impulse, friction still applies
    let j = if closing_speed > 0.0 && denominator > f32::EPSILON {
        -(1.0 + restitution) * closing_speed / denominator
    } else {
        0.0
    };

    let tangent_a = a.velocity - normal * a.velocity.dot(normal);
    let tangent_b = b.velocity - normal * b.velocity.dot(normal);
    let impulse_a = normal * j - tangent_a * friction;
    let impulse_b = -normal * j - tangent_b * friction;

    a.apply_impulse(impulse_a, rot_a.as_ref(), bodies);
    b.apply_impulse(impulse_b, rot_b.as_ref(), bodies);

    let (share_a, share_b) = match (a.immovable, b.immovable) {
        (true, _) => (0.0, 1.0),
        (_, true) => (1.0, 0.0),
        _ => (0.5, 0.5),
    };
    a.translate(-normal * info.penetration * share_a, bodies);
    b.translate(normal * info.penetration * share_b, bodies);

    a.mark_in_contact(bodies);
    b.mark_in_contact(bodies);

    tracing::trace!(
        "resolved contact {:?} <-> {:?}: normal {:?}, depth {}, impulse {}",
        body_a,
        body_b,
        normal,
        info.penetration,
        j
    );

    Some(ContactReport {
        body_a,
        body_b,
        normal,
        penetration: info.penetration,
        impulse: j,
    })
}

/// Test every member pair of every unordered group pair and resolve each contact
/// as soon as it is found.
///
/// Clears and then sets each body's `in_contact` flag. Bodies without a bounding
/// volume and wall-wall pairs are skipped.
///
/// # Panics
///
/// Panics if a group holds a handle that is out of bounds for `bodies`, e.g. a
/// group taken from another world.
pub fn detect_and_resolve(
    groups: &[Group],
    bodies: &mut [RigidBody],
    config: &PhysicsConfig,
) -> Vec<ContactReport> {
    for body in bodies.iter_mut() {
        body.in_contact = false;
    }

    let mut reports = Vec::new();
    for (i, group_a) in groups.iter().enumerate() {
        for group_b in &groups[i + 1..] {
            for &handle_a in group_a.members() {
                for &handle_b in group_b.members() {
                    let contact = {
                        let (rb_a, rb_b) = (&bodies[handle_a.index()], &bodies[handle_b.index()]);
                        if rb_a.wall && rb_b.wall {
                            continue;
                        }
                        match (rb_a.bounding(), rb_b.bounding()) {
                            (Some(va), Some(vb)) => sat_contact(va, vb, config.parallel_tolerance),
                            _ => None,
                        }
                    };

                    if let Some(info) = contact {
                        if let Some(report) =
                            resolve_contact(group_a, handle_a, group_b, handle_b, info, bodies, config)
                        {
                            reports.push(report);
                        }
                    }
                }
            }
        }
    }
    reports
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::rigid_body::{BodyDesc, Mass};
    use std::sync::Arc;

    use crate::geometry::MeshData;

    fn zero_g() -> PhysicsConfig {
        PhysicsConfig {
            gravity: Vec3::ZERO,
            ..Default::default()
        }
    }

    fn spawn(bodies: &mut Vec<RigidBody>, desc: BodyDesc, config: &PhysicsConfig) -> Group {
        bodies.push(RigidBody::new(desc, config).unwrap());
        Group::single(BodyHandle(bodies.len() - 1))
    }

    fn elastic(position: Vec3, velocity: Vec3) -> BodyDesc {
        BodyDesc {
            position,
            velocity,
            restitution: 1.0,
            friction: 0.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_equal_mass_elastic_exchange() {
        let config = zero_g();
        let mut bodies = Vec::new();
        let groups = vec![
            spawn(&mut bodies, elastic(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0)), &config),
            spawn(&mut bodies, elastic(Vec3::new(1.5, 0.0, 0.0), Vec3::ZERO), &config),
        ];

        let reports = detect_and_resolve(&groups, &mut bodies, &config);
        assert_eq!(reports.len(), 1);

        let eps = 1e-4;
        let report = reports[0];
        assert!((report.normal - Vec3::X).length() < eps);
        assert!((report.penetration - 0.5).abs() < eps);

        assert!(bodies[0].velocity.length() < eps, "v_a = {:?}", bodies[0].velocity);
        assert!((bodies[1].velocity - Vec3::new(5.0, 0.0, 0.0)).length() < eps);
        // Each side absorbs half the depth
        assert!((bodies[0].position - Vec3::new(-0.25, 0.0, 0.0)).length() < eps);
        assert!((bodies[1].position - Vec3::new(1.75, 0.0, 0.0)).length() < eps);
        // Head-on contact gives no spin
        assert!(bodies[0].angular_velocity.length() < eps);
        assert!(bodies[1].angular_velocity.length() < eps);

        assert!(bodies[0].in_contact && bodies[1].in_contact);
    }

    #[test]
    fn test_relative_normal_velocity_reverses() {
        let config = zero_g();
        let mut bodies = Vec::new();
        let groups = vec![
            spawn(&mut bodies, elastic(Vec3::new(0.0, 1.6, 0.0), Vec3::new(1.0, -3.0, 0.0)), &config),
            spawn(&mut bodies, elastic(Vec3::ZERO, Vec3::new(0.0, 2.0, 0.0)), &config),
        ];

        let before = bodies[1].velocity - bodies[0].velocity;
        let reports = detect_and_resolve(&groups, &mut bodies, &config);
        assert_eq!(reports.len(), 1);
        let normal = reports[0].normal;
        // Oriented from A towards B
        assert!(normal.dot(Vec3::new(0.0, -1.6, 0.0)) >= 0.0);

        let after = bodies[1].velocity - bodies[0].velocity;
        let eps = 1e-4;
        assert!((after.dot(normal) + before.dot(normal)).abs() < eps);
    }

    #[test]
    fn test_wall_takes_nothing() {
        let config = PhysicsConfig::default();
        let mut bodies = Vec::new();
        let slab = BodyDesc {
            position: Vec3::new(0.0, -1.0, 0.0),
            scale: Vec3::new(10.0, 1.0, 10.0),
            restitution: 0.5,
            friction: 0.0,
            ..BodyDesc::wall(Arc::new(MeshData::cube()))
        };
        let cube = BodyDesc {
            position: Vec3::new(0.0, 0.9, 0.0),
            velocity: Vec3::new(0.0, -0.5, 0.0),
            restitution: 0.5,
            friction: 0.0,
            ..Default::default()
        };
        let groups = vec![
            spawn(&mut bodies, slab, &config),
            spawn(&mut bodies, cube, &config),
        ];
        let wall_before = (bodies[0].position, bodies[0].velocity);

        let reports = detect_and_resolve(&groups, &mut bodies, &config);
        assert_eq!(reports.len(), 1);

        assert_eq!((bodies[0].position, bodies[0].velocity), wall_before);
        let eps = 1e-4;
        assert!((bodies[1].velocity - Vec3::new(0.0, 0.25, 0.0)).length() < eps);
        // Full depth goes to the cube
        assert!((bodies[1].position - Vec3::new(0.0, 1.0, 0.0)).length() < eps);
    }

    #[test]
    fn test_infinite_mass_unchanged() {
        let config = zero_g();
        let mut bodies = Vec::new();
        let groups = vec![
            spawn(
                &mut bodies,
                BodyDesc {
                    velocity: Vec3::new(0.0, 0.0, 1.0),
                    mass: Mass::Infinite,
                    ..Default::default()
                },
                &config,
            ),
            spawn(
                &mut bodies,
                BodyDesc {
                    position: Vec3::new(1.2, 0.7, 0.3),
                    velocity: Vec3::new(-4.0, -1.0, 0.5),
                    orientation: Vec3::new(0.2, 0.4, 0.1),
                    friction: 0.3,
                    ..Default::default()
                },
                &config,
            ),
        ];
        let before = (bodies[0].position, bodies[0].velocity, bodies[0].angular_velocity);

        let reports = detect_and_resolve(&groups, &mut bodies, &config);
        assert_eq!(reports.len(), 1);
        assert_eq!(
            (bodies[0].position, bodies[0].velocity, bodies[0].angular_velocity),
            before
        );
        // The movable side was pushed out along the normal
        assert!(bodies[1].position.dot(reports[0].normal) > Vec3::new(1.2, 0.7, 0.3).dot(reports[0].normal));
    }

    #[test]
    fn test_group_members_share_response() {
        let config = zero_g();
        let mut bodies = Vec::new();
        bodies.push(RigidBody::new(elastic(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0)), &config).unwrap());
        bodies.push(RigidBody::new(elastic(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)), &config).unwrap());
        let pair = Group::new(vec![BodyHandle(0), BodyHandle(1)]).unwrap();
        pair.update_pivots(&mut bodies);
        let target = spawn(&mut bodies, elastic(Vec3::new(1.8, 0.0, 0.0), Vec3::ZERO), &config);
        let groups = vec![pair, target];

        detect_and_resolve(&groups, &mut bodies, &config);

        let eps = 1e-4;
        assert!((bodies[0].velocity - bodies[1].velocity).length() < eps);
        assert!((bodies[0].angular_velocity - bodies[1].angular_velocity).length() < eps);
        // Group of mass 2 against mass 1, elastic: v_group = 2/3, v_target = 8/3
        assert!((bodies[0].velocity.x - 2.0 / 3.0).abs() < eps, "v = {:?}", bodies[0].velocity);
        assert!((bodies[2].velocity.x - 8.0 / 3.0).abs() < eps);
        // Both members moved by the same correction
        let moved = bodies[0].position.x;
        assert!((bodies[1].position.x - (moved - 2.0)).abs() < eps);
    }

    #[test]
    fn test_off_center_hit_spins_group() {
        let config = zero_g();
        let mut bodies = Vec::new();
        let groups = vec![
            spawn(&mut bodies, elastic(Vec3::ZERO, Vec3::ZERO), &config),
            // Small box strikes the upper edge of the first box
            spawn(
                &mut bodies,
                BodyDesc {
                    scale: Vec3::splat(0.25),
                    ..elastic(Vec3::new(1.0, 0.8, 0.0), Vec3::new(-3.0, 0.0, 0.0))
                },
                &config,
            ),
        ];

        let reports = detect_and_resolve(&groups, &mut bodies, &config);
        assert_eq!(reports.len(), 1);
        assert!(bodies[0].angular_velocity.length() > 0.0);
        assert!(bodies[0].velocity.x < 0.0);
    }

    #[test]
    fn test_spun_group_recomputes_pivots() {
        let config = zero_g();
        let mut bodies = vec![
            RigidBody::new(elastic(Vec3::ZERO, Vec3::ZERO), &config).unwrap(),
            RigidBody::new(elastic(Vec3::new(-3.0, 0.0, 0.0), Vec3::ZERO), &config).unwrap(),
        ];
        let pair = Group::new(vec![BodyHandle(0), BodyHandle(1)]).unwrap();
        // Offsets left stale on purpose
        for body in &mut bodies {
            body.pivot_offset = Vec3::ZERO;
        }
        let striker = spawn(
            &mut bodies,
            BodyDesc {
                scale: Vec3::splat(0.25),
                ..elastic(Vec3::new(1.0, 0.8, 0.0), Vec3::new(-3.0, 0.0, 0.0))
            },
            &config,
        );
        let groups = vec![pair, striker];

        assert_eq!(detect_and_resolve(&groups, &mut bodies, &config).len(), 1);

        let eps = 1e-4;
        assert!(bodies[0].angular_velocity.length() > 0.0);
        assert!((bodies[0].angular_velocity - bodies[1].angular_velocity).length() < eps);

        let center = groups[0].center_of_mass(&bodies);
        for body in &bodies[..2] {
            assert!((body.pivot_offset - (body.position - center)).length() < eps);
        }
        assert!((bodies[1].pivot_offset - Vec3::new(-1.5, 0.0, 0.0)).length() < eps);
    }

    #[test]
    fn test_friction_slows_sliding_contact() {
        let config = zero_g();
        let mut bodies = Vec::new();
        let slab = BodyDesc {
            position: Vec3::new(0.0, -1.0, 0.0),
            scale: Vec3::new(10.0, 1.0, 10.0),
            friction: 0.0,
            ..BodyDesc::wall(Arc::new(MeshData::cube()))
        };
        // Sunk 0.1 into the slab, sliding along it with no normal velocity
        let cube = BodyDesc {
            position: Vec3::new(0.0, 0.9, 0.0),
            velocity: Vec3::new(3.0, 0.0, 0.0),
            friction: 0.3,
            ..Default::default()
        };
        let groups = vec![
            spawn(&mut bodies, slab, &config),
            spawn(&mut bodies, cube, &config),
        ];

        let reports = detect_and_resolve(&groups, &mut bodies, &config);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].impulse, 0.0);

        // Tangential speed drops by mu * v
        let eps = 1e-4;
        assert!(
            (bodies[1].velocity - Vec3::new(2.1, 0.0, 0.0)).length() < eps,
            "v = {:?}",
            bodies[1].velocity
        );
        assert_eq!(bodies[0].velocity, Vec3::ZERO);
    }

    #[test]
    fn test_rotation_response_can_be_disabled() {
        let config = zero_g();
        let mut bodies = Vec::new();
        let groups = vec![
            spawn(
                &mut bodies,
                BodyDesc {
                    rotation_response: false,
                    ..elastic(Vec3::ZERO, Vec3::ZERO)
                },
                &config,
            ),
            spawn(
                &mut bodies,
                BodyDesc {
                    scale: Vec3::splat(0.25),
                    ..elastic(Vec3::new(1.0, 0.8, 0.0), Vec3::new(-3.0, 0.0, 0.0))
                },
                &config,
            ),
        ];

        detect_and_resolve(&groups, &mut bodies, &config);
        assert_eq!(bodies[0].angular_velocity, Vec3::ZERO);
    }

    #[test]
    fn test_separated_groups_untouched() {
        let config = zero_g();
        let mut bodies = Vec::new();
        let groups = vec![
            spawn(&mut bodies, elastic(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)), &config),
            spawn(&mut bodies, elastic(Vec3::new(4.0, 0.0, 0.0), Vec3::ZERO), &config),
        ];

        assert!(detect_and_resolve(&groups, &mut bodies, &config).is_empty());
        assert_eq!(bodies[0].velocity, Vec3::new(1.0, 0.0, 0.0));
        assert!(!bodies[0].in_contact && !bodies[1].in_contact);
    }

    #[test]
    fn test_walls_never_collide_with_walls() {
        let config = PhysicsConfig::default();
        let mut bodies = Vec::new();
        let cube = Arc::new(MeshData::cube());
        let groups = vec![
            spawn(&mut bodies, BodyDesc::wall(cube.clone()), &config),
            spawn(
                &mut bodies,
                BodyDesc {
                    position: Vec3::new(0.5, 0.0, 0.0),
                    ..BodyDesc::wall(cube)
                },
                &config,
            ),
        ];
        assert!(detect_and_resolve(&groups, &mut bodies, &config).is_empty());
    }
}
