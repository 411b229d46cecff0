//! Narrowphase collision detection: separating axis tests between bounding boxes.

use glam::Vec3;

use super::bounding::{push_unique_axis, BoundingVolume};
use super::contact::ContactInfo;
use super::group::Group;
use super::rigid_body::RigidBody;

/// Closed-interval overlap: some endpoint of one range lies inside the other.
#[inline]
fn ranges_overlap(a: (f32, f32), b: (f32, f32)) -> bool {
    let within = |x: f32, (min, max): (f32, f32)| min <= x && x <= max;
    within(a.0, b) || within(a.1, b) || within(b.0, a) || within(b.1, a)
}

/// Boolean SAT over the face normals of both boxes.
///
/// Cheaper than [`sat_contact`] because edge-edge axes are not tested, so it may
/// report touching boxes that the full test separates.
pub fn overlaps(a: &BoundingVolume, b: &BoundingVolume) -> bool {
    a.normals()
        .iter()
        .chain(b.normals())
        .all(|axis| ranges_overlap(a.project(*axis), b.project(*axis)))
}

/// Candidate separating axes: both face-normal sets plus their pairwise cross products.
pub fn candidate_axes(a: &BoundingVolume, b: &BoundingVolume, tolerance: f32) -> Vec<Vec3> {
    let mut axes = Vec::with_capacity(15);
    for axis in a.normals().iter().chain(b.normals()) {
        push_unique_axis(&mut axes, *axis, tolerance);
    }
    for na in a.normals() {
        for nb in b.normals() {
            let cross = na.cross(*nb);
            // Parallel edges give no new axis
            if cross.length_squared() < tolerance * tolerance {
                continue;
            }
            push_unique_axis(&mut axes, cross.normalize(), tolerance);
        }
    }
    axes
}

/// Full SAT test. Returns the minimum-overlap axis and its depth, or `None`
/// as soon as a separating axis is found.
pub fn sat_contact(a: &BoundingVolume, b: &BoundingVolume, tolerance: f32) -> Option<ContactInfo> {
    let mut min_overlap = f32::MAX;
    let mut best_axis = Vec3::ZERO;

    for axis in candidate_axes(a, b, tolerance) {
        let (min_a, max_a) = a.project(axis);
        let (min_b, max_b) = b.project(axis);
        let overlap = max_a.min(max_b) - min_a.max(min_b);
        if overlap <= 0.0 {
            return None;
        }
        if overlap < min_overlap {
            min_overlap = overlap;
            best_axis = axis;
        }
    }

    if best_axis == Vec3::ZERO {
        return None;
    }

    Some(ContactInfo {
        normal: best_axis,
        penetration: min_overlap,
    })
}

/// Whether any member of `group_a` overlaps any member of `group_b`. Nothing is mutated.
///
/// # Panics
///
/// Panics if a member handle is out of bounds for `bodies`.
pub fn detect_only(group_a: &Group, group_b: &Group, bodies: &[RigidBody]) -> bool {
    group_a.bodies(bodies).any(|body_a| {
        group_b.bodies(bodies).any(|body_b| match (body_a.bounding(), body_b.bounding()) {
            (Some(a), Some(b)) => overlaps(a, b),
            _ => false,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    const TOL: f32 = 1e-4;

    fn unit_box(transform: Mat4) -> BoundingVolume {
        BoundingVolume::from_transform(transform, TOL).unwrap()
    }

    #[test]
    fn test_sat_box_box_intersection() {
        let a = unit_box(Mat4::IDENTITY);
        let b = unit_box(Mat4::from_translation(Vec3::new(1.5, 0.0, 0.0)));

        let info = sat_contact(&a, &b, TOL).unwrap();
        let eps = 1e-4;
        assert!((info.normal.abs() - Vec3::X).length() < eps);
        assert!((info.penetration - 0.5).abs() < eps);
        assert!(overlaps(&a, &b));
    }

    #[test]
    fn test_sat_box_box_no_intersection() {
        let a = unit_box(Mat4::IDENTITY);
        let b = unit_box(Mat4::from_translation(Vec3::new(3.0, 0.0, 0.0)));

        assert!(sat_contact(&a, &b, TOL).is_none());
        assert!(!overlaps(&a, &b));
    }

    #[test]
    fn test_touching_boxes() {
        let a = unit_box(Mat4::IDENTITY);
        let b = unit_box(Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0)));

        // Zero overlap is a contact for the boolean test only
        assert!(overlaps(&a, &b));
        assert!(sat_contact(&a, &b, TOL).is_none());
    }

    #[test]
    fn test_edge_edge_axis_separates() {
        // Two boxes rotated 45 degrees about different axes, placed so that face
        // normals all overlap but an edge-edge axis separates them.
        let a = unit_box(Mat4::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let b = unit_box(
            Mat4::from_translation(Vec3::new(1.75, 1.75, 1.75))
                * Mat4::from_rotation_x(std::f32::consts::FRAC_PI_4),
        );

        assert!(overlaps(&a, &b));
        assert!(sat_contact(&a, &b, TOL).is_none());
    }

    #[test]
    fn test_resolving_implies_boolean() {
        let a = unit_box(Mat4::from_rotation_z(0.3));
        for i in 0..40 {
            let t = i as f32 * 0.1;
            let b = unit_box(
                Mat4::from_translation(Vec3::new(t, 0.5 * t, -0.25 * t))
                    * Mat4::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), t),
            );
            if sat_contact(&a, &b, TOL).is_some() {
                assert!(overlaps(&a, &b), "boolean test missed contact at t = {}", t);
            }
        }
    }

    #[test]
    fn test_candidate_axes_deduplicated() {
        let a = unit_box(Mat4::IDENTITY);
        let b = unit_box(Mat4::from_translation(Vec3::new(0.5, 0.0, 0.0)));

        // Aligned boxes share all face normals and every cross product is parallel to one
        assert_eq!(candidate_axes(&a, &b, TOL).len(), 3);

        let c = unit_box(Mat4::from_axis_angle(Vec3::new(1.0, 1.0, 1.0).normalize(), 0.4));
        let axes = candidate_axes(&a, &c, TOL);
        assert!(axes.len() > 6 && axes.len() <= 15);
        for (i, x) in axes.iter().enumerate() {
            for y in &axes[i + 1..] {
                assert!(x.dot(*y).abs() < 1.0 - TOL);
            }
        }
    }
}
