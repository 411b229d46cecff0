//! Contact data and contact-point estimation for collision response.

use glam::Vec3;

use super::bounding::{BoundingVolume, BOX_EDGES};
use super::group::BodyHandle;

/// Slack on the `[-1, 1]` face bounds when keeping clipped points.
const CLIP_SLACK: f32 = 1e-4;

/// Result of a resolving SAT test between two boxes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactInfo {
    /// Minimum-overlap axis. Unoriented until the resolver flips it from A to B.
    pub normal: Vec3,
    /// Overlap along `normal`.
    pub penetration: f32,
}

/// A contact that was resolved during a detection pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactReport {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    /// Contact normal (from A to B).
    pub normal: Vec3,
    pub penetration: f32,
    /// Signed impulse magnitude along the normal.
    pub impulse: f32,
}

/// Approximate where `own` touches `opposing`.
///
/// Each edge of `own` is clipped against the six faces of `opposing` in the
/// opposing box's unit-cube space; crossings that land inside the face are
/// averaged in world space. Returns `None` when no edge crosses a face.
///
/// The clip assumes the opposing box is a unit cube in its local space, so very
/// non-uniform bounding scales only give an approximate point.
pub fn estimate_contact_point(own: &BoundingVolume, opposing: &BoundingVolume) -> Option<Vec3> {
    let to_world = opposing.transform();
    let to_local = to_world.inverse();
    let corners = own.corners().map(|c| to_local.transform_point3(c));

    let mut sum = Vec3::ZERO;
    let mut count = 0u32;

    for (i, j) in BOX_EDGES {
        let (start, end) = (corners[i], corners[j]);
        let delta = end - start;
        for axis in 0..3 {
            if delta[axis].abs() <= f32::EPSILON {
                continue;
            }
            for face in [-1.0f32, 1.0] {
                let t = (face - start[axis]) / delta[axis];
                if !(0.0..=1.0).contains(&t) {
                    continue;
                }
                let hit = start + delta * t;
                let inside = (0..3)
                    .filter(|&k| k != axis)
                    .all(|k| hit[k].abs() <= 1.0 + CLIP_SLACK);
                if inside {
                    sum += to_world.transform_point3(hit);
                    count += 1;
                }
            }
        }
    }

    (count > 0).then(|| sum / count as f32)
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
    fn test_box_resting_on_slab() {
        // Thin wide slab whose top face sits at y = 0
        let slab = unit_box(
            Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)) * Mat4::from_scale(Vec3::new(10.0, 1.0, 10.0)),
        );
        // Unit box sunk 0.1 into the slab, centered at x = 2
        let cube = unit_box(Mat4::from_translation(Vec3::new(2.0, 0.9, 0.0)));

        // The cube's four vertical edges pierce the slab's top face
        let point = estimate_contact_point(&cube, &slab).unwrap();
        let eps = 1e-4;
        assert!((point - Vec3::new(2.0, 0.0, 0.0)).length() < eps, "point = {:?}", point);
    }

    #[test]
    fn test_separated_boxes_have_no_contact_point() {
        let a = unit_box(Mat4::IDENTITY);
        let b = unit_box(Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0)));
        assert!(estimate_contact_point(&a, &b).is_none());
        assert!(estimate_contact_point(&b, &a).is_none());
    }

    #[test]
    fn test_small_box_pressed_into_large_face() {
        let big = unit_box(Mat4::IDENTITY);
        // Half-size box spanning x in [1, 2], flush against big's +x face
        let small = unit_box(Mat4::from_translation(Vec3::new(1.5, 0.0, 0.0)) * Mat4::from_scale(Vec3::splat(0.5)));

        // The small box's x-edges start on the big face
        let point = estimate_contact_point(&small, &big).unwrap();
        assert!((point - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-4, "point = {:?}", point);

        // None of the big box's edges reach inside the small box's faces
        assert!(estimate_contact_point(&big, &small).is_none());
    }
}
