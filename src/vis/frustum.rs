//! View-frustum extraction and containment tests.
//!
//! The six clip-space half-planes are pulled out of a combined
//! view-projection matrix with the usual row-combination trick and
//! normalised to unit normals. Box tests pick the two diagonal corners that
//! matter per plane from an eight-entry lookup instead of testing all eight
//! corners against all six planes.

use bitflags::bitflags;
use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

/// Slack before a corner counts as behind a plane.
const PLANE_EPSILON: f32 = 0.02;

pub const LEFT: usize = 0;
pub const RIGHT: usize = 1;
pub const TOP: usize = 2;
pub const BOTTOM: usize = 3;
pub const NEAR: usize = 4;
pub const FAR: usize = 5;

bitflags! {
    /// Outcome of [`Frustum::test_box`]. Empty set means fully outside.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BoxTest: u8 {
        /// At least partially inside the frustum.
        const VISIBLE = 0b01;
        /// Straddles one or more planes (not fully contained).
        const PARTIAL = 0b10;
    }
}

/// Box corner offsets indexed by the sign bits of a plane normal
/// (bit 0 = z, bit 1 = y, bit 2 = x).
const CORNERS: [Vec3; 8] = [
    Vec3::new(-1.0, -1.0, -1.0),
    Vec3::new(-1.0, -1.0, 1.0),
    Vec3::new(-1.0, 1.0, -1.0),
    Vec3::new(-1.0, 1.0, 1.0),
    Vec3::new(1.0, -1.0, -1.0),
    Vec3::new(1.0, -1.0, 1.0),
    Vec3::new(1.0, 1.0, -1.0),
    Vec3::new(1.0, 1.0, 1.0),
];

/// Six half-space planes in `(normal, offset)` form.
///
/// A malformed input matrix (zero or non-finite rows) marks the frustum
/// invalid; every test then reports "outside" so a bad camera frame culls
/// everything instead of crashing the frame loop.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    planes: [Vec4; 6],
    valid: bool,
}

impl Frustum {
    /// Re-derive the planes from a view-projection matrix.
    pub fn update(&mut self, matrix: Mat4) {
        let r0 = matrix.row(0);
        let r1 = matrix.row(1);
        let r2 = matrix.row(2);
        let r3 = matrix.row(3);

        self.planes[LEFT] = r3 + r0;
        self.planes[RIGHT] = r3 - r0;
        self.planes[TOP] = r3 - r1;
        self.planes[BOTTOM] = r3 + r1;
        self.planes[NEAR] = r3 + r2;
        self.planes[FAR] = r3 - r2;

        self.valid = true;
        for plane in &mut self.planes {
            let length = plane.xyz().length();
            if !length.is_finite() || length <= f32::EPSILON {
                self.valid = false;
                return;
            }
            *plane /= length;
        }
    }

    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Signed distance of `point` to plane `i` (positive = inside).
    #[inline(always)]
    fn distance(&self, i: usize, point: Vec3) -> f32 {
        self.planes[i].xyz().dot(point) + self.planes[i].w
    }

    /// Lookup index of the box corner furthest along `v`.
    #[inline(always)]
    fn corner_index(v: Vec3) -> usize {
        let mut idx = 0;
        if v.z >= 0.0 {
            idx |= 1;
        }
        if v.y >= 0.0 {
            idx |= 2;
        }
        if v.x >= 0.0 {
            idx |= 4;
        }
        idx
    }

    /// Test an axis-aligned box given by its `center` and `half_extents`.
    ///
    /// Per plane, only the corner furthest along the normal can prove the
    /// box outside, and only the corner furthest against it can prove the
    /// box not fully contained.
    pub fn test_box(&self, center: Vec3, half_extents: Vec3) -> BoxTest {
        if !self.valid {
            return BoxTest::empty();
        }

        let mut result = BoxTest::VISIBLE;
        for i in 0..6 {
            let normal = self.planes[i].xyz();

            let positive = center + half_extents * CORNERS[Self::corner_index(normal)];
            if self.distance(i, positive) < -PLANE_EPSILON {
                return BoxTest::empty();
            }

            let negative = center + half_extents * CORNERS[Self::corner_index(-normal)];
            if self.distance(i, negative) < -PLANE_EPSILON {
                result |= BoxTest::PARTIAL;
            }
        }
        result
    }

    /// Sphere variant: outside as soon as the center sits `radius` behind
    /// any plane.
    pub fn test_sphere(&self, center: Vec3, radius: f32) -> bool {
        if !self.valid {
            return false;
        }
        for i in 0..6 {
            if self.distance(i, center) <= -radius {
                return false;
            }
        }
        true
    }
}

// ──────────────────────────────────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    /// Identity clip volume: the cube `[-1, 1]^3`.
    fn unit_frustum() -> Frustum {
        let mut f = Frustum::default();
        f.update(Mat4::IDENTITY);
        f
    }

    fn perspective() -> Frustum {
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let mut f = Frustum::default();
        f.update(proj * view);
        f
    }

    #[test]
    fn planes_are_normalised() {
        let f = perspective();
        for plane in f.planes {
            assert!((plane.xyz().length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn box_inside_is_visible_not_partial() {
        let f = unit_frustum();
        let t = f.test_box(Vec3::ZERO, Vec3::splat(0.5));
        assert_eq!(t, BoxTest::VISIBLE);
    }

    #[test]
    fn box_behind_one_plane_is_outside() {
        let f = unit_frustum();
        let t = f.test_box(Vec3::new(3.0, 0.0, 0.0), Vec3::splat(0.5));
        assert!(t.is_empty());
    }

    #[test]
    fn box_straddling_one_plane_intersects() {
        let f = unit_frustum();
        // Pokes through x = +1 but stays inside every other plane.
        let t = f.test_box(Vec3::new(1.0, 0.0, 0.0), Vec3::splat(0.5));
        assert!(t.contains(BoxTest::VISIBLE));
        assert!(t.contains(BoxTest::PARTIAL));
    }

    #[test]
    fn perspective_culls_behind_camera() {
        let f = perspective();
        assert!(f.test_box(Vec3::new(0.0, 0.0, 5.0), Vec3::splat(0.5)).is_empty());
        assert_eq!(
            f.test_box(Vec3::new(0.0, 0.0, -5.0), Vec3::splat(0.5)),
            BoxTest::VISIBLE
        );
    }

    #[test]
    fn sphere_test_matches_planes() {
        let f = unit_frustum();
        assert!(f.test_sphere(Vec3::ZERO, 0.5));
        assert!(!f.test_sphere(Vec3::new(-3.0, 0.0, 0.0), 0.5));
    }

    #[test]
    fn degenerate_matrix_sees_nothing() {
        let mut f = Frustum::default();
        f.update(Mat4::ZERO);
        assert!(!f.is_valid());
        assert!(f.test_box(Vec3::ZERO, Vec3::ONE).is_empty());
        assert!(!f.test_sphere(Vec3::ZERO, 100.0));
    }
}
