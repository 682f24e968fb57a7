//! Math type aliases and helper functions.
//!
//! Provides f32 rendering types over `nalgebra`, projection helpers
//! using the `[0, 1]` depth convention, and a [`Frustum`] for
//! visibility classification.

pub use nalgebra;

// ===== Rendering math (always f32) =====

/// 2D vector (f32).
pub type Vec2 = nalgebra::Vector2<f32>;

/// 3D vector (f32).
pub type Vec3 = nalgebra::Vector3<f32>;

/// 4D vector (f32).
pub type Vec4 = nalgebra::Vector4<f32>;

/// 4x4 matrix (f32).
pub type Mat4 = nalgebra::Matrix4<f32>;

// ===== Helper functions =====

/// Build a right-handed perspective projection with depth range [0, 1].
pub fn perspective_rh(yfov: f32, aspect: f32, znear: f32, zfar: f32) -> Mat4 {
    let f = 1.0 / (yfov / 2.0).tan();
    let nf = 1.0 / (znear - zfar);
    #[rustfmt::skip]
    let result = Mat4::new(
        f / aspect, 0.0,  0.0,              0.0,
        0.0,        f,    0.0,              0.0,
        0.0,        0.0,  zfar * nf,        znear * zfar * nf,
        0.0,        0.0,  -1.0,             0.0,
    );
    result
}

/// Build a right-handed orthographic projection with depth range [0, 1].
pub fn orthographic_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
    let rml = right - left;
    let tmb = top - bottom;
    let fmn = far - near;
    #[rustfmt::skip]
    let result = Mat4::new(
        2.0 / rml, 0.0,       0.0,         -(right + left) / rml,
        0.0,       2.0 / tmb, 0.0,         -(top + bottom) / tmb,
        0.0,       0.0,       -1.0 / fmn,  -near / fmn,
        0.0,       0.0,       0.0,          1.0,
    );
    result
}

/// Right-handed look-at view matrix.
pub fn look_at_rh(eye: &Vec3, target: &Vec3, up: &Vec3) -> Mat4 {
    let eye_point = nalgebra::Point3::from(*eye);
    let target_point = nalgebra::Point3::from(*target);
    nalgebra::Isometry3::look_at_rh(&eye_point, &target_point, up).to_homogeneous()
}

/// Build a translation-only 4x4 matrix.
pub fn mat4_from_translation(t: Vec3) -> Mat4 {
    Mat4::new_translation(&t)
}

/// Extract the translation column of a 4x4 matrix.
pub fn mat4_translation(m: &Mat4) -> Vec3 {
    Vec3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)])
}

/// Largest column norm of the upper-left 3x3 block.
///
/// Used to scale bounding radii through a transform without decomposing it.
pub fn mat4_max_scale(m: &Mat4) -> f32 {
    let sx = Vec3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]).norm();
    let sy = Vec3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]).norm();
    let sz = Vec3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]).norm();
    sx.max(sy).max(sz)
}

// ===== Frustum =====

/// A view frustum described by six inward-facing planes.
///
/// Planes are extracted from a combined view-projection matrix
/// (Gribb-Hartmann method, `[0, 1]` depth convention) and stored as
/// `(normal, d)` in [`Vec4`] form, normalized so plane distances are in
/// world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a combined view-projection matrix.
    pub fn from_matrix(view_proj: &Mat4) -> Self {
        let row = |i: usize| {
            Vec4::new(
                view_proj[(i, 0)],
                view_proj[(i, 1)],
                view_proj[(i, 2)],
                view_proj[(i, 3)],
            )
        };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        let mut planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r2,      // near ([0, 1] depth)
            r3 - r2, // far
        ];

        for plane in &mut planes {
            let norm = Vec3::new(plane.x, plane.y, plane.z).norm();
            if norm > f32::EPSILON {
                *plane /= norm;
            }
        }

        Self { planes }
    }

    /// Test whether a sphere is at least partially inside the frustum.
    pub fn intersects_sphere(&self, center: &Vec3, radius: f32) -> bool {
        self.planes.iter().all(|plane| {
            let distance = plane.x * center.x + plane.y * center.y + plane.z * center.z + plane.w;
            distance >= -radius
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        // A point on the near plane maps to depth 0.
        let near = proj * Vec4::new(0.0, 0.0, -0.1, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
    }

    #[test]
    fn test_frustum_contains_origin_ahead() {
        let view = look_at_rh(
            &Vec3::new(0.0, 0.0, 5.0),
            &Vec3::new(0.0, 0.0, 0.0),
            &Vec3::y(),
        );
        let proj = perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let frustum = Frustum::from_matrix(&(proj * view));

        assert!(frustum.intersects_sphere(&Vec3::new(0.0, 0.0, 0.0), 1.0));
        // Behind the camera.
        assert!(!frustum.intersects_sphere(&Vec3::new(0.0, 0.0, 50.0), 1.0));
        // Far outside the side planes.
        assert!(!frustum.intersects_sphere(&Vec3::new(100.0, 0.0, 0.0), 1.0));
    }

    #[test]
    fn test_frustum_sphere_straddles_plane() {
        let view = look_at_rh(
            &Vec3::new(0.0, 0.0, 5.0),
            &Vec3::new(0.0, 0.0, 0.0),
            &Vec3::y(),
        );
        let proj = perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        let frustum = Frustum::from_matrix(&(proj * view));

        // Center outside the right plane but radius reaches back in.
        assert!(frustum.intersects_sphere(&Vec3::new(6.0, 0.0, 0.0), 3.0));
    }

    #[test]
    fn test_mat4_max_scale() {
        let m = Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 3.0, 0.5));
        assert!((mat4_max_scale(&m) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_mat4_translation() {
        let m = mat4_from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(mat4_translation(&m), Vec3::new(1.0, 2.0, 3.0));
    }
}
