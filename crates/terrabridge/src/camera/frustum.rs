//! Projection parameters, view frusta and the per-frame streaming view.

use glam::{DMat4, DQuat, DVec3, DVec4};

use crate::camera::look_at::CameraPlacement;

/// Perspective projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraProjection {
    /// Vertical field of view in radians.
    pub fov_y: f64,
    /// Width over height.
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for CameraProjection {
    fn default() -> Self {
        Self {
            fov_y: std::f64::consts::FRAC_PI_4,
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 100_000.0,
        }
    }
}

impl CameraProjection {
    /// Right-handed perspective matrix with depth in `[0, 1]`.
    #[must_use]
    pub fn matrix(&self) -> DMat4 {
        DMat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

/// A view frustum as six inward-facing planes.
///
/// Each plane is `(normal, distance)` packed as `xyz` and `w`; a point `p`
/// is inside when `normal · p + distance >= 0` for every plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    planes: [DVec4; 6],
}

impl Frustum {
    /// Extract the planes from a view-projection matrix with depth in
    /// `[0, 1]`.
    #[must_use]
    pub fn from_matrix(vp: DMat4) -> Self {
        let m = vp.to_cols_array_2d();
        let row = |r: usize| DVec4::new(m[0][r], m[1][r], m[2][r], m[3][r]);
        let (x, y, z, w) = (row(0), row(1), row(2), row(3));

        // Left, right, bottom, top, near, far.
        let planes = [w + x, w - x, w + y, w - y, z, w - z].map(Self::normalize_plane);
        Self { planes }
    }

    fn normalize_plane(plane: DVec4) -> DVec4 {
        let length = plane.truncate().length();
        if length > 0.0 {
            plane / length
        } else {
            DVec4::ZERO
        }
    }

    #[must_use]
    pub fn planes(&self) -> &[DVec4; 6] {
        &self.planes
    }

    #[must_use]
    pub fn contains_point(&self, point: DVec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(point) + plane.w >= 0.0)
    }

    #[must_use]
    pub fn intersects_sphere(&self, center: DVec3, radius: f64) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }
}

/// What the streaming engine is told about the camera each frame.
///
/// The view is zero-origin: the camera sits at the origin of ECEF-aligned
/// axes and `origin_ecef` carries its true position, so the matrices and
/// planes stay small enough for single precision on the engine side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamingView {
    pub origin_ecef: DVec3,
    pub interest_point_ecef: DVec3,
    /// Camera orientation in ECEF axes, looking along local -Z.
    pub rotation: DQuat,
    pub projection: CameraProjection,
    pub view_projection: DMat4,
    pub frustum: Frustum,
}

impl StreamingView {
    #[must_use]
    pub fn new(camera: &CameraPlacement, interest_point_ecef: DVec3, projection: CameraProjection) -> Self {
        let view = DMat4::look_to_rh(DVec3::ZERO, camera.forward, camera.up);
        let view_projection = projection.matrix() * view;
        Self {
            origin_ecef: camera.position,
            interest_point_ecef,
            rotation: camera.rotation(),
            projection,
            view_projection,
            frustum: Frustum::from_matrix(view_projection),
        }
    }

    /// Whether an ECEF point is inside the view.
    #[must_use]
    pub fn contains_ecef(&self, point: DVec3) -> bool {
        self.frustum.contains_point(point - self.origin_ecef)
    }
}
