//! Tangent bases anchored to points on the Earth's surface.

use glam::{DMat3, DQuat, DVec3, Vec3};

/// Below this length a cross product is treated as degenerate.
const DEGENERATE_LENGTH: f32 = 1e-4;

/// A right/up/forward frame at an ECEF point.
///
/// `up` is radial, `forward` is the requested direction projected onto the
/// tangent plane and `right` completes a right-handed set with
/// `right = forward × up`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentBasis {
    pub point: DVec3,
    pub right: Vec3,
    pub up: Vec3,
    pub forward: Vec3,
}

impl TangentBasis {
    /// Build a basis at `point` facing as close to `direction` as the tangent
    /// plane allows.
    ///
    /// When `direction` is parallel to up, world Y is used instead, or world
    /// X if up is itself along Y.
    #[must_use]
    pub fn new(point: DVec3, direction: Vec3) -> Self {
        let up = point.normalize_or(DVec3::Z).as_vec3();
        let mut right = direction.cross(up);
        if right.length() < DEGENERATE_LENGTH {
            let fallback = if up.dot(Vec3::Y).abs() < 1.0 - f32::EPSILON {
                Vec3::Y
            } else {
                Vec3::X
            };
            right = fallback.cross(up);
        }
        let right = right.normalize();
        let forward = up.cross(right);
        Self {
            point,
            right,
            up,
            forward,
        }
    }

    /// Build a basis at `point` whose forward is `heading_degrees` clockwise
    /// from north.
    #[must_use]
    pub fn from_point_and_heading(point: DVec3, heading_degrees: f64) -> Self {
        Self::new(point, heading_direction(point, heading_degrees))
    }

    /// Move the basis to a new point, keeping the forward direction as
    /// close as possible.
    pub fn set_point(&mut self, point: DVec3) {
        *self = Self::new(point, self.forward);
    }

    /// Re-derive the basis for a new heading at the same point.
    pub fn set_heading(&mut self, heading_degrees: f64) {
        *self = Self::from_point_and_heading(self.point, heading_degrees);
    }

    /// Heading of `forward` clockwise from north, in `[0, 360)`.
    #[must_use]
    pub fn heading_degrees(&self) -> f64 {
        let (north, east) = north_east(self.point);
        let forward = self.forward.as_dvec3();
        forward.dot(east).atan2(forward.dot(north)).to_degrees().rem_euclid(360.0)
    }

    /// Rotation taking local `(x = right, y = up, z = -forward)` axes to ECEF.
    #[must_use]
    pub fn local_to_ecef_rotation(&self) -> DQuat {
        let basis = DMat3::from_cols(
            self.right.as_dvec3(),
            self.up.as_dvec3(),
            -self.forward.as_dvec3(),
        );
        DQuat::from_mat3(&basis).normalize()
    }
}

/// North and east unit vectors at an ECEF point.
///
/// On the polar axis north is undefined; world X stands in for east there.
#[must_use]
pub fn north_east(point: DVec3) -> (DVec3, DVec3) {
    let up = point.normalize_or(DVec3::Z);
    let east = DVec3::Z.cross(up).try_normalize().unwrap_or(DVec3::Y);
    let north = up.cross(east);
    (north, east)
}

/// Unit tangent direction `heading_degrees` clockwise from north at `point`.
#[must_use]
pub fn heading_direction(point: DVec3, heading_degrees: f64) -> Vec3 {
    let (north, east) = north_east(point);
    let heading = heading_degrees.to_radians();
    (north * heading.cos() + east * heading.sin()).as_vec3()
}
