//! Placing a camera relative to an interest point on the globe.

use glam::{DMat3, DQuat, DVec3};

use crate::space::TangentBasis;

/// Camera state as distance, heading and pitch around an interest point.
///
/// This is the single source of truth for an orbiting camera; its position
/// and orientation are always derived through [`calculate_look_at`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    /// Look-at target in ECEF metres.
    pub interest_point: DVec3,
    /// Distance from the interest point in metres.
    pub distance: f64,
    /// Degrees clockwise from north.
    pub heading_degrees: f64,
    /// Degrees below the local horizon; 90 looks straight down.
    pub pitch_degrees: f64,
}

/// A derived camera position and orientation in ECEF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPlacement {
    pub position: DVec3,
    /// Unit view direction.
    pub forward: DVec3,
    pub up: DVec3,
    pub right: DVec3,
}

impl CameraPlacement {
    /// Build a placement from a position and view direction, with `up_hint`
    /// resolving the roll.
    #[must_use]
    pub fn looking_to(position: DVec3, forward: DVec3, up_hint: DVec3) -> Self {
        let forward = forward.normalize_or(DVec3::NEG_Z);
        let right = forward
            .cross(up_hint)
            .try_normalize()
            .unwrap_or_else(|| forward.any_orthonormal_vector());
        let up = right.cross(forward);
        Self {
            position,
            forward,
            up,
            right,
        }
    }

    /// Orientation with the camera looking along local -Z and y up.
    #[must_use]
    pub fn rotation(&self) -> DQuat {
        DQuat::from_mat3(&DMat3::from_cols(self.right, self.up, -self.forward)).normalize()
    }
}

/// Derive the camera placement for a pose.
///
/// Builds a tangent basis at the interest point facing the heading, tilts
/// the basis forward vector down about the basis right axis by the pitch,
/// and backs the camera away from the interest point along that direction.
/// Pitch is measured from the local horizon, so the result is the same at
/// any latitude or longitude.
#[must_use]
pub fn calculate_look_at(pose: &CameraPose) -> CameraPlacement {
    let basis = TangentBasis::from_point_and_heading(pose.interest_point, pose.heading_degrees);
    let right = basis.right.as_dvec3();
    let tilt = DQuat::from_axis_angle(right, -pose.pitch_degrees.to_radians());
    let forward = (tilt * basis.forward.as_dvec3()).normalize();
    let up = right.cross(forward);
    CameraPlacement {
        position: pose.interest_point - forward * pose.distance,
        forward,
        up,
        right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::{LatLongAltitude, heading_direction};

    fn transamerica(distance: f64, heading: f64, pitch: f64) -> CameraPose {
        CameraPose {
            interest_point: LatLongAltitude::new(37.7951572, -122.4028915, 0.0).to_ecef(),
            distance,
            heading_degrees: heading,
            pitch_degrees: pitch,
        }
    }

    #[test]
    fn test_look_at_east_at_45_degrees() {
        let pose = transamerica(1500.0, 90.0, 45.0);
        let placement = calculate_look_at(&pose);

        let offset = pose.interest_point - placement.position;
        assert!((offset.length() - 1500.0).abs() < 1e-3);

        let up = pose.interest_point.normalize();
        let projected = (placement.forward - up * placement.forward.dot(up)).normalize();
        let east = heading_direction(pose.interest_point, 90.0).as_dvec3();
        assert!(projected.abs_diff_eq(east, 1e-5), "{projected} vs {east}");

        // 45 degrees below the horizon.
        let below = (-placement.forward.dot(up)).asin().to_degrees();
        assert!((below - 45.0).abs() < 1e-3);
        // Camera is above the interest point.
        assert!(placement.position.length() > pose.interest_point.length());
    }

    #[test]
    fn test_top_down_and_horizon() {
        let pose = transamerica(1000.0, 0.0, 90.0);
        let placement = calculate_look_at(&pose);
        let up = pose.interest_point.normalize();
        assert!(placement.forward.abs_diff_eq(-up, 1e-5));
        assert!(((placement.position.length() - pose.interest_point.length()) - 1000.0).abs() < 1e-2);

        let pose = transamerica(1000.0, 0.0, 0.0);
        let placement = calculate_look_at(&pose);
        assert!(placement.forward.dot(up).abs() < 1e-5);
    }

    #[test]
    fn test_placement_is_orthonormal() {
        let placement = calculate_look_at(&transamerica(500.0, 210.0, 30.0));
        assert!(placement.forward.dot(placement.up).abs() < 1e-6);
        assert!(placement.right.dot(placement.up).abs() < 1e-6);
        assert!(placement.right.dot(placement.forward).abs() < 1e-6);
        assert!(placement.forward.cross(placement.up).abs_diff_eq(placement.right, 1e-6));

        let rotation = placement.rotation();
        assert!((rotation * DVec3::NEG_Z).abs_diff_eq(placement.forward, 1e-6));
        assert!((rotation * DVec3::Y).abs_diff_eq(placement.up, 1e-6));
    }

    #[test]
    fn test_looking_to_matches_look_at() {
        let look_at = calculate_look_at(&transamerica(800.0, 45.0, 60.0));
        let rebuilt = CameraPlacement::looking_to(look_at.position, look_at.forward, look_at.up);
        assert!(rebuilt.right.abs_diff_eq(look_at.right, 1e-9));
        assert!(rebuilt.up.abs_diff_eq(look_at.up, 1e-9));
    }
}
