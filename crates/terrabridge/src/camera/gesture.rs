//! Canonical input gestures applied to an orbiting camera pose.

use crate::camera::look_at::CameraPose;
use crate::camera::zoom::MAX_DISTANCE;
use crate::space::TangentBasis;

/// Closest the camera may zoom to its interest point, in metres.
pub const MIN_DISTANCE: f64 = 5.0;
/// Shallowest pitch a tilt gesture may reach, in degrees below the horizon.
pub const MIN_PITCH: f64 = 10.0;
/// Steepest pitch (straight down).
pub const MAX_PITCH: f64 = 90.0;

/// A gesture produced by the host application's input layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraGesture {
    /// Drag along the ground, in fractions of the camera distance.
    /// Positive `right` moves the view right, positive `forward` moves it
    /// in the heading direction.
    Pan { right: f64, forward: f64 },
    /// Multiply the distance; values below one zoom in.
    Zoom { factor: f64 },
    /// Turn the heading clockwise.
    Rotate { degrees: f64 },
    /// Steepen the pitch.
    Tilt { degrees: f64 },
}

/// Apply a gesture to a pose in place.
pub fn apply_gesture(pose: &mut CameraPose, gesture: CameraGesture) {
    match gesture {
        CameraGesture::Pan { right, forward } => {
            let basis = TangentBasis::from_point_and_heading(pose.interest_point, pose.heading_degrees);
            let radius = pose.interest_point.length();
            let offset = (basis.right.as_dvec3() * right + basis.forward.as_dvec3() * forward)
                * pose.distance;
            let moved = pose.interest_point + offset;
            pose.interest_point = moved.normalize_or(pose.interest_point) * radius;
        }
        CameraGesture::Zoom { factor } => {
            if factor.is_finite() && factor > 0.0 {
                pose.distance = (pose.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
            }
        }
        CameraGesture::Rotate { degrees } => {
            pose.heading_degrees = (pose.heading_degrees + degrees).rem_euclid(360.0);
        }
        CameraGesture::Tilt { degrees } => {
            pose.pitch_degrees = (pose.pitch_degrees + degrees).clamp(MIN_PITCH, MAX_PITCH);
        }
    }
}
