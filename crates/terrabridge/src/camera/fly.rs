//! Free-flying camera with accelerated movement and mouse look.
//!
//! Orientation is stored as a yaw (heading) and an Euler pitch so that
//! mouse look follows the same clamping rules as the host engine.

use glam::{DQuat, DVec3, Vec2, Vec3};

use crate::camera::euler::{apply_pitch_delta, euler_to_signed_pitch, signed_pitch_to_euler};
use crate::camera::look_at::CameraPlacement;
use crate::space::TangentBasis;

/// Movement tuning for a [`FlyCamera`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlySettings {
    /// Metres per second.
    pub max_speed: f64,
    /// Metres per second squared.
    pub acceleration: f64,
    /// Fraction of velocity kept per frame when there is no input.
    pub drag: f64,
    /// Degrees per second per unit of look input.
    pub look_sensitivity: f64,
}

impl Default for FlySettings {
    fn default() -> Self {
        Self {
            max_speed: 500.0,
            acceleration: 150.0,
            drag: 0.95,
            look_sensitivity: 20.0,
        }
    }
}

/// One frame of fly input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlyInput {
    /// `x` right, `y` up, `z` forward; each in `[-1, 1]`.
    pub movement: Vec3,
    /// Look delta; `x` turns right, `y` looks up.
    pub look: Vec2,
}

/// A camera that flies freely in ECEF space.
#[derive(Debug, Clone, PartialEq)]
pub struct FlyCamera {
    pub position: DVec3,
    pub velocity: DVec3,
    /// Heading in degrees clockwise from north.
    pub yaw_degrees: f64,
    /// Pitch in the engine's Euler convention, see [`crate::camera::euler`].
    pub euler_pitch: f64,
    pub settings: FlySettings,
}

impl FlyCamera {
    /// Start at a placement, keeping its heading and pitch.
    #[must_use]
    pub fn from_placement(placement: &CameraPlacement, settings: FlySettings) -> Self {
        let basis = TangentBasis::new(placement.position, placement.forward.as_vec3());
        let up = placement.position.normalize_or(DVec3::Z);
        let below = (-placement.forward.dot(up)).clamp(-1.0, 1.0).asin().to_degrees();
        Self {
            position: placement.position,
            velocity: DVec3::ZERO,
            yaw_degrees: basis.heading_degrees(),
            euler_pitch: signed_pitch_to_euler(below),
            settings,
        }
    }

    /// Current placement in ECEF.
    #[must_use]
    pub fn placement(&self) -> CameraPlacement {
        let basis = TangentBasis::from_point_and_heading(self.position, self.yaw_degrees);
        let right = basis.right.as_dvec3();
        let pitch = euler_to_signed_pitch(self.euler_pitch).to_radians();
        let forward = DQuat::from_axis_angle(right, -pitch) * basis.forward.as_dvec3();
        CameraPlacement::looking_to(self.position, forward, basis.up.as_dvec3())
    }

    /// Advance by `dt` seconds. While `frozen` (a transition is running) the
    /// camera stops and ignores input.
    pub fn update(&mut self, input: &FlyInput, dt: f64, frozen: bool) {
        if frozen {
            self.velocity = DVec3::ZERO;
            return;
        }

        let look = input.look.as_dvec2() * self.settings.look_sensitivity * dt;
        self.yaw_degrees = (self.yaw_degrees + look.x).rem_euclid(360.0);
        self.euler_pitch = apply_pitch_delta(self.euler_pitch, -look.y);

        let placement = self.placement();
        let movement = input.movement.as_dvec3();
        let thrust = placement.right * movement.x
            + self.position.normalize_or(DVec3::Z) * movement.y
            + placement.forward * movement.z;

        if thrust.length_squared() > 0.0 {
            self.velocity += thrust.normalize() * self.settings.acceleration * dt;
        } else {
            self.velocity *= self.settings.drag;
        }
        self.velocity = self.velocity.clamp_length_max(self.settings.max_speed);
        self.position += self.velocity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::look_at::{CameraPose, calculate_look_at};
    use crate::space::LatLongAltitude;

    fn camera() -> FlyCamera {
        let placement = calculate_look_at(&CameraPose {
            interest_point: LatLongAltitude::new(40.7, -74.0, 0.0).to_ecef(),
            distance: 1000.0,
            heading_degrees: 60.0,
            pitch_degrees: 30.0,
        });
        FlyCamera::from_placement(&placement, FlySettings::default())
    }

    #[test]
    fn test_from_placement_keeps_orientation() {
        let camera = camera();
        // Meridians converge slightly between the camera and its target.
        assert!((camera.yaw_degrees - 60.0).abs() < 0.05);
        assert!((euler_to_signed_pitch(camera.euler_pitch) - 30.0).abs() < 0.05);
    }

    #[test]
    fn test_accelerates_to_max_speed() {
        let mut camera = camera();
        let input = FlyInput {
            movement: Vec3::Z,
            look: Vec2::ZERO,
        };
        let start = camera.position;
        for _ in 0..600 {
            camera.update(&input, 1.0 / 30.0, false);
        }
        assert!((camera.velocity.length() - 500.0).abs() < 1e-6);
        assert!(camera.position.distance(start) > 1000.0);
    }

    #[test]
    fn test_drag_and_freeze() {
        let mut camera = camera();
        camera.velocity = DVec3::X * 100.0;
        camera.update(&FlyInput::default(), 0.1, false);
        assert!((camera.velocity.length() - 95.0).abs() < 1e-9);

        let position = camera.position;
        camera.update(
            &FlyInput {
                movement: Vec3::Z,
                look: Vec2::new(1.0, 1.0),
            },
            0.1,
            true,
        );
        assert_eq!(camera.velocity, DVec3::ZERO);
        assert_eq!(camera.position, position);
    }

    #[test]
    fn test_look_up_wraps_pitch() {
        let mut camera = camera();
        camera.euler_pitch = 5.0;
        camera.update(
            &FlyInput {
                movement: Vec3::ZERO,
                look: Vec2::new(0.0, 1.0),
            },
            1.0,
            false,
        );
        // Pitched up by 20 degrees, ending 15 above the horizon.
        assert!((camera.euler_pitch - 345.0).abs() < 1e-9);
        let placement = camera.placement();
        let up = camera.position.normalize();
        assert!(placement.forward.dot(up) > 0.0);
    }
}
