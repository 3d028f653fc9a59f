//! Camera controller: immediate moves and eased, interruptible transitions.

use glam::{DQuat, DVec3};

use crate::camera::gesture::{CameraGesture, apply_gesture};
use crate::camera::look_at::{CameraPlacement, CameraPose, calculate_look_at};
use crate::error::{Error, Result};
use crate::space::{LatLong, LatLongAltitude};

/// Notifications for collaborators that gate input on camera motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraEvent {
    TransitionStart,
    TransitionEnd,
}

/// A partial pose; `None` fields keep the current value.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CameraUpdate {
    pub interest_point: Option<DVec3>,
    pub distance: Option<f64>,
    pub heading_degrees: Option<f64>,
    pub pitch_degrees: Option<f64>,
}

impl CameraUpdate {
    #[must_use]
    pub fn interest_point(mut self, interest_point: DVec3) -> Self {
        self.interest_point = Some(interest_point);
        self
    }

    /// Look at a point on the ground.
    #[must_use]
    pub fn lat_long(self, lat_long: LatLong) -> Self {
        self.interest_point(lat_long.with_altitude(0.0).to_ecef())
    }

    /// A complete update that puts the camera at `camera`, looking at
    /// `interest`.
    ///
    /// Distance, heading and pitch are derived from the ground distance and
    /// altitude difference between the two points.
    #[must_use]
    pub fn from_camera_position(interest: LatLongAltitude, camera: LatLongAltitude) -> Self {
        let ground = camera.lat_long().great_circle_distance(interest.lat_long());
        let height = camera.altitude - interest.altitude;
        Self {
            interest_point: Some(interest.to_ecef()),
            distance: Some(ground.hypot(height)),
            heading_degrees: Some(camera.lat_long().bearing_to(interest.lat_long())),
            pitch_degrees: Some(height.atan2(ground).to_degrees()),
        }
    }

    #[must_use]
    pub fn distance(mut self, distance: f64) -> Self {
        self.distance = Some(distance);
        self
    }

    #[must_use]
    pub fn heading(mut self, heading_degrees: f64) -> Self {
        self.heading_degrees = Some(heading_degrees);
        self
    }

    #[must_use]
    pub fn pitch(mut self, pitch_degrees: f64) -> Self {
        self.pitch_degrees = Some(pitch_degrees);
        self
    }

    /// Fill the missing fields from `current`.
    #[must_use]
    pub fn resolve(&self, current: &CameraPose) -> CameraPose {
        CameraPose {
            interest_point: self.interest_point.unwrap_or(current.interest_point),
            distance: self.distance.unwrap_or(current.distance),
            heading_degrees: self.heading_degrees.unwrap_or(current.heading_degrees),
            pitch_degrees: self.pitch_degrees.unwrap_or(current.pitch_degrees),
        }
    }
}

/// A complete view request, as forwarded to the streaming engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SetViewRequest {
    pub update: CameraUpdate,
    pub animated: bool,
    pub duration_seconds: Option<f64>,
    pub jump_if_far_away: bool,
    /// Whether user gestures may cut the transition short.
    pub allow_interruption: bool,
}

/// Tuning for a [`CameraController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionSettings {
    /// Animated moves further than this jump instead, in metres.
    pub jump_distance_threshold: f64,
    pub default_duration_seconds: f64,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            jump_distance_threshold: 500_000.0,
            default_duration_seconds: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: CameraPose,
    to: CameraPose,
    elapsed: f64,
    duration: f64,
    allow_interruption: bool,
}

impl Transition {
    fn pose_at(&self, t: f64) -> CameraPose {
        let eased = ease(t);
        let (from, to) = (&self.from, &self.to);

        // The interest point travels along the great circle between the two
        // targets while its radius is interpolated.
        let from_direction = from.interest_point.normalize_or(DVec3::Z);
        let to_direction = to.interest_point.normalize_or(DVec3::Z);
        let arc = DQuat::from_rotation_arc(from_direction, to_direction);
        let direction = DQuat::IDENTITY.slerp(arc, eased) * from_direction;
        let from_radius = from.interest_point.length();
        let radius = from_radius + (to.interest_point.length() - from_radius) * eased;

        let heading_delta = shortest_angle(from.heading_degrees, to.heading_degrees);

        CameraPose {
            interest_point: direction * radius,
            distance: from.distance + (to.distance - from.distance) * eased,
            heading_degrees: (from.heading_degrees + heading_delta * eased).rem_euclid(360.0),
            pitch_degrees: from.pitch_degrees + (to.pitch_degrees - from.pitch_degrees) * eased,
        }
    }
}

/// Quintic ease with flat first and second derivatives at both ends.
fn ease(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t.powi(3) * (10.0 - 15.0 * t + 6.0 * t * t)
}

/// Signed shortest rotation from `from` to `to`, in `(-180, 180]`.
fn shortest_angle(from: f64, to: f64) -> f64 {
    let delta = (to - from).rem_euclid(360.0);
    if delta > 180.0 { delta - 360.0 } else { delta }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ControllerState {
    Idle,
    Transitioning(Transition),
}

/// Drives an orbiting camera's pose.
///
/// The controller is either idle or running one transition. Any new move
/// discards the in-flight transition. Each transition emits exactly one
/// [`CameraEvent::TransitionStart`] and one [`CameraEvent::TransitionEnd`],
/// collected until [`CameraController::take_events`] is called.
#[derive(Debug, Clone)]
pub struct CameraController {
    pose: CameraPose,
    state: ControllerState,
    settings: TransitionSettings,
    bound: bool,
    pending_events: Vec<CameraEvent>,
}

impl CameraController {
    /// Create an idle controller with no camera bound.
    #[must_use]
    pub fn new(pose: CameraPose, settings: TransitionSettings) -> Self {
        Self {
            pose,
            state: ControllerState::Idle,
            settings,
            bound: false,
            pending_events: Vec::new(),
        }
    }

    /// Attach a camera for the controller to drive.
    pub fn bind(&mut self) {
        self.bound = true;
    }

    /// Detach the camera, ending any transition.
    pub fn unbind(&mut self) {
        self.end_transition();
        self.bound = false;
    }

    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    #[must_use]
    pub fn is_transitioning(&self) -> bool {
        matches!(self.state, ControllerState::Transitioning(_))
    }

    /// The current pose.
    #[must_use]
    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    /// The camera placement derived from the current pose.
    #[must_use]
    pub fn placement(&self) -> CameraPlacement {
        calculate_look_at(&self.pose)
    }

    #[must_use]
    pub fn settings(&self) -> &TransitionSettings {
        &self.settings
    }

    /// Jump to a pose immediately.
    pub fn move_to(&mut self, update: &CameraUpdate) -> Result<()> {
        self.ensure_bound()?;
        self.end_transition();
        self.pose = update.resolve(&self.pose);
        Ok(())
    }

    /// Ease towards a pose over `duration_seconds`, or the default duration.
    ///
    /// With `jump_if_far_away`, targets whose interest point is further than
    /// the jump threshold are reached immediately instead.
    pub fn animate_to(
        &mut self,
        update: &CameraUpdate,
        duration_seconds: Option<f64>,
        jump_if_far_away: bool,
    ) -> Result<()> {
        self.animate(update, duration_seconds, jump_if_far_away, true)
    }

    /// Apply a full view request.
    pub fn set_view(&mut self, request: &SetViewRequest) -> Result<()> {
        if request.animated {
            self.animate(
                &request.update,
                request.duration_seconds,
                request.jump_if_far_away,
                request.allow_interruption,
            )
        } else {
            self.move_to(&request.update)
        }
    }

    /// Apply a user gesture.
    ///
    /// Gestures cut an interruptible transition short and are refused
    /// while a non-interruptible one runs.
    pub fn apply_gesture(&mut self, gesture: CameraGesture) -> Result<()> {
        self.ensure_bound()?;
        if let ControllerState::Transitioning(transition) = &self.state {
            if !transition.allow_interruption {
                return Err(Error::TransitionNotInterruptible);
            }
            self.end_transition();
        }
        apply_gesture(&mut self.pose, gesture);
        Ok(())
    }

    /// Advance the running transition by `dt` seconds.
    pub fn update(&mut self, dt: f64) {
        let ControllerState::Transitioning(transition) = &mut self.state else {
            return;
        };
        transition.elapsed += dt;
        let t = if transition.duration > 0.0 {
            (transition.elapsed / transition.duration).min(1.0)
        } else {
            1.0
        };
        if t >= 1.0 {
            self.pose = transition.to;
            self.end_transition();
        } else {
            self.pose = transition.pose_at(t);
        }
    }

    /// Drain the events raised since the last call.
    pub fn take_events(&mut self) -> Vec<CameraEvent> {
        std::mem::take(&mut self.pending_events)
    }

    fn animate(
        &mut self,
        update: &CameraUpdate,
        duration_seconds: Option<f64>,
        jump_if_far_away: bool,
        allow_interruption: bool,
    ) -> Result<()> {
        self.ensure_bound()?;
        let target = update.resolve(&self.pose);
        let duration = duration_seconds.unwrap_or(self.settings.default_duration_seconds);
        let travel = self.pose.interest_point.distance(target.interest_point);

        if duration <= 0.0 || (jump_if_far_away && travel > self.settings.jump_distance_threshold) {
            tracing::debug!(travel, "jumping camera instead of animating");
            self.end_transition();
            self.pose = target;
            return Ok(());
        }

        self.end_transition();
        self.state = ControllerState::Transitioning(Transition {
            from: self.pose,
            to: target,
            elapsed: 0.0,
            duration,
            allow_interruption,
        });
        self.pending_events.push(CameraEvent::TransitionStart);
        Ok(())
    }

    fn end_transition(&mut self) {
        if self.is_transitioning() {
            self.state = ControllerState::Idle;
            self.pending_events.push(CameraEvent::TransitionEnd);
        }
    }

    fn ensure_bound(&self) -> Result<()> {
        if self.bound {
            Ok(())
        } else {
            tracing::error!("camera operation requested with no camera bound");
            Err(Error::NoCameraBound)
        }
    }
}
