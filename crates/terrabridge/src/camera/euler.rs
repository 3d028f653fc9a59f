//! Pitch bookkeeping in the engine's Euler-angle convention.
//!
//! Engines that store orientation as Euler angles in `[0, 360)` report the
//! camera pitch with the horizon at 0 and 360, straight down at 90 and
//! straight up at 270. Valid angles are therefore `[0, 90]` and `[270, 360]`.

/// Apply a mouse-look `delta` to a stored Euler pitch, clamping it to the
/// valid ranges.
///
/// A stored angle above 180 is looking up. It is kept at or above 270 and
/// wraps past 360 into the looking-down range, capped at 90. A stored angle
/// at or below 180 is looking down. It is kept at or below 90 and wraps
/// below 0 into the looking-up range, floored at 270.
#[must_use]
pub fn apply_pitch_delta(euler_pitch: f64, delta: f64) -> f64 {
    let pitch = euler_pitch + delta;
    if euler_pitch > 180.0 {
        let pitch = pitch.max(270.0);
        if pitch > 360.0 {
            (pitch - 360.0).min(90.0)
        } else {
            pitch
        }
    } else {
        let pitch = pitch.min(90.0);
        if pitch < 0.0 {
            (pitch + 360.0).max(270.0)
        } else {
            pitch
        }
    }
}

/// Convert a stored Euler pitch to degrees below the horizon in `[-90, 90]`.
#[must_use]
pub fn euler_to_signed_pitch(euler_pitch: f64) -> f64 {
    if euler_pitch > 180.0 {
        euler_pitch - 360.0
    } else {
        euler_pitch
    }
}

/// Convert degrees below the horizon in `[-90, 90]` to a stored Euler pitch.
#[must_use]
pub fn signed_pitch_to_euler(pitch: f64) -> f64 {
    let pitch = pitch.clamp(-90.0, 90.0);
    if pitch < 0.0 { pitch + 360.0 } else { pitch }
}
