//! Interest point for a camera that is not orbiting a known target.

use glam::DVec3;

use crate::camera::look_at::CameraPlacement;

/// Supplies the camera interest point each frame.
///
/// An authoritative value from the streaming engine is used once and then
/// discarded. Without one, the point is estimated half-way between the near
/// and far clip planes along the view direction.
#[derive(Debug, Clone, Default)]
pub struct InterestPointProvider {
    authoritative: Option<DVec3>,
}

impl InterestPointProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an authoritative interest point for the next query.
    pub fn set_interest_point(&mut self, interest_point: DVec3) {
        self.authoritative = Some(interest_point);
    }

    /// Whether an authoritative value is waiting.
    #[must_use]
    pub fn has_authoritative(&self) -> bool {
        self.authoritative.is_some()
    }

    /// The interest point for this frame, consuming any authoritative value.
    pub fn take_interest_point(&mut self, camera: &CameraPlacement, near: f64, far: f64) -> DVec3 {
        self.authoritative
            .take()
            .unwrap_or_else(|| estimate_interest_point(camera, near, far))
    }
}

/// Camera position plus the view direction times the clip-range midpoint.
#[must_use]
pub fn estimate_interest_point(camera: &CameraPlacement, near: f64, far: f64) -> DVec3 {
    camera.position + camera.forward * ((near + far) * 0.5)
}
