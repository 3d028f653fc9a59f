//! Camera placement, transitions and input handling.
//!
//! An orbiting camera is described by a [`CameraPose`] around an interest
//! point and driven by a [`CameraController`]. A [`FlyCamera`] provides free
//! flight; its interest point comes from an [`InterestPointProvider`].

pub mod euler;
mod fly;
mod frustum;
mod gesture;
mod interest;
mod look_at;
mod transition;
pub mod zoom;

pub use fly::{FlyCamera, FlyInput, FlySettings};
pub use frustum::{CameraProjection, Frustum, StreamingView};
pub use gesture::{CameraGesture, MAX_PITCH, MIN_DISTANCE, MIN_PITCH, apply_gesture};
pub use interest::{InterestPointProvider, estimate_interest_point};
pub use look_at::{CameraPlacement, CameraPose, calculate_look_at};
pub use transition::{
    CameraController, CameraEvent, CameraUpdate, SetViewRequest, TransitionSettings,
};
