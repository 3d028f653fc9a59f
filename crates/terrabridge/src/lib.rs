//! Bridge between an ECEF map streaming engine and a rendering engine.
//!
//! This crate provides:
//! - Geographic coordinates, tangent bases and the two coordinate frames
//!   that place ECEF data in an engine's single-precision space
//! - Camera placement around an interest point, eased transitions, gestures
//!   and a free-flying camera
//! - The streaming lifecycle: prepared meshes, live objects, shared
//!   materials and streamed textures
//! - [`MapSession`], which owns all of it for one map
//!
//! Mesh chunking and normal generation live in [`terrabridge_mesh`].

pub mod camera;
pub mod config;
pub mod engine;
mod error;
pub mod render;
mod session;
pub mod space;
pub mod streaming;

#[cfg(test)]
mod testing;

pub use config::{CoordinateSystem, MapConfig};
pub use engine::{EngineEvent, EngineIngress, NativeCameraState, StreamingEngine};
pub use error::{Error, Result};
pub use render::SceneBackend;
pub use session::{DEFAULT_START_PITCH, MapSession};
pub use terrabridge_mesh as mesh;
