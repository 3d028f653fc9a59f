//! The boundary to the external streaming engine.
//!
//! The engine decides what to stream for a camera and produces mesh and
//! texture data on its own thread through an [`EngineIngress`]. It reports
//! lifecycle changes back as [`EngineEvent`]s, which the session applies on
//! the main thread.

use glam::DVec3;
use terrabridge_mesh::{MeshCounts, RawMeshBuffer};

use crate::camera::{CameraEvent, SetViewRequest, StreamingView};
use crate::error::Result;
use crate::space::TangentBasis;
use crate::streaming::{MeshUploader, TextureBuffer, TextureFormat, TextureId, TextureUploader};

/// Camera state exported for the engine's own camera queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NativeCameraState {
    pub near: f64,
    pub far: f64,
    /// Vertical field of view in radians.
    pub fov_y: f64,
    pub aspect: f64,
    /// Pitch below the horizon in degrees.
    pub tilt_degrees: f64,
    /// Distance from the camera to the interest point in metres.
    pub distance: f64,
    /// Camera position in ECEF.
    pub origin_ecef: DVec3,
    /// Tangent basis at the interest point, oriented along the heading.
    pub interest_basis: TangentBasis,
}

/// Main-thread notifications from the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A prepared mesh is ready to become live.
    AddMesh { id: String },
    /// A live mesh is no longer needed.
    DeleteMesh { id: String },
    SetVisible { id: String, visible: bool },
    /// A texture id will not be used again.
    ReleaseTexture { id: TextureId },
    /// Authoritative interest point for the next streaming request.
    InterestPoint(DVec3),
    /// Transition notification from an engine-driven camera.
    Camera(CameraEvent),
}

/// Producer-thread entry points into a session.
///
/// Cloneable and shareable across threads; every clone feeds the same
/// session.
#[derive(Debug, Clone)]
pub struct EngineIngress {
    meshes: MeshUploader,
    textures: TextureUploader,
}

impl EngineIngress {
    #[must_use]
    pub fn new(meshes: MeshUploader, textures: TextureUploader) -> Self {
        Self { meshes, textures }
    }

    /// Allocate mesh storage for the producer to fill.
    #[must_use]
    pub fn allocate_unpacked_mesh(
        &self,
        counts: MeshCounts,
        id: &str,
        material_name: &str,
        origin_ecef: DVec3,
    ) -> RawMeshBuffer {
        self.meshes
            .allocate_unpacked_mesh(counts, id, material_name, origin_ecef)
    }

    /// Prepare a filled mesh and store it until its `AddMesh` event.
    ///
    /// Returns `Ok(false)` if a mesh with the same id is already waiting.
    pub fn upload_unpacked_mesh(&self, buffer: RawMeshBuffer) -> Result<bool> {
        self.meshes.upload_unpacked_mesh(buffer)
    }

    #[must_use]
    pub fn allocate_texture_buffer(
        &self,
        width: u32,
        height: u32,
        format: TextureFormat,
        generate_mips: bool,
    ) -> TextureBuffer {
        self.textures
            .allocate_texture_buffer(width, height, format, generate_mips)
    }

    /// Queue a filled texture. Returns `false` after shutdown.
    pub fn upload_texture_buffer(&self, buffer: TextureBuffer) -> bool {
        self.textures.upload_texture_buffer(buffer)
    }
}

/// Operations the session calls on the streaming engine.
pub trait StreamingEngine {
    /// Receive the producer entry points. Called once, before any other
    /// method.
    fn initialize(&mut self, ingress: EngineIngress);

    /// Advance by `dt` seconds and return the events to apply this frame.
    fn update(&mut self, dt: f64, camera: &NativeCameraState) -> Vec<EngineEvent>;

    /// Decide what to stream for this frame's view.
    fn stream_resources_for_camera(&mut self, view: &StreamingView);

    /// Mirror of a view request made on the session.
    fn set_view(&mut self, request: &SetViewRequest);

    /// The texture a streamed-texture material should use, once ready.
    fn texture_id_for_material(&self, material_name: &str) -> Option<TextureId>;

    fn pause(&mut self) {}

    fn resume(&mut self) {}
}
