//! The boundary to the host rendering engine.
//!
//! The core never draws anything. It tells a [`SceneBackend`] which
//! geometry, objects, materials and textures exist and where objects sit,
//! and refers to them afterwards through opaque handles.

use terrabridge_mesh::{GeometryKind, PreparedMeshChunk};

use crate::camera::CameraProjection;
use crate::space::LocalTransform;
use crate::streaming::TextureBuffer;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);
    };
}

handle!(
    /// Uploaded vertex and index data.
    GeometryHandle
);
handle!(
    /// A scene object drawing one geometry with one material.
    ObjectHandle
);
handle!(
    /// A material instance.
    MaterialHandle
);
handle!(
    /// A texture built from a [`TextureBuffer`].
    TextureHandle
);

/// Built-in materials used when no named asset exists.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialTemplate {
    /// Stand-in for a landmark until its texture streams in.
    Placeholder,
    /// Stand-in for raster terrain until its texture streams in.
    RasterPlaceholder,
    /// Untextured flat colour, linear RGBA.
    FlatColor([f32; 4]),
}

/// Everything needed to instantiate one scene object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectDescriptor<'a> {
    /// Unique object name, the chunk name.
    pub name: &'a str,
    pub kind: GeometryKind,
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    /// Whether to attach a collider built from the geometry.
    pub collision: bool,
}

/// Operations the host rendering engine provides.
///
/// All calls happen on the main thread during
/// [`MapSession::update`](crate::MapSession::update) or the session's
/// direct operations.
pub trait SceneBackend {
    /// Upload a prepared chunk.
    fn create_geometry(&mut self, chunk: &PreparedMeshChunk) -> GeometryHandle;

    fn destroy_geometry(&mut self, geometry: GeometryHandle);

    /// Create an object. New objects start inactive.
    fn create_object(&mut self, descriptor: &ObjectDescriptor<'_>) -> ObjectHandle;

    fn destroy_object(&mut self, object: ObjectHandle);

    fn set_object_active(&mut self, object: ObjectHandle, active: bool);

    fn set_object_transform(&mut self, object: ObjectHandle, transform: LocalTransform);

    /// Look up a named material asset in `directory`.
    fn load_material(&mut self, directory: &str, name: &str) -> Option<MaterialHandle>;

    /// Instantiate a built-in material.
    fn create_material(&mut self, name: &str, template: &MaterialTemplate) -> MaterialHandle;

    fn destroy_material(&mut self, material: MaterialHandle);

    /// Build a texture from a filled pixel buffer.
    fn create_texture(&mut self, buffer: &TextureBuffer) -> TextureHandle;

    fn destroy_texture(&mut self, texture: TextureHandle);

    fn set_material_texture(&mut self, material: MaterialHandle, texture: TextureHandle);

    /// Place the rendering camera.
    fn set_camera(&mut self, transform: LocalTransform, projection: &CameraProjection);
}
