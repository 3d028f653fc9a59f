//! A scene backend that keeps bookkeeping instead of drawing.

use std::collections::{HashMap, HashSet};

use terrabridge::camera::CameraProjection;
use terrabridge::render::{
    GeometryHandle, MaterialHandle, MaterialTemplate, ObjectDescriptor, ObjectHandle,
    SceneBackend, TextureHandle,
};
use terrabridge::space::LocalTransform;
use terrabridge::streaming::TextureBuffer;
use terrabridge_mesh::PreparedMeshChunk;

#[derive(Debug, Clone, Copy)]
struct ObjectInfo {
    active: bool,
    transform: LocalTransform,
}

/// Snapshot of what the backend currently holds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BackendStats {
    pub geometries: usize,
    pub objects: usize,
    pub active_objects: usize,
    pub materials: usize,
    pub textures: usize,
    pub uploaded_vertices: usize,
    /// Furthest active object from the engine origin, in metres.
    pub max_object_distance: f32,
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: u64,
    geometries: HashSet<GeometryHandle>,
    objects: HashMap<ObjectHandle, ObjectInfo>,
    materials: HashMap<MaterialHandle, String>,
    textures: HashSet<TextureHandle>,
    uploaded_vertices: usize,
    camera: Option<LocalTransform>,
}

impl HeadlessBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    #[must_use]
    pub fn camera(&self) -> Option<LocalTransform> {
        self.camera
    }

    #[must_use]
    pub fn stats(&self) -> BackendStats {
        let active = self.objects.values().filter(|o| o.active);
        BackendStats {
            geometries: self.geometries.len(),
            objects: self.objects.len(),
            active_objects: active.clone().count(),
            materials: self.materials.len(),
            textures: self.textures.len(),
            uploaded_vertices: self.uploaded_vertices,
            max_object_distance: active
                .map(|o| o.transform.translation.length())
                .fold(0.0, f32::max),
        }
    }
}

impl SceneBackend for HeadlessBackend {
    fn create_geometry(&mut self, chunk: &PreparedMeshChunk) -> GeometryHandle {
        let handle = GeometryHandle(self.next());
        self.uploaded_vertices += chunk.positions.len();
        self.geometries.insert(handle);
        handle
    }

    fn destroy_geometry(&mut self, geometry: GeometryHandle) {
        if !self.geometries.remove(&geometry) {
            tracing::warn!(?geometry, "destroying unknown geometry");
        }
    }

    fn create_object(&mut self, descriptor: &ObjectDescriptor<'_>) -> ObjectHandle {
        let handle = ObjectHandle(self.next());
        tracing::trace!(name = descriptor.name, kind = descriptor.kind.label(), "create object");
        self.objects.insert(
            handle,
            ObjectInfo {
                active: false,
                transform: LocalTransform::IDENTITY,
            },
        );
        handle
    }

    fn destroy_object(&mut self, object: ObjectHandle) {
        self.objects.remove(&object);
    }

    fn set_object_active(&mut self, object: ObjectHandle, active: bool) {
        if let Some(info) = self.objects.get_mut(&object) {
            info.active = active;
        }
    }

    fn set_object_transform(&mut self, object: ObjectHandle, transform: LocalTransform) {
        if let Some(info) = self.objects.get_mut(&object) {
            info.transform = transform;
        }
    }

    fn load_material(&mut self, _directory: &str, _name: &str) -> Option<MaterialHandle> {
        None
    }

    fn create_material(&mut self, name: &str, template: &MaterialTemplate) -> MaterialHandle {
        let handle = MaterialHandle(self.next());
        tracing::trace!(name, ?template, "create material");
        self.materials.insert(handle, name.to_owned());
        handle
    }

    fn destroy_material(&mut self, material: MaterialHandle) {
        self.materials.remove(&material);
    }

    fn create_texture(&mut self, buffer: &TextureBuffer) -> TextureHandle {
        let handle = TextureHandle(self.next());
        tracing::trace!(id = buffer.id.0, width = buffer.width, height = buffer.height, "create texture");
        self.textures.insert(handle);
        handle
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        self.textures.remove(&texture);
    }

    fn set_material_texture(&mut self, material: MaterialHandle, texture: TextureHandle) {
        if let Some(name) = self.materials.get(&material) {
            tracing::trace!(material = %name, ?texture, "texture attached");
        }
    }

    fn set_camera(&mut self, transform: LocalTransform, _projection: &CameraProjection) {
        self.camera = Some(transform);
    }
}
