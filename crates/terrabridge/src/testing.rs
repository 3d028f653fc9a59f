//! Recording fakes for the rendering and streaming engines.

use std::collections::{HashMap, HashSet};

use terrabridge_mesh::{GeometryKind, PreparedMeshChunk};

use crate::camera::{CameraProjection, SetViewRequest, StreamingView};
use crate::engine::{EngineEvent, EngineIngress, NativeCameraState, StreamingEngine};
use crate::render::{
    GeometryHandle, MaterialHandle, MaterialTemplate, ObjectDescriptor, ObjectHandle,
    SceneBackend, TextureHandle,
};
use crate::space::LocalTransform;
use crate::streaming::{TextureBuffer, TextureId};

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectState {
    pub name: String,
    pub kind: GeometryKind,
    pub geometry: GeometryHandle,
    pub material: MaterialHandle,
    pub collision: bool,
    pub active: bool,
    pub transform: LocalTransform,
}

/// Scene backend that records the live state of everything it was asked to
/// create.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    next_handle: u64,
    pub geometries: HashSet<GeometryHandle>,
    pub objects: HashMap<ObjectHandle, ObjectState>,
    /// Built-in materials by handle.
    pub materials: HashMap<MaterialHandle, MaterialTemplate>,
    /// Names of material assets that `load_material` finds.
    pub assets: HashSet<String>,
    /// Loaded material assets by handle.
    pub loaded: HashMap<MaterialHandle, String>,
    pub material_textures: HashMap<MaterialHandle, TextureHandle>,
    pub textures: HashSet<TextureHandle>,
    pub camera: Option<(LocalTransform, CameraProjection)>,
}

impl RecordingBackend {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    /// A live geometry not backed by any chunk.
    pub fn fake_geometry(&mut self) -> GeometryHandle {
        let handle = GeometryHandle(self.next());
        self.geometries.insert(handle);
        handle
    }

    pub fn object_named(&self, name: &str) -> Option<&ObjectState> {
        self.objects.values().find(|o| o.name == name)
    }
}

impl SceneBackend for RecordingBackend {
    fn create_geometry(&mut self, _chunk: &PreparedMeshChunk) -> GeometryHandle {
        self.fake_geometry()
    }

    fn destroy_geometry(&mut self, geometry: GeometryHandle) {
        assert!(self.geometries.remove(&geometry), "double free of {geometry:?}");
    }

    fn create_object(&mut self, descriptor: &ObjectDescriptor<'_>) -> ObjectHandle {
        let handle = ObjectHandle(self.next());
        self.objects.insert(
            handle,
            ObjectState {
                name: descriptor.name.to_owned(),
                kind: descriptor.kind,
                geometry: descriptor.geometry,
                material: descriptor.material,
                collision: descriptor.collision,
                active: false,
                transform: LocalTransform::IDENTITY,
            },
        );
        handle
    }

    fn destroy_object(&mut self, object: ObjectHandle) {
        assert!(self.objects.remove(&object).is_some(), "double free of {object:?}");
    }

    fn set_object_active(&mut self, object: ObjectHandle, active: bool) {
        self.objects.get_mut(&object).unwrap().active = active;
    }

    fn set_object_transform(&mut self, object: ObjectHandle, transform: LocalTransform) {
        self.objects.get_mut(&object).unwrap().transform = transform;
    }

    fn load_material(&mut self, _directory: &str, name: &str) -> Option<MaterialHandle> {
        if !self.assets.contains(name) {
            return None;
        }
        let handle = MaterialHandle(self.next());
        self.loaded.insert(handle, name.to_owned());
        Some(handle)
    }

    fn create_material(&mut self, _name: &str, template: &MaterialTemplate) -> MaterialHandle {
        let handle = MaterialHandle(self.next());
        self.materials.insert(handle, template.clone());
        handle
    }

    fn destroy_material(&mut self, material: MaterialHandle) {
        let created = self.materials.remove(&material).is_some();
        let loaded = self.loaded.remove(&material).is_some();
        assert!(created || loaded, "double free of {material:?}");
        self.material_textures.remove(&material);
    }

    fn create_texture(&mut self, _buffer: &TextureBuffer) -> TextureHandle {
        let handle = TextureHandle(self.next());
        self.textures.insert(handle);
        handle
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        assert!(self.textures.remove(&texture), "double free of {texture:?}");
    }

    fn set_material_texture(&mut self, material: MaterialHandle, texture: TextureHandle) {
        self.material_textures.insert(material, texture);
    }

    fn set_camera(&mut self, transform: LocalTransform, projection: &CameraProjection) {
        self.camera = Some((transform, *projection));
    }
}

/// Streaming engine that replays queued events and records what it was told.
#[derive(Debug, Default)]
pub struct FakeEngine {
    pub ingress: Option<EngineIngress>,
    /// Returned by the next `update`.
    pub queued: Vec<EngineEvent>,
    pub views: Vec<StreamingView>,
    pub view_requests: Vec<SetViewRequest>,
    pub cameras: Vec<NativeCameraState>,
    pub material_textures: HashMap<String, TextureId>,
    pub paused: bool,
}

impl FakeEngine {
    pub fn ingress(&self) -> &EngineIngress {
        self.ingress.as_ref().unwrap()
    }
}

impl StreamingEngine for FakeEngine {
    fn initialize(&mut self, ingress: EngineIngress) {
        assert!(self.ingress.is_none(), "initialised twice");
        self.ingress = Some(ingress);
    }

    fn update(&mut self, _dt: f64, camera: &NativeCameraState) -> Vec<EngineEvent> {
        self.cameras.push(*camera);
        std::mem::take(&mut self.queued)
    }

    fn stream_resources_for_camera(&mut self, view: &StreamingView) {
        self.views.push(*view);
    }

    fn set_view(&mut self, request: &SetViewRequest) {
        self.view_requests.push(*request);
    }

    fn texture_id_for_material(&self, material_name: &str) -> Option<TextureId> {
        self.material_textures.get(material_name).copied()
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn resume(&mut self) {
        self.paused = false;
    }
}
