//! Live streamed objects, grouped by geometry bucket.

use std::collections::HashMap;

use glam::DVec3;
use terrabridge_mesh::GeometryKind;

use crate::config::CollisionConfig;
use crate::error::{Error, Result};
use crate::render::{GeometryHandle, ObjectDescriptor, ObjectHandle, SceneBackend};
use crate::space::TransformUpdateStrategy;
use crate::streaming::{ConsumedMesh, MaterialRepository};

/// One live identifier and what it owns in the rendering engine.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveObjectRecord {
    pub id: String,
    pub origin_ecef: DVec3,
    /// Shared material name holding one reference.
    pub material_key: String,
    pub objects: Vec<ObjectHandle>,
    pub geometries: Vec<GeometryHandle>,
    pub visible: bool,
}

/// Per-bucket settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketSettings {
    /// Radial lift applied every frame, in metres.
    pub height_offset: f32,
    pub collision: bool,
}

/// Live objects of a single bucket.
#[derive(Debug)]
pub struct ObjectStreamer {
    kind: GeometryKind,
    settings: BucketSettings,
    records: HashMap<String, LiveObjectRecord>,
}

impl ObjectStreamer {
    #[must_use]
    pub fn new(kind: GeometryKind, settings: BucketSettings) -> Self {
        Self {
            kind,
            settings,
            records: HashMap::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    #[must_use]
    pub fn settings(&self) -> &BucketSettings {
        &self.settings
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LiveObjectRecord> {
        self.records.get(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn add(
        &mut self,
        mesh: ConsumedMesh,
        materials: &mut MaterialRepository,
        backend: &mut impl SceneBackend,
    ) -> Result<()> {
        if self.records.contains_key(&mesh.id) {
            tracing::error!(id = %mesh.id, "add for an object that is already live");
            for (_, geometry) in mesh.geometries {
                backend.destroy_geometry(geometry);
            }
            return Err(Error::DuplicateObject { id: mesh.id });
        }

        let (material_key, material) = materials.acquire(&mesh.id, &mesh.material_name, backend);
        let mut objects = Vec::with_capacity(mesh.geometries.len());
        let mut geometries = Vec::with_capacity(mesh.geometries.len());
        for (name, geometry) in &mesh.geometries {
            objects.push(backend.create_object(&ObjectDescriptor {
                name,
                kind: self.kind,
                geometry: *geometry,
                material,
                collision: self.settings.collision,
            }));
            geometries.push(*geometry);
        }

        tracing::debug!(id = %mesh.id, bucket = self.kind.label(), objects = objects.len(), "added object");
        self.records.insert(
            mesh.id.clone(),
            LiveObjectRecord {
                id: mesh.id,
                origin_ecef: mesh.origin_ecef,
                material_key,
                objects,
                geometries,
                visible: false,
            },
        );
        Ok(())
    }

    fn remove(
        &mut self,
        id: &str,
        materials: &mut MaterialRepository,
        backend: &mut impl SceneBackend,
    ) -> bool {
        let Some(record) = self.records.remove(id) else {
            tracing::warn!(id, bucket = self.kind.label(), "remove for an object that is not live");
            return false;
        };
        for object in record.objects {
            backend.destroy_object(object);
        }
        for geometry in record.geometries {
            backend.destroy_geometry(geometry);
        }
        materials.release(&record.material_key, backend);
        true
    }

    fn set_visible(&mut self, id: &str, visible: bool, backend: &mut impl SceneBackend) -> bool {
        let Some(record) = self.records.get_mut(id) else {
            tracing::warn!(id, bucket = self.kind.label(), "visibility change for an object that is not live");
            return false;
        };
        record.visible = visible;
        for &object in &record.objects {
            backend.set_object_active(object, visible);
        }
        true
    }

    fn update_transforms(
        &self,
        frame: &impl TransformUpdateStrategy,
        backend: &mut impl SceneBackend,
    ) {
        for record in self.records.values() {
            let transform = frame.update_transform(record.origin_ecef, self.settings.height_offset);
            for &object in &record.objects {
                backend.set_object_transform(object, transform);
            }
        }
    }
}

/// All live streamed objects.
///
/// Objects are keyed by the identifiers the streaming engine uses, routed
/// to a bucket by the identifier's prefix.
#[derive(Debug)]
pub struct MapScene {
    streamers: [ObjectStreamer; 3],
}

impl MapScene {
    /// Create the terrain, road and building buckets.
    #[must_use]
    pub fn new(road_height_offset: f32, collisions: CollisionConfig) -> Self {
        let bucket = |height_offset, collision| BucketSettings {
            height_offset,
            collision,
        };
        Self {
            streamers: [
                ObjectStreamer::new(GeometryKind::Terrain, bucket(0.0, collisions.terrain)),
                ObjectStreamer::new(GeometryKind::Road, bucket(road_height_offset, collisions.road)),
                ObjectStreamer::new(GeometryKind::Building, bucket(0.0, collisions.building)),
            ],
        }
    }

    #[must_use]
    pub fn streamer(&self, kind: GeometryKind) -> &ObjectStreamer {
        &self.streamers[Self::slot(kind)]
    }

    /// Whether `id` is live.
    ///
    /// Fails for identifiers with an unknown prefix.
    pub fn contains(&self, id: &str) -> Result<bool> {
        let kind = GeometryKind::classify(id)?;
        Ok(self.streamer(kind).get(id).is_some())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LiveObjectRecord> {
        let kind = GeometryKind::classify(id).ok()?;
        self.streamer(kind).get(id)
    }

    /// Total live identifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.streamers.iter().map(ObjectStreamer::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.streamers.iter().all(ObjectStreamer::is_empty)
    }

    /// Instantiate a consumed mesh as live objects.
    ///
    /// New objects start hidden. Fails with [`Error::DuplicateObject`] if the
    /// identifier is already live; the live record is left untouched and the
    /// new mesh's geometry is destroyed.
    pub fn add(
        &mut self,
        mesh: ConsumedMesh,
        materials: &mut MaterialRepository,
        backend: &mut impl SceneBackend,
    ) -> Result<()> {
        self.streamers[Self::slot(mesh.kind)].add(mesh, materials, backend)
    }

    /// Destroy the objects for `id` and release its material.
    ///
    /// Returns `Ok(false)` if `id` is not live.
    pub fn remove(
        &mut self,
        id: &str,
        materials: &mut MaterialRepository,
        backend: &mut impl SceneBackend,
    ) -> Result<bool> {
        let kind = GeometryKind::classify(id)?;
        Ok(self.streamers[Self::slot(kind)].remove(id, materials, backend))
    }

    /// Show or hide the objects for `id`.
    ///
    /// Returns `Ok(false)` if `id` is not live.
    pub fn set_visible(
        &mut self,
        id: &str,
        visible: bool,
        backend: &mut impl SceneBackend,
    ) -> Result<bool> {
        let kind = GeometryKind::classify(id)?;
        Ok(self.streamers[Self::slot(kind)].set_visible(id, visible, backend))
    }

    /// Re-place every live object in `frame`.
    pub fn update_transforms(
        &self,
        frame: &impl TransformUpdateStrategy,
        backend: &mut impl SceneBackend,
    ) {
        for streamer in &self.streamers {
            streamer.update_transforms(frame, backend);
        }
    }

    /// Remove every live object.
    pub fn clear(&mut self, materials: &mut MaterialRepository, backend: &mut impl SceneBackend) {
        for streamer in &mut self.streamers {
            let ids: Vec<String> = streamer.records.keys().cloned().collect();
            for id in ids {
                streamer.remove(&id, materials, backend);
            }
        }
    }

    fn slot(kind: GeometryKind) -> usize {
        match kind {
            GeometryKind::Terrain => 0,
            GeometryKind::Road => 1,
            GeometryKind::Building => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;
    use terrabridge_mesh::{DEFAULT_MAX_CHUNK_VERTICES, MeshCounts, MeshError, RawMeshBuffer};

    use super::*;
    use crate::space::{EARTH_RADIUS, EcefFrame, LatLongAltitude};
    use crate::streaming::{MaterialSettings, MeshUploader};
    use crate::testing::RecordingBackend;

    struct Fixture {
        scene: MapScene,
        materials: MaterialRepository,
        backend: RecordingBackend,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                scene: MapScene::new(0.1, CollisionConfig {
                    building: true,
                    ..CollisionConfig::default()
                }),
                materials: MaterialRepository::new(MaterialSettings::default()),
                backend: RecordingBackend::default(),
            }
        }

        fn mesh(&mut self, id: &str, material: &str, chunks: usize) -> ConsumedMesh {
            let geometries = (0..chunks)
                .map(|i| (format!("{id}_INDEX{i}"), self.backend.fake_geometry()))
                .collect();
            ConsumedMesh {
                id: id.to_owned(),
                kind: GeometryKind::classify(id).unwrap(),
                origin_ecef: LatLongAltitude::new(1.0, 2.0, 0.0).to_ecef(),
                material_name: material.to_owned(),
                geometries,
            }
        }

        fn add(&mut self, id: &str, material: &str, chunks: usize) -> Result<()> {
            let mesh = self.mesh(id, material, chunks);
            self.scene.add(mesh, &mut self.materials, &mut self.backend)
        }
    }

    #[test]
    fn test_add_creates_hidden_objects() {
        let mut f = Fixture::new();
        f.add("B1", "wall", 2).unwrap();

        let record = f.scene.get("B1").unwrap();
        assert_eq!(record.objects.len(), 2);
        assert!(!record.visible);
        for object in &record.objects {
            let state = &f.backend.objects[object];
            assert!(!state.active);
            assert!(state.collision);
            assert_eq!(state.kind, GeometryKind::Building);
        }
        assert_eq!(f.materials.reference_count("wall"), 1);
    }

    #[test]
    fn test_duplicate_add_is_rejected() {
        let mut f = Fixture::new();
        f.add("B1", "wall", 1).unwrap();
        let before = f.scene.get("B1").cloned();
        let objects_before = f.backend.objects.len();

        assert_eq!(
            f.add("B1", "glass", 3),
            Err(Error::DuplicateObject { id: "B1".to_owned() })
        );
        assert_eq!(f.scene.get("B1").cloned(), before);
        assert_eq!(f.backend.objects.len(), objects_before);
        assert_eq!(f.materials.reference_count("glass"), 0);
        assert_eq!(f.materials.reference_count("wall"), 1);
    }

    #[test]
    fn test_remove_releases_everything() {
        let mut f = Fixture::new();
        f.add("B1", "wall", 2).unwrap();
        f.add("B2", "wall", 1).unwrap();
        assert_eq!(f.materials.reference_count("wall"), 2);

        assert_eq!(f.scene.remove("B1", &mut f.materials, &mut f.backend), Ok(true));
        assert_eq!(f.materials.reference_count("wall"), 1);
        assert_eq!(f.backend.objects.len(), 1);
        assert_eq!(f.backend.geometries.len(), 1);

        assert_eq!(f.scene.remove("B1", &mut f.materials, &mut f.backend), Ok(false));
        assert_eq!(f.scene.remove("B2", &mut f.materials, &mut f.backend), Ok(true));
        assert!(f.backend.materials.is_empty());
        assert!(f.scene.is_empty());
    }

    #[test]
    fn test_set_visible_toggles_objects() {
        let mut f = Fixture::new();
        f.add("R1", "road", 2).unwrap();
        assert_eq!(f.scene.set_visible("R1", true, &mut f.backend), Ok(true));
        let record = f.scene.get("R1").unwrap();
        assert!(record.visible);
        assert!(record.objects.iter().all(|o| f.backend.objects[o].active));

        assert_eq!(f.scene.set_visible("R9", true, &mut f.backend), Ok(false));
    }

    #[test]
    fn test_unknown_prefix_is_protocol_error() {
        let mut f = Fixture::new();
        assert!(matches!(
            f.scene.remove("Q1", &mut f.materials, &mut f.backend),
            Err(Error::Mesh(MeshError::UnknownGeometryPrefix { .. }))
        ));
        assert!(f.scene.set_visible("", true, &mut f.backend).is_err());
    }

    #[test]
    fn test_roads_are_lifted() {
        let mut f = Fixture::new();
        f.add("R1", "road", 1).unwrap();
        f.add("L1", "grass", 1).unwrap();
        let origin = f.scene.get("R1").unwrap().origin_ecef;
        let frame = EcefFrame::new(origin);
        f.scene.update_transforms(&frame, &mut f.backend);

        let road = f.scene.get("R1").unwrap().objects[0];
        let terrain = f.scene.get("L1").unwrap().objects[0];
        let lift = f.backend.objects[&road].transform.translation
            - f.backend.objects[&terrain].transform.translation;
        let up = origin.normalize().as_vec3();
        assert!(lift.abs_diff_eq(up * 0.1, 1e-4));
        assert_ne!(lift, Vec3::ZERO);
    }

    /// A vertical wall strip facing +Y, standing on a point whose up is +Z.
    fn wall_strip(id: &str, vertex_count: usize) -> RawMeshBuffer {
        let mut buffer = RawMeshBuffer::allocate(
            MeshCounts {
                vertices: vertex_count,
                indices: (vertex_count - 2) * 3,
                has_uv1: false,
            },
            id,
            "wall",
            DVec3::new(0.0, 0.0, EARTH_RADIUS),
        );
        for (i, position) in buffer.positions.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let column = (i / 2) as f32;
            let height = if i % 2 == 0 { 0.0 } else { 10.0 };
            *position = Vec3::new(column, 0.0, height);
        }
        let triangles = u32::try_from(vertex_count - 2).unwrap();
        buffer.indices = (0..triangles)
            .flat_map(|t| if t % 2 == 0 { [t, t + 1, t + 2] } else { [t + 1, t, t + 2] })
            .collect();
        buffer
    }

    #[test]
    fn test_large_building_lands_in_building_bucket() {
        let mut f = Fixture::new();
        let uploader = MeshUploader::new(DEFAULT_MAX_CHUNK_VERTICES);
        assert_eq!(uploader.upload_unpacked_mesh(wall_strip("B123", 200_000)), Ok(true));

        let prepared = uploader.repository().try_take("B123").unwrap();
        assert_eq!(prepared.kind, GeometryKind::Building);
        assert!(prepared.chunks.len() >= 4);
        for (index, chunk) in prepared.chunks.iter().enumerate() {
            assert_eq!(chunk.name, format!("B123_INDEX{index}"));
            assert!(chunk.positions.len() <= DEFAULT_MAX_CHUNK_VERTICES);
            // Plain face normals: the wall is not treated as a terrain skirt.
            assert!(chunk.normals.iter().all(|n| n.abs_diff_eq(Vec3::Y, 1e-5)));
        }
        let names: Vec<String> = prepared.chunks.iter().map(|c| c.name.clone()).collect();
        assert!(uploader.repository().insert(prepared));

        let mesh = uploader.try_consume("B123", &mut f.backend).unwrap();
        f.scene.add(mesh, &mut f.materials, &mut f.backend).unwrap();

        assert_eq!(f.scene.streamer(GeometryKind::Building).len(), 1);
        assert!(f.scene.streamer(GeometryKind::Terrain).is_empty());
        assert!(f.scene.streamer(GeometryKind::Road).is_empty());
        assert_eq!(f.scene.get("B123").unwrap().objects.len(), names.len());
        for name in &names {
            let object = f.backend.object_named(name).unwrap();
            assert_eq!(object.kind, GeometryKind::Building);
            assert!(object.collision);
            assert!(!object.active);
        }
    }
}
