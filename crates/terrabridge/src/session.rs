//! The map session: one streaming engine, one rendering backend and the
//! state that bridges them.

use glam::{DMat4, DVec3};

use crate::camera::{
    CameraController, CameraEvent, CameraGesture, CameraPlacement, CameraPose, CameraProjection,
    CameraUpdate, InterestPointProvider, SetViewRequest, StreamingView, TransitionSettings,
    calculate_look_at,
};
use crate::config::{CoordinateSystem, MapConfig};
use crate::engine::{EngineEvent, EngineIngress, NativeCameraState, StreamingEngine};
use crate::error::{Error, Result};
use crate::render::SceneBackend;
use crate::space::{CoordinateFrame, LatLongAltitude, TangentBasis};
use crate::streaming::{MapScene, MaterialRepository, MaterialSettings, MeshUploader, TextureStore};

/// Pitch of the camera when a session starts, degrees below the horizon.
pub const DEFAULT_START_PITCH: f64 = 45.0;

/// Where the camera placement comes from each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CameraSource {
    /// Derived from the controller's pose.
    Orbit,
    /// Supplied from outside, by the host or the streaming engine.
    Free(CameraPlacement),
}

/// A running map.
///
/// Owns every piece of per-map state and replaces process-wide engine
/// handles: the streaming engine receives its producer entry points through
/// [`StreamingEngine::initialize`] and everything else happens through this
/// object on the main thread.
#[derive(Debug)]
pub struct MapSession<B: SceneBackend, E: StreamingEngine> {
    config: MapConfig,
    frame: CoordinateFrame,
    controller: CameraController,
    source: CameraSource,
    projection: CameraProjection,
    interest: InterestPointProvider,
    last_interest_point: DVec3,
    scene: MapScene,
    materials: MaterialRepository,
    textures: TextureStore,
    meshes: MeshUploader,
    backend: B,
    engine: E,
    paused: bool,
    camera_events: Vec<CameraEvent>,
}

impl<B: SceneBackend, E: StreamingEngine> MapSession<B, E> {
    /// Validate `config`, build the session and initialise the engine.
    pub fn new(config: MapConfig, backend: B, mut engine: E) -> Result<Self> {
        config.validate().inspect_err(|e| {
            tracing::error!(error = %e, "rejected map configuration");
        })?;

        let start = LatLongAltitude::new(config.latitude_degrees, config.longitude_degrees, 0.0);
        let interest_point = start.to_ecef();
        // ECEF sessions start with the origin at the camera's altitude.
        let origin = match config.coordinate_system {
            CoordinateSystem::LocalGrounded => interest_point,
            CoordinateSystem::Ecef => LatLongAltitude {
                altitude: config.distance_to_interest,
                ..start
            }
            .to_ecef(),
        };

        let controller = CameraController::new(
            CameraPose {
                interest_point,
                distance: config.distance_to_interest,
                heading_degrees: config.heading_degrees,
                pitch_degrees: DEFAULT_START_PITCH,
            },
            TransitionSettings {
                jump_distance_threshold: config.jump_distance_threshold,
                default_duration_seconds: config.default_transition_seconds,
            },
        );

        let meshes = MeshUploader::new(config.max_vertices_per_chunk);
        let textures = TextureStore::new();
        engine.initialize(EngineIngress::new(meshes.clone(), textures.uploader()));

        tracing::info!(
            latitude = config.latitude_degrees,
            longitude = config.longitude_degrees,
            coordinate_system = ?config.coordinate_system,
            "map session started"
        );

        Ok(Self {
            frame: CoordinateFrame::new(config.coordinate_system, origin),
            controller,
            source: CameraSource::Orbit,
            projection: CameraProjection::default(),
            interest: InterestPointProvider::new(),
            last_interest_point: interest_point,
            scene: MapScene::new(config.road_height_offset, config.collisions),
            materials: MaterialRepository::new(MaterialSettings {
                directory: config.materials_directory.clone(),
                override_landmark_material: config.override_landmark_material.clone(),
            }),
            textures,
            meshes,
            backend,
            engine,
            paused: false,
            camera_events: Vec::new(),
            config,
        })
    }

    /// Producer entry points for this session, usable from any thread.
    #[must_use]
    pub fn ingress(&self) -> EngineIngress {
        EngineIngress::new(self.meshes.clone(), self.textures.uploader())
    }

    /// Run one frame.
    ///
    /// Requests streaming for the current camera, applies the engine's
    /// events, builds textures, advances the camera and re-places every live
    /// object. Protocol violations reported by the engine's events are
    /// returned after the rest of the frame has run; the first one wins.
    pub fn update(&mut self, dt: f64) -> Result<()> {
        if self.paused {
            return Ok(());
        }

        self.stream_resources_for_camera();

        let mut first_error = None;
        let events = self.engine.update(dt, &self.native_camera_state());
        for event in events {
            if let Err(e) = self.apply_event(event) {
                first_error.get_or_insert(e);
            }
        }

        self.textures.update(&mut self.backend);
        let engine = &self.engine;
        self.materials.update(
            &self.textures,
            |material| engine.texture_id_for_material(material),
            &mut self.backend,
        );

        self.controller.update(dt);
        self.camera_events.extend(self.controller.take_events());

        if self.controller.is_bound() {
            let placement = self.camera_placement();
            let transform = self
                .frame
                .camera_transform(placement.position, placement.rotation());
            self.backend.set_camera(transform, &self.projection);
        }
        self.scene.update_transforms(&self.frame, &mut self.backend);

        first_error.map_or(Ok(()), Err)
    }

    fn stream_resources_for_camera(&mut self) {
        let placement = self.camera_placement();
        // Taken every frame so an authoritative point never outlives the
        // frame it was supplied for, even while orbiting.
        let free_interest_point = self.interest.take_interest_point(
            &placement,
            self.projection.near,
            self.projection.far,
        );
        let interest_point = match self.source {
            CameraSource::Orbit => self.controller.pose().interest_point,
            CameraSource::Free(_) => free_interest_point,
        };

        match self.frame.system() {
            CoordinateSystem::Ecef => self.frame.recenter(placement.position),
            CoordinateSystem::LocalGrounded => {
                let origin = self.frame.origin();
                let ground = placement.position.normalize_or_zero() * origin.length();
                if let Some(limit) = self.config.recenter_distance
                    && ground.distance(origin) > limit
                {
                    tracing::debug!(drift = ground.distance(origin), "recentring local frame");
                    self.frame.recenter(ground);
                }
            }
        }

        self.last_interest_point = interest_point;
        let view = StreamingView::new(&placement, interest_point, self.projection);
        self.engine.stream_resources_for_camera(&view);
    }

    fn apply_event(&mut self, event: EngineEvent) -> Result<()> {
        match event {
            EngineEvent::AddMesh { id } => {
                if self.scene.contains(&id)? {
                    self.meshes.discard(&id);
                    tracing::error!(%id, "add for an object that is already live");
                    return Err(Error::DuplicateObject { id });
                }
                let Some(mesh) = self.meshes.try_consume(&id, &mut self.backend) else {
                    return Ok(());
                };
                self.scene.add(mesh, &mut self.materials, &mut self.backend)
            }
            EngineEvent::DeleteMesh { id } => {
                let removed = self
                    .scene
                    .remove(&id, &mut self.materials, &mut self.backend)?;
                if !removed && self.meshes.discard(&id) {
                    tracing::debug!(%id, "dropped prepared mesh deleted before it was added");
                }
                Ok(())
            }
            EngineEvent::SetVisible { id, visible } => {
                self.scene.set_visible(&id, visible, &mut self.backend)?;
                Ok(())
            }
            EngineEvent::ReleaseTexture { id } => {
                self.textures.release(id, &mut self.backend);
                Ok(())
            }
            EngineEvent::InterestPoint(point) => {
                self.interest.set_interest_point(point);
                Ok(())
            }
            EngineEvent::Camera(event) => {
                self.camera_events.push(event);
                Ok(())
            }
        }
    }

    /// Let the session drive the host camera.
    pub fn bind_camera(&mut self) {
        self.controller.bind();
    }

    /// Stop driving the host camera, ending any transition.
    pub fn unbind_camera(&mut self) {
        self.controller.unbind();
        self.camera_events.extend(self.controller.take_events());
    }

    /// Jump the camera. Takes the camera back from any external source.
    pub fn move_to(&mut self, update: CameraUpdate) -> Result<()> {
        self.set_view(SetViewRequest {
            update,
            animated: false,
            duration_seconds: None,
            jump_if_far_away: false,
            allow_interruption: true,
        })
    }

    /// Ease the camera towards a pose. Takes the camera back from any
    /// external source.
    pub fn animate_to(
        &mut self,
        update: CameraUpdate,
        duration_seconds: Option<f64>,
        jump_if_far_away: bool,
    ) -> Result<()> {
        self.set_view(SetViewRequest {
            update,
            animated: true,
            duration_seconds,
            jump_if_far_away,
            allow_interruption: true,
        })
    }

    /// Apply a view request and mirror it to the streaming engine.
    pub fn set_view(&mut self, request: SetViewRequest) -> Result<()> {
        self.controller.set_view(&request)?;
        self.source = CameraSource::Orbit;
        self.engine.set_view(&request);
        Ok(())
    }

    /// Apply a user gesture to the orbiting camera.
    pub fn apply_gesture(&mut self, gesture: CameraGesture) -> Result<()> {
        self.controller.apply_gesture(gesture)?;
        self.source = CameraSource::Orbit;
        Ok(())
    }

    /// Use an externally driven camera placement, in ECEF, until the next
    /// programmatic move. The interest point is estimated from the clip
    /// planes unless the engine supplies one.
    pub fn set_free_camera(&mut self, placement: CameraPlacement) {
        self.source = CameraSource::Free(placement);
    }

    /// Follow a camera driven by the streaming engine.
    pub fn apply_native_camera_state(&mut self, state: &NativeCameraState) {
        let pose = CameraPose {
            interest_point: state.interest_basis.point,
            distance: state.distance,
            heading_degrees: state.interest_basis.heading_degrees(),
            pitch_degrees: state.tilt_degrees,
        };
        self.projection = CameraProjection {
            fov_y: state.fov_y,
            aspect: state.aspect,
            near: state.near,
            far: state.far,
        };
        self.interest.set_interest_point(pose.interest_point);
        self.source = CameraSource::Free(calculate_look_at(&pose));
    }

    /// The current camera placement in ECEF.
    #[must_use]
    pub fn camera_placement(&self) -> CameraPlacement {
        match self.source {
            CameraSource::Orbit => self.controller.placement(),
            CameraSource::Free(placement) => placement,
        }
    }

    /// Camera state in the form the streaming engine queries.
    #[must_use]
    pub fn native_camera_state(&self) -> NativeCameraState {
        let placement = self.camera_placement();
        let (interest_point, distance, tilt_degrees, heading) = match self.source {
            CameraSource::Orbit => {
                let pose = self.controller.pose();
                (
                    pose.interest_point,
                    pose.distance,
                    pose.pitch_degrees,
                    None,
                )
            }
            CameraSource::Free(_) => {
                let up = placement.position.normalize_or(DVec3::Z);
                let tilt = (-placement.forward.dot(up)).clamp(-1.0, 1.0).asin();
                (
                    self.last_interest_point,
                    self.last_interest_point.distance(placement.position),
                    tilt.to_degrees(),
                    Some(placement.forward.as_vec3()),
                )
            }
        };
        let interest_basis = match heading {
            Some(forward) => TangentBasis::new(interest_point, forward),
            None => TangentBasis::from_point_and_heading(
                interest_point,
                self.controller.pose().heading_degrees,
            ),
        };
        NativeCameraState {
            near: self.projection.near,
            far: self.projection.far,
            fov_y: self.projection.fov_y,
            aspect: self.projection.aspect,
            tilt_degrees,
            distance,
            origin_ecef: placement.position,
            interest_basis,
        }
    }

    /// Move the coordinate frame's origin.
    pub fn set_origin_point(&mut self, origin: LatLongAltitude) {
        self.frame.recenter(origin.to_ecef());
    }

    /// A geographic point in the engine's space.
    #[must_use]
    pub fn geographic_to_world(&self, position: LatLongAltitude) -> DVec3 {
        self.frame.ecef_to_engine(position.to_ecef())
    }

    /// A point in the engine's space as a geographic point.
    #[must_use]
    pub fn world_to_geographic(&self, position: DVec3) -> LatLongAltitude {
        LatLongAltitude::from_ecef(self.frame.engine_to_ecef(position))
    }

    /// Project a geographic point into the camera's viewport.
    ///
    /// `x` and `y` run from 0 to 1 left to right and bottom to top; `z` is
    /// the distance in front of the camera, negative behind it.
    #[must_use]
    pub fn geographic_to_viewport(&self, position: LatLongAltitude) -> DVec3 {
        let placement = self.camera_placement();
        let view = DMat4::look_to_rh(DVec3::ZERO, placement.forward, placement.up);
        let relative = view.transform_point3(position.to_ecef() - placement.position);
        let ndc = self.projection.matrix().project_point3(relative);
        DVec3::new((ndc.x + 1.0) * 0.5, (ndc.y + 1.0) * 0.5, -relative.z)
    }

    /// Inverse of [`Self::geographic_to_viewport`].
    #[must_use]
    pub fn viewport_to_geographic(&self, viewport: DVec3) -> LatLongAltitude {
        let placement = self.camera_placement();
        let half_height = (self.projection.fov_y * 0.5).tan();
        let x = (viewport.x * 2.0 - 1.0) * half_height * self.projection.aspect;
        let y = (viewport.y * 2.0 - 1.0) * half_height;
        let ecef = placement.position
            + (placement.right * x + placement.up * y + placement.forward) * viewport.z;
        LatLongAltitude::from_ecef(ecef)
    }

    /// Stop streaming until [`Self::resume`]. Frames do nothing meanwhile.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.engine.pause();
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.engine.resume();
        }
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Drain transition events from the controller and the engine.
    pub fn take_camera_events(&mut self) -> Vec<CameraEvent> {
        std::mem::take(&mut self.camera_events)
    }

    /// Destroy everything the session created in the backend and hand the
    /// collaborators back. Texture uploads made afterwards are refused.
    pub fn shutdown(mut self) -> (B, E) {
        let live = self.scene.len();
        self.scene.clear(&mut self.materials, &mut self.backend);
        self.materials.clear(&mut self.backend);
        self.textures.clear(&mut self.backend);
        self.meshes.repository().clear();
        tracing::info!(live, "map session shut down");
        (self.backend, self.engine)
    }

    #[must_use]
    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    #[must_use]
    pub fn frame(&self) -> &CoordinateFrame {
        &self.frame
    }

    #[must_use]
    pub fn controller(&self) -> &CameraController {
        &self.controller
    }

    #[must_use]
    pub fn projection(&self) -> &CameraProjection {
        &self.projection
    }

    pub fn set_projection(&mut self, projection: CameraProjection) {
        self.projection = projection;
    }

    #[must_use]
    pub fn scene(&self) -> &MapScene {
        &self.scene
    }

    #[must_use]
    pub fn materials(&self) -> &MaterialRepository {
        &self.materials
    }

    #[must_use]
    pub fn textures(&self) -> &TextureStore {
        &self.textures
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use glam::Vec3;
    use terrabridge_mesh::MeshCounts;

    use super::*;
    use crate::space::{LocalTransform, approx_eq_ecef};
    use crate::streaming::TextureFormat;
    use crate::testing::{FakeEngine, RecordingBackend};

    const API_KEY: &str = "0123456789abcdef0123456789abcdef";

    fn config() -> MapConfig {
        MapConfig {
            api_key: API_KEY.to_owned(),
            ..MapConfig::default()
        }
    }

    fn session(config: MapConfig) -> MapSession<RecordingBackend, FakeEngine> {
        MapSession::new(config, RecordingBackend::default(), FakeEngine::default()).unwrap()
    }

    fn upload_quad(ingress: &EngineIngress, id: &str, material: &str) {
        let origin = LatLongAltitude::new(37.7951572, -122.4028915, 0.0).to_ecef();
        let mut buffer = ingress.allocate_unpacked_mesh(
            MeshCounts {
                vertices: 4,
                indices: 6,
                has_uv1: false,
            },
            id,
            material,
            origin,
        );
        buffer.positions = vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y];
        buffer.indices = vec![0, 1, 2, 0, 2, 3];
        assert_eq!(ingress.upload_unpacked_mesh(buffer), Ok(true));
    }

    fn queue(session: &mut MapSession<RecordingBackend, FakeEngine>, events: Vec<EngineEvent>) {
        session.engine_mut().queued = events;
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = MapSession::new(
            MapConfig::default(),
            RecordingBackend::default(),
            FakeEngine::default(),
        );
        assert!(matches!(result, Err(Error::InvalidApiKey)));
    }

    #[test]
    fn test_engine_receives_ingress_and_views() {
        let mut session = session(config());
        assert!(session.engine().ingress.is_some());
        session.update(0.016).unwrap();

        let view = session.engine().views[0];
        let pose = *session.controller().pose();
        assert_eq!(view.interest_point_ecef, pose.interest_point);
        assert!((view.origin_ecef.distance(pose.interest_point) - config().distance_to_interest).abs() < 1e-3);
        assert!(view.contains_ecef(pose.interest_point));
        assert_eq!(session.engine().cameras.len(), 1);
    }

    #[test]
    fn test_mesh_lifecycle_through_events() {
        let mut session = session(config());
        let ingress = session.ingress();
        thread::spawn(move || upload_quad(&ingress, "B7", "wall"))
            .join()
            .unwrap();

        queue(&mut session, vec![EngineEvent::AddMesh { id: "B7".to_owned() }]);
        session.update(0.016).unwrap();
        let record = session.scene().get("B7").unwrap().clone();
        assert!(!record.visible);
        let object = session.backend().object_named("B7_INDEX0").unwrap();
        assert!(!object.active);
        assert_ne!(object.transform, LocalTransform::IDENTITY);

        queue(
            &mut session,
            vec![EngineEvent::SetVisible {
                id: "B7".to_owned(),
                visible: true,
            }],
        );
        session.update(0.016).unwrap();
        assert!(session.backend().object_named("B7_INDEX0").unwrap().active);

        queue(&mut session, vec![EngineEvent::DeleteMesh { id: "B7".to_owned() }]);
        session.update(0.016).unwrap();
        assert!(session.scene().is_empty());
        assert!(session.backend().objects.is_empty());
        assert!(session.backend().geometries.is_empty());
        assert!(session.materials().is_empty());
    }

    #[test]
    fn test_duplicate_add_is_reported_after_frame() {
        let mut session = session(config());
        let ingress = session.ingress();
        upload_quad(&ingress, "R1", "road");
        queue(&mut session, vec![EngineEvent::AddMesh { id: "R1".to_owned() }]);
        session.update(0.016).unwrap();

        upload_quad(&ingress, "R1", "road_wet");
        queue(
            &mut session,
            vec![
                EngineEvent::AddMesh { id: "R1".to_owned() },
                EngineEvent::SetVisible {
                    id: "R1".to_owned(),
                    visible: true,
                },
            ],
        );
        assert_eq!(
            session.update(0.016),
            Err(Error::DuplicateObject { id: "R1".to_owned() })
        );
        // The live record is untouched, the later event still applied and
        // the redundant upload was dropped.
        assert_eq!(session.materials().reference_count("road"), 1);
        assert_eq!(session.materials().reference_count("road_wet"), 0);
        assert!(session.scene().get("R1").unwrap().visible);
        upload_quad(&ingress, "R1", "road");
    }

    #[test]
    fn test_not_found_events_are_tolerated() {
        let mut session = session(config());
        queue(
            &mut session,
            vec![
                EngineEvent::AddMesh { id: "B404".to_owned() },
                EngineEvent::DeleteMesh { id: "L9".to_owned() },
                EngineEvent::SetVisible {
                    id: "R3".to_owned(),
                    visible: false,
                },
            ],
        );
        assert_eq!(session.update(0.016), Ok(()));
    }

    #[test]
    fn test_unknown_prefix_is_protocol_error() {
        let mut session = session(config());
        queue(&mut session, vec![EngineEvent::DeleteMesh { id: "X1".to_owned() }]);
        assert!(matches!(session.update(0.016), Err(Error::Mesh(_))));
    }

    #[test]
    fn test_camera_operations_need_binding() {
        let mut session = session(config());
        assert_eq!(
            session.move_to(CameraUpdate::default().distance(100.0)),
            Err(Error::NoCameraBound)
        );
        assert!(session.engine().view_requests.is_empty());

        session.bind_camera();
        session
            .animate_to(CameraUpdate::default().heading(90.0), Some(1.0), true)
            .unwrap();
        assert_eq!(session.engine().view_requests.len(), 1);
        assert!(session.engine().view_requests[0].animated);

        session.update(0.5).unwrap();
        assert!(session.backend().camera.is_some());
        session.update(0.6).unwrap();
        assert_eq!(
            session.take_camera_events(),
            [CameraEvent::TransitionStart, CameraEvent::TransitionEnd]
        );
    }

    #[test]
    fn test_streamed_texture_reaches_material() {
        let mut session = session(config());
        let ingress = session.ingress();
        upload_quad(&ingress, "L5", "Raster_12");
        queue(&mut session, vec![EngineEvent::AddMesh { id: "L5".to_owned() }]);
        session.update(0.016).unwrap();
        assert!(session.materials().is_awaiting_texture("Raster_12"));

        let buffer = ingress.allocate_texture_buffer(8, 8, TextureFormat::Rgba8, true);
        let texture = buffer.id;
        assert!(ingress.upload_texture_buffer(buffer));
        session
            .engine_mut()
            .material_textures
            .insert("Raster_12".to_owned(), texture);
        session.update(0.016).unwrap();
        assert!(!session.materials().is_awaiting_texture("Raster_12"));
        assert_eq!(session.backend().material_textures.len(), 1);

        queue(&mut session, vec![EngineEvent::ReleaseTexture { id: texture }]);
        session.update(0.016).unwrap();
        assert!(session.textures().is_empty());
        assert!(session.backend().textures.is_empty());
    }

    #[test]
    fn test_ecef_frame_follows_camera() {
        let mut session = session(MapConfig {
            coordinate_system: CoordinateSystem::Ecef,
            ..config()
        });
        session.update(0.016).unwrap();
        let camera = session.camera_placement().position;
        assert!(approx_eq_ecef(session.frame().origin(), camera, 1e-6));

        session.bind_camera();
        session.update(0.016).unwrap();
        let (transform, _) = session.backend().camera.unwrap();
        assert!(transform.translation.length() < 1e-3);
    }

    #[test]
    fn test_local_frame_recentres_after_drift() {
        let mut session = session(config());
        let start = session.frame().origin();
        session.bind_camera();

        session
            .move_to(CameraUpdate::default().heading(180.0))
            .unwrap();
        session.update(0.016).unwrap();
        assert_eq!(session.frame().origin(), start);

        let far = LatLongAltitude::new(38.0, -122.0, 0.0);
        session
            .move_to(CameraUpdate::default().interest_point(far.to_ecef()))
            .unwrap();
        session.update(0.016).unwrap();
        let origin = session.frame().origin();
        assert_ne!(origin, start);
        let ground = session.camera_placement().position.normalize() * start.length();
        assert!(approx_eq_ecef(origin, ground, 1e-3));
    }

    #[test]
    fn test_free_camera_interest_point() {
        let mut session = session(config());
        let placement = session.camera_placement();
        session.set_free_camera(placement);
        session.update(0.016).unwrap();

        let projection = *session.projection();
        let estimated = placement.position
            + placement.forward * ((projection.near + projection.far) * 0.5);
        assert!(approx_eq_ecef(session.engine().views[0].interest_point_ecef, estimated, 1e-6));

        // An authoritative point is used for one frame only.
        let authoritative = LatLongAltitude::new(37.0, -122.0, 0.0).to_ecef();
        queue(&mut session, vec![EngineEvent::InterestPoint(authoritative)]);
        session.update(0.016).unwrap();
        session.update(0.016).unwrap();
        assert_eq!(session.engine().views[2].interest_point_ecef, authoritative);
        session.update(0.016).unwrap();
        assert!(approx_eq_ecef(session.engine().views[3].interest_point_ecef, estimated, 1e-6));
    }

    #[test]
    fn test_interest_point_not_kept_while_orbiting() {
        let mut session = session(config());
        let authoritative = LatLongAltitude::new(37.0, -122.0, 0.0).to_ecef();
        queue(&mut session, vec![EngineEvent::InterestPoint(authoritative)]);
        for _ in 0..5 {
            session.update(0.016).unwrap();
        }
        let orbit_target = session.controller().pose().interest_point;
        assert!(session.engine().views.iter().all(|v| v.interest_point_ecef == orbit_target));

        let placement = session.camera_placement();
        session.set_free_camera(placement);
        session.update(0.016).unwrap();

        let projection = *session.projection();
        let estimated = placement.position
            + placement.forward * ((projection.near + projection.far) * 0.5);
        let view = session.engine().views.last().unwrap();
        assert_ne!(view.interest_point_ecef, authoritative);
        assert!(approx_eq_ecef(view.interest_point_ecef, estimated, 1e-6));
    }

    #[test]
    fn test_native_camera_state_round_trip() {
        let mut session = session(config());
        let state = session.native_camera_state();
        assert!((state.tilt_degrees - DEFAULT_START_PITCH).abs() < 1e-9);
        assert!((state.distance - config().distance_to_interest).abs() < 1e-9);

        let before = session.camera_placement();
        session.apply_native_camera_state(&state);
        let after = session.camera_placement();
        assert!(approx_eq_ecef(before.position, after.position, 1e-3));
        assert!(before.forward.abs_diff_eq(after.forward, 1e-6));

        session.update(0.016).unwrap();
        assert_eq!(
            session.engine().views[0].interest_point_ecef,
            state.interest_basis.point
        );
    }

    #[test]
    fn test_viewport_projection() {
        let session = session(config());
        let interest = LatLongAltitude::from_ecef(session.controller().pose().interest_point);

        let viewport = session.geographic_to_viewport(interest);
        assert!((viewport.x - 0.5).abs() < 1e-6);
        assert!((viewport.y - 0.5).abs() < 1e-6);
        assert!((viewport.z - config().distance_to_interest).abs() < 1e-3);

        let offset = LatLongAltitude::new(interest.latitude + 0.001, interest.longitude, 20.0);
        let back = session.viewport_to_geographic(session.geographic_to_viewport(offset));
        assert!(approx_eq_ecef(back.to_ecef(), offset.to_ecef(), 1e-3));

        let world = session.geographic_to_world(offset);
        assert!(approx_eq_ecef(session.world_to_geographic(world).to_ecef(), offset.to_ecef(), 1e-3));
    }

    #[test]
    fn test_pause_skips_frames() {
        let mut session = session(config());
        session.pause();
        assert!(session.engine().paused);
        session.update(0.016).unwrap();
        assert!(session.engine().views.is_empty());
        session.resume();
        session.update(0.016).unwrap();
        assert_eq!(session.engine().views.len(), 1);
    }

    #[test]
    fn test_shutdown_releases_backend() {
        let mut session = session(config());
        let ingress = session.ingress();
        upload_quad(&ingress, "B1", "wall");
        upload_quad(&ingress, "B2", "wall");
        queue(&mut session, vec![EngineEvent::AddMesh { id: "B1".to_owned() }]);
        session.update(0.016).unwrap();

        let (backend, _) = session.shutdown();
        assert!(backend.objects.is_empty());
        assert!(backend.geometries.is_empty());
        assert!(backend.materials.is_empty());

        let buffer = ingress.allocate_texture_buffer(1, 1, TextureFormat::Rgba8, false);
        assert!(!ingress.upload_texture_buffer(buffer));
    }
}
