//! An in-process streaming engine producing synthetic tiles.
//!
//! Tile production runs on a worker thread, as a native engine would, and
//! talks to the main thread over `async_channel`.

use std::collections::HashMap;
use std::thread::JoinHandle;

use terrabridge::camera::{SetViewRequest, StreamingView};
use terrabridge::streaming::TextureId;
use terrabridge::{EngineEvent, EngineIngress, NativeCameraState, StreamingEngine};

use crate::tiles::{ProducedTile, TileKey, produce_tile};

/// Rings of cells streamed around the interest point.
const STREAM_RADIUS: i32 = 1;

#[derive(Debug, Clone, PartialEq)]
enum TileState {
    Requested,
    Live {
        visible: bool,
        texture: Option<(String, TextureId)>,
    },
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub requested: usize,
    pub added: usize,
    pub evicted: usize,
}

/// Streams the cells around the camera's interest point.
#[derive(Debug, Default)]
pub struct SyntheticEngine {
    jobs: Option<async_channel::Sender<TileKey>>,
    produced: Option<async_channel::Receiver<ProducedTile>>,
    worker: Option<JoinHandle<()>>,
    tiles: HashMap<TileKey, TileState>,
    material_textures: HashMap<String, TextureId>,
    pending: Vec<EngineEvent>,
    paused: bool,
    stats: EngineStats,
}

impl SyntheticEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    #[must_use]
    pub fn live_tiles(&self) -> usize {
        self.tiles
            .values()
            .filter(|t| matches!(t, TileState::Live { .. }))
            .count()
    }

    fn request(&mut self, key: TileKey) {
        let Some(jobs) = &self.jobs else {
            return;
        };
        if jobs.try_send(key).is_ok() {
            self.tiles.insert(key, TileState::Requested);
            self.stats.requested += 1;
        } else {
            tracing::warn!(tile = %key, "tile worker is gone");
        }
    }

    fn evict(&mut self, key: TileKey, state: &TileState) {
        if let TileState::Live {
            texture: Some((material, id)),
            ..
        } = state
        {
            self.material_textures.remove(material);
            self.pending.push(EngineEvent::ReleaseTexture { id: *id });
        }
        for id in key.mesh_ids() {
            self.pending.push(EngineEvent::DeleteMesh { id });
        }
        self.stats.evicted += 1;
    }

    fn receive_produced(&mut self) {
        let Some(produced) = &self.produced else {
            return;
        };
        let mut ready = Vec::new();
        while let Ok(tile) = produced.try_recv() {
            ready.push(tile);
        }

        for tile in ready {
            match self.tiles.get(&tile.key) {
                Some(TileState::Requested) => {
                    for id in tile.key.mesh_ids() {
                        self.pending.push(EngineEvent::AddMesh { id });
                    }
                    if let Some((material, id)) = &tile.texture {
                        self.material_textures.insert(material.clone(), *id);
                    }
                    self.tiles.insert(
                        tile.key,
                        TileState::Live {
                            visible: false,
                            texture: tile.texture,
                        },
                    );
                    self.stats.added += 1;
                }
                // Evicted while in flight: drop what the worker uploaded.
                _ => {
                    let state = TileState::Live {
                        visible: false,
                        texture: tile.texture,
                    };
                    self.evict(tile.key, &state);
                }
            }
        }
    }
}

impl StreamingEngine for SyntheticEngine {
    fn initialize(&mut self, ingress: EngineIngress) {
        let (jobs, job_receiver) = async_channel::unbounded::<TileKey>();
        let (produced_sender, produced) = async_channel::unbounded();
        let worker = std::thread::Builder::new()
            .name("tile-producer".to_owned())
            .spawn(move || {
                while let Ok(key) = job_receiver.recv_blocking() {
                    if produced_sender.send_blocking(produce_tile(&ingress, key)).is_err() {
                        break;
                    }
                }
            });
        match worker {
            Ok(worker) => {
                self.jobs = Some(jobs);
                self.produced = Some(produced);
                self.worker = Some(worker);
            }
            Err(e) => tracing::error!(error = %e, "failed to start tile worker"),
        }
    }

    fn update(&mut self, _dt: f64, camera: &NativeCameraState) -> Vec<EngineEvent> {
        self.receive_produced();
        tracing::trace!(distance = camera.distance, tilt = camera.tilt_degrees, "engine update");
        std::mem::take(&mut self.pending)
    }

    fn stream_resources_for_camera(&mut self, view: &StreamingView) {
        if self.paused {
            return;
        }
        let center = TileKey::containing(view.interest_point_ecef);
        let wanted: Vec<TileKey> = (-STREAM_RADIUS..=STREAM_RADIUS)
            .flat_map(|lat| (-STREAM_RADIUS..=STREAM_RADIUS).map(move |lon| center.offset(lat, lon)))
            .collect();

        let stale: Vec<TileKey> = self
            .tiles
            .keys()
            .filter(|key| !wanted.contains(key))
            .copied()
            .collect();
        for key in stale {
            if let Some(state) = self.tiles.remove(&key) {
                // Requested tiles are cleaned up when the worker reports them.
                if matches!(state, TileState::Live { .. }) {
                    self.evict(key, &state);
                }
            }
        }

        for key in wanted {
            match self.tiles.get_mut(&key) {
                None => self.request(key),
                Some(TileState::Requested) => {}
                Some(TileState::Live { visible, .. }) => {
                    let now_visible = key == center || view.contains_ecef(key.center());
                    if *visible != now_visible {
                        *visible = now_visible;
                        for id in key.mesh_ids() {
                            self.pending.push(EngineEvent::SetVisible {
                                id,
                                visible: now_visible,
                            });
                        }
                    }
                }
            }
        }
    }

    fn set_view(&mut self, request: &SetViewRequest) {
        tracing::debug!(
            animated = request.animated,
            jump = request.jump_if_far_away,
            "view requested"
        );
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

impl Drop for SyntheticEngine {
    fn drop(&mut self) {
        self.jobs = None;
        self.produced = None;
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            tracing::error!("tile worker panicked");
        }
    }
}
