//! Reference-counted materials keyed by name.
//!
//! Every live object holds one reference on its material. Materials whose
//! texture is streamed (raster terrain and landmarks) start out with a
//! placeholder look and get their texture attached once the streaming
//! engine reports it ready.

use std::collections::HashMap;

use rand::Rng;

use crate::render::{MaterialHandle, MaterialTemplate, SceneBackend};
use crate::streaming::{TextureId, TextureStore};

const LANDMARK_PREFIX: &str = "landmark_";
const RASTER_PREFIX: &str = "Raster";

/// Material naming and fallback settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterialSettings {
    /// Directory searched for named material assets. Empty disables the
    /// lookup.
    pub directory: String,
    /// Asset used as the starting look of landmarks that have no named
    /// asset of their own. Their streamed texture is still attached.
    pub override_landmark_material: Option<String>,
}

/// Name under which a material is shared.
///
/// Landmark materials carry a per-object texture, so each landmark object
/// gets its own material.
#[must_use]
pub fn disambiguated_material_name(object_id: &str, material_name: &str) -> String {
    if material_name.starts_with(LANDMARK_PREFIX) {
        format!("{material_name}_{object_id}")
    } else {
        material_name.to_owned()
    }
}

/// Whether a material waits for a texture from the streaming engine.
#[must_use]
pub fn requires_streamed_texture(material_name: &str) -> bool {
    material_name.starts_with(RASTER_PREFIX) || material_name.starts_with(LANDMARK_PREFIX)
}

#[derive(Debug)]
struct MaterialEntry {
    handle: MaterialHandle,
    references: usize,
    awaiting_texture: bool,
}

/// Shared materials owned by the streaming lifecycle.
#[derive(Debug, Default)]
pub struct MaterialRepository {
    settings: MaterialSettings,
    entries: HashMap<String, MaterialEntry>,
}

impl MaterialRepository {
    #[must_use]
    pub fn new(settings: MaterialSettings) -> Self {
        Self {
            settings,
            entries: HashMap::new(),
        }
    }

    /// Take a reference on the material for an object, creating it on first
    /// use.
    ///
    /// Returns the shared name, to be passed to [`Self::release`], and the
    /// handle.
    pub fn acquire(
        &mut self,
        object_id: &str,
        material_name: &str,
        backend: &mut impl SceneBackend,
    ) -> (String, MaterialHandle) {
        let key = disambiguated_material_name(object_id, material_name);
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.references += 1;
            return (key, entry.handle);
        }

        let (handle, awaiting_texture) = self.create(material_name, &key, backend);
        tracing::debug!(material = %key, awaiting_texture, "created material");
        self.entries.insert(
            key.clone(),
            MaterialEntry {
                handle,
                references: 1,
                awaiting_texture,
            },
        );
        (key, handle)
    }

    /// Drop a reference, destroying the material with the last one.
    ///
    /// Returns `false` if the name is unknown.
    pub fn release(&mut self, key: &str, backend: &mut impl SceneBackend) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            tracing::warn!(material = key, "release for unknown material");
            return false;
        };
        entry.references -= 1;
        if entry.references == 0
            && let Some(entry) = self.entries.remove(key)
        {
            tracing::debug!(material = key, "destroyed material");
            backend.destroy_material(entry.handle);
        }
        true
    }

    /// Attach streamed textures that have become ready.
    ///
    /// `texture_for` asks the streaming engine which texture a material
    /// should use; `None` means not ready yet, and the material is retried
    /// next frame. Returns the number of materials that got their texture.
    pub fn update(
        &mut self,
        textures: &TextureStore,
        mut texture_for: impl FnMut(&str) -> Option<TextureId>,
        backend: &mut impl SceneBackend,
    ) -> usize {
        let mut attached = 0;
        for (key, entry) in self.entries.iter_mut().filter(|(_, e)| e.awaiting_texture) {
            let Some(texture) = texture_for(key).and_then(|id| textures.get(id)) else {
                continue;
            };
            backend.set_material_texture(entry.handle, texture);
            entry.awaiting_texture = false;
            attached += 1;
        }
        attached
    }

    /// References held on a material, zero if it does not exist.
    #[must_use]
    pub fn reference_count(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, |e| e.references)
    }

    #[must_use]
    pub fn is_awaiting_texture(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| e.awaiting_texture)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Destroy every material regardless of references.
    pub fn clear(&mut self, backend: &mut impl SceneBackend) {
        for (_, entry) in self.entries.drain() {
            backend.destroy_material(entry.handle);
        }
    }

    fn create(
        &self,
        material_name: &str,
        key: &str,
        backend: &mut impl SceneBackend,
    ) -> (MaterialHandle, bool) {
        let streamed = requires_streamed_texture(material_name);
        if let Some(handle) = self.load(material_name, backend) {
            return (handle, streamed);
        }

        let is_landmark = material_name.starts_with(LANDMARK_PREFIX);
        if is_landmark && let Some(name) = &self.settings.override_landmark_material {
            if let Some(handle) = self.load(name, backend) {
                return (handle, streamed);
            }
            tracing::warn!(material = %name, "override landmark material not found");
        }

        let template = if material_name.starts_with(RASTER_PREFIX) {
            MaterialTemplate::RasterPlaceholder
        } else if is_landmark {
            MaterialTemplate::Placeholder
        } else {
            random_gray()
        };
        (backend.create_material(key, &template), streamed)
    }

    fn load(&self, name: &str, backend: &mut impl SceneBackend) -> Option<MaterialHandle> {
        if self.settings.directory.is_empty() {
            return None;
        }
        backend.load_material(&self.settings.directory, name)
    }
}

/// A flat grey of random brightness, so that untextured neighbours differ.
fn random_gray() -> MaterialTemplate {
    let value = rand::rng().random_range(0.5f32..0.9);
    MaterialTemplate::FlatColor([value, value, value, 1.0])
}
