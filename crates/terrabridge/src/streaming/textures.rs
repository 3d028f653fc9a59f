//! Streamed texture buffers: allocation on the producer thread, building on
//! the main thread.
//!
//! The streaming engine allocates a [`TextureBuffer`] with a fresh id, fills
//! it and uploads it through a [`TextureUploader`]. The buffer travels over a
//! channel to the [`TextureStore`], which builds the texture on the next
//! frame and keeps it until the engine releases the id.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use crate::render::{SceneBackend, TextureHandle};

/// Identifier of a streamed texture. Zero is never allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u32);

/// Pixel layout of a [`TextureBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba8,
    Rgb8,
    /// BC1 compressed, 8 bytes per 4x4 block.
    Dxt1,
    /// BC3 compressed, 16 bytes per 4x4 block.
    Dxt5,
}

impl TextureFormat {
    /// Bytes needed for the top mip level.
    #[must_use]
    pub fn byte_size(self, width: u32, height: u32) -> usize {
        let (width, height) = (width as usize, height as usize);
        let blocks = width.div_ceil(4) * height.div_ceil(4);
        match self {
            Self::Rgba8 => width * height * 4,
            Self::Rgb8 => width * height * 3,
            Self::Dxt1 => blocks * 8,
            Self::Dxt5 => blocks * 16,
        }
    }
}

/// An owned pixel buffer on its way to the rendering engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureBuffer {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub generate_mips: bool,
    pub data: Vec<u8>,
}

/// Hands out unique non-zero texture ids.
#[derive(Debug, Default)]
pub struct IdGenerator {
    state: Mutex<IdState>,
}

#[derive(Debug, Default)]
struct IdState {
    next: u32,
    in_use: HashSet<u32>,
}

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an id that is neither zero nor currently in use.
    pub fn allocate(&self) -> TextureId {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            state.next = state.next.wrapping_add(1);
            let candidate = state.next;
            if candidate != 0 && state.in_use.insert(candidate) {
                return TextureId(candidate);
            }
        }
    }

    /// Return an id to the pool. Returns `false` if it was not in use.
    pub fn release(&self, id: TextureId) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_use
            .remove(&id.0)
    }

    #[must_use]
    pub fn is_allocated(&self, id: TextureId) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .in_use
            .contains(&id.0)
    }
}

/// Producer-side texture entry points. Cheap to clone, usable from any
/// thread.
#[derive(Debug, Clone)]
pub struct TextureUploader {
    ids: Arc<IdGenerator>,
    sender: async_channel::Sender<TextureBuffer>,
}

impl TextureUploader {
    /// Allocate a zeroed buffer with a fresh id.
    #[must_use]
    pub fn allocate_texture_buffer(
        &self,
        width: u32,
        height: u32,
        format: TextureFormat,
        generate_mips: bool,
    ) -> TextureBuffer {
        TextureBuffer {
            id: self.ids.allocate(),
            width,
            height,
            format,
            generate_mips,
            data: vec![0; format.byte_size(width, height)],
        }
    }

    /// Queue a filled buffer for building on the main thread.
    ///
    /// Returns `false` if the session has shut down.
    pub fn upload_texture_buffer(&self, buffer: TextureBuffer) -> bool {
        match self.sender.try_send(buffer) {
            Ok(()) => true,
            Err(e) => {
                let id = e.into_inner().id;
                tracing::warn!(id = id.0, "texture upload after shutdown");
                self.ids.release(id);
                false
            }
        }
    }
}

/// Main-thread owner of built textures.
#[derive(Debug)]
pub struct TextureStore {
    ids: Arc<IdGenerator>,
    receiver: async_channel::Receiver<TextureBuffer>,
    uploader: TextureUploader,
    textures: HashMap<TextureId, TextureHandle>,
}

impl Default for TextureStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TextureStore {
    #[must_use]
    pub fn new() -> Self {
        let ids = Arc::new(IdGenerator::new());
        let (sender, receiver) = async_channel::unbounded();
        Self {
            uploader: TextureUploader {
                ids: Arc::clone(&ids),
                sender,
            },
            ids,
            receiver,
            textures: HashMap::new(),
        }
    }

    /// A producer handle feeding this store.
    #[must_use]
    pub fn uploader(&self) -> TextureUploader {
        self.uploader.clone()
    }

    /// Build every texture uploaded since the last call.
    ///
    /// Returns the number of textures built.
    pub fn update(&mut self, backend: &mut impl SceneBackend) -> usize {
        let mut built = 0;
        while let Ok(buffer) = self.receiver.try_recv() {
            if !self.ids.is_allocated(buffer.id) {
                tracing::debug!(id = buffer.id.0, "dropping texture released before build");
                continue;
            }
            let handle = backend.create_texture(&buffer);
            if let Some(old) = self.textures.insert(buffer.id, handle) {
                backend.destroy_texture(old);
            }
            built += 1;
        }
        built
    }

    /// The built texture for `id`, if any.
    #[must_use]
    pub fn get(&self, id: TextureId) -> Option<TextureHandle> {
        self.textures.get(&id).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Destroy the texture for `id` and free the id.
    ///
    /// Returns `false` if the id was unknown.
    pub fn release(&mut self, id: TextureId, backend: &mut impl SceneBackend) -> bool {
        let freed = self.ids.release(id);
        match self.textures.remove(&id) {
            Some(handle) => {
                backend.destroy_texture(handle);
                true
            }
            None => {
                if !freed {
                    tracing::warn!(id = id.0, "release for unknown texture");
                }
                freed
            }
        }
    }

    /// Destroy every texture.
    pub fn clear(&mut self, backend: &mut impl SceneBackend) {
        for (id, handle) in self.textures.drain() {
            self.ids.release(id);
            backend.destroy_texture(handle);
        }
    }
}
