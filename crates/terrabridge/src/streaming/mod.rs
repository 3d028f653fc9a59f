//! Streaming lifecycle: prepared meshes, live objects, materials and
//! textures.
//!
//! The streaming engine prepares meshes and fills texture buffers on its own
//! thread. Everything that touches the rendering engine happens on the main
//! thread when the session applies the engine's events.

mod lifecycle;
mod materials;
mod textures;
mod uploader;

pub use lifecycle::{BucketSettings, LiveObjectRecord, MapScene, ObjectStreamer};
pub use materials::{
    MaterialRepository, MaterialSettings, disambiguated_material_name, requires_streamed_texture,
};
pub use textures::{
    IdGenerator, TextureBuffer, TextureFormat, TextureId, TextureStore, TextureUploader,
};
pub use uploader::{ConsumedMesh, MeshUploader};
