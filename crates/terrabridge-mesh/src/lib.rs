//! Mesh preparation for streamed map geometry.
//!
//! Raw mesh buffers arrive from a streaming engine with single-precision
//! positions relative to a double-precision ECEF origin. This crate splits
//! them into chunks that fit a 16-bit index buffer, generates normals suited
//! to the kind of geometry, and keeps the results in a thread-safe
//! repository until the main thread consumes them.
//!
//! # Example
//!
//! ```
//! use glam::{DVec3, Vec3};
//! use terrabridge_mesh::{MeshCounts, PreparedMeshRepository, RawMeshBuffer, prepare_mesh};
//!
//! let mut buffer = RawMeshBuffer::allocate(
//!     MeshCounts { vertices: 3, indices: 3, has_uv1: false },
//!     "B42",
//!     "wall",
//!     DVec3::new(0.0, 0.0, 6_378_100.0),
//! );
//! buffer.positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
//! buffer.indices = vec![0, 1, 2];
//!
//! let repository = PreparedMeshRepository::new();
//! repository.insert(prepare_mesh(buffer, 65_535).unwrap());
//! assert!(repository.try_take("B42").is_some());
//! ```

mod buffer;
mod chunk;
mod error;
mod kind;
mod normals;
mod prepared;
mod repository;

pub use buffer::{MeshCounts, RawMeshBuffer};
pub use chunk::{DEFAULT_MAX_CHUNK_VERTICES, MeshChunk, split_into_chunks};
pub use error::{MeshError, MeshResult};
pub use kind::{GeometryKind, NormalStrategy};
pub use normals::{
    SKIRT_ANGLE_DEGREES, SKIRT_NORMAL_SCALE, compute_normals, face_normal, terrain_face_normal,
};
pub use prepared::{PreparedMeshChunk, PreparedMeshRecord, prepare_mesh};
pub use repository::PreparedMeshRepository;
