//! Producer-side mesh entry points and main-thread consumption.

use glam::DVec3;
use terrabridge_mesh::{
    GeometryKind, MeshCounts, PreparedMeshRepository, RawMeshBuffer, prepare_mesh,
};

use crate::error::Result;
use crate::render::{GeometryHandle, SceneBackend};

/// Prepares meshes on the streaming engine's thread and hands them to the
/// main thread. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MeshUploader {
    repository: PreparedMeshRepository,
    max_vertices_per_chunk: usize,
}

/// A consumed mesh whose chunks now live in the rendering engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumedMesh {
    pub id: String,
    pub kind: GeometryKind,
    pub origin_ecef: DVec3,
    pub material_name: String,
    /// Chunk name and uploaded geometry, in chunk order.
    pub geometries: Vec<(String, GeometryHandle)>,
}

impl MeshUploader {
    #[must_use]
    pub fn new(max_vertices_per_chunk: usize) -> Self {
        Self {
            repository: PreparedMeshRepository::new(),
            max_vertices_per_chunk,
        }
    }

    /// The store shared with the producer.
    #[must_use]
    pub fn repository(&self) -> &PreparedMeshRepository {
        &self.repository
    }

    /// Allocate storage for the producer to fill.
    #[must_use]
    pub fn allocate_unpacked_mesh(
        &self,
        counts: MeshCounts,
        id: &str,
        material_name: &str,
        origin_ecef: DVec3,
    ) -> RawMeshBuffer {
        RawMeshBuffer::allocate(counts, id, material_name, origin_ecef)
    }

    /// Chunk a filled buffer, compute its normals and store the result.
    ///
    /// Returns `Ok(false)` when a record with the same identifier is already
    /// waiting; the earlier one is kept.
    pub fn upload_unpacked_mesh(&self, buffer: RawMeshBuffer) -> Result<bool> {
        let id = buffer.id.clone();
        let record = prepare_mesh(buffer, self.max_vertices_per_chunk).inspect_err(|e| {
            tracing::error!(%id, error = %e, "failed to prepare mesh");
        })?;
        Ok(self.repository.insert(record))
    }

    /// Take the prepared record for `id` and upload its chunks.
    ///
    /// Returns `None`, after logging, if nothing is waiting under `id`.
    pub fn try_consume(&self, id: &str, backend: &mut impl SceneBackend) -> Option<ConsumedMesh> {
        let record = self.repository.try_take(id)?;
        let geometries = record
            .chunks
            .iter()
            .map(|chunk| (chunk.name.clone(), backend.create_geometry(chunk)))
            .collect();
        Some(ConsumedMesh {
            id: record.id,
            kind: record.kind,
            origin_ecef: record.origin_ecef,
            material_name: record.material_name,
            geometries,
        })
    }

    /// Drop a waiting record without uploading it.
    pub fn discard(&self, id: &str) -> bool {
        self.repository.try_take(id).is_some()
    }
}
