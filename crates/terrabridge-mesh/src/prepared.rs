//! Prepared mesh records, the output of the preparation pipeline.

use glam::{DVec3, Vec2, Vec3};

use crate::buffer::RawMeshBuffer;
use crate::chunk::split_into_chunks;
use crate::error::MeshResult;
use crate::kind::{GeometryKind, NormalStrategy};
use crate::normals::compute_normals;

/// One GPU-ready piece of a prepared mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMeshChunk {
    /// `{id}_INDEX{n}`, unique per chunk.
    pub name: String,
    pub positions: Vec<Vec3>,
    pub uv0: Vec<Vec2>,
    pub uv1: Option<Vec<Vec2>>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

/// An immutable prepared mesh, keyed by its identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedMeshRecord {
    pub id: String,
    pub kind: GeometryKind,
    pub material_name: String,
    pub origin_ecef: DVec3,
    pub chunks: Vec<PreparedMeshChunk>,
}

impl PreparedMeshRecord {
    /// Total vertex count across all chunks.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.chunks.iter().map(|c| c.positions.len()).sum()
    }
}

/// Run the full preparation pipeline on a raw buffer.
///
/// Classifies the identifier, splits the buffer into chunks of at most
/// `max_vertices` vertices and computes normals per chunk. The buffer is
/// consumed.
///
/// # Errors
///
/// Returns an error for an unknown identifier prefix, an invalid chunk limit
/// or a malformed buffer.
pub fn prepare_mesh(buffer: RawMeshBuffer, max_vertices: usize) -> MeshResult<PreparedMeshRecord> {
    let kind = GeometryKind::classify(&buffer.id)?;
    let strategy = NormalStrategy::select(&buffer.id, &buffer.material_name);
    let chunks = split_into_chunks(&buffer, max_vertices)?;

    let chunks = chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let normals =
                compute_normals(strategy, &chunk.positions, &chunk.indices, buffer.origin_ecef);
            PreparedMeshChunk {
                name: format!("{}_INDEX{index}", buffer.id),
                positions: chunk.positions,
                uv0: chunk.uv0,
                uv1: chunk.uv1,
                normals,
                indices: chunk.indices,
            }
        })
        .collect();

    Ok(PreparedMeshRecord {
        id: buffer.id,
        kind,
        material_name: buffer.material_name,
        origin_ecef: buffer.origin_ecef,
        chunks,
    })
}
