//! Splitting meshes into chunks that fit a 16-bit index buffer.
//!
//! Triangles are walked in their original order and packed greedily. A chunk
//! is closed as soon as the next triangle would push its vertex count past
//! the limit, so triangles are never split and winding is untouched.

use glam::{Vec2, Vec3};

use crate::buffer::RawMeshBuffer;
use crate::error::{MeshError, MeshResult};

/// Largest vertex count addressable by a 16-bit index buffer.
pub const DEFAULT_MAX_CHUNK_VERTICES: usize = 65_535;

const UNMAPPED: u32 = u32::MAX;

/// A subset of a mesh whose vertex count fits the chunk limit.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshChunk {
    pub positions: Vec<Vec3>,
    pub uv0: Vec<Vec2>,
    pub uv1: Option<Vec<Vec2>>,
    /// Triangle indices into this chunk's vertices.
    pub indices: Vec<u32>,
    /// For every chunk vertex, its index in the source buffer.
    pub source_vertices: Vec<u32>,
}

impl MeshChunk {
    /// Number of vertices in the chunk.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// Split a validated buffer into chunks of at most `max_vertices` vertices.
///
/// # Errors
///
/// Returns [`MeshError::InvalidChunkLimit`] when `max_vertices < 3`, or any
/// validation error from [`RawMeshBuffer::validate`].
pub fn split_into_chunks(buffer: &RawMeshBuffer, max_vertices: usize) -> MeshResult<Vec<MeshChunk>> {
    if max_vertices < 3 {
        return Err(MeshError::InvalidChunkLimit {
            limit: max_vertices,
        });
    }
    buffer.validate()?;

    if buffer.vertex_count() <= max_vertices {
        let source_vertices = (0..buffer.vertex_count())
            .map(|i| u32::try_from(i).unwrap_or(UNMAPPED))
            .collect();
        return Ok(vec![MeshChunk {
            positions: buffer.positions.clone(),
            uv0: buffer.uv0.clone(),
            uv1: buffer.uv1.clone(),
            indices: buffer.indices.clone(),
            source_vertices,
        }]);
    }

    let mut builder = ChunkBuilder::new(buffer.vertex_count());
    let mut chunks = Vec::new();

    for triangle in buffer.indices.chunks_exact(3) {
        let new_vertices = builder.new_vertex_count(triangle);
        if builder.len() + new_vertices > max_vertices {
            chunks.push(builder.finish(buffer));
        }
        builder.push_triangle(triangle);
    }
    if !builder.is_empty() {
        chunks.push(builder.finish(buffer));
    }

    tracing::debug!(
        id = %buffer.id,
        vertices = buffer.vertex_count(),
        chunks = chunks.len(),
        "split mesh into chunks"
    );

    Ok(chunks)
}

/// Accumulates one chunk's vertex remap and local indices.
struct ChunkBuilder {
    /// Source vertex index to local index, `UNMAPPED` if absent.
    remap: Vec<u32>,
    /// Local index to source vertex index.
    source_vertices: Vec<u32>,
    indices: Vec<u32>,
}

impl ChunkBuilder {
    fn new(vertex_count: usize) -> Self {
        Self {
            remap: vec![UNMAPPED; vertex_count],
            source_vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    fn len(&self) -> usize {
        self.source_vertices.len()
    }

    fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn new_vertex_count(&self, triangle: &[u32]) -> usize {
        let [a, b, c] = [triangle[0], triangle[1], triangle[2]];
        let mut count = 0;
        if self.remap[a as usize] == UNMAPPED {
            count += 1;
        }
        if b != a && self.remap[b as usize] == UNMAPPED {
            count += 1;
        }
        if c != a && c != b && self.remap[c as usize] == UNMAPPED {
            count += 1;
        }
        count
    }

    fn push_triangle(&mut self, triangle: &[u32]) {
        for &source in triangle {
            let slot = &mut self.remap[source as usize];
            if *slot == UNMAPPED {
                // Chunk length is bounded by the limit, which fits in u32.
                #[allow(clippy::cast_possible_truncation)]
                {
                    *slot = self.source_vertices.len() as u32;
                }
                self.source_vertices.push(source);
            }
            self.indices.push(*slot);
        }
    }

    /// Emit the current chunk and reset only the touched remap entries.
    fn finish(&mut self, buffer: &RawMeshBuffer) -> MeshChunk {
        let source_vertices = std::mem::take(&mut self.source_vertices);
        let indices = std::mem::take(&mut self.indices);
        for &source in &source_vertices {
            self.remap[source as usize] = UNMAPPED;
        }

        let gather_vec2 = |values: &[Vec2]| -> Vec<Vec2> {
            source_vertices.iter().map(|&i| values[i as usize]).collect()
        };

        MeshChunk {
            positions: source_vertices
                .iter()
                .map(|&i| buffer.positions[i as usize])
                .collect(),
            uv0: gather_vec2(&buffer.uv0),
            uv1: buffer.uv1.as_deref().map(gather_vec2),
            indices,
            source_vertices,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use proptest::prelude::*;

    use super::*;
    use crate::buffer::MeshCounts;

    /// A strip mesh where triangle `t` uses vertices `t, t+1, t+2`.
    fn strip(vertex_count: usize) -> RawMeshBuffer {
        let mut buffer = RawMeshBuffer::allocate(
            MeshCounts {
                vertices: vertex_count,
                indices: (vertex_count - 2) * 3,
                has_uv1: true,
            },
            "B123",
            "wall",
            DVec3::ZERO,
        );
        for (i, position) in buffer.positions.iter_mut().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let x = i as f32;
            *position = Vec3::new(x, x * 0.5, 0.0);
        }
        for t in 0..vertex_count - 2 {
            let t32 = u32::try_from(t).unwrap();
            buffer.indices[t * 3] = t32;
            buffer.indices[t * 3 + 1] = t32 + 1;
            buffer.indices[t * 3 + 2] = t32 + 2;
        }
        buffer
    }

    fn reconstruct(chunks: &[MeshChunk]) -> Vec<u32> {
        chunks
            .iter()
            .flat_map(|chunk| {
                chunk
                    .indices
                    .iter()
                    .map(|&local| chunk.source_vertices[local as usize])
            })
            .collect()
    }

    #[test]
    fn test_small_mesh_is_single_chunk() {
        let buffer = strip(10);
        let chunks = split_into_chunks(&buffer, DEFAULT_MAX_CHUNK_VERTICES).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].indices, buffer.indices);
        assert_eq!(chunks[0].positions, buffer.positions);
    }

    #[test]
    fn test_large_building_splits() {
        let buffer = strip(200_000);
        let chunks = split_into_chunks(&buffer, DEFAULT_MAX_CHUNK_VERTICES).unwrap();

        assert!(chunks.len() >= 4);
        for chunk in &chunks {
            assert!(chunk.vertex_count() <= DEFAULT_MAX_CHUNK_VERTICES);
            assert_eq!(chunk.indices.len() % 3, 0);
        }
        assert_eq!(reconstruct(&chunks), buffer.indices);
    }

    #[test]
    fn test_chunk_attributes_follow_remap() {
        let buffer = strip(12);
        let chunks = split_into_chunks(&buffer, 5).unwrap();
        for chunk in &chunks {
            for (local, &source) in chunk.source_vertices.iter().enumerate() {
                assert_eq!(chunk.positions[local], buffer.positions[source as usize]);
            }
            assert_eq!(
                chunk.uv1.as_ref().map(Vec::len),
                Some(chunk.vertex_count())
            );
        }
    }

    #[test]
    fn test_rejects_tiny_limit() {
        let buffer = strip(5);
        assert_eq!(
            split_into_chunks(&buffer, 2),
            Err(MeshError::InvalidChunkLimit { limit: 2 })
        );
    }

    fn arbitrary_mesh() -> impl Strategy<Value = (RawMeshBuffer, usize)> {
        (3usize..60, 3usize..20).prop_flat_map(|(vertices, limit)| {
            let index = 0..u32::try_from(vertices).unwrap();
            (
                proptest::collection::vec([index.clone(), index.clone(), index], 1..80),
                Just(vertices),
                Just(limit),
            )
                .prop_map(|(triangles, vertices, limit)| {
                    let mut buffer = RawMeshBuffer::allocate(
                        MeshCounts {
                            vertices,
                            indices: 0,
                            has_uv1: false,
                        },
                        "R1",
                        "road",
                        DVec3::ZERO,
                    );
                    for (i, position) in buffer.positions.iter_mut().enumerate() {
                        #[allow(clippy::cast_precision_loss)]
                        let v = i as f32;
                        *position = Vec3::splat(v);
                    }
                    buffer.indices = triangles.into_iter().flatten().collect();
                    (buffer, limit)
                })
        })
    }

    proptest! {
        #[test]
        fn prop_chunks_reconstruct_source((buffer, limit) in arbitrary_mesh()) {
            let chunks = split_into_chunks(&buffer, limit).unwrap();
            for chunk in &chunks {
                if buffer.vertex_count() > limit {
                    prop_assert!(chunk.vertex_count() <= limit);
                }
                prop_assert_eq!(chunk.indices.len() % 3, 0);
            }
            prop_assert_eq!(reconstruct(&chunks), buffer.indices.clone());

            let positions: Vec<Vec3> = chunks
                .iter()
                .flat_map(|c| c.indices.iter().map(|&i| c.positions[i as usize]))
                .collect();
            let expected: Vec<Vec3> = buffer
                .indices
                .iter()
                .map(|&i| buffer.positions[i as usize])
                .collect();
            prop_assert_eq!(positions, expected);
        }
    }
}
