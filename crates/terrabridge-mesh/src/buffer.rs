//! Owned raw mesh buffers handed over by the streaming engine.

use glam::{DVec3, Vec2, Vec3};

use crate::error::{MeshError, MeshResult};

/// Sizes used to allocate a [`RawMeshBuffer`] before the producer fills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshCounts {
    pub vertices: usize,
    pub indices: usize,
    pub has_uv1: bool,
}

/// A raw unpacked mesh as produced by the streaming engine.
///
/// Positions are relative to `origin_ecef`. The buffer is filled in place by
/// the producer and then moved into the preparation pipeline, which consumes
/// it exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMeshBuffer {
    pub id: String,
    pub material_name: String,
    pub origin_ecef: DVec3,
    pub positions: Vec<Vec3>,
    pub uv0: Vec<Vec2>,
    pub uv1: Option<Vec<Vec2>>,
    pub indices: Vec<u32>,
}

impl RawMeshBuffer {
    /// Allocate zeroed storage of the given sizes.
    #[must_use]
    pub fn allocate(
        counts: MeshCounts,
        id: impl Into<String>,
        material_name: impl Into<String>,
        origin_ecef: DVec3,
    ) -> Self {
        Self {
            id: id.into(),
            material_name: material_name.into(),
            origin_ecef,
            positions: vec![Vec3::ZERO; counts.vertices],
            uv0: vec![Vec2::ZERO; counts.vertices],
            uv1: counts.has_uv1.then(|| vec![Vec2::ZERO; counts.vertices]),
            indices: vec![0; counts.indices],
        }
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of whole triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check attribute lengths and index bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the index buffer is not a whole number of
    /// triangles, an index is out of range, or a UV buffer length differs
    /// from the vertex count.
    pub fn validate(&self) -> MeshResult<()> {
        let len = self.positions.len();
        if self.uv0.len() != len {
            return Err(MeshError::AttributeLengthMismatch {
                attribute: "uv0",
                expected: len,
                actual: self.uv0.len(),
            });
        }
        if let Some(uv1) = &self.uv1
            && uv1.len() != len
        {
            return Err(MeshError::AttributeLengthMismatch {
                attribute: "uv1",
                expected: len,
                actual: uv1.len(),
            });
        }
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::InvalidIndexCount {
                count: self.indices.len(),
            });
        }
        if let Some(&index) = self.indices.iter().find(|&&i| i as usize >= len) {
            return Err(MeshError::IndexOutOfBounds {
                index: index as usize,
                len,
            });
        }
        Ok(())
    }
}
