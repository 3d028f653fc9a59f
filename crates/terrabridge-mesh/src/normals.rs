//! Per-vertex normal generation.
//!
//! Three strategies are supported, see [`NormalStrategy`]. All of them work
//! on a single chunk, whose positions are relative to the mesh origin.

use glam::{DVec3, Vec3};

use crate::kind::NormalStrategy;

/// Faces further than this from the radial up direction are skirts.
pub const SKIRT_ANGLE_DEGREES: f32 = 85.0;

/// Length of the radial normal substituted for skirt faces.
pub const SKIRT_NORMAL_SCALE: f32 = 0.001;

/// Compute normals for a chunk.
///
/// # Arguments
///
/// * `strategy` - How normals are derived
/// * `positions` - Chunk vertex positions relative to `origin_ecef`
/// * `indices` - Chunk triangle indices
/// * `origin_ecef` - The mesh origin in ECEF metres
///
/// # Returns
///
/// One unit normal per vertex. Vertices referenced by no face with a
/// non-zero area get a zero normal under the face-based strategies.
#[must_use]
pub fn compute_normals(
    strategy: NormalStrategy,
    positions: &[Vec3],
    indices: &[u32],
    origin_ecef: DVec3,
) -> Vec<Vec3> {
    match strategy {
        NormalStrategy::RasterTerrain => radial_normals(positions, origin_ecef),
        NormalStrategy::Terrain => {
            let up = origin_ecef.normalize_or_zero().as_vec3();
            accumulate_face_normals(positions, indices, |face| terrain_face_normal(face, up))
        }
        NormalStrategy::Generic => accumulate_face_normals(positions, indices, |face| face),
    }
}

/// The contribution of one terrain face, given its area-weighted normal.
///
/// Near-vertical skirt faces are replaced by `up * SKIRT_NORMAL_SCALE` so
/// that they barely influence the shared vertices.
#[must_use]
pub fn terrain_face_normal(face: Vec3, up: Vec3) -> Vec3 {
    let Some(direction) = face.try_normalize() else {
        return face;
    };
    let skirt_limit = SKIRT_ANGLE_DEGREES.to_radians().cos();
    if up.dot(direction).abs() < skirt_limit {
        up * SKIRT_NORMAL_SCALE
    } else {
        face
    }
}

/// Area-weighted face normal of a triangle (twice its area in length).
#[must_use]
pub fn face_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

fn radial_normals(positions: &[Vec3], origin_ecef: DVec3) -> Vec<Vec3> {
    positions
        .iter()
        .map(|p| (p.as_dvec3() + origin_ecef).normalize_or_zero().as_vec3())
        .collect()
}

fn accumulate_face_normals(
    positions: &[Vec3],
    indices: &[u32],
    mut contribution: impl FnMut(Vec3) -> Vec3,
) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [a, b, c] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        let face = contribution(face_normal(positions[a], positions[b], positions[c]));
        normals[a] += face;
        normals[b] += face;
        normals[c] += face;
    }

    for normal in &mut normals {
        *normal = normal.normalize_or_zero();
    }
    normals
}
