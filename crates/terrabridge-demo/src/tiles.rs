//! Synthetic tile geometry.
//!
//! Each tile is a fixed lat/long cell holding a terrain patch with skirts, a
//! road crossing it and a single building, all built in the tangent plane at
//! the cell centre.

use std::fmt;

use glam::{DVec3, Vec2, Vec3};
use terrabridge::engine::EngineIngress;
use terrabridge::space::{LatLongAltitude, TangentBasis};
use terrabridge::streaming::{TextureFormat, TextureId};
use terrabridge_mesh::{MeshCounts, RawMeshBuffer};

/// Cell size in degrees.
pub const TILE_DEGREES: f64 = 0.01;

const TERRAIN_CELLS: u32 = 16;
const SKIRT_DEPTH: f32 = 20.0;
const ROAD_SEGMENTS: u32 = 24;
const ROAD_WIDTH: f32 = 8.0;
const RASTER_TEXTURE_SIZE: u32 = 64;

/// Integer cell coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    pub lat: i32,
    pub lon: i32,
}

impl TileKey {
    /// The cell containing an ECEF point.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn containing(point: DVec3) -> Self {
        let lla = LatLongAltitude::from_ecef(point);
        Self {
            lat: (lla.latitude / TILE_DEGREES).floor() as i32,
            lon: (lla.longitude / TILE_DEGREES).floor() as i32,
        }
    }

    #[must_use]
    pub fn offset(self, lat: i32, lon: i32) -> Self {
        Self {
            lat: self.lat + lat,
            lon: self.lon + lon,
        }
    }

    /// Cell centre on the ground.
    #[must_use]
    pub fn center(self) -> DVec3 {
        LatLongAltitude::new(
            (f64::from(self.lat) + 0.5) * TILE_DEGREES,
            (f64::from(self.lon) + 0.5) * TILE_DEGREES,
            0.0,
        )
        .to_ecef()
    }

    /// Approximate cell width in metres at its latitude.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn size_meters(self) -> f32 {
        let lla = LatLongAltitude::from_ecef(self.center());
        let north_south = TILE_DEGREES.to_radians() * terrabridge::space::EARTH_RADIUS;
        (north_south * lla.latitude.to_radians().cos()) as f32
    }

    /// Terrain, road and building identifiers for this cell.
    #[must_use]
    pub fn mesh_ids(self) -> [String; 3] {
        [format!("L{self}"), format!("R{self}"), format!("B{self}")]
    }

    /// Terrain material; alternating cells stream a raster texture.
    #[must_use]
    pub fn terrain_material(self) -> String {
        if (self.lat + self.lon).rem_euclid(2) == 0 {
            format!("Raster_{self}")
        } else {
            "grass".to_owned()
        }
    }

    /// Building material; one cell in nine gets a landmark.
    #[must_use]
    pub fn building_material(self) -> String {
        if self.lat.rem_euclid(3) == 0 && self.lon.rem_euclid(3) == 0 {
            format!("landmark_tower_{self}")
        } else {
            "building_wall".to_owned()
        }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.lat, self.lon)
    }
}

/// A finished tile as reported back from the producer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducedTile {
    pub key: TileKey,
    /// Streamed texture and the material waiting for it.
    pub texture: Option<(String, TextureId)>,
}

/// Build, fill and upload every mesh and texture for a cell.
pub fn produce_tile(ingress: &EngineIngress, key: TileKey) -> ProducedTile {
    let origin = key.center();
    let basis = TangentBasis::from_point_and_heading(origin, 0.0);
    let size = key.size_meters();
    let [terrain_id, road_id, building_id] = key.mesh_ids();
    let terrain_material = key.terrain_material();

    let buffers = [
        terrain(ingress, &terrain_id, &terrain_material, &basis, size),
        road(ingress, &road_id, &basis, size),
        building(ingress, &building_id, &key.building_material(), &basis),
    ];
    for buffer in buffers {
        let id = buffer.id.clone();
        match ingress.upload_unpacked_mesh(buffer) {
            Ok(true) => {}
            Ok(false) => tracing::debug!(%id, "mesh already waiting"),
            Err(e) => tracing::error!(%id, error = %e, "mesh upload failed"),
        }
    }

    let texture = terrain_material.starts_with("Raster").then(|| {
        let mut buffer = ingress.allocate_texture_buffer(
            RASTER_TEXTURE_SIZE,
            RASTER_TEXTURE_SIZE,
            TextureFormat::Rgba8,
            true,
        );
        fill_checker(&mut buffer.data, key);
        let id = buffer.id;
        ingress.upload_texture_buffer(buffer);
        (terrain_material.clone(), id)
    });

    tracing::debug!(tile = %key, "produced tile");
    ProducedTile { key, texture }
}

fn to_local(basis: &TangentBasis, east: f32, north: f32, up: f32) -> Vec3 {
    basis.right * east + basis.forward * north + basis.up * up
}

fn terrain_height(east: f32, north: f32) -> f32 {
    5.0 * (east / 50.0).sin() * (north / 70.0).cos()
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn terrain(
    ingress: &EngineIngress,
    id: &str,
    material: &str,
    basis: &TangentBasis,
    size: f32,
) -> RawMeshBuffer {
    let side = TERRAIN_CELLS + 1;
    let perimeter = perimeter(TERRAIN_CELLS);
    let grid_vertices = (side * side) as usize;
    let grid_indices = (TERRAIN_CELLS * TERRAIN_CELLS * 6) as usize;
    let mut buffer = ingress.allocate_unpacked_mesh(
        MeshCounts {
            vertices: grid_vertices + perimeter.len(),
            indices: grid_indices + perimeter.len() * 6,
            has_uv1: false,
        },
        id,
        material,
        basis.point,
    );

    let step = size / TERRAIN_CELLS as f32;
    let half = size * 0.5;
    for row in 0..side {
        for column in 0..side {
            let i = (row * side + column) as usize;
            let east = column as f32 * step - half;
            let north = row as f32 * step - half;
            buffer.positions[i] = to_local(basis, east, north, terrain_height(east, north));
            buffer.uv0[i] = Vec2::new(column as f32, row as f32) / TERRAIN_CELLS as f32;
        }
    }
    for row in 0..TERRAIN_CELLS {
        for column in 0..TERRAIN_CELLS {
            let a = row * side + column;
            let (b, c, d) = (a + 1, a + side + 1, a + side);
            let i = ((row * TERRAIN_CELLS + column) * 6) as usize;
            buffer.indices[i..i + 6].copy_from_slice(&[a, b, c, a, c, d]);
        }
    }

    // Skirt: a copy of each edge vertex pushed down, joined to its edge.
    let ring = perimeter.len() as u32;
    for (i, &top) in perimeter.iter().enumerate() {
        let bottom = grid_vertices + i;
        buffer.positions[bottom] = buffer.positions[top as usize] - basis.up * SKIRT_DEPTH;
        buffer.uv0[bottom] = buffer.uv0[top as usize];

        let i = i as u32;
        let next = (i + 1) % ring;
        let top_next = perimeter[next as usize];
        let (bottom, bottom_next) = (side * side + i, side * side + next);
        let at = grid_indices + i as usize * 6;
        buffer.indices[at..at + 6]
            .copy_from_slice(&[top, bottom, bottom_next, top, bottom_next, top_next]);
    }
    buffer
}

/// Grid indices around the edge of a `cells` x `cells` grid, in order.
fn perimeter(cells: u32) -> Vec<u32> {
    let side = cells + 1;
    let bottom = 0..cells;
    let right = (0..cells).map(|r| r * side + cells);
    let top = (0..cells).map(|c| cells * side + cells - c);
    let left = (0..cells).map(|r| (cells - r) * side);
    bottom.chain(right).chain(top).chain(left).collect()
}

#[allow(clippy::cast_precision_loss)]
fn road(ingress: &EngineIngress, id: &str, basis: &TangentBasis, size: f32) -> RawMeshBuffer {
    let columns = ROAD_SEGMENTS + 1;
    let mut buffer = ingress.allocate_unpacked_mesh(
        MeshCounts {
            vertices: (columns * 2) as usize,
            indices: (ROAD_SEGMENTS * 6) as usize,
            has_uv1: true,
        },
        id,
        "road",
        basis.point,
    );
    let half_width = ROAD_WIDTH * 0.5;
    let step = size / ROAD_SEGMENTS as f32;
    for column in 0..columns {
        let east = column as f32 * step - size * 0.5;
        let height = terrain_height(east, 0.0);
        for (side, north) in [-half_width, half_width].into_iter().enumerate() {
            let i = (column * 2) as usize + side;
            buffer.positions[i] = to_local(basis, east, north, height);
            buffer.uv0[i] = Vec2::new(column as f32, side as f32);
            if let Some(uv1) = &mut buffer.uv1 {
                uv1[i] = Vec2::new(column as f32 / ROAD_SEGMENTS as f32, side as f32);
            }
        }
    }
    for segment in 0..ROAD_SEGMENTS {
        let a = segment * 2;
        let i = (segment * 6) as usize;
        buffer.indices[i..i + 6].copy_from_slice(&[a, a + 2, a + 3, a, a + 3, a + 1]);
    }
    buffer
}

fn building(
    ingress: &EngineIngress,
    id: &str,
    material: &str,
    basis: &TangentBasis,
) -> RawMeshBuffer {
    const HALF_WIDTH: f32 = 15.0;
    const HALF_DEPTH: f32 = 10.0;
    const HEIGHT: f32 = 45.0;
    // Sits clear of the road.
    const NORTH: f32 = 60.0;

    let mut buffer = ingress.allocate_unpacked_mesh(
        MeshCounts {
            vertices: 20,
            indices: 30,
            has_uv1: false,
        },
        id,
        material,
        basis.point,
    );
    let base = terrain_height(0.0, NORTH);
    let corner = |east: f32, north: f32, up: f32| to_local(basis, east, NORTH + north, base + up);
    let faces = [
        // South, east, north, west walls and the roof.
        [(-1.0, -1.0, 0.0), (1.0, -1.0, 0.0), (1.0, -1.0, 1.0), (-1.0, -1.0, 1.0)],
        [(1.0, -1.0, 0.0), (1.0, 1.0, 0.0), (1.0, 1.0, 1.0), (1.0, -1.0, 1.0)],
        [(1.0, 1.0, 0.0), (-1.0, 1.0, 0.0), (-1.0, 1.0, 1.0), (1.0, 1.0, 1.0)],
        [(-1.0, 1.0, 0.0), (-1.0, -1.0, 0.0), (-1.0, -1.0, 1.0), (-1.0, 1.0, 1.0)],
        [(-1.0, -1.0, 1.0), (1.0, -1.0, 1.0), (1.0, 1.0, 1.0), (-1.0, 1.0, 1.0)],
    ];
    let uvs = [Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y];
    for (face, corners) in faces.iter().enumerate() {
        for (c, &(east, north, up)) in corners.iter().enumerate() {
            let i = face * 4 + c;
            buffer.positions[i] = corner(east * HALF_WIDTH, north * HALF_DEPTH, up * HEIGHT);
            buffer.uv0[i] = uvs[c];
        }
        #[allow(clippy::cast_possible_truncation)]
        let a = (face * 4) as u32;
        let i = face * 6;
        buffer.indices[i..i + 6].copy_from_slice(&[a, a + 1, a + 2, a, a + 2, a + 3]);
    }
    buffer
}

/// Two-tone checkerboard tinted per cell.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn fill_checker(data: &mut [u8], key: TileKey) {
    let tint = (key.lat.wrapping_mul(31) ^ key.lon.wrapping_mul(17)).rem_euclid(64) as u8;
    let size = RASTER_TEXTURE_SIZE as usize;
    for (i, pixel) in data.chunks_exact_mut(4).enumerate() {
        let (x, y) = (i % size, i / size);
        let light = ((x / 8) + (y / 8)) % 2 == 0;
        let value = if light { 160 + tint } else { 80 + tint / 2 };
        pixel.copy_from_slice(&[value / 2, value, value / 3, 255]);
    }
}
