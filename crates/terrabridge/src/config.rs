//! Map configuration handed to the core at construction.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default starting latitude (San Francisco).
pub const DEFAULT_LATITUDE: f64 = 37.771_092;
/// Default starting longitude (San Francisco).
pub const DEFAULT_LONGITUDE: f64 = -122.468_385;
/// Default starting distance from the interest point in metres.
pub const DEFAULT_DISTANCE: f64 = 1781.0;
/// Default radial offset for roads in metres.
pub const DEFAULT_ROAD_HEIGHT_OFFSET: f32 = 0.1;

/// How objects and the camera are placed in the rendering engine's space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// A local frame tangent to the Earth at a chosen origin, y up.
    #[default]
    LocalGrounded,
    /// Raw ECEF axes offset by a moving origin.
    Ecef,
}

/// Which buckets get collision meshes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    pub terrain: bool,
    pub road: bool,
    pub building: bool,
}

/// Configuration for a [`MapSession`](crate::MapSession).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub api_key: String,
    pub coordinate_system: CoordinateSystem,
    pub latitude_degrees: f64,
    pub longitude_degrees: f64,
    pub distance_to_interest: f64,
    pub heading_degrees: f64,
    /// Directory searched for named materials. Empty disables the lookup.
    pub materials_directory: String,
    /// Material used for every landmark instead of a streamed texture.
    pub override_landmark_material: Option<String>,
    pub coverage_tree_manifest_url: String,
    pub theme_manifest_url: String,
    pub collisions: CollisionConfig,
    pub max_vertices_per_chunk: usize,
    pub road_height_offset: f32,
    /// Animated transitions further than this jump instead, in metres.
    pub jump_distance_threshold: f64,
    pub default_transition_seconds: f64,
    /// Recentre the local frame when the camera drifts this far.
    pub recenter_distance: Option<f64>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            coordinate_system: CoordinateSystem::default(),
            latitude_degrees: DEFAULT_LATITUDE,
            longitude_degrees: DEFAULT_LONGITUDE,
            distance_to_interest: DEFAULT_DISTANCE,
            heading_degrees: 0.0,
            materials_directory: "MapMaterials/".to_owned(),
            override_landmark_material: None,
            coverage_tree_manifest_url: String::new(),
            theme_manifest_url: String::new(),
            collisions: CollisionConfig::default(),
            max_vertices_per_chunk: terrabridge_mesh::DEFAULT_MAX_CHUNK_VERTICES,
            road_height_offset: DEFAULT_ROAD_HEIGHT_OFFSET,
            jump_distance_threshold: 500_000.0,
            default_transition_seconds: 2.0,
            recenter_distance: Some(5000.0),
        }
    }
}

impl MapConfig {
    /// Check the configuration for values the core cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_api_key(&self.api_key) {
            return Err(Error::InvalidApiKey);
        }
        if !(-90.0..=90.0).contains(&self.latitude_degrees) {
            return Err(invalid("latitude_degrees", self.latitude_degrees));
        }
        if !(-180.0..=180.0).contains(&self.longitude_degrees) {
            return Err(invalid("longitude_degrees", self.longitude_degrees));
        }
        if !is_positive(self.distance_to_interest) {
            return Err(invalid("distance_to_interest", self.distance_to_interest));
        }
        if self.max_vertices_per_chunk < 3 {
            return Err(Error::InvalidConfig {
                field: "max_vertices_per_chunk",
                detail: format!("{} is below one triangle", self.max_vertices_per_chunk),
            });
        }
        if self.default_transition_seconds.is_nan() || self.default_transition_seconds < 0.0 {
            return Err(invalid(
                "default_transition_seconds",
                self.default_transition_seconds,
            ));
        }
        if let Some(distance) = self.recenter_distance
            && !is_positive(distance)
        {
            return Err(invalid("recenter_distance", distance));
        }
        Ok(())
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(field: &'static str, value: f64) -> Error {
    Error::InvalidConfig {
        field,
        detail: format!("{value} is out of range"),
    }
}

/// Whether `key` is 32 lowercase hexadecimal characters.
#[must_use]
pub fn is_valid_api_key(key: &str) -> bool {
    key.len() == 32 && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
