//! Geometry classification by identifier and material name.
//!
//! The streaming engine encodes the kind of a mesh in the first character of
//! its identifier. The classification is resolved once when the mesh is
//! prepared and carried on the record from then on.

use crate::error::{MeshError, MeshResult};

/// Destination bucket for a streamed mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryKind {
    /// Terrain tiles, raster terrain and landmarks.
    Terrain,
    /// Road overlays.
    Road,
    /// Extruded buildings.
    Building,
}

impl GeometryKind {
    /// All buckets, in update order.
    pub const ALL: [Self; 3] = [Self::Terrain, Self::Road, Self::Building];

    /// Classify an identifier.
    ///
    /// `Raster*`, `Terrain*`, `M*` and `L*` are terrain, `R*` is a road and
    /// `B*` is a building.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::UnknownGeometryPrefix`] for anything else.
    pub fn classify(id: &str) -> MeshResult<Self> {
        if id.starts_with("Raster") || id.starts_with("Terrain") {
            return Ok(Self::Terrain);
        }
        match id.as_bytes().first() {
            Some(b'M' | b'L') => Ok(Self::Terrain),
            Some(b'R') => Ok(Self::Road),
            Some(b'B') => Ok(Self::Building),
            _ => Err(MeshError::UnknownGeometryPrefix { id: id.to_owned() }),
        }
    }

    /// Short lowercase label used in logs and object names.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Terrain => "terrain",
            Self::Road => "road",
            Self::Building => "building",
        }
    }
}

/// How per-vertex normals are produced for a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalStrategy {
    /// Area-weighted face normals with skirt faces replaced by a radial bias.
    Terrain,
    /// Radial direction from the Earth centre, ignoring topology.
    RasterTerrain,
    /// Plain area-weighted face normals.
    Generic,
}

impl NormalStrategy {
    /// Pick the strategy for a mesh.
    ///
    /// `L*` identifiers use the skirt-aware terrain path unless their
    /// material is a tree (`tr*`). Otherwise `Raster*` materials get radial
    /// normals and everything else plain face normals.
    #[must_use]
    pub fn select(id: &str, material_name: &str) -> Self {
        let is_tree = material_name.starts_with("tr");
        if id.starts_with('L') && !is_tree {
            Self::Terrain
        } else if material_name.starts_with("Raster") {
            Self::RasterTerrain
        } else {
            Self::Generic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prefixes() {
        assert_eq!(GeometryKind::classify("B123"), Ok(GeometryKind::Building));
        assert_eq!(GeometryKind::classify("R7"), Ok(GeometryKind::Road));
        assert_eq!(GeometryKind::classify("L0_12"), Ok(GeometryKind::Terrain));
        assert_eq!(GeometryKind::classify("M3"), Ok(GeometryKind::Terrain));
        assert_eq!(
            GeometryKind::classify("Raster_4_2"),
            Ok(GeometryKind::Terrain)
        );
        assert_eq!(GeometryKind::classify("Terrain9"), Ok(GeometryKind::Terrain));
    }

    #[test]
    fn test_classify_rejects_unknown() {
        assert!(matches!(
            GeometryKind::classify("X1"),
            Err(MeshError::UnknownGeometryPrefix { .. })
        ));
        assert!(GeometryKind::classify("").is_err());
    }

    #[test]
    fn test_normal_strategy() {
        assert_eq!(NormalStrategy::select("L1", "Raster_a"), NormalStrategy::Terrain);
        assert_eq!(
            NormalStrategy::select("Raster_4_2", "Raster_a"),
            NormalStrategy::RasterTerrain
        );
        assert_eq!(
            NormalStrategy::select("M1", "Raster_a"),
            NormalStrategy::RasterTerrain
        );
        assert_eq!(NormalStrategy::select("L1", "grass"), NormalStrategy::Terrain);
        assert_eq!(NormalStrategy::select("L1", "tree01"), NormalStrategy::Generic);
        assert_eq!(NormalStrategy::select("B1", "wall"), NormalStrategy::Generic);
        assert_eq!(NormalStrategy::select("M1", "grass"), NormalStrategy::Generic);
    }
}
