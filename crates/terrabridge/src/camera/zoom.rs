//! Conversions between map zoom levels and camera distances.

/// Camera distance in metres for each integer zoom level.
const ZOOM_DISTANCES: [f64; 26] = [
    27_428_700.0,
    14_720_762.0,
    8_000_000.0,
    4_512_909.0,
    2_087_317.0,
    1_248_854.0,
    660_556.0,
    351_205.0,
    185_652.0,
    83_092.0,
    41_899.0,
    21_377.0,
    11_294.0,
    5_818.0,
    3_106.0,
    1_890.0,
    1_300.0,
    821.0,
    500.0,
    300.0,
    108.0,
    58.0,
    31.0,
    17.0,
    9.0,
    5.0,
];

/// Furthest supported camera distance.
pub const MAX_DISTANCE: f64 = ZOOM_DISTANCES[0];

/// Highest zoom level.
pub const MAX_ZOOM_LEVEL: usize = ZOOM_DISTANCES.len() - 1;

/// Camera distance for a fractional zoom level, interpolating linearly
/// between table entries and clamping outside the table.
#[must_use]
pub fn zoom_level_to_distance(zoom_level: f64) -> f64 {
    if zoom_level.is_nan() || zoom_level <= 0.0 {
        return ZOOM_DISTANCES[0];
    }
    #[allow(clippy::cast_precision_loss)]
    let max_level = MAX_ZOOM_LEVEL as f64;
    if zoom_level >= max_level {
        return ZOOM_DISTANCES[MAX_ZOOM_LEVEL];
    }
    // In range: 0 < zoom_level < MAX_ZOOM_LEVEL.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = zoom_level.floor() as usize;
    #[allow(clippy::cast_precision_loss)]
    let t = zoom_level - lower as f64;
    let (near, far) = (ZOOM_DISTANCES[lower], ZOOM_DISTANCES[lower + 1]);
    near + (far - near) * t
}

/// The first zoom level whose distance does not exceed `distance`.
#[must_use]
pub fn distance_to_zoom_level(distance: f64) -> usize {
    ZOOM_DISTANCES
        .iter()
        .position(|&level| distance >= level)
        .unwrap_or(MAX_ZOOM_LEVEL)
}
