//! Geographic coordinates and their conversion to ECEF.
//!
//! Uses a spherical Earth. ECEF axes follow the usual convention: +Z through
//! the north pole, +X through (0°, 0°), +Y through (0°, 90°E).

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS: f64 = 6_378_100.0;
/// Height of the highest terrain above the sphere in metres.
pub const MAX_ELEVATION: f64 = 8848.0;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLong {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLong {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    #[must_use]
    pub fn latitude_radians(self) -> f64 {
        self.latitude.to_radians()
    }

    #[must_use]
    pub fn longitude_radians(self) -> f64 {
        self.longitude.to_radians()
    }

    /// Attach an altitude.
    #[must_use]
    pub fn with_altitude(self, altitude: f64) -> LatLongAltitude {
        LatLongAltitude::new(self.latitude, self.longitude, altitude)
    }

    /// Initial great-circle bearing towards `other`, in degrees in `[0, 360)`.
    #[must_use]
    pub fn bearing_to(self, other: LatLong) -> f64 {
        let (lat1, lat2) = (self.latitude_radians(), other.latitude_radians());
        let delta_lon = other.longitude_radians() - self.longitude_radians();
        let y = delta_lon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lon.cos();
        y.atan2(x).to_degrees().rem_euclid(360.0)
    }

    /// Great-circle (haversine) distance to `other` in metres on the sphere.
    #[must_use]
    pub fn great_circle_distance(self, other: LatLong) -> f64 {
        let (lat1, lat2) = (self.latitude_radians(), other.latitude_radians());
        let half_dlat = (lat2 - lat1) * 0.5;
        let half_dlon = (other.longitude_radians() - self.longitude_radians()) * 0.5;
        let a = half_dlat.sin().powi(2) + lat1.cos() * lat2.cos() * half_dlon.sin().powi(2);
        2.0 * EARTH_RADIUS * a.sqrt().min(1.0).asin()
    }

    /// Component-wise interpolation.
    #[must_use]
    pub fn lerp(self, other: LatLong, t: f64) -> LatLong {
        LatLong::new(
            self.latitude + (other.latitude - self.latitude) * t,
            self.longitude + (other.longitude - self.longitude) * t,
        )
    }
}

/// A geodetic point: degrees, degrees, metres above the sphere.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLongAltitude {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

impl LatLongAltitude {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }

    /// Drop the altitude.
    #[must_use]
    pub fn lat_long(self) -> LatLong {
        LatLong::new(self.latitude, self.longitude)
    }

    /// Convert to ECEF metres.
    #[must_use]
    pub fn to_ecef(self) -> DVec3 {
        let lat_long = self.lat_long();
        let (lat, lon) = (lat_long.latitude_radians(), lat_long.longitude_radians());
        let radial = DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin());
        radial * (EARTH_RADIUS + self.altitude)
    }

    /// Convert from ECEF metres.
    ///
    /// The longitude of a point on the polar axis is reported as zero.
    #[must_use]
    pub fn from_ecef(position: DVec3) -> Self {
        let latitude = position.z.atan2(position.truncate().length());
        let longitude = position.y.atan2(position.x);
        Self::new(
            latitude.to_degrees(),
            longitude.to_degrees(),
            position.length() - EARTH_RADIUS,
        )
    }

    /// Component-wise interpolation.
    #[must_use]
    pub fn lerp(self, other: LatLongAltitude, t: f64) -> LatLongAltitude {
        let lat_long = self.lat_long().lerp(other.lat_long(), t);
        lat_long.with_altitude(self.altitude + (other.altitude - self.altitude) * t)
    }
}

/// Whether every component of `a` lies in `[b - tolerance, b + tolerance)`.
#[must_use]
pub fn approx_eq_ecef(a: DVec3, b: DVec3, tolerance: f64) -> bool {
    let lower = b - DVec3::splat(tolerance);
    let upper = b + DVec3::splat(tolerance);
    a.cmpge(lower).all() && a.cmplt(upper).all()
}
