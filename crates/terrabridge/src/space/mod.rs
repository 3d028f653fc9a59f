//! Geographic coordinates, tangent bases and coordinate frames.

mod basis;
mod frame;
mod geo;

pub use basis::{TangentBasis, heading_direction, north_east};
pub use frame::{
    CoordinateFrame, EcefFrame, LocalGroundedFrame, LocalTransform, TransformUpdateStrategy,
};
pub use geo::{EARTH_RADIUS, LatLong, LatLongAltitude, MAX_ELEVATION, approx_eq_ecef};
