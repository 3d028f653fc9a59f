//! Coordinate frames that place ECEF objects in the rendering engine's space.
//!
//! Earth coordinates are millions of metres, far outside what `f32` can hold
//! precisely. Both frames keep a double-precision origin and hand the engine
//! small single-precision offsets from it.

use glam::{DQuat, DVec3, Quat, Vec3};

use crate::config::CoordinateSystem;
use crate::space::{LatLongAltitude, TangentBasis};

/// A single-precision transform in the engine's space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl LocalTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };
}

/// Computes where a streamed object sits in the engine's space.
pub trait TransformUpdateStrategy {
    /// Transform for an object whose vertices are relative to `origin_ecef`,
    /// lifted radially by `height_offset` metres.
    fn update_transform(&self, origin_ecef: DVec3, height_offset: f32) -> LocalTransform;
}

/// A frame tangent to the Earth at an origin: x east, y up, z south.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalGroundedFrame {
    basis: TangentBasis,
    local_to_ecef: DQuat,
    ecef_to_local: DQuat,
}

impl LocalGroundedFrame {
    /// Create a frame centred on `origin`.
    #[must_use]
    pub fn new(origin: DVec3) -> Self {
        let basis = TangentBasis::from_point_and_heading(origin, 0.0);
        let local_to_ecef = basis.local_to_ecef_rotation();
        Self {
            basis,
            local_to_ecef,
            ecef_to_local: local_to_ecef.inverse(),
        }
    }

    /// The ECEF origin.
    #[must_use]
    pub fn origin(&self) -> DVec3 {
        self.basis.point
    }

    /// The tangent basis at the origin.
    #[must_use]
    pub fn basis(&self) -> &TangentBasis {
        &self.basis
    }

    /// Replace the frame with one centred on `origin`.
    pub fn recenter(&mut self, origin: DVec3) {
        *self = Self::new(origin);
    }

    #[must_use]
    pub fn ecef_to_local(&self, ecef: DVec3) -> DVec3 {
        self.ecef_to_local * (ecef - self.basis.point)
    }

    #[must_use]
    pub fn local_to_ecef(&self, local: DVec3) -> DVec3 {
        self.local_to_ecef * local + self.basis.point
    }

    /// Rotate an ECEF direction into local axes.
    #[must_use]
    pub fn ecef_direction_to_local(&self, direction: DVec3) -> DVec3 {
        self.ecef_to_local * direction
    }

    /// Rotation taking ECEF axes to local axes.
    #[must_use]
    pub fn ecef_to_local_rotation(&self) -> DQuat {
        self.ecef_to_local
    }

    /// Rotation taking local axes to ECEF axes.
    #[must_use]
    pub fn local_to_ecef_rotation(&self) -> DQuat {
        self.local_to_ecef
    }

    #[must_use]
    pub fn lla_to_local(&self, lla: LatLongAltitude) -> DVec3 {
        self.ecef_to_local(lla.to_ecef())
    }

    #[must_use]
    pub fn local_to_lla(&self, local: DVec3) -> LatLongAltitude {
        LatLongAltitude::from_ecef(self.local_to_ecef(local))
    }
}

impl TransformUpdateStrategy for LocalGroundedFrame {
    fn update_transform(&self, origin_ecef: DVec3, height_offset: f32) -> LocalTransform {
        let up = self.ecef_direction_to_local(origin_ecef.normalize_or_zero());
        let translation = self.ecef_to_local(origin_ecef) + up * f64::from(height_offset);
        LocalTransform {
            translation: translation.as_vec3(),
            rotation: self.ecef_to_local.as_quat(),
        }
    }
}

/// Raw ECEF axes with a moving origin and no rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EcefFrame {
    pub origin: DVec3,
}

impl EcefFrame {
    #[must_use]
    pub fn new(origin: DVec3) -> Self {
        Self { origin }
    }
}

impl TransformUpdateStrategy for EcefFrame {
    fn update_transform(&self, origin_ecef: DVec3, height_offset: f32) -> LocalTransform {
        let up = origin_ecef.normalize_or_zero();
        let translation = origin_ecef - self.origin + up * f64::from(height_offset);
        LocalTransform {
            translation: translation.as_vec3(),
            rotation: Quat::IDENTITY,
        }
    }
}

/// The frame chosen for a session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CoordinateFrame {
    LocalGrounded(LocalGroundedFrame),
    Ecef(EcefFrame),
}

impl CoordinateFrame {
    /// Create the frame for `system` centred on `origin`.
    #[must_use]
    pub fn new(system: CoordinateSystem, origin: DVec3) -> Self {
        match system {
            CoordinateSystem::LocalGrounded => Self::LocalGrounded(LocalGroundedFrame::new(origin)),
            CoordinateSystem::Ecef => Self::Ecef(EcefFrame::new(origin)),
        }
    }

    #[must_use]
    pub fn system(&self) -> CoordinateSystem {
        match self {
            Self::LocalGrounded(_) => CoordinateSystem::LocalGrounded,
            Self::Ecef(_) => CoordinateSystem::Ecef,
        }
    }

    #[must_use]
    pub fn origin(&self) -> DVec3 {
        match self {
            Self::LocalGrounded(frame) => frame.origin(),
            Self::Ecef(frame) => frame.origin,
        }
    }

    /// Move the origin. The whole frame is replaced.
    pub fn recenter(&mut self, origin: DVec3) {
        match self {
            Self::LocalGrounded(frame) => frame.recenter(origin),
            Self::Ecef(frame) => frame.origin = origin,
        }
    }

    /// Place a camera given its ECEF position and ECEF orientation.
    #[must_use]
    pub fn camera_transform(&self, position_ecef: DVec3, rotation_ecef: DQuat) -> LocalTransform {
        match self {
            Self::LocalGrounded(frame) => LocalTransform {
                translation: frame.ecef_to_local(position_ecef).as_vec3(),
                rotation: (frame.ecef_to_local * rotation_ecef).normalize().as_quat(),
            },
            Self::Ecef(frame) => LocalTransform {
                translation: (position_ecef - frame.origin).as_vec3(),
                rotation: rotation_ecef.as_quat(),
            },
        }
    }

    /// Recover a camera's ECEF position and orientation from its local
    /// transform.
    #[must_use]
    pub fn camera_to_ecef(&self, transform: LocalTransform) -> (DVec3, DQuat) {
        let translation = transform.translation.as_dvec3();
        let rotation = transform.rotation.as_dquat();
        match self {
            Self::LocalGrounded(frame) => (
                frame.local_to_ecef(translation),
                (frame.local_to_ecef * rotation).normalize(),
            ),
            Self::Ecef(frame) => (frame.origin + translation, rotation),
        }
    }

    /// Convert an ECEF point to the engine's space.
    #[must_use]
    pub fn ecef_to_engine(&self, ecef: DVec3) -> DVec3 {
        match self {
            Self::LocalGrounded(frame) => frame.ecef_to_local(ecef),
            Self::Ecef(frame) => ecef - frame.origin,
        }
    }

    /// Convert a point in the engine's space to ECEF.
    #[must_use]
    pub fn engine_to_ecef(&self, local: DVec3) -> DVec3 {
        match self {
            Self::LocalGrounded(frame) => frame.local_to_ecef(local),
            Self::Ecef(frame) => frame.origin + local,
        }
    }
}

impl TransformUpdateStrategy for CoordinateFrame {
    fn update_transform(&self, origin_ecef: DVec3, height_offset: f32) -> LocalTransform {
        match self {
            Self::LocalGrounded(frame) => frame.update_transform(origin_ecef, height_offset),
            Self::Ecef(frame) => frame.update_transform(origin_ecef, height_offset),
        }
    }
}
