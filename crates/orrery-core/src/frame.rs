//! Fixed reference-frame rotation shared by every orbit in a system
//!
//! Each orbit is computed in its own plane (z = 0) and then embedded into the
//! common scene frame by the same three axis rotations: yaw about +Y, then
//! roll about +Z, then pitch about +X.

use crate::constants::{DEFAULT_PITCH, DEFAULT_ROLL, DEFAULT_YAW};
use crate::coordinates::CartesianPosition;
use nalgebra::{Rotation3, Vector3};
use serde::{Serialize, Deserialize};

/// Rotation angles in radians, as read from configuration
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotationAngles {
    #[serde(default = "default_yaw")]
    pub yaw: f64,
    #[serde(default = "default_roll")]
    pub roll: f64,
    #[serde(default = "default_pitch")]
    pub pitch: f64,
}

fn default_yaw() -> f64 {
    DEFAULT_YAW
}

fn default_roll() -> f64 {
    DEFAULT_ROLL
}

fn default_pitch() -> f64 {
    DEFAULT_PITCH
}

impl RotationAngles {
    pub fn new(yaw: f64, roll: f64, pitch: f64) -> Self {
        Self { yaw, roll, pitch }
    }

    /// No rotation: orbital-plane coordinates pass through unchanged
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl Default for RotationAngles {
    fn default() -> Self {
        Self::new(DEFAULT_YAW, DEFAULT_ROLL, DEFAULT_PITCH)
    }
}

/// Precomputed composite rotation `R = Rx(pitch) · Rz(roll) · Ry(yaw)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameRotation {
    rotation: Rotation3<f64>,
}

impl FrameRotation {
    pub fn new(angles: RotationAngles) -> Self {
        let yaw = Rotation3::from_axis_angle(&Vector3::y_axis(), angles.yaw);
        let roll = Rotation3::from_axis_angle(&Vector3::z_axis(), angles.roll);
        let pitch = Rotation3::from_axis_angle(&Vector3::x_axis(), angles.pitch);

        Self {
            rotation: pitch * roll * yaw,
        }
    }

    pub fn identity() -> Self {
        Self::new(RotationAngles::zero())
    }

    /// Rotate an orbital-plane point into the scene frame
    pub fn apply(&self, p: CartesianPosition) -> CartesianPosition {
        (self.rotation * p.to_vector()).into()
    }
}

impl Default for FrameRotation {
    fn default() -> Self {
        Self::new(RotationAngles::default())
    }
}

impl From<RotationAngles> for FrameRotation {
    fn from(angles: RotationAngles) -> Self {
        Self::new(angles)
    }
}
