use nalgebra::Vector3;
use serde::{Serialize, Deserialize};
use std::ops::{Add, Sub};

/// Cartesian position in the shared scene frame (same length unit as `a`)
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartesianPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl CartesianPosition {
    pub const ORIGIN: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance_to(&self, other: &Self) -> f64 {
        (*self - *other).magnitude()
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_vector(&self) -> Vector3<f64> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn from_vector(v: &Vector3<f64>) -> Self {
        Self::new(v.x, v.y, v.z)
    }

    /// Single-precision offset from `origin`, for GPU upload
    pub fn relative_to(&self, origin: &Self) -> LocalPosition {
        LocalPosition {
            x: (self.x - origin.x) as f32,
            y: (self.y - origin.y) as f32,
            z: (self.z - origin.z) as f32,
        }
    }
}

impl Add for CartesianPosition {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl Sub for CartesianPosition {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl From<Vector3<f64>> for CartesianPosition {
    fn from(v: Vector3<f64>) -> Self {
        Self::from_vector(&v)
    }
}

impl From<CartesianPosition> for Vector3<f64> {
    fn from(p: CartesianPosition) -> Self {
        p.to_vector()
    }
}

/// GPU-friendly position (f32, relative to a host-chosen origin)
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct LocalPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}
