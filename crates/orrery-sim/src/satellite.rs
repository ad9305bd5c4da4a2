//! Simplified satellite (moon) orbit
//!
//! Not a Kepler solve: the satellite sits on a circle of radius `ρ` around its
//! parent's current position, swept at a constant angular rate `ω`. The offset
//! always lies in the scene frame's XY plane, whatever the parent's own orbital
//! plane looks like.

use crate::error::{SimError, SimResult};
use orrery_core::CartesianPosition;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SatelliteOrbit {
    /// Distance from the parent (length unit)
    orbit_radius: f64,
    /// Angular rate (radians per time unit); negative runs clockwise
    angular_rate: f64,
}

impl SatelliteOrbit {
    pub fn new(orbit_radius: f64, angular_rate: f64) -> SimResult<Self> {
        if !orbit_radius.is_finite() || orbit_radius < 0.0 {
            return Err(SimError::InvalidSatellite {
                field: "orbit_radius",
                value: orbit_radius,
                reason: "orbit radius must be non-negative and finite",
            });
        }
        if !angular_rate.is_finite() {
            return Err(SimError::InvalidSatellite {
                field: "angular_rate",
                value: angular_rate,
                reason: "angular rate must be finite",
            });
        }

        Ok(Self { orbit_radius, angular_rate })
    }

    pub fn orbit_radius(&self) -> f64 {
        self.orbit_radius
    }

    pub fn angular_rate(&self) -> f64 {
        self.angular_rate
    }

    pub fn scaled(&self, factor: f64) -> SimResult<Self> {
        Self::new(self.orbit_radius * factor, self.angular_rate)
    }

    /// Offset from the parent at time `t`
    pub fn offset(&self, t: f64) -> CartesianPosition {
        let angle = self.angular_rate * t;
        CartesianPosition::new(
            self.orbit_radius * angle.cos(),
            self.orbit_radius * angle.sin(),
            0.0,
        )
    }

    /// Satellite position given the parent's freshly computed position
    pub fn position(&self, parent: CartesianPosition, t: f64) -> CartesianPosition {
        parent + self.offset(t)
    }
}
