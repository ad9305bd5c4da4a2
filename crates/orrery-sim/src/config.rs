//! System description: bodies plus the run-wide settings they share
//!
//! Stored as JSON. Every section except `bodies` is optional and falls back
//! to the built-in defaults.

use crate::clock::ClockConfig;
use crate::error::{SimError, SimResult};
use crate::kepler::SolverConfig;
use crate::sampler::SampleCount;
use orrery_core::RotationAngles;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SystemConfig {
    /// Frame rotation shared by every orbit
    #[serde(default)]
    pub rotation: RotationAngles,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    /// Multiplies every semi-major axis and satellite orbit radius
    #[serde(default = "default_scale")]
    pub scale: f64,
    /// Orbit path samples for bodies that don't set their own
    #[serde(default)]
    pub sample_count: SampleCount,
    pub bodies: Vec<BodyConfig>,
}

fn default_scale() -> f64 {
    1.0
}

/// One body; `kind` selects the motion model
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum BodyConfig {
    /// Static point, e.g. the central star or a marker
    Fixed {
        name: String,
        position: [f64; 3],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
    },
    /// Elliptical orbit about the origin
    Keplerian {
        name: String,
        a: f64,
        e: f64,
        #[serde(rename = "T", alias = "period")]
        period: f64,
        #[serde(default)]
        tau: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sample_count: Option<SampleCount>,
    },
    /// Circular offset around an earlier body
    Satellite {
        name: String,
        parent: String,
        orbit_radius: f64,
        angular_rate: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius: Option<f64>,
    },
}

impl BodyConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Fixed { name, .. } | Self::Keplerian { name, .. } | Self::Satellite { name, .. } => name,
        }
    }

    pub fn radius(&self) -> Option<f64> {
        match self {
            Self::Fixed { radius, .. } | Self::Keplerian { radius, .. } | Self::Satellite { radius, .. } => *radius,
        }
    }
}

impl SystemConfig {
    /// Default settings around the given bodies
    pub fn with_bodies(bodies: Vec<BodyConfig>) -> Self {
        Self {
            rotation: RotationAngles::default(),
            solver: SolverConfig::default(),
            clock: ClockConfig::default(),
            scale: 1.0,
            sample_count: SampleCount::default(),
            bodies,
        }
    }

    pub fn load(path: &Path) -> SimResult<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks that need no body construction; elements are checked when the
    /// driver builds each body
    pub fn validate(&self) -> SimResult<()> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SimError::InvalidBody {
                name: "<system>".to_string(),
                reason: format!("scale must be positive and finite, got {}", self.scale),
            });
        }
        self.solver.validate()?;
        self.clock.validate()?;
        Ok(())
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        crate::planets::solar_system()
    }
}
