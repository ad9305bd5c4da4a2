use std::f64::consts::PI;

/// Default reference-frame yaw (about +Y)
pub const DEFAULT_YAW: f64 = PI / 5.0;

/// Default reference-frame roll (about +Z)
pub const DEFAULT_ROLL: f64 = PI / 4.0;

/// Default reference-frame pitch (about +X)
pub const DEFAULT_PITCH: f64 = PI / 4.0;

/// Kepler solver stopping tolerance on successive iterates
pub const KEPLER_TOLERANCE: f64 = 1.0e-14;

/// Kepler solver iteration cap
pub const KEPLER_MAX_ITERATIONS: u32 = 100;

/// Eccentricities closer than this to 1 are flagged as near-parabolic
pub const NEAR_PARABOLIC_MARGIN: f64 = 1.0e-6;

/// Simulation time advanced per frame at speed 1.0
pub const DEFAULT_TIME_STEP: f64 = 0.05;

/// Orbit path samples per period
pub const DEFAULT_SAMPLE_COUNT: usize = 100;
