//! Error types for body construction and configuration

use thiserror::Error;

/// Result type for simulation setup operations
pub type SimResult<T> = Result<T, SimError>;

/// Errors that reject a body or a configuration
///
/// Per-tick solver trouble is never an error; see [`crate::kepler::Convergence`].
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid orbital elements: {field} = {value} ({reason})")]
    InvalidOrbitalElements {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Invalid satellite orbit: {field} = {value} ({reason})")]
    InvalidSatellite {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Invalid body {name}: {reason}")]
    InvalidBody { name: String, reason: String },

    #[error("Invalid sample count: {0}")]
    InvalidSampleCount(String),

    #[error("Invalid solver settings: {0}")]
    InvalidSolver(String),

    #[error("Invalid clock settings: {0}")]
    InvalidClock(String),

    #[error("Invalid validation range: {0}")]
    InvalidRange(String),

    #[error("Unknown parent body: {0}")]
    UnknownParent(String),

    #[error("Unknown body: {0}")]
    UnknownBody(String),

    #[error("Duplicate body name: {0}")]
    DuplicateBody(String),

    #[error("Body {0} is not on a Keplerian orbit")]
    NotKeplerian(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
