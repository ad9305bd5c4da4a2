pub mod clock;
pub mod config;
pub mod eclipse;
pub mod elements;
pub mod error;
pub mod kepler;
pub mod planets;
pub mod sampler;
pub mod satellite;
pub mod system;
pub mod validation;

#[cfg(test)]
mod tests;

pub use clock::{ClockConfig, SimulationClock};
pub use config::{BodyConfig, SystemConfig};
pub use eclipse::{classify, EclipseKind, EclipseWatch, Occultation};
pub use elements::{OrbitalElements, Propagation, Propagator};
pub use error::{SimError, SimResult};
pub use kepler::{Convergence, KeplerSolution, KeplerSolver, SolverConfig};
pub use planets::{solar_system, Planet};
pub use sampler::{OrbitPath, OrbitSampler, SampleCount};
pub use satellite::SatelliteOrbit;
pub use system::{Body, BodyDiagnostics, BodyId, Driver, Motion, PositionSink, SystemSnapshot};
pub use validation::{validate_body, validate_range, summarize_validation, ValidationPoint, ValidationSummary};
