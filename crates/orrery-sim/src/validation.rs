//! Self-consistency checks over a configured system
//!
//! There is no ephemeris to compare against, so each Keplerian body is
//! checked against the properties its orbit must satisfy: the Kepler residual
//! of every solve, periodicity in `T`, focus distance against `a(1 − e·cos E)`,
//! and closure of its sampled path.

use crate::kepler::residual;
use crate::sampler::{OrbitSampler, SampleCount};
use crate::system::{BodyId, Driver};
use crate::error::{SimError, SimResult};
use std::collections::BTreeMap;

/// Checks for one body at one time
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationPoint {
    pub body: BodyId,
    pub time: f64,
    /// |E − e·sin E − M| (mod 2π)
    pub kepler_residual: f64,
    /// Largest coordinate difference between t and t + T
    pub periodicity_error: f64,
    /// |‖p‖ − a(1 − e·cos E)|, since rotation keeps the distance to the focus
    pub radius_error: f64,
    pub converged: bool,
}

/// Check one Keplerian body at a single time
pub fn validate_body(driver: &Driver, id: BodyId, t: f64) -> SimResult<ValidationPoint> {
    let body = driver
        .body(id)
        .ok_or_else(|| SimError::UnknownBody(format!("{:?}", id)))?;
    let elements = body
        .elements()
        .ok_or_else(|| SimError::NotKeplerian(body.name().to_string()))?;
    let propagator = driver.propagator();

    let now = propagator.propagate(elements, t);
    let later = propagator.propagate(elements, t + elements.period());

    let diff = now.position - later.position;
    let periodicity_error = diff.x.abs().max(diff.y.abs()).max(diff.z.abs());

    Ok(ValidationPoint {
        body: id,
        time: t,
        kepler_residual: residual(
            elements.eccentricity(),
            now.solution.eccentric_anomaly,
            elements.mean_anomaly_at(t),
        )
        .abs(),
        periodicity_error,
        radius_error: (now.position.magnitude() - elements.radius_at(now.solution.eccentric_anomaly)).abs(),
        converged: now.solution.is_converged(),
    })
}

/// Upper bound on validation times per range
pub const MAX_VALIDATION_TIMES: usize = 100_000;

/// Number of times `start + k·step` that fall in `[start, end]`
fn range_len(start: f64, end: f64, step: f64) -> SimResult<usize> {
    if !start.is_finite() || !end.is_finite() {
        return Err(SimError::InvalidRange("range must be finite".to_string()));
    }
    if !step.is_finite() || step <= 0.0 {
        return Err(SimError::InvalidRange(format!("step must be positive, got {}", step)));
    }
    if end < start {
        return Err(SimError::InvalidRange(format!("end {} is before start {}", end, start)));
    }
    if start + step == start {
        return Err(SimError::InvalidRange(format!(
            "step {} is below the time resolution at {}",
            step, start
        )));
    }

    let n = ((end - start) / step).floor() + 1.0;
    if n > MAX_VALIDATION_TIMES as f64 {
        return Err(SimError::InvalidRange(format!(
            "{} validation times exceeds the limit of {}",
            n, MAX_VALIDATION_TIMES
        )));
    }
    Ok(n as usize)
}

/// Check every Keplerian body from `start` to `end` inclusive
pub fn validate_range(driver: &Driver, start: f64, end: f64, step: f64) -> SimResult<Vec<ValidationPoint>> {
    let n = range_len(start, end, step)?;
    let keplerian: Vec<BodyId> = driver
        .bodies()
        .iter()
        .filter(|b| b.elements().is_some())
        .map(|b| b.id())
        .collect();

    let mut results = Vec::with_capacity(n * keplerian.len());
    for k in 0..n {
        let t = start + k as f64 * step;
        for id in &keplerian {
            results.push(validate_body(driver, *id, t)?);
        }
    }

    Ok(results)
}

/// Summary statistics for validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSummary {
    pub body: BodyId,
    pub name: String,
    pub num_points: usize,
    pub max_kepler_residual: f64,
    pub max_periodicity_error: f64,
    pub max_radius_error: f64,
    /// Distance between path sample 0 and the wrapped sample N
    pub closure_error: f64,
    pub unconverged: usize,
    pub near_parabolic: bool,
}

impl ValidationSummary {
    /// `position_tol` bounds both the periodicity and the focus-distance error
    pub fn passes(&self, residual_tol: f64, position_tol: f64, closure_tol: f64) -> bool {
        self.unconverged == 0
            && self.max_kepler_residual < residual_tol
            && self.max_periodicity_error < position_tol
            && self.max_radius_error < position_tol
            && self.closure_error < closure_tol
    }
}

/// Compute summary statistics per body, in registration order
pub fn summarize_validation(
    driver: &Driver,
    results: &[ValidationPoint],
    samples: SampleCount,
) -> SimResult<Vec<ValidationSummary>> {
    let mut by_body: BTreeMap<BodyId, Vec<&ValidationPoint>> = BTreeMap::new();

    for point in results {
        by_body.entry(point.body).or_default().push(point);
    }

    by_body.into_iter().map(|(id, points)| {
        let body = driver
            .body(id)
            .ok_or_else(|| SimError::UnknownBody(format!("{:?}", id)))?;
        let elements = body
            .elements()
            .ok_or_else(|| SimError::NotKeplerian(body.name().to_string()))?;

        let sampler = OrbitSampler::new(driver.propagator(), *elements, samples)?;
        let closure_error = sampler
            .sample(0)
            .position
            .distance_to(&sampler.sample(sampler.len()).position);

        Ok(ValidationSummary {
            body: id,
            name: body.name().to_string(),
            num_points: points.len(),
            max_kepler_residual: points.iter().map(|p| p.kepler_residual).fold(0.0, f64::max),
            max_periodicity_error: points.iter().map(|p| p.periodicity_error).fold(0.0, f64::max),
            max_radius_error: points.iter().map(|p| p.radius_error).fold(0.0, f64::max),
            closure_error,
            unconverged: points.iter().filter(|p| !p.converged).count(),
            near_parabolic: driver.diagnostics(id).map(|d| d.near_parabolic).unwrap_or(false),
        })
    }).collect()
}
