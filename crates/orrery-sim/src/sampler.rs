//! Orbit path sampling
//!
//! Characterises an orbit once, independent of the live clock: `N` positions
//! at times `i·T/N` for `i = 0..N`. The sequence is a pure function of its
//! inputs, so it can be regenerated at will (e.g. to redraw a static path).

use crate::elements::{OrbitalElements, Propagation, Propagator};
use crate::error::{SimError, SimResult};
use orrery_core::constants::DEFAULT_SAMPLE_COUNT;
use orrery_core::CartesianPosition;
use serde::{Serialize, Deserialize};

/// Upper bound on samples per path
pub const MAX_SAMPLE_COUNT: usize = 1_000_000;

/// How many samples to take over one period
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SampleCount {
    /// Exactly this many samples
    Fixed(usize),
    /// `ceil(T · per_unit_time)` samples, so longer periods get more points
    Density { per_unit_time: f64 },
}

impl Default for SampleCount {
    fn default() -> Self {
        Self::Fixed(DEFAULT_SAMPLE_COUNT)
    }
}

impl SampleCount {
    /// Concrete sample count for an orbit of the given period
    pub fn resolve(&self, period: f64) -> SimResult<usize> {
        let n = match *self {
            Self::Fixed(n) => n,
            Self::Density { per_unit_time } => {
                if !per_unit_time.is_finite() || per_unit_time <= 0.0 {
                    return Err(SimError::InvalidSampleCount(format!(
                        "per_unit_time must be positive and finite, got {}",
                        per_unit_time
                    )));
                }
                let n = (period * per_unit_time).ceil();
                if n > MAX_SAMPLE_COUNT as f64 {
                    return Err(SimError::InvalidSampleCount(format!(
                        "{} samples exceeds the limit of {}",
                        n, MAX_SAMPLE_COUNT
                    )));
                }
                n as usize
            }
        };

        if n == 0 {
            return Err(SimError::InvalidSampleCount("at least one sample is required".to_string()));
        }
        if n > MAX_SAMPLE_COUNT {
            return Err(SimError::InvalidSampleCount(format!(
                "{} samples exceeds the limit of {}",
                n, MAX_SAMPLE_COUNT
            )));
        }
        Ok(n)
    }
}

/// Evenly spaced samples of one orbit
#[derive(Clone, Copy, Debug)]
pub struct OrbitSampler<'a> {
    propagator: &'a Propagator,
    elements: OrbitalElements,
    count: usize,
}

impl<'a> OrbitSampler<'a> {
    pub fn new(propagator: &'a Propagator, elements: OrbitalElements, count: SampleCount) -> SimResult<Self> {
        let count = count.resolve(elements.period())?;
        Ok(Self { propagator, elements, count })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Sample time for index `i`; `i = len()` lands one full period after `i = 0`
    pub fn time_of(&self, i: usize) -> f64 {
        i as f64 * self.elements.period() / self.count as f64
    }

    pub fn sample(&self, i: usize) -> Propagation {
        self.propagator.propagate(&self.elements, self.time_of(i))
    }

    /// Fresh pass over the samples; every call yields the same sequence
    pub fn iter(&self) -> Samples<'a> {
        Samples { sampler: *self, next: 0 }
    }

    pub fn path(&self) -> OrbitPath {
        let mut points = Vec::with_capacity(self.count);
        let mut unconverged = 0;

        for i in 0..self.count {
            let p = self.sample(i);
            if !p.solution.is_converged() {
                unconverged += 1;
            }
            points.push(p.position);
        }

        OrbitPath { points, unconverged }
    }
}

/// Iterator over an [`OrbitSampler`]'s positions
#[derive(Clone, Debug)]
pub struct Samples<'a> {
    sampler: OrbitSampler<'a>,
    next: usize,
}

impl Iterator for Samples<'_> {
    type Item = CartesianPosition;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.sampler.count {
            return None;
        }
        let p = self.sampler.sample(self.next).position;
        self.next += 1;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.sampler.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Samples<'_> {}

/// Sampled orbit path, ready to hand to a line renderer
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrbitPath {
    pub points: Vec<CartesianPosition>,
    /// Samples whose Kepler solve hit the iteration cap
    pub unconverged: usize,
}

impl OrbitPath {
    /// Points with the first repeated at the end, for a closed line strip
    pub fn closed_points(&self) -> impl Iterator<Item = &CartesianPosition> + '_ {
        self.points.iter().chain(self.points.first())
    }
}
