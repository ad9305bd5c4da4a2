//! Multi-body driver: owns the clock and computes every body per tick

use crate::clock::SimulationClock;
use crate::config::{BodyConfig, SystemConfig};
use crate::elements::{OrbitalElements, Propagator};
use crate::error::{SimError, SimResult};
use crate::kepler::Convergence;
use crate::sampler::{OrbitPath, OrbitSampler, SampleCount};
use crate::satellite::SatelliteOrbit;
use orrery_core::{CartesianPosition, FrameRotation, LocalPosition};
use rayon::prelude::*;
use serde::{Serialize, Deserialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Stable body identifier, assigned in registration order
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(u32);

impl BodyId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

/// How a body moves
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Motion {
    Fixed(CartesianPosition),
    Keplerian(OrbitalElements),
    Satellite { parent: BodyId, orbit: SatelliteOrbit },
}

#[derive(Clone, Debug)]
pub struct Body {
    id: BodyId,
    name: String,
    motion: Motion,
    /// Physical/visual radius, if known
    radius: Option<f64>,
    sample_count: Option<SampleCount>,
}

impl Body {
    pub fn id(&self) -> BodyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn radius(&self) -> Option<f64> {
        self.radius
    }

    pub fn parent(&self) -> Option<BodyId> {
        match self.motion {
            Motion::Satellite { parent, .. } => Some(parent),
            _ => None,
        }
    }

    pub fn elements(&self) -> Option<&OrbitalElements> {
        match &self.motion {
            Motion::Keplerian(elements) => Some(elements),
            _ => None,
        }
    }
}

/// Every body's position at one instant
#[derive(Clone, Debug, PartialEq)]
pub struct SystemSnapshot {
    pub time: f64,
    pub positions: HashMap<BodyId, CartesianPosition>,
}

impl SystemSnapshot {
    pub fn get(&self, id: BodyId) -> Option<CartesianPosition> {
        self.positions.get(&id).copied()
    }

    /// Positions in registration order
    pub fn ordered(&self) -> Vec<(BodyId, CartesianPosition)> {
        let mut out: Vec<_> = self.positions.iter().map(|(id, p)| (*id, *p)).collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }

    /// Registration-ordered f32 positions relative to `origin`, for a vertex buffer
    pub fn render_buffer(&self, origin: &CartesianPosition) -> Vec<LocalPosition> {
        self.ordered().iter().map(|(_, p)| p.relative_to(origin)).collect()
    }
}

/// Receives each snapshot the driver produces (the host's rendering layer)
pub trait PositionSink {
    fn receive(&mut self, snapshot: &SystemSnapshot);
}

impl<F: FnMut(&SystemSnapshot)> PositionSink for F {
    fn receive(&mut self, snapshot: &SystemSnapshot) {
        self(snapshot)
    }
}

/// Soft-failure bookkeeping for one body
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BodyDiagnostics {
    /// Ticks on which the Kepler solve hit its iteration cap
    pub convergence_failures: u64,
    pub last_failure_time: Option<f64>,
    /// Eccentricity within the near-parabolic margin of 1
    pub near_parabolic: bool,
}

/// Positions at one time plus the bodies whose solve did not converge
struct Evaluation {
    snapshot: SystemSnapshot,
    unconverged: Vec<BodyId>,
}

/// Time-stepped driver
///
/// Positions are recomputed from scratch every tick; the only state carried
/// between ticks is the clock and the diagnostic counters.
pub struct Driver {
    bodies: Vec<Body>,
    names: HashMap<String, BodyId>,
    propagator: Propagator,
    clock: SimulationClock,
    scale: f64,
    sample_count: SampleCount,
    diagnostics: Vec<BodyDiagnostics>,
}

impl Driver {
    pub fn new(propagator: Propagator, clock: SimulationClock) -> Self {
        Self {
            bodies: Vec::new(),
            names: HashMap::new(),
            propagator,
            clock,
            scale: 1.0,
            sample_count: SampleCount::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Build a driver and register every configured body in order
    pub fn from_config(config: &SystemConfig) -> SimResult<Self> {
        config.validate()?;

        let propagator = Propagator::with_config(config.solver, FrameRotation::new(config.rotation))?;
        let clock = SimulationClock::new(config.clock)?;

        let mut driver = Self::new(propagator, clock);
        driver.scale = config.scale;
        driver.sample_count = config.sample_count;

        for body in &config.bodies {
            driver.add_from_config(body)?;
        }

        info!(
            "Built system with {} bodies (scale {}, epoch {})",
            driver.bodies.len(),
            driver.scale,
            driver.clock.epoch()
        );
        Ok(driver)
    }

    fn add_from_config(&mut self, body: &BodyConfig) -> SimResult<BodyId> {
        let id = match body {
            BodyConfig::Fixed { name, position, .. } => {
                let [x, y, z] = *position;
                let p = CartesianPosition::new(x * self.scale, y * self.scale, z * self.scale);
                self.add_fixed(name, p)?
            }
            BodyConfig::Keplerian { name, a, e, period, tau, sample_count, .. } => {
                let elements = OrbitalElements::new(*a, *e, *period, *tau)?.scaled(self.scale)?;
                let id = self.add_keplerian(name, elements)?;
                self.bodies[id.index()].sample_count = *sample_count;
                id
            }
            BodyConfig::Satellite { name, parent, orbit_radius, angular_rate, .. } => {
                let parent_id = self
                    .body_id(parent)
                    .ok_or_else(|| SimError::UnknownParent(parent.clone()))?;
                let orbit = SatelliteOrbit::new(*orbit_radius, *angular_rate)?.scaled(self.scale)?;
                self.add_satellite(name, parent_id, orbit)?
            }
        };

        if let Some(radius) = body.radius() {
            self.set_radius(id, radius * self.scale)?;
        }
        Ok(id)
    }

    fn register(&mut self, name: &str, motion: Motion) -> SimResult<BodyId> {
        if self.names.contains_key(name) {
            return Err(SimError::DuplicateBody(name.to_string()));
        }
        let index = u32::try_from(self.bodies.len()).map_err(|_| SimError::InvalidBody {
            name: name.to_string(),
            reason: "too many bodies".to_string(),
        })?;

        let id = BodyId(index);
        let mut diagnostics = BodyDiagnostics::default();

        if let Motion::Keplerian(elements) = &motion {
            if elements.is_near_parabolic() {
                warn!(
                    "{} has e = {} (near-parabolic); positions near pericenter may be imprecise",
                    name,
                    elements.eccentricity()
                );
                diagnostics.near_parabolic = true;
            }
        }

        debug!("Registered {} as {:?}: {:?}", name, id, motion);
        self.bodies.push(Body {
            id,
            name: name.to_string(),
            motion,
            radius: None,
            sample_count: None,
        });
        self.names.insert(name.to_string(), id);
        self.diagnostics.push(diagnostics);
        Ok(id)
    }

    pub fn add_fixed(&mut self, name: &str, position: CartesianPosition) -> SimResult<BodyId> {
        if !position.is_finite() {
            return Err(SimError::InvalidBody {
                name: name.to_string(),
                reason: format!("position {:?} is not finite", position),
            });
        }
        self.register(name, Motion::Fixed(position))
    }

    pub fn add_keplerian(&mut self, name: &str, elements: OrbitalElements) -> SimResult<BodyId> {
        self.register(name, Motion::Keplerian(elements))
    }

    /// The parent must already be registered, which keeps registration
    /// order a valid evaluation order
    pub fn add_satellite(&mut self, name: &str, parent: BodyId, orbit: SatelliteOrbit) -> SimResult<BodyId> {
        if parent.index() >= self.bodies.len() {
            return Err(SimError::UnknownParent(format!("{:?}", parent)));
        }
        self.register(name, Motion::Satellite { parent, orbit })
    }

    pub fn set_radius(&mut self, id: BodyId, radius: f64) -> SimResult<()> {
        let body = self
            .bodies
            .get_mut(id.index())
            .ok_or_else(|| SimError::UnknownBody(format!("{:?}", id)))?;

        if !radius.is_finite() || radius < 0.0 {
            return Err(SimError::InvalidBody {
                name: body.name.clone(),
                reason: format!("radius must be non-negative and finite, got {}", radius),
            });
        }
        body.radius = Some(radius);
        Ok(())
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.bodies.get(id.index())
    }

    pub fn body_id(&self, name: &str) -> Option<BodyId> {
        self.names.get(name).copied()
    }

    /// Look up by name, as an error if missing
    pub fn require(&self, name: &str) -> SimResult<&Body> {
        self.body_id(name)
            .and_then(|id| self.body(id))
            .ok_or_else(|| SimError::UnknownBody(name.to_string()))
    }

    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut SimulationClock {
        &mut self.clock
    }

    pub fn time(&self) -> f64 {
        self.clock.time()
    }

    pub fn diagnostics(&self, id: BodyId) -> Option<&BodyDiagnostics> {
        self.diagnostics.get(id.index())
    }

    pub fn total_convergence_failures(&self) -> u64 {
        self.diagnostics.iter().map(|d| d.convergence_failures).sum()
    }

    fn evaluate(&self, t: f64) -> Evaluation {
        let mut positions = HashMap::with_capacity(self.bodies.len());
        let mut unconverged = Vec::new();

        for body in &self.bodies {
            let position = match body.motion {
                Motion::Fixed(p) => p,
                Motion::Keplerian(elements) => {
                    let prop = self.propagator.propagate(&elements, t);
                    if prop.convergence() == Convergence::NotConverged {
                        unconverged.push(body.id);
                    }
                    prop.position
                }
                Motion::Satellite { parent, orbit } => {
                    // Parents are registered first, so already computed this pass
                    let parent_pos = positions.get(&parent).copied().unwrap_or_default();
                    orbit.position(parent_pos, t)
                }
            };
            positions.insert(body.id, position);
        }

        Evaluation {
            snapshot: SystemSnapshot { time: t, positions },
            unconverged,
        }
    }

    fn record(&mut self, evaluation: &Evaluation) {
        let t = evaluation.snapshot.time;

        for id in &evaluation.unconverged {
            let diag = &mut self.diagnostics[id.index()];
            let name = &self.bodies[id.index()].name;

            if diag.convergence_failures == 0 {
                warn!("Kepler solve for {} did not converge at t = {}; using last iterate", name, t);
            } else {
                debug!("Kepler solve for {} did not converge at t = {} ({} so far)", name, t, diag.convergence_failures + 1);
            }
            diag.convergence_failures += 1;
            diag.last_failure_time = Some(t);
        }
    }

    /// Positions at an arbitrary time; leaves the clock and diagnostics alone
    pub fn snapshot_at(&self, t: f64) -> SystemSnapshot {
        self.evaluate(t).snapshot
    }

    /// Positions at the current clock time
    pub fn snapshot(&self) -> SystemSnapshot {
        self.snapshot_at(self.clock.time())
    }

    /// Advance the clock by `dt` (scaled by speed) and compute every body
    pub fn tick(&mut self, dt: f64) -> SystemSnapshot {
        let t = self.clock.tick(dt);
        let evaluation = self.evaluate(t);
        self.record(&evaluation);
        evaluation.snapshot
    }

    /// Tick by the clock's configured step
    pub fn step(&mut self) -> SystemSnapshot {
        let dt = self.clock.step_size();
        self.tick(dt)
    }

    /// Tick `steps` times, handing every snapshot to `sink`
    pub fn run<S: PositionSink + ?Sized>(&mut self, steps: usize, dt: f64, sink: &mut S) {
        for _ in 0..steps {
            let snapshot = self.tick(dt);
            sink.receive(&snapshot);
        }
    }

    fn sample_count_for(&self, body: &Body) -> SampleCount {
        body.sample_count.unwrap_or(self.sample_count)
    }

    /// Sampled orbit path of one Keplerian body
    pub fn orbit_path(&self, id: BodyId) -> SimResult<OrbitPath> {
        let body = self
            .body(id)
            .ok_or_else(|| SimError::UnknownBody(format!("{:?}", id)))?;
        let elements = body
            .elements()
            .ok_or_else(|| SimError::NotKeplerian(body.name.clone()))?;

        let sampler = OrbitSampler::new(&self.propagator, *elements, self.sample_count_for(body))?;
        Ok(sampler.path())
    }

    /// Orbit paths of every Keplerian body, sampled in parallel
    pub fn orbit_paths(&self) -> SimResult<Vec<(BodyId, OrbitPath)>> {
        self.bodies
            .par_iter()
            .filter(|body| body.elements().is_some())
            .map(|body| Ok((body.id, self.orbit_path(body.id)?)))
            .collect()
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(Propagator::default(), SimulationClock::default())
    }
}
