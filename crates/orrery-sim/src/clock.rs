//! Simulation clock with variable speed playback

use crate::error::{SimError, SimResult};
use orrery_core::constants::DEFAULT_TIME_STEP;
use serde::{Serialize, Deserialize};

/// Clock settings
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClockConfig {
    /// Simulation time at start and after [`SimulationClock::reset`]
    #[serde(default)]
    pub epoch: f64,
    /// Step used by [`SimulationClock::step`] (one host frame)
    #[serde(default = "default_step")]
    pub step: f64,
    /// Multiplier on every step; negative runs time backwards
    #[serde(default = "default_speed")]
    pub speed: f64,
}

fn default_step() -> f64 {
    DEFAULT_TIME_STEP
}

fn default_speed() -> f64 {
    1.0
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            epoch: 0.0,
            step: DEFAULT_TIME_STEP,
            speed: 1.0,
        }
    }
}

impl ClockConfig {
    pub fn validate(&self) -> SimResult<()> {
        for (name, value) in [("epoch", self.epoch), ("step", self.step), ("speed", self.speed)] {
            if !value.is_finite() {
                return Err(SimError::InvalidClock(format!("{} must be finite, got {}", name, value)));
            }
        }
        Ok(())
    }
}

/// Owns simulation time; nothing else writes it
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationClock {
    epoch: f64,
    /// Current simulation time
    current: f64,
    /// Default step per frame
    step: f64,
    /// Sim time per unit of supplied step
    speed: f64,
    paused: bool,
}

impl SimulationClock {
    pub fn new(config: ClockConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            epoch: config.epoch,
            current: config.epoch,
            step: config.step,
            speed: config.speed,
            paused: false,
        })
    }

    pub fn time(&self) -> f64 {
        self.current
    }

    pub fn epoch(&self) -> f64 {
        self.epoch
    }

    pub fn step_size(&self) -> f64 {
        self.step
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Non-finite speeds are ignored
    pub fn set_speed(&mut self, speed: f64) {
        if speed.is_finite() {
            self.speed = speed;
        }
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advance by `dt · speed` unless paused; returns the new time
    pub fn tick(&mut self, dt: f64) -> f64 {
        if self.paused || !dt.is_finite() {
            return self.current;
        }

        self.current += dt * self.speed;
        self.current
    }

    /// Advance by the configured step
    pub fn step(&mut self) -> f64 {
        self.tick(self.step)
    }

    /// Shift time directly, ignoring speed and pause
    pub fn jump(&mut self, dt: f64) {
        if dt.is_finite() {
            self.current += dt;
        }
    }

    pub fn set_time(&mut self, t: f64) {
        if t.is_finite() {
            self.current = t;
        }
    }

    /// Back to the configured epoch
    pub fn reset(&mut self) {
        self.current = self.epoch;
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self {
            epoch: 0.0,
            current: 0.0,
            step: DEFAULT_TIME_STEP,
            speed: 1.0,
            paused: false,
        }
    }
}
