//! Built-in solar system
//!
//! Toy elements in scene units (a in scene lengths, T in days of sim time);
//! the proportions follow the real planets loosely, the absolute sizes are
//! chosen to fit a single view.

use crate::config::{BodyConfig, SystemConfig};
use std::f64::consts::TAU;

/// Visual radius of the Sun
pub const SUN_RADIUS: f64 = 0.5;

/// Visual radius of every planet
pub const PLANET_RADIUS: f64 = 0.1;

/// Visual radius of the Moon
pub const MOON_RADIUS: f64 = 0.05;

/// Moon distance from Earth
pub const MOON_ORBIT_RADIUS: f64 = 0.5;

/// Time for one Moon revolution
pub const MOON_PERIOD: f64 = 10.0;

/// Planet identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Planet {
    Mercury,
    Venus,
    Earth,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
}

impl Planet {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mercury => "Mercury",
            Self::Venus => "Venus",
            Self::Earth => "Earth",
            Self::Mars => "Mars",
            Self::Jupiter => "Jupiter",
            Self::Saturn => "Saturn",
            Self::Uranus => "Uranus",
            Self::Neptune => "Neptune",
        }
    }

    /// `(a, e, T)`
    pub fn elements(&self) -> (f64, f64, f64) {
        match self {
            Self::Mercury => (3.0, 0.205, 88.0),
            Self::Venus => (5.0, 0.0067, 225.0),
            Self::Earth => (7.0, 0.0167, 365.0),
            Self::Mars => (9.0, 0.0934, 687.0),
            Self::Jupiter => (12.0, 0.0489, 4331.0),
            Self::Saturn => (16.0, 0.0565, 10747.0),
            Self::Uranus => (20.0, 0.046, 30589.0),
            Self::Neptune => (24.0, 0.0097, 59800.0),
        }
    }

    pub fn all() -> &'static [Planet] {
        &[
            Self::Mercury, Self::Venus, Self::Earth, Self::Mars,
            Self::Jupiter, Self::Saturn, Self::Uranus, Self::Neptune,
        ]
    }

    pub fn body_config(&self) -> BodyConfig {
        let (a, e, period) = self.elements();
        BodyConfig::Keplerian {
            name: self.name().to_string(),
            a,
            e,
            period,
            tau: 0.0,
            radius: Some(PLANET_RADIUS),
            sample_count: None,
        }
    }
}

/// Sun at the origin, the eight planets, and the Moon circling Earth
pub fn solar_system() -> SystemConfig {
    let mut bodies = Vec::with_capacity(Planet::all().len() + 2);

    bodies.push(BodyConfig::Fixed {
        name: "Sun".to_string(),
        position: [0.0, 0.0, 0.0],
        radius: Some(SUN_RADIUS),
    });
    bodies.extend(Planet::all().iter().map(Planet::body_config));
    bodies.push(BodyConfig::Satellite {
        name: "Moon".to_string(),
        parent: Planet::Earth.name().to_string(),
        orbit_radius: MOON_ORBIT_RADIUS,
        angular_rate: TAU / MOON_PERIOD,
        radius: Some(MOON_RADIUS),
    });

    SystemConfig::with_bodies(bodies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::OrbitalElements;

    #[test]
    fn test_catalogue_elements_are_valid() {
        for planet in Planet::all() {
            let (a, e, period) = planet.elements();
            assert!(OrbitalElements::at_pericenter(a, e, period).is_ok(), "{}", planet.name());
        }
    }

    #[test]
    fn test_planets_ordered_outwards() {
        let axes: Vec<f64> = Planet::all().iter().map(|p| p.elements().0).collect();
        assert!(axes.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_solar_system_layout() {
        let config = solar_system();
        assert_eq!(config.bodies.len(), 10);
        assert_eq!(config.bodies[0].name(), "Sun");
        assert_eq!(config.bodies[3].name(), "Earth");
        assert_eq!(config.bodies[9].name(), "Moon");
    }
}
