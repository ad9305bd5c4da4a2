//! Keplerian orbital elements and the element-to-Cartesian propagator

use crate::error::{SimError, SimResult};
use crate::kepler::{Convergence, KeplerSolution, KeplerSolver, SolverConfig};
use orrery_core::constants::NEAR_PARABOLIC_MARGIN;
use orrery_core::{CartesianPosition, FrameRotation};
use serde::Serialize;
use std::f64::consts::TAU;

/// Orbital elements of a single-focus elliptical orbit
///
/// Only constructible through [`OrbitalElements::new`], so every value in
/// circulation satisfies `a > 0`, `0 ≤ e < 1`, `T > 0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct OrbitalElements {
    /// Semi-major axis (length unit)
    a: f64,
    /// Eccentricity (dimensionless, 0 = circular)
    e: f64,
    /// Orbital period (time unit)
    period: f64,
    /// Time of pericenter passage
    tau: f64,
}

impl OrbitalElements {
    /// Create from parameters, rejecting anything that is not a closed orbit
    pub fn new(a: f64, e: f64, period: f64, tau: f64) -> SimResult<Self> {
        if !a.is_finite() || a <= 0.0 {
            return Err(invalid("a", a, "semi-major axis must be positive and finite"));
        }
        if !e.is_finite() || !(0.0..1.0).contains(&e) {
            return Err(invalid("e", e, "eccentricity must lie in [0, 1)"));
        }
        if !period.is_finite() || period <= 0.0 {
            return Err(invalid("T", period, "period must be positive and finite"));
        }
        if !tau.is_finite() {
            return Err(invalid("tau", tau, "pericenter time must be finite"));
        }

        Ok(Self { a, e, period, tau })
    }

    /// Elements with pericenter passage at t = 0
    pub fn at_pericenter(a: f64, e: f64, period: f64) -> SimResult<Self> {
        Self::new(a, e, period, 0.0)
    }

    pub fn semi_major_axis(&self) -> f64 {
        self.a
    }

    pub fn eccentricity(&self) -> f64 {
        self.e
    }

    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn tau(&self) -> f64 {
        self.tau
    }

    /// Same orbit with every length multiplied by `factor`
    pub fn scaled(&self, factor: f64) -> SimResult<Self> {
        Self::new(self.a * factor, self.e, self.period, self.tau)
    }

    pub fn semi_minor_axis(&self) -> f64 {
        self.a * (1.0 - self.e * self.e).sqrt()
    }

    pub fn pericenter_distance(&self) -> f64 {
        self.a * (1.0 - self.e)
    }

    pub fn apocenter_distance(&self) -> f64 {
        self.a * (1.0 + self.e)
    }

    /// Eccentricity so close to 1 that the solve is ill-conditioned
    pub fn is_near_parabolic(&self) -> bool {
        1.0 - self.e < NEAR_PARABOLIC_MARGIN
    }

    /// Mean motion (radians per time unit)
    pub fn mean_motion(&self) -> f64 {
        TAU / self.period
    }

    /// Mean anomaly at time `t`, not normalized
    pub fn mean_anomaly_at(&self, t: f64) -> f64 {
        self.mean_motion() * (t - self.tau)
    }

    /// Distance from the focus for a given eccentric anomaly
    pub fn radius_at(&self, eccentric_anomaly: f64) -> f64 {
        self.a * (1.0 - self.e * eccentric_anomaly.cos())
    }

    /// Focus-centred position in the orbital plane (z = 0), x towards pericenter
    ///
    /// `|p| == radius_at(E)`: the `r / (1 − e·cos E)` factor that turns the
    /// radius back into `a` is folded in.
    pub fn position_in_plane(&self, eccentric_anomaly: f64) -> CartesianPosition {
        let cos_e = eccentric_anomaly.cos();
        let sin_e = eccentric_anomaly.sin();

        CartesianPosition::new(
            self.a * (cos_e - self.e),
            self.semi_minor_axis() * sin_e,
            0.0,
        )
    }
}

fn invalid(field: &'static str, value: f64, reason: &'static str) -> SimError {
    SimError::InvalidOrbitalElements { field, value, reason }
}

/// One propagated position plus how its solve went
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Propagation {
    pub position: CartesianPosition,
    pub solution: KeplerSolution,
}

impl Propagation {
    pub fn convergence(&self) -> Convergence {
        self.solution.convergence
    }
}

/// Turns `(elements, t)` into a scene-frame position
///
/// Holds only configuration (solver tuning and the frame rotation), so a
/// single instance is shared read-only by every body in a run.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Propagator {
    solver: KeplerSolver,
    rotation: FrameRotation,
}

impl Propagator {
    pub fn new(solver: KeplerSolver, rotation: FrameRotation) -> Self {
        Self { solver, rotation }
    }

    pub fn with_config(solver: SolverConfig, rotation: FrameRotation) -> SimResult<Self> {
        Ok(Self::new(KeplerSolver::new(solver)?, rotation))
    }

    pub fn solver(&self) -> &KeplerSolver {
        &self.solver
    }

    pub fn rotation(&self) -> &FrameRotation {
        &self.rotation
    }

    /// Pre-rotation position in the orbital plane
    pub fn orbital_plane_position(&self, elements: &OrbitalElements, t: f64) -> Propagation {
        let m = elements.mean_anomaly_at(t);
        let solution = self.solver.solve(elements.e, m);

        Propagation {
            position: elements.position_in_plane(solution.eccentric_anomaly),
            solution,
        }
    }

    /// Position in the shared scene frame
    pub fn propagate(&self, elements: &OrbitalElements, t: f64) -> Propagation {
        let in_plane = self.orbital_plane_position(elements, t);

        Propagation {
            position: self.rotation.apply(in_plane.position),
            solution: in_plane.solution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn earth() -> OrbitalElements {
        OrbitalElements::at_pericenter(7.0, 0.0167, 365.0).unwrap()
    }

    #[test]
    fn test_rejects_open_and_degenerate_orbits() {
        assert!(matches!(
            OrbitalElements::new(5.0, 1.2, 100.0, 0.0),
            Err(SimError::InvalidOrbitalElements { field: "e", .. })
        ));
        assert!(OrbitalElements::new(5.0, 1.0, 100.0, 0.0).is_err());
        assert!(OrbitalElements::new(5.0, -0.1, 100.0, 0.0).is_err());
        assert!(OrbitalElements::new(0.0, 0.1, 100.0, 0.0).is_err());
        assert!(OrbitalElements::new(-3.0, 0.1, 100.0, 0.0).is_err());
        assert!(OrbitalElements::new(5.0, 0.1, 0.0, 0.0).is_err());
        assert!(OrbitalElements::new(5.0, 0.1, f64::INFINITY, 0.0).is_err());
        assert!(OrbitalElements::new(f64::NAN, 0.1, 100.0, 0.0).is_err());
        assert!(OrbitalElements::new(5.0, 0.1, 100.0, f64::NAN).is_err());
    }

    #[test]
    fn test_geometry_helpers() {
        let el = earth();
        assert!((el.pericenter_distance() - 6.8831).abs() < 1e-12);
        assert!((el.apocenter_distance() - 7.1169).abs() < 1e-12);
        assert!((el.mean_motion() - TAU / 365.0).abs() < 1e-15);
        assert!(el.semi_minor_axis() < el.semi_major_axis());
        assert!(!el.is_near_parabolic());

        let comet = OrbitalElements::at_pericenter(10.0, 1.0 - 1e-7, 50.0).unwrap();
        assert!(comet.is_near_parabolic());
    }

    #[test]
    fn test_aphelion_half_period() {
        let el = earth();
        let prop = Propagator::default();
        let p = prop.orbital_plane_position(&el, 365.0 / 2.0).position;

        assert_abs_diff_eq!(p.x, -el.apocenter_distance(), epsilon = 1e-9);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-9);
        assert_eq!(p.z, 0.0);
    }

    #[test]
    fn test_focus_distance_matches_radius() {
        let el = OrbitalElements::new(3.0, 0.205, 88.0, 4.0).unwrap();
        let prop = Propagator::default();

        for k in 0..40 {
            let t = k as f64 * 2.2;
            let in_plane = prop.orbital_plane_position(&el, t);
            let expected = el.radius_at(in_plane.solution.eccentric_anomaly);
            assert!((in_plane.position.magnitude() - expected).abs() < 1e-12);

            // Rotation is rigid, so distance from the focus survives it
            let rotated = prop.propagate(&el, t).position;
            assert!((rotated.magnitude() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn test_tau_shifts_pericenter() {
        let el = OrbitalElements::new(9.0, 0.0934, 687.0, 100.0).unwrap();
        let prop = Propagator::default();
        let p = prop.orbital_plane_position(&el, 100.0).position;

        assert_abs_diff_eq!(p.x, el.pericenter_distance(), epsilon = 1e-12);
        assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_scaled_orbit() {
        let el = earth().scaled(0.5).unwrap();
        assert_eq!(el.semi_major_axis(), 3.5);
        assert_eq!(el.period(), 365.0);
        assert!(earth().scaled(0.0).is_err());
    }
}
