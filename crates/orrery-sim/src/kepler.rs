//! Kepler equation solver: `E − e·sin(E) = M`
//!
//! Starts from a closed-form third-order guess in `M` and refines it with a
//! third-order Newton-type step that uses both first and second derivatives
//! of `f(E) = E − e·sin(E) − M`. Iterates stay inside a bracket around the
//! root; a step that leaves it is replaced by bisection, which keeps orbits
//! with `e` close to 1 convergent. The loop is bounded by the configured
//! iteration cap, so every call has a bounded worst-case cost.

use crate::error::{SimError, SimResult};
use orrery_core::constants::{KEPLER_MAX_ITERATIONS, KEPLER_TOLERANCE};
use serde::{Serialize, Deserialize};
use std::f64::consts::{PI, TAU};

/// Solver tuning
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SolverConfig {
    /// Stop once successive iterates differ by less than this
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Iteration cap before giving up with the last iterate
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_tolerance() -> f64 {
    KEPLER_TOLERANCE
}

fn default_max_iterations() -> u32 {
    KEPLER_MAX_ITERATIONS
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: KEPLER_TOLERANCE,
            max_iterations: KEPLER_MAX_ITERATIONS,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SimError::InvalidSolver(format!(
                "tolerance must be positive and finite, got {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(SimError::InvalidSolver(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Terminal state of a solve
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Convergence {
    Converged,
    /// Iteration cap hit (or the iteration went non-finite); the last
    /// finite iterate is still returned and usable
    NotConverged,
}

/// Result of one solve
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeplerSolution {
    /// Eccentric anomaly (radians)
    pub eccentric_anomaly: f64,
    /// Refinement steps taken
    pub iterations: u32,
    pub convergence: Convergence,
}

impl KeplerSolution {
    pub fn is_converged(&self) -> bool {
        self.convergence == Convergence::Converged
    }
}

/// Stateless solver; holds only its configuration
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct KeplerSolver {
    config: SolverConfig,
}

impl KeplerSolver {
    pub fn new(config: SolverConfig) -> SimResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> SolverConfig {
        self.config
    }

    /// Eccentric anomaly for eccentricity `e ∈ [0, 1)` and any real `M`
    pub fn solve(&self, e: f64, mean_anomaly: f64) -> KeplerSolution {
        let m = normalize_angle(mean_anomaly);
        if !m.is_finite() {
            return KeplerSolution {
                eccentric_anomaly: 0.0,
                iterations: 0,
                convergence: Convergence::NotConverged,
            };
        }

        // Circular orbit: E = M exactly
        if e == 0.0 {
            return KeplerSolution {
                eccentric_anomaly: m,
                iterations: 0,
                convergence: Convergence::Converged,
            };
        }

        // f(E) = E − e·sin E − M is monotone, and the root lies between M and
        // the apsis on the same side
        let (mut lo, mut hi) = if m <= PI {
            (m, (m + e).min(PI))
        } else {
            ((m - e).max(PI), m)
        };

        let mut ea = starting_estimate(e, m);
        if !ea.is_finite() {
            ea = m;
        }
        ea = ea.max(lo).min(hi);

        for i in 1..=self.config.max_iterations {
            let f = ea - e * ea.sin() - m;
            if f == 0.0 {
                return KeplerSolution {
                    eccentric_anomaly: ea,
                    iterations: i - 1,
                    convergence: Convergence::Converged,
                };
            }
            if f < 0.0 {
                lo = ea;
            } else {
                hi = ea;
            }

            let mut next = ea - third_order_step(e, m, ea);
            if !next.is_finite() || next < lo || next > hi {
                next = 0.5 * (lo + hi);
            }

            let delta = (next - ea).abs();
            ea = next;

            if delta < self.config.tolerance || hi - lo < self.config.tolerance {
                return KeplerSolution {
                    eccentric_anomaly: ea,
                    iterations: i,
                    convergence: Convergence::Converged,
                };
            }
        }

        KeplerSolution {
            eccentric_anomaly: ea,
            iterations: self.config.max_iterations,
            convergence: Convergence::NotConverged,
        }
    }
}

/// Normalize angle to [0, 2π)
pub fn normalize_angle(angle: f64) -> f64 {
    let a = angle.rem_euclid(TAU);
    // rem_euclid of a tiny negative value rounds up to exactly 2π
    if a >= TAU { 0.0 } else { a }
}

/// Wrap an angle difference into (-π, π]
pub fn wrap_pi(angle: f64) -> f64 {
    let a = normalize_angle(angle);
    if a > PI { a - TAU } else { a }
}

/// Kepler residual `E − e·sin(E) − M`, wrapped into (-π, π]
pub fn residual(e: f64, eccentric_anomaly: f64, mean_anomaly: f64) -> f64 {
    wrap_pi(eccentric_anomaly - e * eccentric_anomaly.sin() - mean_anomaly)
}

/// Closed-form third-order starting guess in `M`
pub fn starting_estimate(e: f64, m: f64) -> f64 {
    let cos_m = m.cos();
    let e2 = e * e;
    let e3 = e * e2;
    m + (-0.5 * e3 + e + (e2 + 1.5 * cos_m * e3) * cos_m) * m.sin()
}

/// Correction `δ` such that `E_next = x − δ`
fn third_order_step(e: f64, m: f64, x: f64) -> f64 {
    let cos_x = x.cos();
    let sin_x = x.sin();
    let fp = -1.0 + e * cos_x; // -f'(x)
    let e_sin = e * sin_x;
    let f = -x + e_sin + m; // -f(x)

    // Halley estimate feeding the cubic term
    let halley = f / ((0.5 * f * e_sin / fp) + fp);
    f / ((0.5 * sin_x - (1.0 / 6.0) * cos_x * halley) * e * halley + fp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kepler_circular() {
        let solver = KeplerSolver::default();
        let m = PI / 4.0;
        let sol = solver.solve(0.0, m);

        assert_eq!(sol.eccentric_anomaly, m);
        assert_eq!(sol.iterations, 0);
        assert!(sol.is_converged());
    }

    #[test]
    fn test_kepler_apsides() {
        let solver = KeplerSolver::default();

        // At perihelion (M=0), E=0
        let sol = solver.solve(0.0167, 0.0);
        assert!(sol.eccentric_anomaly.abs() < 1e-14);

        // At aphelion (M=π), E=π
        let sol = solver.solve(0.0167, PI);
        assert!((sol.eccentric_anomaly - PI).abs() < 1e-12);
    }

    #[test]
    fn test_mean_anomaly_is_normalized() {
        let solver = KeplerSolver::default();
        let e = 0.3;

        let base = solver.solve(e, 1.0).eccentric_anomaly;
        let wrapped = solver.solve(e, 1.0 + 3.0 * TAU).eccentric_anomaly;
        let negative = solver.solve(e, 1.0 - 2.0 * TAU).eccentric_anomaly;

        assert!((base - wrapped).abs() < 1e-10);
        assert!((base - negative).abs() < 1e-10);
        assert!((0.0..TAU).contains(&wrapped));
    }

    #[test]
    fn test_high_eccentricity_still_converges() {
        let solver = KeplerSolver::default();
        for e in [0.9, 0.95, 0.97, 0.99] {
            for k in 0..64 {
                let m = k as f64 * TAU / 64.0;
                let sol = solver.solve(e, m);
                assert!(sol.is_converged(), "e={} M={} did not converge", e, m);
                assert!(residual(e, sol.eccentric_anomaly, m).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_near_parabolic_stays_bracketed() {
        let solver = KeplerSolver::default();

        for e in [0.999, 0.9999, 1.0 - 1e-6, 1.0 - 1e-9] {
            let mut worst: f64 = 0.0;
            for k in 0..1000 {
                let m = k as f64 * TAU / 1000.0 + 1e-7 * k as f64;
                let sol = solver.solve(e, m);

                assert!(sol.is_converged(), "e={} M={} did not converge", e, m);
                assert!(sol.eccentric_anomaly.is_finite());
                worst = worst.max(residual(e, sol.eccentric_anomaly, m).abs());
            }
            for m in [1e-12, 1e-9, 6.283e-3, TAU - 1e-9] {
                let sol = solver.solve(e, m);
                assert!(sol.is_converged(), "e={} M={} did not converge", e, m);
                worst = worst.max(residual(e, sol.eccentric_anomaly, m).abs());
            }
            assert!(worst < 1e-9, "e={} worst residual {}", e, worst);
        }
    }

    #[test]
    fn test_non_finite_mean_anomaly_is_not_nan() {
        let sol = KeplerSolver::default().solve(0.5, f64::NAN);
        assert_eq!(sol.convergence, Convergence::NotConverged);
        assert!(sol.eccentric_anomaly.is_finite());
    }

    #[test]
    fn test_iteration_cap_reports_not_converged() {
        let solver = KeplerSolver::new(SolverConfig {
            tolerance: 1e-14,
            max_iterations: 1,
        })
        .unwrap();

        let sol = solver.solve(0.9, 0.5);
        assert_eq!(sol.convergence, Convergence::NotConverged);
        assert_eq!(sol.iterations, 1);
        // Best-effort value is still close to the root
        assert!(sol.eccentric_anomaly.is_finite());
        assert!(residual(0.9, sol.eccentric_anomaly, 0.5).abs() < 1e-2);
    }

    #[test]
    fn test_starting_estimate_fixed_points() {
        // Apsides are exact, and a circular orbit needs no correction
        assert_eq!(starting_estimate(0.7, 0.0), 0.0);
        assert!((starting_estimate(0.7, PI) - PI).abs() < 1e-12);
        assert_eq!(starting_estimate(0.0, 1.25), 1.25);
    }

    #[test]
    fn test_invalid_solver_config() {
        assert!(KeplerSolver::new(SolverConfig { tolerance: 0.0, max_iterations: 10 }).is_err());
        assert!(KeplerSolver::new(SolverConfig { tolerance: 1e-12, max_iterations: 0 }).is_err());
        assert!(KeplerSolver::new(SolverConfig { tolerance: f64::NAN, max_iterations: 10 }).is_err());
    }

    #[test]
    fn test_normalize_angle_range() {
        assert_eq!(normalize_angle(-1e-300), 0.0);
        assert!((normalize_angle(-PI / 2.0) - 1.5 * PI).abs() < 1e-15);
        assert!((wrap_pi(1.5 * PI) + PI / 2.0).abs() < 1e-15);
    }
}
