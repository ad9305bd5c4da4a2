use crate::*;
use crate::kepler::{residual, wrap_pi};
use approx::assert_abs_diff_eq;
use orrery_core::{CartesianPosition, FrameRotation, RotationAngles};
use std::f64::consts::{PI, TAU};

fn earth_elements() -> OrbitalElements {
    OrbitalElements::at_pericenter(7.0, 0.0167, 365.0).unwrap()
}

fn unrotated() -> Propagator {
    Propagator::new(KeplerSolver::default(), FrameRotation::identity())
}

#[test]
fn test_kepler_residual_across_domain() {
    let solver = KeplerSolver::default();

    for i in 0..100 {
        let e = i as f64 * 0.01;
        for k in 0..=100 {
            let m = k as f64 * PI / 50.0;
            let sol = solver.solve(e, m);

            assert!(sol.is_converged(), "e = {}, M = {}", e, m);
            assert!(
                residual(e, sol.eccentric_anomaly, m).abs() < 1e-12,
                "e = {}, M = {}, E = {}",
                e, m, sol.eccentric_anomaly
            );
        }
    }
}

#[test]
fn test_position_is_periodic() {
    let propagator = Propagator::default();

    for planet in Planet::all() {
        let (a, e, period) = planet.elements();
        let elements = OrbitalElements::new(a, e, period, 3.5).unwrap();

        for k in 0..25 {
            let t = -200.0 + k as f64 * 37.3;
            let now = propagator.propagate(&elements, t).position;
            let later = propagator.propagate(&elements, t + period).position;

            assert!(now.distance_to(&later) < 1e-9, "{} at t = {}", planet.name(), t);
        }
    }
}

#[test]
fn test_circular_orbit_exact() {
    let elements = OrbitalElements::at_pericenter(4.0, 0.0, 50.0).unwrap();
    let propagator = unrotated();
    let n = elements.mean_motion();

    for k in 0..40 {
        let t = k as f64 * 3.1;
        let p = propagator.orbital_plane_position(&elements, t).position;

        assert_abs_diff_eq!(p.magnitude(), 4.0, epsilon = 1e-12);
        assert!(wrap_pi(p.y.atan2(p.x) - n * t).abs() < 1e-9, "t = {}", t);
    }
}

#[test]
fn test_pericenter_scenario() {
    let p = unrotated().propagate(&earth_elements(), 0.0).position;

    assert_abs_diff_eq!(p.x, 6.8831, epsilon = 1e-9);
    assert_abs_diff_eq!(p.y, 0.0, epsilon = 1e-9);
    assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-9);
}

#[test]
fn test_rotated_pericenter_matches_manual_matrix() {
    let angles = RotationAngles::default();
    let p = Propagator::default().propagate(&earth_elements(), 0.0).position;

    let (sy, cy) = angles.yaw.sin_cos();
    let (sr, cr) = angles.roll.sin_cos();
    let (sp, cp) = angles.pitch.sin_cos();
    let x = 6.8831;

    assert_abs_diff_eq!(p.x, x * cr * cy, epsilon = 1e-9);
    assert_abs_diff_eq!(p.y, x * (cp * sr * cy + sp * sy), epsilon = 1e-9);
    assert_abs_diff_eq!(p.z, x * (sp * sr * cy - cp * sy), epsilon = 1e-9);
}

#[test]
fn test_sampled_orbit_closes() {
    let propagator = Propagator::default();

    for planet in Planet::all() {
        let (a, e, period) = planet.elements();
        let elements = OrbitalElements::at_pericenter(a, e, period).unwrap();
        let sampler = OrbitSampler::new(&propagator, elements, SampleCount::default()).unwrap();

        let first = sampler.sample(0).position;
        let wrapped = sampler.sample(sampler.len()).position;
        assert!(first.distance_to(&wrapped) < 1e-6, "{}", planet.name());
    }
}

#[test]
fn test_hyperbolic_elements_rejected() {
    assert!(matches!(
        OrbitalElements::new(5.0, 1.2, 100.0, 0.0),
        Err(SimError::InvalidOrbitalElements { field: "e", .. })
    ));
}

#[test]
fn test_satellite_scenario() {
    let moon = SatelliteOrbit::new(0.5, TAU / 10.0).unwrap();
    let p = moon.position(CartesianPosition::new(10.0, 0.0, 0.0), 2.5);

    assert_abs_diff_eq!(p.x, 10.0, epsilon = 1e-12);
    assert_abs_diff_eq!(p.y, 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(p.z, 0.0, epsilon = 1e-12);
}

#[test]
fn test_default_system_at_epoch() {
    let driver = Driver::from_config(&SystemConfig::default()).unwrap();
    let snap = driver.snapshot();

    assert_eq!(snap.time, 0.0);
    assert_eq!(snap.positions.len(), 10);

    let sun = snap.get(driver.body_id("Sun").unwrap()).unwrap();
    let earth = snap.get(driver.body_id("Earth").unwrap()).unwrap();
    let moon = snap.get(driver.body_id("Moon").unwrap()).unwrap();

    assert_eq!(sun, CartesianPosition::ORIGIN);
    assert_abs_diff_eq!(earth.magnitude(), 6.8831, epsilon = 1e-9);
    assert_abs_diff_eq!(moon.distance_to(&earth), 0.5, epsilon = 1e-12);
    assert_eq!(driver.total_convergence_failures(), 0);
}

#[test]
fn test_scale_applies_to_lengths_only() {
    let mut config = SystemConfig::default();
    config.scale = 0.5;
    let driver = Driver::from_config(&config).unwrap();

    let earth_id = driver.body_id("Earth").unwrap();
    let elements = driver.body(earth_id).unwrap().elements().copied().unwrap();
    assert_eq!(elements.semi_major_axis(), 3.5);
    assert_eq!(elements.period(), 365.0);
    assert_eq!(driver.body(driver.body_id("Sun").unwrap()).unwrap().radius(), Some(0.25));

    let snap = driver.snapshot();
    let earth = snap.get(earth_id).unwrap();
    let moon = snap.get(driver.body_id("Moon").unwrap()).unwrap();
    assert_abs_diff_eq!(earth.magnitude(), 0.5 * 6.8831, epsilon = 1e-9);
    assert_abs_diff_eq!(moon.distance_to(&earth), 0.25, epsilon = 1e-12);
}

#[test]
fn test_satellite_before_parent_rejected() {
    let raw = r#"{ "bodies": [
        { "kind": "satellite", "name": "Moon", "parent": "Earth", "orbit_radius": 0.5, "angular_rate": 1.0 },
        { "kind": "keplerian", "name": "Earth", "a": 7, "e": 0.0167, "T": 365 }
    ] }"#;
    let config = SystemConfig::from_json_str(raw).unwrap();
    assert!(matches!(Driver::from_config(&config), Err(SimError::UnknownParent(_))));
}

#[test]
fn test_eclipse_watch_finds_eclipses_over_a_run() {
    let mut driver = Driver::from_config(&SystemConfig::default()).unwrap();
    let watch = EclipseWatch::new(&driver, "Earth", "Moon", "Sun").unwrap();

    let mut kinds = Vec::new();
    let mut sink = |snap: &SystemSnapshot| {
        if let Some(occ) = watch.check(snap) {
            kinds.push(occ.kind);
        }
    };
    driver.run(20_000, 0.05, &mut sink);

    assert_eq!(kinds.len(), 20_000);
    // The Moon crosses the Sun's disc several times in 1000 time units
    let eclipsed = kinds
        .iter()
        .filter(|k| matches!(k, EclipseKind::Total | EclipseKind::Partial))
        .count();
    assert!(eclipsed > 0);
    assert!(eclipsed < kinds.len());
}

#[test]
fn test_high_eccentricity_body_tracks_its_orbit() {
    let mut driver = Driver::default();
    let comet = driver
        .add_keplerian("Comet", OrbitalElements::at_pericenter(10.0, 0.9999, 50.0).unwrap())
        .unwrap();
    let elements = *driver.body(comet).unwrap().elements().unwrap();

    for _ in 0..400 {
        let snap = driver.tick(0.125);
        let p = snap.get(comet).unwrap();
        assert!(p.magnitude() <= elements.apocenter_distance() + 1e-9);
        assert!(p.magnitude() >= elements.pericenter_distance() - 1e-9);
    }
    assert_eq!(driver.total_convergence_failures(), 0);
}
