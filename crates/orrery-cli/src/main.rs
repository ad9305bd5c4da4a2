use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use orrery_core::CartesianPosition;
use orrery_sim::{
    summarize_validation, validate_range, BodyConfig, Driver, EclipseKind, EclipseWatch, SampleCount,
    SystemConfig, SystemSnapshot,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orrery")]
#[command(about = "Kepler-orbit solar system simulator")]
struct Cli {
    /// System description (JSON); the built-in solar system if omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show every body's position at one time
    Positions {
        /// Simulation time (defaults to the clock epoch)
        #[arg(short, long)]
        time: Option<f64>,
    },

    /// Tick the driver and print snapshots as time advances
    Run {
        #[arg(long, default_value = "100")]
        steps: usize,
        /// Time per tick before the speed factor (defaults to the clock step)
        #[arg(long)]
        dt: Option<f64>,
        /// Override the clock speed
        #[arg(long)]
        speed: Option<f64>,
        /// Print every Nth snapshot
        #[arg(long, default_value = "10")]
        every: usize,
        /// One JSON object per printed snapshot
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Sample one body's orbit path
    Orbit {
        #[arg(short, long)]
        body: String,
        /// Override the configured sample count
        #[arg(short, long)]
        samples: Option<usize>,
        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// Check Kepler residuals, periodicity and path closure for every orbit
    Validate {
        #[arg(long, default_value = "0")]
        start: f64,
        #[arg(long, default_value = "1000")]
        end: f64,
        #[arg(long, default_value = "5")]
        step: f64,
    },

    /// Scan ticks for eclipses seen from one body
    Eclipses {
        #[arg(long, default_value = "Earth")]
        observer: String,
        #[arg(long, default_value = "Moon")]
        occluder: String,
        #[arg(long, default_value = "Sun")]
        source: String,
        #[arg(long, default_value = "10000")]
        steps: usize,
        #[arg(long)]
        dt: Option<f64>,
    },

    /// Print the built-in system as JSON
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Csv,
    Json,
}

#[derive(Serialize)]
struct BodyRow<'a> {
    name: &'a str,
    x: f64,
    y: f64,
    z: f64,
}

#[derive(Serialize)]
struct SnapshotRow<'a> {
    time: f64,
    bodies: Vec<BodyRow<'a>>,
}

fn snapshot_rows<'a>(driver: &'a Driver, snapshot: &SystemSnapshot) -> SnapshotRow<'a> {
    let bodies = driver
        .bodies()
        .iter()
        .filter_map(|body| {
            let p = snapshot.get(body.id())?;
            Some(BodyRow { name: body.name(), x: p.x, y: p.y, z: p.z })
        })
        .collect();

    SnapshotRow { time: snapshot.time, bodies }
}

fn print_table(driver: &Driver, snapshot: &SystemSnapshot) {
    println!("t = {:.4}", snapshot.time);
    println!("{:<12} {:>12} {:>12} {:>12} {:>12}", "Body", "X", "Y", "Z", "Dist");

    for row in snapshot_rows(driver, snapshot).bodies {
        let dist = CartesianPosition::new(row.x, row.y, row.z).magnitude();
        println!("{:<12} {:>12.6} {:>12.6} {:>12.6} {:>12.4}", row.name, row.x, row.y, row.z, dist);
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<SystemConfig> {
    match path {
        Some(path) => SystemConfig::load(path)
            .with_context(|| format!("Failed to load system config from {:?}", path)),
        None => Ok(SystemConfig::default()),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Config => {
            println!("{}", config.to_json_pretty()?);
        }

        Commands::Positions { time } => {
            let driver = Driver::from_config(&config)?;
            let t = time.unwrap_or_else(|| driver.time());
            print_table(&driver, &driver.snapshot_at(t));
        }

        Commands::Run { steps, dt, speed, every, json } => {
            if every == 0 {
                anyhow::bail!("--every must be at least 1");
            }

            let mut driver = Driver::from_config(&config)?;
            if let Some(speed) = speed {
                driver.clock_mut().set_speed(speed);
            }
            let dt = dt.unwrap_or_else(|| driver.clock().step_size());

            info!("Running {} ticks of {} (speed {})", steps, dt, driver.clock().speed());

            for k in 1..=steps {
                let snapshot = driver.tick(dt);
                if k % every != 0 && k != steps {
                    continue;
                }
                if json {
                    println!("{}", serde_json::to_string(&snapshot_rows(&driver, &snapshot))?);
                } else {
                    print_table(&driver, &snapshot);
                    println!();
                }
            }

            let failures = driver.total_convergence_failures();
            if failures > 0 {
                warn!("{} Kepler solves hit the iteration cap", failures);
            }
        }

        Commands::Orbit { body, samples, format } => {
            let mut config = config;
            if let Some(n) = samples {
                config.sample_count = SampleCount::Fixed(n);
                for b in config.bodies.iter_mut() {
                    if let BodyConfig::Keplerian { sample_count, .. } = b {
                        *sample_count = None;
                    }
                }
            }

            let driver = Driver::from_config(&config)?;
            let found = driver.require(&body)?;
            let path = driver.orbit_path(found.id())?;

            if let Some(el) = found.elements() {
                info!(
                    "{}: a = {}, e = {}, T = {}, pericenter {:.6}, apocenter {:.6}",
                    found.name(),
                    el.semi_major_axis(),
                    el.eccentricity(),
                    el.period(),
                    el.pericenter_distance(),
                    el.apocenter_distance()
                );
            }

            if path.unconverged > 0 {
                warn!("{} of {} samples did not converge", path.unconverged, path.points.len());
            }

            // Both formats carry the closed strip: N samples plus the first again
            let points: Vec<_> = path.closed_points().collect();

            match format {
                OutputFormat::Csv => {
                    println!("x,y,z");
                    for p in &points {
                        println!("{},{},{}", p.x, p.y, p.z);
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&points)?);
                }
            }
        }

        Commands::Validate { start, end, step } => {
            let driver = Driver::from_config(&config)?;
            println!("Validating from t = {} to t = {} with step {}", start, end, step);

            let results = validate_range(&driver, start, end, step)?;
            let summary = summarize_validation(&driver, &results, config.sample_count)?;

            println!(
                "\n{:<12} {:>8} {:>14} {:>14} {:>14} {:>14} {:>8}",
                "Body", "Points", "Max residual", "Max period", "Max radius", "Closure", "Status"
            );
            let mut failed = 0;
            for s in &summary {
                let ok = s.passes(1e-12, 1e-9, 1e-6);
                if !ok {
                    failed += 1;
                }
                println!(
                    "{:<12} {:>8} {:>14.3e} {:>14.3e} {:>14.3e} {:>14.3e} {:>8}",
                    s.name,
                    s.num_points,
                    s.max_kepler_residual,
                    s.max_periodicity_error,
                    s.max_radius_error,
                    s.closure_error,
                    if ok { "ok" } else { "FAIL" }
                );
            }

            if failed > 0 {
                anyhow::bail!("{} of {} orbits failed validation", failed, summary.len());
            }
        }

        Commands::Eclipses { observer, occluder, source, steps, dt } => {
            let mut driver = Driver::from_config(&config)?;
            let watch = EclipseWatch::new(&driver, &observer, &occluder, &source)?;
            let dt = dt.unwrap_or_else(|| driver.clock().step_size());

            let mut previous = EclipseKind::None;
            let mut events = 0;

            for _ in 0..steps {
                let snapshot = driver.tick(dt);
                let Some(occ) = watch.check(&snapshot) else {
                    continue;
                };

                if occ.kind != previous {
                    if previous == EclipseKind::None {
                        events += 1;
                    }
                    println!(
                        "t = {:>10.3}  {:?} -> {:?}  (separation {:.5} rad)",
                        snapshot.time, previous, occ.kind, occ.separation
                    );
                    previous = occ.kind;
                }
            }

            println!("{} eclipse events over {} ticks", events, steps);
        }
    }

    Ok(())
}
