use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pendulum_core::analysis::{kaplan_yorke, lyapunov_exponents};
use pendulum_core::energy::EnergyDrift;
use pendulum_core::kinematics::BobPositions;
use pendulum_core::simulation::{Simulation, SimulationConfig};
use pendulum_core::PendulumState;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "pendulum", version, about = "Headless double pendulum simulator")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate and print sampled states plus an energy drift summary
    Run {
        /// JSON simulation config; missing fields take defaults
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        theta1: Option<f64>,
        #[arg(long)]
        theta2: Option<f64>,
        /// Override the fixed physics step (s)
        #[arg(long)]
        dt: Option<f64>,
        /// Simulated duration (s)
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
        /// Emit one sample every N physics steps
        #[arg(long, default_value_t = 10)]
        sample_every: u64,
    },
    /// Estimate the Lyapunov spectrum from the configured initial pose
    Lyapunov {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long, default_value_t = 5000)]
        steps: usize,
        /// Integration step (s); defaults to the config's physics step
        #[arg(long)]
        dt: Option<f64>,
        #[arg(long, default_value_t = 10)]
        qr_stride: usize,
    },
    /// Print the default configuration as JSON
    Config,
}

#[derive(Serialize)]
struct Sample {
    time: f64,
    state: PendulumState,
    positions: BobPositions,
    energy: f64,
}

#[derive(Serialize)]
struct RunReport {
    config: SimulationConfig,
    samples: Vec<Sample>,
    steps: u64,
    resets: u64,
    energy: EnergyDrift,
    relative_energy_drift: f64,
}

#[derive(Serialize)]
struct LyapunovReport {
    exponents: Vec<f64>,
    kaplan_yorke: f64,
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn parse_config(text: &str) -> Result<SimulationConfig> {
    let config: SimulationConfig = serde_json::from_str(text)?;
    config.validate()?;
    Ok(config)
}

fn sample(sim: &Simulation) -> Sample {
    Sample {
        time: sim.time(),
        state: sim.state(),
        positions: sim.bob_positions(),
        energy: sim.energy(),
    }
}

fn run(config: SimulationConfig, duration: f64, sample_every: u64) -> Result<RunReport> {
    anyhow::ensure!(
        duration.is_finite() && duration >= 0.0,
        "duration must be finite and non-negative, got {duration}"
    );
    let mut sim = Simulation::new(config)?;
    let total_steps = (duration / config.physics_step).round() as u64;
    let sample_every = sample_every.max(1);

    let mut drift = EnergyDrift::new(sim.energy());
    let mut samples = vec![sample(&sim)];
    for _ in 0..total_steps {
        sim.step_once();
        drift.record(sim.energy());
        if sim.steps() % sample_every == 0 {
            samples.push(sample(&sim));
        }
    }
    info!(
        steps = sim.steps(),
        resets = sim.resets(),
        drift = drift.relative(),
        "run finished"
    );

    Ok(RunReport {
        config,
        samples,
        steps: sim.steps(),
        resets: sim.resets(),
        relative_energy_drift: drift.relative(),
        energy: drift,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.cmd {
        Command::Run {
            config,
            theta1,
            theta2,
            dt,
            duration,
            sample_every,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(theta1) = theta1 {
                config.initial_theta1 = theta1;
            }
            if let Some(theta2) = theta2 {
                config.initial_theta2 = theta2;
            }
            if let Some(dt) = dt {
                config.physics_step = dt;
            }
            let report = run(config, duration, sample_every)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Lyapunov {
            config,
            steps,
            dt,
            qr_stride,
        } => {
            let config = load_config(config.as_deref())?;
            let dt = dt.unwrap_or(config.physics_step);
            let exponents =
                lyapunov_exponents(&config.params, config.initial_state(), steps, dt, qr_stride)?;
            let report = LyapunovReport {
                kaplan_yorke: kaplan_yorke(&exponents),
                exponents,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Config => {
            println!(
                "{}",
                serde_json::to_string_pretty(&SimulationConfig::default())?
            );
        }
    }
    Ok(())
}
