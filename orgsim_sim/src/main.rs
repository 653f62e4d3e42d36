//! Orgsim CLI
//!
//! Runs an organisation simulation from a JSON configuration file, or from a
//! built-in demo model when no file is given.

use clap::Parser;
use orgsim_core::{EventLog, LogLevel};
use orgsim_sim::{Simulation, SimulationConfig, StepOutput};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Organisation simulation CLI
#[derive(Parser, Debug)]
#[command(name = "orgsim-sim")]
#[command(about = "Run an organisation simulation", long_about = None)]
struct Args {
    /// JSON configuration file; omitted means the built-in demo model
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seed for the demo model's random streams (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of agents in the demo model
    #[arg(short, long, default_value = "10")]
    agents: usize,

    /// Number of behavioural states in the demo model
    #[arg(long, default_value = "3")]
    states: usize,

    /// Simulated working days
    #[arg(short, long, default_value = "1.0")]
    days: f64,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON summary output for scripting
    #[arg(long)]
    json: bool,
}

fn load_config(args: &Args) -> Result<SimulationConfig, String> {
    match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("cannot parse {}: {e}", path.display()))
        }
        None => {
            let seed = if args.seed == 0 {
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(1)
            } else {
                args.seed
            };
            Ok(SimulationConfig::demo(
                args.agents,
                args.states,
                args.days,
                seed,
            ))
        }
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("failed to set tracing subscriber");
        std::process::exit(1);
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(message) => {
            error!("{message}");
            std::process::exit(1);
        }
    };

    // Count model warnings (saturation events) across the whole run.
    let warnings = Arc::new(AtomicU64::new(0));
    let log = EventLog::new();
    {
        let warnings = Arc::clone(&warnings);
        log.subscribe(move |event| {
            if event.level == LogLevel::Warn {
                warnings.fetch_add(1, Ordering::Relaxed);
            }
        });
    }

    let simulation = match Simulation::new(&config, log) {
        Ok(simulation) => simulation,
        Err(error) => {
            error!("failed to build simulation: {error}");
            std::process::exit(1);
        }
    };
    let clock_ticks = simulation.clock_ticks();
    if !args.json {
        info!(
            "running {} agents / {} states for {} clock ticks",
            config.org.agent_set.priority.len(),
            config.org.states.len(),
            clock_ticks
        );
    }

    let progress_interval = (clock_ticks / 10).max(1);
    let mut last: Option<StepOutput> = None;
    for step in simulation.run() {
        match step {
            Ok(step) => {
                if step.clock_tick % progress_interval == 0 {
                    debug!(
                        "tick {} | plant={:?} | reporting={:?}",
                        step.clock_tick, step.snapshot.plant_state, step.snapshot.reporting
                    );
                }
                last = Some(step);
            }
            Err(error) => {
                error!("simulation failed: {error}");
                std::process::exit(1);
            }
        }
    }

    let warning_count = warnings.load(Ordering::Relaxed);
    if args.json {
        let summary = serde_json::json!({
            "clock_ticks": clock_ticks,
            "warnings": warning_count,
            "final": last,
        });
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{text}"),
            Err(error) => {
                error!("cannot encode summary: {error}");
                std::process::exit(1);
            }
        }
    } else if let Some(step) = &last {
        info!(
            "completed {} clock ticks ({} warnings)",
            clock_ticks, warning_count
        );
        info!("final agent states: {:?}", step.snapshot.agent_states);
        info!("final plant state: {:?}", step.snapshot.plant_state);
        info!("final reporting:   {:?}", step.snapshot.reporting);
    } else {
        info!("nothing to run (0 clock ticks)");
    }
}
