#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Grid Traffic simulation headless.

mod render;
mod scenario;
mod spawn;

use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use grid_traffic_simulation::{Simulation, SimulationConfig, DEFAULT_MOVEMENT_INTERVAL};
use grid_traffic_system_agents::DEFAULT_PLAN_COOLDOWN;
use grid_traffic_world::{GridWorld, WallPattern, DEFAULT_GRID_SIZE, DEFAULT_STREET_PERIOD};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

/// Output styles supported by the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Grid drawings and event narration for humans.
    Text,
    /// One JSON tick report per line.
    Json,
}

/// Command-line arguments for the Grid Traffic simulation.
#[derive(Debug, Parser)]
#[command(
    name = "grid-traffic",
    about = "Agents plan and drive across a street grid without colliding."
)]
struct CliArgs {
    /// Number of cells along each edge of the square grid.
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    grid_size: u32,
    /// Spacing between arterial streets.
    #[arg(long, default_value_t = DEFAULT_STREET_PERIOD)]
    street_period: u32,
    /// Number of randomly spawned agents.
    #[arg(long, default_value_t = 4)]
    agents: usize,
    /// Seed for the spawn generator; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Ticks between two movement passes.
    #[arg(long, default_value_t = DEFAULT_MOVEMENT_INTERVAL)]
    movement_interval: u64,
    /// Ticks an agent waits between planning attempts.
    #[arg(long, default_value_t = DEFAULT_PLAN_COOLDOWN)]
    plan_cooldown: u32,
    /// Tick cap after which the run stops even if agents are still travelling.
    #[arg(long, default_value_t = 10_000)]
    max_ticks: u64,
    /// JSON scenario file replacing the grid, config and spawn flags.
    #[arg(long, value_name = "FILE")]
    scenario: Option<PathBuf>,
    /// Output style.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Entry point for the Grid Traffic command-line interface.
fn main() -> Result<()> {
    init_tracing()?;
    let args = CliArgs::parse();
    run(&args)
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|error| anyhow!("failed to install tracing subscriber: {error}"))
}

fn run(args: &CliArgs) -> Result<()> {
    let mut simulation = build_simulation(args)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if args.format == OutputFormat::Text {
        writeln!(out, "tick 0")?;
        writeln!(out, "{}", render::grid(simulation.world(), &simulation.snapshot()))?;
    }

    for _ in 0..args.max_ticks {
        if simulation.all_arrived() {
            break;
        }

        let report = simulation.advance_tick();
        match args.format {
            OutputFormat::Text => {
                for line in report.events.iter().filter_map(render::describe) {
                    writeln!(out, "[tick {}] {line}", report.tick)?;
                }
                if report.movement_tick {
                    writeln!(out, "tick {}", report.tick)?;
                    writeln!(out, "{}", render::grid(simulation.world(), &report.agents))?;
                }
            }
            OutputFormat::Json => {
                if report.movement_tick {
                    serde_json::to_writer(&mut out, &report)
                        .context("failed to encode tick report")?;
                    writeln!(out)?;
                }
            }
        }
    }

    let arrived = simulation
        .agents()
        .iter()
        .filter(|agent| agent.has_arrived())
        .count();
    info!(
        tick = simulation.tick(),
        arrived,
        agents = simulation.agents().len(),
        "run finished"
    );
    if args.format == OutputFormat::Text {
        writeln!(
            out,
            "{arrived}/{} agents arrived after {} ticks",
            simulation.agents().len(),
            simulation.tick()
        )?;
    }

    out.flush()?;
    Ok(())
}

fn build_simulation(args: &CliArgs) -> Result<Simulation> {
    if let Some(path) = &args.scenario {
        let scenario = Scenario::load(path)?;
        return scenario
            .build()
            .with_context(|| format!("invalid scenario {}", path.display()));
    }

    let pattern = WallPattern::Arterial {
        period: args.street_period,
    };
    let world = GridWorld::new(args.grid_size, &pattern).context("invalid grid")?;

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(seed, agents = args.agents, "spawning agents");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let specs = spawn::random_specs(&world, args.agents, &mut rng)?;

    let config = SimulationConfig {
        movement_interval: args.movement_interval,
        plan_cooldown: args.plan_cooldown,
        ..SimulationConfig::default()
    };
    Simulation::with_config(config, args.grid_size, &pattern, &specs)
        .context("failed to initialise simulation")
}
