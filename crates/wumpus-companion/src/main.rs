//! Wumpus companion — drives the belief-and-decision engine from the CLI.
//!
//! Usage:
//!   wumpus-companion                          # random 4x4 world, auto-run
//!   wumpus-companion --size 6 --seed 7        # reproducible random world
//!   wumpus-companion --world maps/guarded.json
//!   wumpus-companion --interactive            # step/undo/quit from stdin

use std::fs;
use std::io::{self, BufRead, Write as _};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn, Level};

use wumpus_core::{Tile, World};

mod event_bus;
mod sim;
mod world_gen;

use event_bus::EventBus;
use sim::{RunSummary, Simulation};
use world_gen::WorldSpec;

#[derive(Parser, Debug)]
#[command(name = "wumpus-companion")]
#[command(about = "Simulation driver for the wumpus belief-and-decision engine", long_about = None)]
struct Args {
    /// Load a world from a JSON file (row-major array of labels)
    #[arg(long)]
    world: Option<PathBuf>,

    /// Side length for generated worlds
    #[arg(long, default_value = "4")]
    size: usize,

    /// Starting arrow count for the agent
    #[arg(long, default_value = "1")]
    arrows: u32,

    /// Pit probability per free cell in generated worlds
    #[arg(long, default_value = "0.12")]
    pit_density: f64,

    /// Number of wumpuses in generated worlds
    #[arg(long, default_value = "1")]
    wumpuses: usize,

    /// Number of arrow pickups in generated worlds
    #[arg(long, default_value = "1")]
    arrow_tiles: usize,

    /// RNG seed for reproducible worlds
    #[arg(long)]
    seed: Option<u64>,

    /// Milliseconds between ticks in auto-run
    #[arg(long, default_value = "250")]
    delay_ms: u64,

    /// Step manually: Enter steps, 'u' undoes, 'q' quits
    #[arg(long)]
    interactive: bool,

    /// Print every bus event as a JSON line
    #[arg(long)]
    emit_json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - warnings only
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let log_level = if args.quiet {
        Level::WARN
    } else if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(log_level).init();

    let world = match &args.world {
        Some(path) => load_world(path)?,
        None => {
            let seed = args.seed.unwrap_or_else(rand::random);
            info!(seed, size = args.size, "generating world");
            let spec = WorldSpec {
                size: args.size,
                pit_density: args.pit_density,
                wumpus_count: args.wumpuses,
                arrow_count: args.arrow_tiles,
            };
            let mut rng = StdRng::seed_from_u64(seed);
            world_gen::generate(&spec, &mut rng).context("generated world was malformed")?
        }
    };

    let bus = EventBus::new(64);
    if args.emit_json {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            while let Ok(event) = rx.recv().await {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(err) => warn!(%err, "event serialization failed"),
                }
            }
        });
    }

    let mut sim = Simulation::new(world, args.arrows, bus);

    if args.interactive {
        interactive_loop(&mut sim)?;
    } else {
        let summary = sim.run(Duration::from_millis(args.delay_ms)).await;
        report(&summary);
    }

    Ok(())
}

fn load_world(path: &Path) -> Result<World> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading world file {}", path.display()))?;
    let rows: Vec<Vec<Tile>> =
        serde_json::from_str(&raw).context("world file must be a row-major array of labels")?;
    World::from_rows(rows).context("world file has a bad shape")
}

fn interactive_loop(sim: &mut Simulation) -> Result<()> {
    let stdin = io::stdin();
    loop {
        if sim.finished() {
            report(&sim.summary());
            return Ok(());
        }
        print!(
            "[step {}] Enter = step, u = undo, q = quit: ",
            sim.agent().steps()
        );
        io::stdout().flush()?;
        let Some(line) = stdin.lock().lines().next() else {
            return Ok(());
        };
        match line?.trim() {
            "q" => {
                report(&sim.summary());
                return Ok(());
            }
            "u" => {
                if !sim.undo() {
                    warn!("nothing to undo");
                }
            }
            _ => {
                sim.step();
            }
        }
    }
}

fn report(summary: &RunSummary) {
    if summary.returned_home {
        info!(steps = summary.steps, "🏆 gold retrieved and carried home");
    } else if let Some(cause) = summary.death_cause {
        info!(?cause, steps = summary.steps, "💀 agent died");
    } else {
        info!(steps = summary.steps, "run stopped");
    }
}
