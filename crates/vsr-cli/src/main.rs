//! vsr - headless voxel robot simulator

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use vsr_grid::{GridShape, SHAPE_NAMES};

mod recorder;
mod scenario;

use recorder::Recorder;
use scenario::Scenario;

#[derive(Parser)]
#[command(name = "vsr")]
#[command(about = "Voxel-based soft robot simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario headless
    Run {
        /// Scenario file (YAML)
        #[arg(short, long)]
        scenario: Option<PathBuf>,

        /// Number of ticks (overrides the scenario)
        #[arg(short, long)]
        ticks: Option<usize>,

        /// Append one JSON line per tick to this file
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List the named grid shapes
    Shapes {
        /// Width and height used for the preview
        #[arg(long, default_value = "5x4")]
        size: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Some(Commands::Run { scenario, ticks, out }) => run(scenario, ticks, out),
        Some(Commands::Shapes { size }) => list_shapes(&size),
        None => {
            println!("vsr - voxel-based soft robot simulator");
            println!();
            println!("Commands:");
            println!("  run     Run a scenario headless");
            println!("  shapes  List the named grid shapes");
            println!();
            println!("Run 'vsr --help' for more information.");
            Ok(())
        }
    }
}

fn run(path: Option<PathBuf>, ticks: Option<usize>, out: Option<PathBuf>) -> Result<()> {
    let scenario = match &path {
        Some(path) => Scenario::load(path)?,
        None => {
            tracing::info!("No scenario given, using the default one");
            Scenario::default()
        }
    };
    let ticks = ticks.unwrap_or(scenario.ticks);
    tracing::info!(ticks, robots = scenario.robots.len(), "Starting run");

    let (mut engine, agents) = scenario.build()?;
    let mut recorder = Recorder::new(out.as_deref())?;

    for _ in 0..ticks {
        let snapshot = engine.tick().context("Tick aborted")?;
        for failure in &snapshot.failures {
            tracing::debug!(action = ?failure.action.kind(), error = %failure.error, "Action failed");
        }
        recorder.record(&snapshot)?;
    }

    let summary = recorder.finish()?;
    tracing::info!(agents = agents.len(), t = summary.t, "Run finished");
    summary.print();
    if let Some(out) = &out {
        println!();
        println!("Run log: {}", out.display());
    }
    Ok(())
}

fn list_shapes(size: &str) -> Result<()> {
    for name in SHAPE_NAMES {
        let shape = GridShape::parse(&format!("{name}-{size}"))
            .with_context(|| format!("Failed to build shape {name}-{size}"))?;
        println!("{} ({}x{})", name, shape.w(), shape.h());
        for row in shape.to_string().lines() {
            println!("  {}", row);
        }
        println!();
    }
    Ok(())
}
