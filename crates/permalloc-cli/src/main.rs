//! Permalloc CLI
//!
//! Builds a random process/resource graph, runs the single allocation pass
//! and prints every step.
//!
//! # Example
//!
//! ```bash
//! # Prompt for the counts, random seed
//! permalloc
//!
//! # Fully non-interactive, reproducible, JSON lines
//! permalloc --resources 4 --processes 6 --seed 42 --format json
//! ```

mod error;
mod input;
mod render;

use clap::{Parser, ValueEnum};
use error::CliError;
use input::{TokenReader, resolve_config};
use permalloc_core::builder::DEFAULT_MAX_REQUESTS;
use permalloc_core::engine::Simulation;
use permalloc_core::graph::EdgeStatus;
use permalloc_core::rng::SimRng;
use render::{JsonReporter, TextReporter};
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Human-readable step trace.
    Text,
    /// One JSON object per event.
    Json,
}

/// Permanent resource allocation simulator
///
/// Processes acquire resources all-or-nothing and never release them.
/// Each step reports the full graph state and whether a circular wait exists.
#[derive(Parser, Debug)]
#[command(name = "permalloc")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of resource nodes. Prompted on stdin when omitted.
    #[arg(short = 'r', long)]
    resources: Option<u32>,

    /// Number of process nodes. Prompted on stdin when omitted.
    #[arg(short = 'p', long)]
    processes: Option<u32>,

    /// Random seed for reproducible graphs. When omitted, a random seed is used.
    #[arg(long)]
    seed: Option<u64>,

    /// Upper bound of the per-process request draw
    #[arg(long, default_value_t = DEFAULT_MAX_REQUESTS)]
    max_requests: u32,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    exit_code(run(&args), &mut io::stderr())
}

/// Map the outcome of a run to the process exit status, printing any error
/// once on `err_out`.
fn exit_code<W: Write>(result: Result<(), CliError>, err_out: &mut W) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(err_out, "error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let stdin = io::stdin();
    let stdout = io::stdout();

    let config = resolve_config(
        args.resources,
        args.processes,
        args.max_requests,
        &mut TokenReader::new(stdin.lock()),
        &mut stdout.lock(),
    )?;

    let seed = args.seed.unwrap_or_else(rand::random);
    info!(
        seed,
        resources = config.resources,
        processes = config.processes,
        max_requests = config.max_requests,
        "starting simulation"
    );

    let mut rng = SimRng::new(seed);
    let mut sim = Simulation::generate(config, &mut rng)?;
    let out = BufWriter::new(stdout.lock());

    let summary = match args.format {
        Format::Text => {
            let mut reporter = TextReporter::new(out);
            let summary = sim.run(&mut reporter)?;
            reporter.finish()?;
            summary
        }
        Format::Json => {
            let mut reporter = JsonReporter::new(out);
            let summary = sim.run(&mut reporter)?;
            reporter.finish()?;
            summary
        }
    };

    let last = sim.snapshot();
    info!(
        seed,
        completed = summary.completed.len(),
        blocked = summary.blocked.len(),
        allocated = last.allocated_count(),
        blocked_edges = last.edges_with_status(EdgeStatus::Blocked).count(),
        state_hash = summary.state_hash,
        "done"
    );
    Ok(())
}
