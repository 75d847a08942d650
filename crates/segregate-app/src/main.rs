use std::io;
use std::thread;
use std::time::Duration;

use anyhow::{Result, anyhow};
use clap::Parser;
use segregate_app::{AnsiRenderer, Renderer};
use segregate_core::{RelocationStrategy, SegregationConfig, WorldState};
use tracing::info;

/// Schelling segregation model animated in the terminal.
#[derive(Parser, Debug)]
#[command(name = "segregate", version, about = "Schelling segregation model in the terminal")]
struct Cli {
    /// Number of rows.
    #[arg(long, default_value_t = 24)]
    rows: usize,

    /// Number of columns.
    #[arg(long, default_value_t = 80)]
    cols: usize,

    /// Percent of similar neighbours required for satisfaction.
    #[arg(long, default_value_t = 30)]
    similar: u32,

    /// Percent of red agents (blue = 100 - red).
    #[arg(long, default_value_t = 50)]
    red: u32,

    /// Percent of empty sites.
    #[arg(long, default_value_t = 10)]
    empty: u32,

    /// Relocation algorithm (0-4).
    #[arg(long, default_value_t = 4)]
    alg: u8,

    /// Delay between rounds in milliseconds.
    #[arg(long, default_value_t = 100)]
    delay: u64,

    /// RNG seed for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many rounds even without convergence.
    #[arg(long)]
    max_rounds: Option<u64>,

    /// Enable diagnostic logging on stderr.
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let strategy = RelocationStrategy::from_index(cli.alg)
        .ok_or_else(|| anyhow!("--alg must be in 0..=4, got {}", cli.alg))?;
    let config = SegregationConfig {
        rows: cli.rows,
        cols: cli.cols,
        similar: cli.similar,
        red: cli.red,
        empty: cli.empty,
        strategy,
        rng_seed: cli.seed,
        ..SegregationConfig::default()
    };

    let mut world = WorldState::new(config)?;
    let mut renderer = AnsiRenderer::stdout();
    let delay = Duration::from_millis(cli.delay);

    renderer.draw(&world)?;
    loop {
        thread::sleep(delay);
        let summary = world.step();
        renderer.draw(&world)?;

        if world.is_converged() {
            info!(round = summary.round, "population converged");
            break;
        }
        if cli.max_rounds.is_some_and(|cap| summary.round >= cap) {
            info!(
                round = summary.round,
                satisfied = summary.satisfied,
                "round cap reached before convergence"
            );
            break;
        }
    }
    println!();
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .try_init();
}
