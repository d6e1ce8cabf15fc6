//! Montecarlo-Chess: a time-bounded MCTS chess engine.
//!
//! ## Usage
//!
//! - `montecarlo-chess` - Show a demo
//! - `montecarlo-chess uci` - Start the UCI server for GUI integration
//! - `montecarlo-chess demo --plies 6` - Let the engine play itself
//!
//! Logging goes to stderr and is controlled with `RUST_LOG`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use flexi_logger::Logger;

use montecarlo_chess::engine::{Engine, SearchConfig};
use montecarlo_chess::position::{str_move, Position};
use montecarlo_chess::timer::Stopwatch;
use montecarlo_chess::uci::UciEngine;

/// Montecarlo-Chess: a time-bounded MCTS chess engine
#[derive(Parser)]
#[command(name = "montecarlo-chess")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Thinking time per move in milliseconds
    #[arg(long, global = true)]
    budget_ms: Option<u64>,

    /// Seed for the engine's random source
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the UCI (Universal Chess Interface) server for use with GUI applications
    Uci,
    /// Let the engine play itself from the starting position
    Demo {
        /// Number of plies to play
        #[arg(long, default_value_t = 4)]
        plies: usize,
    },
}

fn main() -> Result<()> {
    let _logger = Logger::try_with_env_or_str("info")?
        .format(flexi_logger::colored_default_format)
        .start()?;

    let cli = Cli::parse();

    let mut config = SearchConfig::default();
    if let Some(budget_ms) = cli.budget_ms {
        config.budget_ms = budget_ms;
    }
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    match cli.command {
        Some(Commands::Uci) => UciEngine::new(config).run(),
        Some(Commands::Demo { plies }) => run_demo(config, plies),
        None => run_demo(config, 4),
    }
}

fn run_demo(config: SearchConfig, plies: usize) -> Result<()> {
    println!("Montecarlo-Chess: MCTS chess engine\n");
    println!("Thinking {} ms per move\n", config.budget_ms);

    // One engine per side, so each keeps and reuses its own tree.
    let mut white = Engine::new(config.clone());
    let mut black = Engine::new(SearchConfig {
        seed: config.seed.wrapping_add(1),
        ..config
    });
    let mut pos = Position::new();

    for ply in 0..plies {
        if pos.is_checkmate() || pos.is_draw() {
            println!("Game over: {}", if pos.is_checkmate() { "checkmate" } else { "draw" });
            break;
        }

        let engine = if ply % 2 == 0 { &mut white } else { &mut black };
        let mv = engine
            .think(&mut pos, &Stopwatch::start())
            .with_context(|| format!("searching {}", pos.fen()))?;

        if let Some(tree) = engine.tree() {
            let root = &tree[tree.root()];
            println!(
                "{:>3}. {:<6} visits={:<7} nodes={}",
                ply / 2 + 1,
                str_move(mv),
                root.visits,
                tree.len()
            );
        }
        pos.make_move(mv);
    }

    println!("\nFinal position: {}", pos.fen());
    Ok(())
}
