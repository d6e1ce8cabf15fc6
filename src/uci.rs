//! Universal Chess Interface (UCI) front end.
//!
//! UCI is the text protocol chess GUIs use to talk to engines over
//! stdin/stdout. This module implements the subset needed to play games:
//!
//! - `uci` - Identify the engine and list its options
//! - `isready` - Synchronisation ping, answered with `readyok`
//! - `ucinewgame` - Forget the search tree
//! - `position [startpos | fen <fen>] [moves <m1> ...]` - Set the position
//! - `go [movetime <ms> | wtime <ms> btime <ms> ...]` - Search and answer `bestmove`
//! - `setoption name <Seed|MoveTime> value <n>` - Adjust the search
//! - `stop` - Accepted; searches are synchronous
//! - `quit` - Exit the program
//!
//! The engine keeps its tree between `go` commands of the same game, so the
//! subtree reached by the last two moves is reused.
//!
//! ## Example
//!
//! ```ignore
//! use montecarlo_chess::uci::UciEngine;
//! let mut engine = UciEngine::new(Default::default());
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use chess::Color;
use log::{debug, warn};

use crate::constants::CLOCK_FRACTION;
use crate::engine::{Engine, SearchConfig, SearchError};
use crate::position::{str_move, Position};
use crate::timer::Stopwatch;

/// Engine name reported to the GUI.
const ENGINE_NAME: &str = "montecarlo-chess";

/// UCI engine state.
pub struct UciEngine {
    /// Current game position, rebuilt by every `position` command
    pos: Position,
    /// Search engine holding the persistent tree
    engine: Engine,
}

impl Default for UciEngine {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl UciEngine {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            pos: Position::new(),
            engine: Engine::new(config),
        }
    }

    /// Run the UCI command loop, reading from stdin and writing to stdout.
    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();

        for line in stdin.lock().lines() {
            let line = line.context("reading command")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let command = parts[0];
            let args = &parts[1..];

            if command == "quit" {
                break;
            }

            match self.execute(command, args) {
                Ok(responses) => {
                    for response in responses {
                        writeln!(stdout, "{response}")?;
                    }
                    stdout.flush()?;
                }
                Err(err) => warn!("{command}: {err:#}"),
            }
        }

        Ok(())
    }

    /// Execute one command and return the lines to send back.
    fn execute(&mut self, command: &str, args: &[&str]) -> Result<Vec<String>> {
        match command {
            "uci" => Ok(vec![
                format!("id name {ENGINE_NAME} {}", env!("CARGO_PKG_VERSION")),
                "id author montecarlo-chess developers".to_string(),
                format!(
                    "option name MoveTime type spin default {} min 1 max 600000",
                    self.engine.config().budget_ms
                ),
                format!(
                    "option name Seed type string default {}",
                    self.engine.config().seed
                ),
                "uciok".to_string(),
            ]),

            "isready" => Ok(vec!["readyok".to_string()]),

            "ucinewgame" => {
                self.engine.new_game();
                self.pos = Position::new();
                Ok(Vec::new())
            }

            "position" => {
                self.pos = parse_position(args)?;
                debug!("position set: {}", self.pos.fen());
                Ok(Vec::new())
            }

            "go" => {
                let budget_ms = self.budget_for(args)?;
                let timer = Stopwatch::start();
                let best = match self.engine.think_for(&mut self.pos, &timer, budget_ms) {
                    Ok(mv) => str_move(mv),
                    Err(SearchError::TerminalPosition) => "0000".to_string(),
                    Err(err) => return Err(err.into()),
                };
                Ok(vec![format!("bestmove {best}")])
            }

            "setoption" => {
                self.set_option(args)?;
                Ok(Vec::new())
            }

            "stop" | "ponderhit" => Ok(Vec::new()),

            _ => {
                debug!("ignoring unknown command: {command}");
                Ok(Vec::new())
            }
        }
    }

    /// Thinking time for a `go` command.
    fn budget_for(&self, args: &[&str]) -> Result<u64> {
        let clock_key = match self.pos.side_to_move() {
            Color::White => "wtime",
            Color::Black => "btime",
        };

        let mut budget = self.engine.config().budget_ms;
        let mut pairs = args.iter();
        while let Some(&key) = pairs.next() {
            let Some(value) = pairs.next() else {
                break;
            };
            if key == "movetime" {
                return value
                    .parse()
                    .with_context(|| format!("invalid movetime {value}"));
            }
            if key == clock_key {
                let remaining: u64 = value
                    .parse()
                    .with_context(|| format!("invalid {key} {value}"))?;
                budget = budget.min((remaining / CLOCK_FRACTION).max(1));
            }
        }
        Ok(budget)
    }

    fn set_option(&mut self, args: &[&str]) -> Result<()> {
        let (Some(name_at), Some(value_at)) = (
            args.iter().position(|&a| a == "name"),
            args.iter().position(|&a| a == "value"),
        ) else {
            bail!("expected: setoption name <id> value <x>");
        };
        if value_at < name_at {
            bail!("expected: setoption name <id> value <x>");
        }
        let name = args[name_at + 1..value_at].join(" ");
        let value = args[value_at + 1..].join(" ");

        let mut config = self.engine.config().clone();
        match name.to_lowercase().as_str() {
            "seed" => config.seed = value.parse().context("invalid seed")?,
            "movetime" => config.budget_ms = value.parse().context("invalid movetime")?,
            _ => bail!("unknown option {name}"),
        }
        self.engine.set_config(config);
        Ok(())
    }
}

/// Build a position from the arguments of a `position` command.
fn parse_position(args: &[&str]) -> Result<Position> {
    let moves_at = args.iter().position(|&a| a == "moves").unwrap_or(args.len());
    let mut pos = match args.first() {
        Some(&"startpos") => Position::new(),
        Some(&"fen") => Position::from_fen(&args[1..moves_at].join(" "))?,
        _ => bail!("expected startpos or fen"),
    };

    for s in args.iter().skip(moves_at + 1) {
        let mv = pos.parse_move(s)?;
        pos.make_move(mv);
    }
    Ok(pos)
}
