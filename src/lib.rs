//! Montecarlo-Chess: a time-bounded MCTS chess engine.
//!
//! This crate provides a Monte Carlo Tree Search (MCTS) move selector for
//! chess, with a material-and-mobility prior blended into UCB selection and a
//! search tree that is carried over from one turn to the next.
//!
//! ## Modules
//!
//! - [`constants`] - Search parameters and evaluation weights
//! - [`position`] - Chess rules: reversible moves, terminal and draw detection
//! - [`replay`] - Scoped move stack over the shared position
//! - [`eval`] - Static evaluation with a quiescence pass over captures
//! - [`tree`] - Arena-backed search tree with root promotion
//! - [`mcts`] - Selection, expansion, backpropagation and the search loop
//! - [`playout`] - Random game simulation for position evaluation
//! - [`timer`] - Wall-clock budget
//! - [`engine`] - Per-game engine with tree reuse across turns
//! - [`uci`] - Universal Chess Interface front end
//!
//! ## Example
//!
//! ```
//! use montecarlo_chess::engine::{Engine, SearchConfig};
//! use montecarlo_chess::position::{str_move, Position};
//! use montecarlo_chess::timer::Stopwatch;
//!
//! // Create a new game
//! let mut pos = Position::new();
//! let mv = pos.parse_move("e2e4").unwrap();
//! pos.make_move(mv);
//!
//! // Think for 100 ms about Black's reply
//! let mut engine = Engine::new(SearchConfig { budget_ms: 100, ..Default::default() });
//! if let Ok(best) = engine.think(&mut pos, &Stopwatch::start()) {
//!     println!("Best move: {}", str_move(best));
//! }
//! ```

pub mod constants;
pub mod engine;
pub mod eval;
pub mod mcts;
pub mod playout;
pub mod position;
pub mod replay;
pub mod timer;
pub mod tree;
pub mod uci;
