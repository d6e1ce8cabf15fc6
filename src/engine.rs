//! Move-selection engine with tree reuse across turns.
//!
//! The engine owns the search tree for the lifetime of one game. Each turn:
//! 1. [`Engine::initialize`] promotes the subtree the game actually entered
//!    (our previous move, then the opponent's reply) to be the new root, or
//!    starts a fresh root when that path was never expanded.
//! 2. [`Engine::search`] runs MCTS iterations until the time budget is spent.
//! 3. [`Engine::best_move`] returns the most visited root child.
//!
//! [`Engine::think`] bundles the three steps and hands the position back
//! unchanged.

use chess::{ChessMove, Color};
use fastrand::Rng;
use log::{debug, info};
use thiserror::Error;

use crate::constants::{
    DEFAULT_BUDGET_MS, DEFAULT_SEED, EXPLORATION, MAX_PLAYOUT_PLIES, PRIOR_SCALE,
};
use crate::mcts;
use crate::position::{str_move, Position};
use crate::timer::Timer;
use crate::tree::GameTree;

/// Errors returned by the engine's decision API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("search tree not initialized; call initialize first")]
    NotInitialized,
    #[error("position is terminal, there is no move to search")]
    TerminalPosition,
    #[error("root has no children; search budget too small to expand it")]
    NoChildren,
}

/// Search parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// Weight of the exploration term
    pub exploration: f64,
    /// Scale of the static prior inside the exploration sigmoid
    pub prior_scale: f64,
    /// Thinking time per move in milliseconds
    pub budget_ms: u64,
    /// Seed for expansion order and playouts
    pub seed: u64,
    /// Playouts longer than this are scored as draws
    pub max_playout_plies: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            exploration: EXPLORATION,
            prior_scale: PRIOR_SCALE,
            budget_ms: DEFAULT_BUDGET_MS,
            seed: DEFAULT_SEED,
            max_playout_plies: MAX_PLAYOUT_PLIES,
        }
    }
}

/// MCTS engine for one game.
pub struct Engine {
    config: SearchConfig,
    tree: Option<GameTree>,
    /// Hash and ply count of the position the root stands for
    root_key: Option<(u64, usize)>,
    rng: Rng,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

impl Engine {
    pub fn new(config: SearchConfig) -> Self {
        let rng = Rng::with_seed(config.seed);
        Self {
            config,
            tree: None,
            root_key: None,
            rng,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Replace the configuration and reseed the random source.
    pub fn set_config(&mut self, config: SearchConfig) {
        self.rng = Rng::with_seed(config.seed);
        self.config = config;
    }

    /// The persistent tree, once a turn has been initialized.
    pub fn tree(&self) -> Option<&GameTree> {
        self.tree.as_ref()
    }

    /// Forget the tree so the next turn starts from scratch.
    pub fn new_game(&mut self) {
        self.tree = None;
        self.root_key = None;
    }

    /// Prepare the tree for a turn at `pos`.
    ///
    /// If the root ends up labelled with the opponent's last move, that move is
    /// undone on `pos` so that replaying root-to-leaf paths lands on the right
    /// positions. [`Engine::restore_position`] puts it back.
    pub fn initialize(&mut self, pos: &mut Position) {
        let key = (pos.hash(), pos.history().len());
        let history = pos.history();
        let ours = history.len().checked_sub(2).map(|i| history[i]);
        let theirs = history.last().copied();

        let tree = match (self.tree.take(), ours, theirs) {
            (Some(tree), _, last)
                if self.root_key == Some(key) && tree[tree.root()].mv == last =>
            {
                debug!(
                    "position unchanged: keeping tree with {} visits",
                    tree[tree.root()].visits
                );
                tree
            }
            (None, _, _) => {
                debug!("new game: fresh search tree");
                GameTree::new(None)
            }
            (Some(mut tree), Some(ours), Some(theirs)) => {
                match tree.descendant(tree.root(), &[ours, theirs]) {
                    Some(node) => {
                        tree.promote(node);
                        debug!(
                            "reusing subtree after {} {}: {} nodes, {} visits",
                            str_move(ours),
                            str_move(theirs),
                            tree.len(),
                            tree[tree.root()].visits
                        );
                        tree
                    }
                    None => {
                        debug!("{} {} not in tree: cold start", str_move(ours), str_move(theirs));
                        GameTree::new(Some(theirs))
                    }
                }
            }
            (Some(_), None, last) => {
                debug!("history too short for reuse: cold start");
                GameTree::new(last)
            }
            (Some(_), Some(_), None) => GameTree::new(None),
        };

        if let Some(mv) = tree[tree.root()].mv {
            pos.undo_move(mv);
        }
        self.tree = Some(tree);
        self.root_key = Some(key);
    }

    /// Re-apply the root's move undone by [`Engine::initialize`].
    pub fn restore_position(&self, pos: &mut Position) {
        if let Some(mv) = self.tree.as_ref().and_then(|t| t[t.root()].mv) {
            pos.make_move(mv);
        }
    }

    /// Search until `timer` reports `budget_ms` elapsed; returns the number of
    /// iterations run.
    pub fn search<T: Timer + ?Sized>(
        &mut self,
        pos: &mut Position,
        timer: &T,
        budget_ms: u64,
    ) -> Result<u32, SearchError> {
        let tree = self.tree.as_mut().ok_or(SearchError::NotInitialized)?;
        Ok(mcts::search(tree, pos, timer, budget_ms, &mut self.rng, &self.config))
    }

    /// Run extra iterations until the root has children, so that even an
    /// exhausted budget yields a move. Takes at most two: one to simulate a
    /// fresh root and one to expand it.
    fn expand_root(&mut self, pos: &mut Position) -> u32 {
        let Some(tree) = self.tree.as_mut() else {
            return 0;
        };
        let mut extra = 0;
        while tree[tree.root()].is_leaf() && extra < 2 {
            mcts::run_iteration(tree, pos, &mut self.rng, &self.config);
            extra += 1;
        }
        if extra > 0 {
            debug!("budget exhausted before root expansion: ran {extra} extra iterations");
        }
        extra
    }

    /// The most visited root child.
    pub fn best_move(&self) -> Result<ChessMove, SearchError> {
        let tree = self.tree.as_ref().ok_or(SearchError::NotInitialized)?;
        mcts::best_move(tree).ok_or(SearchError::NoChildren)
    }

    /// Play one turn: initialize, search for the configured budget, decide.
    ///
    /// `pos` is the same before and after the call.
    pub fn think<T: Timer + ?Sized>(
        &mut self,
        pos: &mut Position,
        timer: &T,
    ) -> Result<ChessMove, SearchError> {
        let budget_ms = self.config.budget_ms;
        self.think_for(pos, timer, budget_ms)
    }

    /// [`Engine::think`] with an explicit budget.
    pub fn think_for<T: Timer + ?Sized>(
        &mut self,
        pos: &mut Position,
        timer: &T,
        budget_ms: u64,
    ) -> Result<ChessMove, SearchError> {
        if pos.legal_move_count() == 0 {
            return Err(SearchError::TerminalPosition);
        }

        self.initialize(pos);
        let searched = self
            .search(pos, timer, budget_ms)
            .map(|n| n + self.expand_root(pos));
        self.restore_position(pos);
        let iterations = searched?;

        let best = self.best_move()?;
        if let Some(tree) = &self.tree {
            let root = &tree[tree.root()];
            info!(
                "{} plays {} after {} iterations in {} ms (root visits {}, {} nodes)",
                side_name(pos.side_to_move()),
                str_move(best),
                iterations,
                timer.elapsed_ms(),
                root.visits,
                tree.len()
            );
            mcts::dump_children(tree);
        }
        Ok(best)
    }
}

fn side_name(color: Color) -> &'static str {
    match color {
        Color::White => "white",
        Color::Black => "black",
    }
}
