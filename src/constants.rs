//! Constants for search parameters, evaluation weights and game rules.
//!
//! This module contains all the tunable numbers of the engine. Anything that
//! can change per run is collected into [`crate::engine::SearchConfig`], whose
//! defaults come from here.

use chess::Piece;

// =============================================================================
// Selection (UCB with heuristic prior)
// =============================================================================

/// Weight of the exploration term in the selection score.
pub const EXPLORATION: f64 = 20.0;

/// Scale applied to a child's static value inside the exploration sigmoid.
pub const PRIOR_SCALE: f64 = 0.00005;

/// Lower bound on the visit count used as a divisor in the exploration term.
pub const VISIT_EPSILON: f64 = 1e-6;

// =============================================================================
// Search loop
// =============================================================================

/// Default thinking time per move, in milliseconds.
pub const DEFAULT_BUDGET_MS: u64 = 2000;

/// Default seed for the engine's random source.
pub const DEFAULT_SEED: u64 = 0x5eed_c0de;

/// Plies after which a playout is abandoned and scored as a draw.
pub const MAX_PLAYOUT_PLIES: usize = 1000;

/// Fraction of the remaining clock spent on one move when no movetime is given.
pub const CLOCK_FRACTION: u64 = 30;

// =============================================================================
// Evaluation
// =============================================================================

/// Score of a checkmate, from the winner's side.
pub const MATE_SCORE: i32 = i32::MAX;

pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 300;
pub const BISHOP_VALUE: i32 = 300;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;

/// Sentinel weight; kings are never captured.
pub const KING_VALUE: i32 = 500_000;

/// Material value of a piece.
#[inline]
pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => KING_VALUE,
    }
}

// =============================================================================
// Draw rules
// =============================================================================

/// Reversible plies after which the game is drawn (fifty full moves).
pub const FIFTY_MOVE_PLIES: u32 = 100;
