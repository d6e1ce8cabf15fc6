//! Monte Carlo playouts (random game simulation).
//!
//! A playout plays uniformly random legal moves until the game ends, then
//! reports the result relative to the player who made the move leading into
//! the starting position. The playout runs as a loop over an explicit
//! [`MoveStack`], so game length never turns into recursion depth, and every
//! move is undone before returning.

use fastrand::Rng;

use crate::position::Position;
use crate::replay::MoveStack;
use crate::tree::{GameTree, NodeId, Outcome};

/// Perform a random playout from `pos` and restore it afterwards.
///
/// The result is `Win` if the side *not* to move at `pos` ends up delivering
/// mate, `Loss` if it gets mated, and `Draw` for any drawn ending or when
/// `max_plies` is reached.
pub fn playout(pos: &mut Position, rng: &mut Rng, max_plies: usize) -> Outcome {
    let mut stack = MoveStack::new(pos);
    let mut result = Outcome::Win;

    let outcome = loop {
        let p = stack.position();
        if p.is_checkmate() {
            break result;
        }
        if p.is_draw() || stack.len() >= max_plies {
            break Outcome::Draw;
        }

        let moves = p.legal_moves();
        let mv = moves[rng.usize(..moves.len())];
        stack.push(mv);
        result = result.flip();
    };

    stack.unwind();
    outcome
}

/// Simulate from `node`, whose position is the current state of `pos`.
///
/// The outcome is stored on the node for [`crate::mcts::backpropagate`].
pub fn simulate(
    tree: &mut GameTree,
    node: NodeId,
    pos: &mut Position,
    rng: &mut Rng,
    max_plies: usize,
) -> Outcome {
    let outcome = playout(pos, rng, max_plies);
    tree[node].last_result = Some(outcome);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MAX_PLAYOUT_PLIES;

    #[test]
    fn test_playout_restores_position() {
        let mut pos = Position::new();
        let fen = pos.fen();
        let hash = pos.hash();
        let mut rng = Rng::with_seed(7);
        for _ in 0..3 {
            playout(&mut pos, &mut rng, MAX_PLAYOUT_PLIES);
            assert_eq!(pos.fen(), fen);
            assert_eq!(pos.hash(), hash);
            assert!(pos.history().is_empty());
        }
    }

    #[test]
    fn test_playout_is_reproducible() {
        let mut pos = Position::new();
        let a = playout(&mut pos, &mut Rng::with_seed(42), MAX_PLAYOUT_PLIES);
        let b = playout(&mut pos, &mut Rng::with_seed(42), MAX_PLAYOUT_PLIES);
        assert_eq!(a, b);
    }

    #[test]
    fn test_checkmated_side_to_move_is_a_win() {
        // White is mated, so the move into this position (Black's) won.
        let mut pos =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert_eq!(playout(&mut pos, &mut Rng::with_seed(1), 10), Outcome::Win);
    }

    #[test]
    fn test_forced_capture_into_bare_kings_draws() {
        // White's only move is Kxg1, which leaves bare kings.
        let mut pos = Position::from_fen("8/8/8/8/8/6k1/8/6rK w - - 0 1").unwrap();
        assert_eq!(pos.legal_moves().len(), 1);
        assert_eq!(playout(&mut pos, &mut Rng::with_seed(3), 10), Outcome::Draw);
    }

    #[test]
    fn test_ply_cap_scores_draw() {
        let mut pos = Position::new();
        assert_eq!(playout(&mut pos, &mut Rng::with_seed(5), 0), Outcome::Draw);
    }

    #[test]
    fn test_simulate_records_result() {
        let mut pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let mut tree = GameTree::new(None);
        let root = tree.root();
        let outcome = simulate(&mut tree, root, &mut pos, &mut Rng::with_seed(9), 50);
        assert_eq!(outcome, Outcome::Draw);
        assert_eq!(tree[root].last_result, Some(Outcome::Draw));
    }
}
