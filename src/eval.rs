//! Static evaluation with a capture-resolving quiescence pass.
//!
//! Scores are white-relative: positive means White is better. Callers that
//! need the score from a particular side use [`orient`].
//!
//! Before counting material, forced capture sequences are played out by always
//! taking with the least valuable attacker, so that a position is never scored
//! in the middle of an exchange. Every move the evaluator applies is undone
//! before it returns.

use chess::{ChessMove, Color, Piece, ALL_PIECES};

use crate::constants::{piece_value, MATE_SCORE};
use crate::position::Position;
use crate::replay::MoveStack;

/// Evaluate `pos` from White's point of view.
///
/// Checkmate scores `-MATE_SCORE` when White is mated and `MATE_SCORE` when
/// Black is, a draw scores exactly 0. Otherwise the score is the material
/// balance after the quiescence pass plus the mobility of the side to move.
pub fn evaluate(pos: &mut Position) -> i32 {
    if pos.is_checkmate() {
        return match pos.side_to_move() {
            Color::White => -MATE_SCORE,
            Color::Black => MATE_SCORE,
        };
    }
    if pos.is_draw() {
        return 0;
    }

    let mut stack = MoveStack::new(pos);
    while let Some(mv) = cheapest_capture(stack.position()) {
        stack.push(mv);
    }

    let resolved = stack.position();
    let score = material(resolved) + mobility(resolved);
    stack.unwind();
    score
}

/// Turn a white-relative score into one relative to `side`.
#[inline]
pub fn orient(score: i32, side: Color) -> i32 {
    match side {
        Color::White => score,
        Color::Black => score.saturating_neg(),
    }
}

/// Material balance, White minus Black.
pub fn material(pos: &Position) -> i32 {
    ALL_PIECES
        .iter()
        .map(|&piece| {
            let white = pos.piece_count(piece, Color::White) as i32;
            let black = pos.piece_count(piece, Color::Black) as i32;
            (white - black) * piece_value(piece)
        })
        .sum()
}

/// Legal move count of the side to move, signed toward White.
fn mobility(pos: &Position) -> i32 {
    orient(pos.legal_move_count() as i32, pos.side_to_move())
}

/// The capture with the smallest attacker-minus-victim value, first one on ties.
fn cheapest_capture(pos: &Position) -> Option<ChessMove> {
    let mut best: Option<(ChessMove, i32)> = None;
    for mv in pos.capture_moves() {
        let attacker = pos.piece_on(mv.get_source()).map_or(0, piece_value);
        // En passant lands on an empty square and takes a pawn.
        let victim = pos
            .piece_on(mv.get_dest())
            .map_or(piece_value(Piece::Pawn), piece_value);
        let cost = attacker - victim;
        if best.is_none_or(|(_, c)| cost < c) {
            best = Some((mv, cost));
        }
    }
    best.map(|(mv, _)| mv)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position_is_balanced() {
        let mut pos = Position::new();
        // White to move with 20 legal moves and equal material.
        assert_eq!(evaluate(&mut pos), 20);
        assert_eq!(material(&pos), 0);
    }

    #[test]
    fn test_checkmate_scores_extreme() {
        let mut white_mated =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert_eq!(evaluate(&mut white_mated), -MATE_SCORE);

        let mut black_mated = Position::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1").unwrap();
        assert_eq!(evaluate(&mut black_mated), MATE_SCORE);
    }

    #[test]
    fn test_draw_scores_zero() {
        let mut stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert_eq!(evaluate(&mut stalemate), 0);
    }

    #[test]
    fn test_quiescence_resolves_exchange() {
        // Rxd5 exd5 leaves Black a pawn up; White king on e1 then has 5 moves.
        let mut pos = Position::from_fen("4k3/8/4p3/3p4/8/8/8/3RK3 w - - 0 1").unwrap();
        let fen = pos.fen();
        let hash = pos.hash();
        assert_eq!(material(&pos), 300);

        assert_eq!(evaluate(&mut pos), -100 + 5);
        assert_eq!(pos.fen(), fen);
        assert_eq!(pos.hash(), hash);
        assert!(pos.history().is_empty());
    }

    #[test]
    fn test_cheapest_capture_prefers_pawn_takes_queen() {
        // Both the pawn on c4 and the rook on d1 can take the queen on d5.
        let pos = Position::from_fen("4k3/8/8/3q4/2P5/8/8/3RK3 w - - 0 1").unwrap();
        let mv = cheapest_capture(&pos).unwrap();
        assert_eq!(mv.to_string(), "c4d5");
    }

    #[test]
    fn test_orient() {
        assert_eq!(orient(150, Color::White), 150);
        assert_eq!(orient(150, Color::Black), -150);
        assert_eq!(orient(-MATE_SCORE, Color::Black), MATE_SCORE);
    }
}
