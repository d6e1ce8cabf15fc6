//! Chess position with reversible move application.
//!
//! This module is the rules collaborator of the search. It wraps the `chess`
//! crate's immutable [`Board`] into a stack of snapshots so that every applied
//! move can be undone exactly, and adds the draw rules the board type does not
//! track on its own:
//! - fifty-move rule (via a halfmove clock kept per snapshot)
//! - repetition of an earlier position since the last irreversible move
//! - insufficient material
//!
//! Apply and undo calls must mirror each other. Undoing anything other than the
//! last applied move is a corrupted stack and panics immediately.

use std::fmt;
use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square};
use thiserror::Error;

use crate::constants::FIFTY_MOVE_PLIES;

/// Errors raised while setting up a position or reading moves.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),
    #[error("illegal move: {0}")]
    IllegalMove(String),
}

/// One entry of the position stack.
#[derive(Clone, Copy)]
struct Frame {
    board: Board,
    /// Plies since the last capture or pawn move
    halfmove: u32,
}

/// A chess position plus the moves that led to it from its base position.
#[derive(Clone)]
pub struct Position {
    /// Snapshots, base position first. Never empty.
    frames: Vec<Frame>,
    /// Moves applied since the base position; `frames.len() == moves.len() + 1`
    moves: Vec<ChessMove>,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("fen", &self.fen())
            .field("moves", &self.moves.len())
            .finish()
    }
}

impl Position {
    /// The standard starting position.
    pub fn new() -> Self {
        Self::from_board(Board::default(), 0)
    }

    /// Parse a position from Forsyth-Edwards Notation.
    ///
    /// The halfmove clock field is honoured for the fifty-move rule; the
    /// fullmove number is ignored.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let board =
            Board::from_str(fen).map_err(|_| PositionError::InvalidFen(fen.to_string()))?;
        let halfmove = fen
            .split_whitespace()
            .nth(4)
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(0);
        Ok(Self::from_board(board, halfmove))
    }

    fn from_board(board: Board, halfmove: u32) -> Self {
        Self {
            frames: vec![Frame { board, halfmove }],
            moves: Vec::new(),
        }
    }

    #[inline]
    fn top(&self) -> &Frame {
        &self.frames[self.frames.len() - 1]
    }

    /// The board at the current position.
    #[inline]
    pub fn board(&self) -> &Board {
        &self.top().board
    }

    /// Apply a legal move.
    pub fn make_move(&mut self, mv: ChessMove) {
        let top = *self.top();
        let irreversible =
            top.board.piece_on(mv.get_source()) == Some(Piece::Pawn) || is_capture(&top.board, mv);
        self.frames.push(Frame {
            board: top.board.make_move_new(mv),
            halfmove: if irreversible { 0 } else { top.halfmove + 1 },
        });
        self.moves.push(mv);
    }

    /// Undo the last applied move, which must be `mv`.
    ///
    /// # Panics
    ///
    /// Panics if the stack is empty or `mv` is not the last applied move. Either
    /// case means the apply/undo discipline was broken and the position can no
    /// longer be trusted.
    pub fn undo_move(&mut self, mv: ChessMove) {
        match self.moves.last() {
            Some(&last) if last == mv => {
                self.moves.pop();
                self.frames.pop();
            }
            Some(&last) => {
                panic!("move stack corrupted: undo of {mv} but last applied move was {last}")
            }
            None => panic!("move stack corrupted: undo of {mv} with no applied moves"),
        }
    }

    /// All legal moves, in generator order.
    pub fn legal_moves(&self) -> Vec<ChessMove> {
        MoveGen::new_legal(self.board()).collect()
    }

    /// Legal captures only, including en passant and capturing promotions.
    pub fn capture_moves(&self) -> Vec<ChessMove> {
        let board = self.board();
        MoveGen::new_legal(board)
            .filter(|&mv| is_capture(board, mv))
            .collect()
    }

    /// Number of legal moves for the side to move.
    pub fn legal_move_count(&self) -> usize {
        MoveGen::new_legal(self.board()).len()
    }

    pub fn side_to_move(&self) -> Color {
        self.board().side_to_move()
    }

    pub fn is_checkmate(&self) -> bool {
        self.board().status() == BoardStatus::Checkmate
    }

    /// Stalemate, fifty-move rule, repetition or insufficient material.
    pub fn is_draw(&self) -> bool {
        self.board().status() == BoardStatus::Stalemate
            || self.top().halfmove >= FIFTY_MOVE_PLIES
            || self.is_insufficient_material()
            || self.is_repetition()
    }

    /// True if the current position already occurred since the last
    /// irreversible move.
    fn is_repetition(&self) -> bool {
        let top = self.frames.len() - 1;
        let hash = self.frames[top].board.get_hash();
        let window = (self.frames[top].halfmove as usize).min(top);

        // Same side to move only: every second snapshot going back.
        self.frames[top - window..top]
            .iter()
            .rev()
            .skip(1)
            .step_by(2)
            .any(|f| f.board.get_hash() == hash)
    }

    /// Bare kings, or a single minor piece against a bare king.
    fn is_insufficient_material(&self) -> bool {
        let board = self.board();
        let heavy =
            *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
        if heavy.popcnt() != 0 {
            return false;
        }
        let minors = *board.pieces(Piece::Knight) | *board.pieces(Piece::Bishop);
        minors.popcnt() <= 1
    }

    /// Number of pieces of the given type and color.
    pub fn piece_count(&self, piece: Piece, color: Color) -> u32 {
        let board = self.board();
        (*board.pieces(piece) & *board.color_combined(color)).popcnt()
    }

    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board().piece_on(sq)
    }

    /// Zobrist hash of the current position.
    pub fn hash(&self) -> u64 {
        self.board().get_hash()
    }

    /// Moves applied since the base position, oldest first.
    pub fn history(&self) -> &[ChessMove] {
        &self.moves
    }

    /// FEN of the current position.
    pub fn fen(&self) -> String {
        self.board().to_string()
    }

    /// Parse a move in long algebraic notation (`e2e4`, `e7e8q`) and check it
    /// is legal here.
    pub fn parse_move(&self, s: &str) -> Result<ChessMove, PositionError> {
        let wanted = s.trim().to_ascii_lowercase();
        MoveGen::new_legal(self.board())
            .find(|mv| str_move(*mv) == wanted)
            .ok_or_else(|| PositionError::IllegalMove(s.to_string()))
    }
}

/// True if `mv` removes an enemy piece on `board`.
#[inline]
pub fn is_capture(board: &Board, mv: ChessMove) -> bool {
    if board.piece_on(mv.get_dest()).is_some() {
        return true;
    }
    // En passant: a pawn changing file onto an empty square.
    board.piece_on(mv.get_source()) == Some(Piece::Pawn)
        && mv.get_source().get_file() != mv.get_dest().get_file()
}

/// Long algebraic form of a move.
pub fn str_move(mv: ChessMove) -> String {
    mv.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_position_has_twenty_moves() {
        let pos = Position::new();
        assert_eq!(pos.legal_moves().len(), 20);
        assert_eq!(pos.legal_move_count(), 20);
        assert!(pos.capture_moves().is_empty());
        assert_eq!(pos.side_to_move(), Color::White);
    }

    #[test]
    fn test_make_and_undo_restores_hash() {
        let mut pos = Position::new();
        let before = pos.hash();
        let mv = pos.parse_move("e2e4").unwrap();
        pos.make_move(mv);
        assert_ne!(pos.hash(), before);
        assert_eq!(pos.history(), &[mv]);
        pos.undo_move(mv);
        assert_eq!(pos.hash(), before);
        assert!(pos.history().is_empty());
    }

    #[test]
    #[should_panic(expected = "move stack corrupted")]
    fn test_undo_wrong_move_panics() {
        let mut pos = Position::new();
        let e4 = pos.parse_move("e2e4").unwrap();
        let d4 = pos.parse_move("d2d4").unwrap();
        pos.make_move(e4);
        pos.undo_move(d4);
    }

    #[test]
    #[should_panic(expected = "move stack corrupted")]
    fn test_undo_on_empty_stack_panics() {
        let mut pos = Position::new();
        let e4 = pos.parse_move("e2e4").unwrap();
        pos.undo_move(e4);
    }

    #[test]
    fn test_parse_illegal_move() {
        let pos = Position::new();
        assert_eq!(
            pos.parse_move("e2e5"),
            Err(PositionError::IllegalMove("e2e5".to_string()))
        );
    }

    #[test]
    fn test_invalid_fen() {
        assert!(matches!(
            Position::from_fen("not a fen"),
            Err(PositionError::InvalidFen(_))
        ));
    }

    #[test]
    fn test_checkmate_detection() {
        // Fool's mate, white to move and mated.
        let pos =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(pos.is_checkmate());
        assert!(!pos.is_draw());
        assert!(pos.legal_moves().is_empty());
    }

    #[test]
    fn test_stalemate_is_draw() {
        let pos = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(!pos.is_checkmate());
        assert!(pos.is_draw());
    }

    #[test]
    fn test_insufficient_material() {
        let bare = Position::from_fen("8/8/4k3/8/8/3K4/8/8 w - - 0 1").unwrap();
        assert!(bare.is_draw());
        let knight = Position::from_fen("8/8/4k3/8/8/3KN3/8/8 w - - 0 1").unwrap();
        assert!(knight.is_draw());
        let rook = Position::from_fen("8/8/4k3/8/8/3K3R/8/8 w - - 0 1").unwrap();
        assert!(!rook.is_draw());
    }

    #[test]
    fn test_fifty_move_rule_from_fen() {
        let pos = Position::from_fen("8/8/4k3/8/8/3K3R/8/8 w - - 100 80").unwrap();
        assert!(pos.is_draw());
    }

    #[test]
    fn test_repetition_is_draw() {
        let mut pos = Position::new();
        for s in ["g1f3", "g8f6", "f3g1"] {
            let mv = pos.parse_move(s).unwrap();
            pos.make_move(mv);
            assert!(!pos.is_draw());
        }
        let mv = pos.parse_move("f6g8").unwrap();
        pos.make_move(mv);
        assert!(pos.is_draw(), "start position repeated");
    }

    #[test]
    fn test_en_passant_is_capture() {
        let pos =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let ep = pos.parse_move("e5f6").unwrap();
        assert!(is_capture(pos.board(), ep));
        assert!(pos.capture_moves().contains(&ep));
    }
}
