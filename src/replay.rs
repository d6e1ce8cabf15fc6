//! Scoped move application on the shared position.
//!
//! Every component that changes the position does so through a [`MoveStack`].
//! The stack records what it applied and undoes it in reverse order, either
//! explicitly with [`MoveStack::unwind`] or when it goes out of scope, so the
//! position is handed back exactly as it was found on every exit path.

use chess::ChessMove;

use crate::position::Position;

/// Moves applied to a borrowed position, undone in reverse order.
pub struct MoveStack<'a> {
    pos: &'a mut Position,
    moves: Vec<ChessMove>,
}

impl<'a> MoveStack<'a> {
    pub fn new(pos: &'a mut Position) -> Self {
        Self {
            pos,
            moves: Vec::new(),
        }
    }

    /// Apply `mv` and remember it.
    #[inline]
    pub fn push(&mut self, mv: ChessMove) {
        self.pos.make_move(mv);
        self.moves.push(mv);
    }

    /// Apply a whole move sequence in order.
    pub fn replay(&mut self, moves: &[ChessMove]) {
        self.extend(moves.iter().copied());
    }

    /// Apply every move yielded by `moves`, in order.
    pub fn extend<I: IntoIterator<Item = ChessMove>>(&mut self, moves: I) {
        for mv in moves {
            self.push(mv);
        }
    }

    /// Undo the most recent move applied through this stack.
    #[inline]
    pub fn pop(&mut self) -> Option<ChessMove> {
        let mv = self.moves.pop()?;
        self.pos.undo_move(mv);
        Some(mv)
    }

    /// Undo everything applied through this stack.
    pub fn unwind(&mut self) {
        while self.pop().is_some() {}
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[inline]
    pub fn position(&self) -> &Position {
        &*self.pos
    }

    /// Position access for nested components. They must return it in the
    /// state they received it.
    #[inline]
    pub fn position_mut(&mut self) -> &mut Position {
        &mut *self.pos
    }
}

impl Drop for MoveStack<'_> {
    fn drop(&mut self) {
        // A panic here is already a corrupted stack; undoing more would abort.
        if !std::thread::panicking() {
            self.unwind();
        }
    }
}
