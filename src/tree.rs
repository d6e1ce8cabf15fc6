//! Persistent search tree.
//!
//! Nodes live in an arena owned by [`GameTree`] and refer to each other by
//! [`NodeId`]. Children are owned through the parent's `children` list; the
//! `parent` index is only a back-reference used to rebuild paths and to walk
//! upwards during backpropagation.
//!
//! The tree survives across turns. When both sides have moved, the subtree the
//! game actually entered is promoted to be the new root and the rest of the
//! arena is dropped.

use std::collections::VecDeque;
use std::ops::{Index, IndexMut};

use chess::ChessMove;

/// Index of a node inside a [`GameTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// Ternary result of a playout, relative to the player who made the move
/// leading into the simulated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    /// The same result seen from the other player.
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Draw => Outcome::Draw,
            Outcome::Loss => Outcome::Win,
        }
    }
}

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct Node {
    /// Move that produced this node from its parent (`None` for a fresh game root)
    pub mv: Option<ChessMove>,
    /// Non-owning back-reference; `None` for the root
    pub parent: Option<NodeId>,
    /// One child per legal move, in expansion order
    pub children: Vec<NodeId>,
    /// Completed simulations through this node
    pub visits: u32,
    /// Simulations won from the perspective of the player who made `mv`
    pub wins: u32,
    /// Result of the latest simulation started here, consumed by backpropagation
    pub last_result: Option<Outcome>,
    /// Heuristic prior assigned at expansion time
    pub static_value: i32,
}

impl Node {
    fn new(mv: Option<ChessMove>, parent: Option<NodeId>, static_value: i32) -> Self {
        Self {
            mv,
            parent,
            children: Vec::new(),
            visits: 0,
            wins: 0,
            last_result: None,
            static_value,
        }
    }

    /// Calculate the winrate for this node.
    #[inline]
    pub fn winrate(&self) -> f64 {
        if self.visits > 0 {
            self.wins as f64 / self.visits as f64
        } else {
            -0.1
        }
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Arena of nodes plus the index of the current root.
#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Index<NodeId> for GameTree {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }
}

impl IndexMut<NodeId> for GameTree {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }
}

impl GameTree {
    /// Create a tree holding a single unexpanded root labelled with `mv`.
    pub fn new(mv: Option<ChessMove>) -> Self {
        Self {
            nodes: vec![Node::new(mv, None, 0)],
            root: NodeId(0),
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes held by the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Append a child for `mv` under `parent`.
    pub fn add_child(&mut self, parent: NodeId, mv: ChessMove, static_value: i32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(Some(mv), Some(parent), static_value));
        self[parent].children.push(id);
        id
    }

    /// The child of `parent` reached by `mv`, if it was expanded.
    pub fn child(&self, parent: NodeId, mv: ChessMove) -> Option<NodeId> {
        self[parent]
            .children
            .iter()
            .copied()
            .find(|&c| self[c].mv == Some(mv))
    }

    /// Follow `moves` downwards from `from`.
    pub fn descendant(&self, from: NodeId, moves: &[ChessMove]) -> Option<NodeId> {
        moves
            .iter()
            .try_fold(from, |node, &mv| self.child(node, mv))
    }

    /// Moves leading from the root's parent position to `id`, in play order.
    ///
    /// Includes the root's own move when it has one, since the position is
    /// kept one ply before the root in that case.
    pub fn path_moves(&self, id: NodeId) -> Vec<ChessMove> {
        let mut moves = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            if let Some(mv) = self[node].mv {
                moves.push(mv);
            }
            current = self[node].parent;
        }
        moves.reverse();
        moves
    }

    /// Make `new_root` the root, keeping its subtree and statistics.
    ///
    /// The subtree is copied breadth-first into a fresh arena so that child
    /// order is preserved and every node outside it is released.
    pub fn promote(&mut self, new_root: NodeId) {
        let mut nodes: Vec<Node> = Vec::new();
        let mut queue = VecDeque::from([(new_root, None::<NodeId>)]);

        while let Some((old, parent)) = queue.pop_front() {
            let id = NodeId(nodes.len());
            let source = &self[old];
            nodes.push(Node {
                parent,
                children: Vec::with_capacity(source.children.len()),
                ..source.clone_stats()
            });
            if let Some(p) = parent {
                nodes[p.0].children.push(id);
            }
            queue.extend(source.children.iter().map(|&c| (c, Some(id))));
        }

        self.nodes = nodes;
        self.root = NodeId(0);
    }
}

impl Node {
    /// Copy of the node without its links.
    fn clone_stats(&self) -> Node {
        Node {
            mv: self.mv,
            parent: None,
            children: Vec::new(),
            visits: self.visits,
            wins: self.wins,
            last_result: self.last_result,
            static_value: self.static_value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn mv(pos: &Position, s: &str) -> ChessMove {
        pos.parse_move(s).unwrap()
    }

    #[test]
    fn test_new_tree_has_bare_root() {
        let tree = GameTree::new(None);
        let root = &tree[tree.root()];
        assert_eq!(tree.len(), 1);
        assert!(root.mv.is_none());
        assert!(root.parent.is_none());
        assert!(root.is_leaf());
        assert_eq!(root.visits, 0);
    }

    #[test]
    fn test_child_lookup_and_path() {
        let mut pos = Position::new();
        let e4 = mv(&pos, "e2e4");
        let d4 = mv(&pos, "d2d4");
        let mut tree = GameTree::new(None);
        let root = tree.root();
        let a = tree.add_child(root, e4, 10);
        tree.add_child(root, d4, 20);
        pos.make_move(e4);
        let e5 = mv(&pos, "e7e5");
        let b = tree.add_child(a, e5, -5);

        assert_eq!(tree.child(root, e4), Some(a));
        assert_eq!(tree.child(a, e5), Some(b));
        assert_eq!(tree.child(root, e5), None);
        assert_eq!(tree.descendant(root, &[e4, e5]), Some(b));
        assert_eq!(tree.descendant(root, &[d4, e5]), None);
        assert_eq!(tree.path_moves(b), vec![e4, e5]);
        assert_eq!(tree[b].static_value, -5);
    }

    #[test]
    fn test_promote_keeps_subtree_and_drops_rest() {
        let mut pos = Position::new();
        let e4 = mv(&pos, "e2e4");
        let d4 = mv(&pos, "d2d4");
        let mut tree = GameTree::new(None);
        let root = tree.root();
        let a = tree.add_child(root, e4, 0);
        let other = tree.add_child(root, d4, 0);
        let mut side = pos.clone();
        side.make_move(d4);
        tree.add_child(other, mv(&side, "d7d5"), 0);

        pos.make_move(e4);
        let e5 = mv(&pos, "e7e5");
        let c5 = mv(&pos, "c7c5");
        let b = tree.add_child(a, e5, 7);
        tree.add_child(a, c5, 3);
        pos.make_move(e5);
        let nf3 = mv(&pos, "g1f3");
        let nc3 = mv(&pos, "b1c3");
        tree.add_child(b, nf3, 1);
        tree.add_child(b, nc3, 2);
        tree[b].visits = 9;
        tree[b].wins = 4;

        tree.promote(b);

        let root = tree.root();
        assert_eq!(tree.len(), 3);
        assert!(tree[root].parent.is_none());
        assert_eq!(tree[root].mv, Some(e5));
        assert_eq!(tree[root].visits, 9);
        assert_eq!(tree[root].wins, 4);
        assert_eq!(tree[root].static_value, 7);
        let kids: Vec<_> = tree[root].children.iter().map(|&c| tree[c].mv).collect();
        assert_eq!(kids, vec![Some(nf3), Some(nc3)]);
        for &c in &tree[root].children {
            assert_eq!(tree[c].parent, Some(root));
        }
        assert_eq!(tree.path_moves(tree.child(root, nc3).unwrap()), vec![e5, nc3]);
    }

    #[test]
    fn test_outcome_flip() {
        assert_eq!(Outcome::Win.flip(), Outcome::Loss);
        assert_eq!(Outcome::Loss.flip(), Outcome::Win);
        assert_eq!(Outcome::Draw.flip(), Outcome::Draw);
    }
}
