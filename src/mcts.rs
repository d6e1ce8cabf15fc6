//! Monte Carlo Tree Search over a persistent [`GameTree`].
//!
//! One search iteration:
//! - descend from the root to a leaf by the UCB-with-prior score
//! - replay the leaf's move path onto the shared position
//! - expand the leaf if it has been simulated before, stepping into its first child
//! - run a random playout and backpropagate its result
//! - undo every move applied, leaving the position as it was
//!
//! The search loop checks the clock only between iterations, so an iteration
//! that has started always runs to completion.

use chess::ChessMove;
use fastrand::Rng;
use log::trace;

use crate::constants::VISIT_EPSILON;
use crate::engine::SearchConfig;
use crate::eval::{evaluate, orient};
use crate::playout::simulate;
use crate::position::{str_move, Position};
use crate::replay::MoveStack;
use crate::timer::Timer;
use crate::tree::{GameTree, Node, NodeId, Outcome};

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Selection score of a child when the root has `total_sims` visits.
///
/// Unvisited children score `+inf`, so they are always tried before any
/// visited sibling regardless of their prior.
pub fn ucb_score(child: &Node, total_sims: u32, config: &SearchConfig) -> f64 {
    if child.visits == 0 {
        return f64::INFINITY;
    }
    let visits = child.visits as f64;
    let exploitation = child.wins as f64 / visits.max(1.0);
    let spread = ((total_sims.max(1) as f64).ln() / visits.max(VISIT_EPSILON)).sqrt();
    exploitation
        + config.exploration * sigmoid(config.prior_scale * child.static_value as f64 * spread)
}

/// Index of the highest-scoring child of `node`; the first one wins ties.
fn most_urgent(tree: &GameTree, node: NodeId, total_sims: u32, config: &SearchConfig) -> NodeId {
    let children = &tree[node].children;
    let mut best = children[0];
    let mut best_score = ucb_score(&tree[best], total_sims, config);
    for &child in &children[1..] {
        let score = ucb_score(&tree[child], total_sims, config);
        if score > best_score {
            best = child;
            best_score = score;
        }
    }
    best
}

/// Descend from the root to a node without children.
pub fn select(tree: &GameTree, total_sims: u32, config: &SearchConfig) -> NodeId {
    let mut node = tree.root();
    while !tree[node].is_leaf() {
        node = most_urgent(tree, node, total_sims, config);
    }
    node
}

/// Create one child per legal move of `leaf`, whose position is the current
/// state of `pos`, and return the first of them.
///
/// Move order is shuffled with `rng`. Each child gets the static evaluation
/// of its position, seen from the side to move at `leaf`. A position without
/// legal moves gets no children and `leaf` itself is returned.
pub fn expand(tree: &mut GameTree, leaf: NodeId, pos: &mut Position, rng: &mut Rng) -> NodeId {
    if let Some(&first) = tree[leaf].children.first() {
        return first;
    }

    let mut moves = pos.legal_moves();
    if moves.is_empty() {
        return leaf;
    }
    rng.shuffle(&mut moves);

    let mover = pos.side_to_move();
    let mut stack = MoveStack::new(pos);
    for mv in moves {
        stack.push(mv);
        let value = orient(evaluate(stack.position_mut()), mover);
        stack.pop();
        tree.add_child(leaf, mv, value);
    }

    tree[leaf].children[0]
}

/// Walk from `node` to the root, counting the visit and crediting wins.
///
/// The stored result belongs to the player who moved into `node`; its meaning
/// flips at every level going up because turns alternate.
pub fn backpropagate(tree: &mut GameTree, node: NodeId) {
    let Some(result) = tree[node].last_result.take() else {
        log::warn!("backpropagation from a node without a simulation result");
        return;
    };

    let mut flipped = false;
    let mut current = Some(node);
    while let Some(id) = current {
        let n = &mut tree[id];
        n.visits += 1;
        let credited = match result {
            Outcome::Win => !flipped,
            Outcome::Loss => flipped,
            Outcome::Draw => false,
        };
        if credited {
            n.wins += 1;
        }
        flipped = !flipped;
        current = n.parent;
    }
}

/// Run one full select/replay/expand/simulate/backpropagate iteration.
///
/// `pos` must be at the root's parent position when the root carries a move,
/// or at the root position otherwise. It is restored before returning.
pub fn run_iteration(tree: &mut GameTree, pos: &mut Position, rng: &mut Rng, config: &SearchConfig) {
    let total_sims = tree[tree.root()].visits;
    let leaf = select(tree, total_sims, config);

    let mut stack = MoveStack::new(pos);
    stack.replay(&tree.path_moves(leaf));

    let mut node = leaf;
    if tree[leaf].visits > 0 {
        node = expand(tree, leaf, stack.position_mut(), rng);
        // Terminal leaves come back unchanged and are simulated in place.
        if node != leaf {
            stack.extend(tree[node].mv);
        }
    }

    simulate(tree, node, stack.position_mut(), rng, config.max_playout_plies);
    backpropagate(tree, node);
    stack.unwind();
}

/// Run iterations until `timer` reports at least `budget_ms` elapsed.
///
/// Returns the number of completed iterations.
pub fn search<T: Timer + ?Sized>(
    tree: &mut GameTree,
    pos: &mut Position,
    timer: &T,
    budget_ms: u64,
    rng: &mut Rng,
    config: &SearchConfig,
) -> u32 {
    let mut iterations = 0;
    while timer.elapsed_ms() < budget_ms {
        run_iteration(tree, pos, rng, config);
        iterations += 1;
    }
    iterations
}

/// Move of the most visited root child; the first one wins ties.
pub fn best_move(tree: &GameTree) -> Option<ChessMove> {
    let mut best: Option<&Node> = None;
    for &child in &tree[tree.root()].children {
        let node = &tree[child];
        if best.is_none_or(|b| node.visits > b.visits) {
            best = Some(node);
        }
    }
    best.and_then(|n| n.mv)
}

/// Log statistics of the root's children.
pub fn dump_children(tree: &GameTree) {
    for &child in &tree[tree.root()].children {
        let node = &tree[child];
        trace!(
            "move {} v={} w={} wr={:.3} prior={}",
            node.mv.map(str_move).unwrap_or_default(),
            node.visits,
            node.wins,
            node.winrate(),
            node.static_value
        );
    }
}
