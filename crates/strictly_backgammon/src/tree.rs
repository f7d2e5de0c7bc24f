//! The move tree: every maximal way to play a roll.
//!
//! Each path from a root to a leaf is one legal [`Turn`](crate::Turn). The
//! tree is built depth-first over the distinct die values still in the pool
//! and then pruned so that only sequences of maximal length remain, which
//! encodes the rule that a player must use as many dice as possible.

use crate::movegen::legs_for_die;
use crate::{BackgammonBoard, Leg, Roll};
use serde::Serialize;
use strictly_rules::Color;
use tracing::{debug, instrument};

/// One leg in the tree and the legs that may follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveNode {
    leg: Leg,
    children: Vec<MoveNode>,
    #[serde(skip)]
    depth: usize,
}

impl MoveNode {
    fn new(leg: Leg, children: Vec<MoveNode>) -> Self {
        let depth = 1 + children.iter().map(|c| c.depth).max().unwrap_or(0);
        Self {
            leg,
            children,
            depth,
        }
    }

    /// The leg played at this node, with hit metadata.
    pub fn leg(&self) -> &Leg {
        &self.leg
    }

    /// Legs that may follow this one.
    pub fn children(&self) -> &[MoveNode] {
        &self.children
    }

    /// Returns true if the sequence ending here is complete.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn leaves(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(MoveNode::leaves).sum()
        }
    }

    fn collect_paths(&self, prefix: &mut Vec<Leg>, out: &mut Vec<Vec<Leg>>) {
        prefix.push(self.leg);
        if self.is_leaf() {
            out.push(prefix.clone());
        } else {
            for child in &self.children {
                child.collect_paths(prefix, out);
            }
        }
        prefix.pop();
    }
}

/// All maximal legal sequences for one roll on one board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveTree {
    roll: Roll,
    color: Color,
    roots: Vec<MoveNode>,
    max_legs: usize,
    forfeited: Vec<u8>,
}

impl MoveTree {
    /// Builds the tree of every maximal way the side to move on `board` can
    /// play `roll`.
    #[instrument(skip(board), fields(color = %board.side_to_move(), roll = %roll))]
    pub fn build(board: &BackgammonBoard, roll: Roll) -> Self {
        let color = board.side_to_move();
        let expanded = expand(board, color, &roll.dice());
        let max_legs = expanded.iter().map(|n| n.depth).max().unwrap_or(0);
        let mut roots = prune(expanded, max_legs);

        if max_legs == 1 && !roll.is_double() && roots.iter().any(|n| n.leg.die == roll.higher()) {
            roots.retain(|n| n.leg.die == roll.higher());
        }

        let mut forfeited = roll.dice();
        let mut node = roots.first();
        while let Some(current) = node {
            if let Some(i) = forfeited.iter().position(|&d| d == current.leg.die) {
                forfeited.remove(i);
            }
            node = current.children.first();
        }

        let tree = Self {
            roll,
            color,
            roots,
            max_legs,
            forfeited,
        };
        debug!(
            max_legs = tree.max_legs,
            leaves = tree.leaf_count(),
            forfeited = ?tree.forfeited,
            "Built move tree"
        );
        tree
    }

    /// The roll this tree plays.
    pub fn roll(&self) -> Roll {
        self.roll
    }

    /// The side playing the roll.
    pub fn color(&self) -> Color {
        self.color
    }

    /// First legs of every maximal sequence.
    pub fn roots(&self) -> &[MoveNode] {
        &self.roots
    }

    /// Number of legs every legal sequence contains.
    pub fn max_legs(&self) -> usize {
        self.max_legs
    }

    /// Dice that cannot be used and are lost for this turn.
    pub fn forfeited_dice(&self) -> &[u8] {
        &self.forfeited
    }

    /// Number of distinct legal sequences.
    pub fn leaf_count(&self) -> usize {
        if self.roots.is_empty() {
            1
        } else {
            self.roots.iter().map(MoveNode::leaves).sum()
        }
    }

    /// Every legal sequence. A single empty sequence when nothing can move.
    pub fn sequences(&self) -> Vec<Vec<Leg>> {
        if self.roots.is_empty() {
            return vec![Vec::new()];
        }
        let mut out = Vec::new();
        let mut prefix = Vec::with_capacity(self.max_legs);
        for root in &self.roots {
            root.collect_paths(&mut prefix, &mut out);
        }
        out
    }

    /// Returns true if `legs` is a complete legal sequence. Legs are matched
    /// by origin, destination and die.
    pub fn contains(&self, legs: &[Leg]) -> bool {
        legs.len() == self.max_legs && self.follow(legs).is_ok()
    }

    /// Legs selectable after playing `prefix`, or `None` if `prefix` is not
    /// the start of any legal sequence. Empty once a sequence is complete.
    pub fn options_after(&self, prefix: &[Leg]) -> Option<Vec<Leg>> {
        self.walk(prefix)
            .ok()
            .map(|(_, nodes)| nodes.iter().map(|n| n.leg).collect())
    }

    /// Walks `legs` down the tree, returning the tree's own legs (with hit
    /// metadata) or the index of the first leg that leaves the tree.
    pub(crate) fn follow(&self, legs: &[Leg]) -> Result<Vec<Leg>, usize> {
        self.walk(legs).map(|(played, _)| played)
    }

    fn walk(&self, legs: &[Leg]) -> Result<(Vec<Leg>, &[MoveNode]), usize> {
        let mut nodes = self.roots.as_slice();
        let mut played = Vec::with_capacity(legs.len());
        for (i, leg) in legs.iter().enumerate() {
            let node = nodes.iter().find(|n| n.leg.same_play(leg)).ok_or(i)?;
            played.push(node.leg);
            nodes = &node.children;
        }
        Ok((played, nodes))
    }
}

fn expand(board: &BackgammonBoard, color: Color, pool: &[u8]) -> Vec<MoveNode> {
    let mut distinct = pool.to_vec();
    distinct.dedup();

    let mut nodes = Vec::new();
    for die in distinct {
        let mut rest = pool.to_vec();
        if let Some(i) = rest.iter().position(|&d| d == die) {
            rest.remove(i);
        }
        for leg in legs_for_die(board, color, die) {
            let mut next = board.clone();
            let played = next.apply_leg(color, &leg);
            nodes.push(MoveNode::new(played, expand(&next, color, &rest)));
        }
    }
    nodes
}

fn prune(nodes: Vec<MoveNode>, required: usize) -> Vec<MoveNode> {
    nodes
        .into_iter()
        .filter(|n| n.depth == required)
        .map(|n| MoveNode::new(n.leg, prune(n.children, required.saturating_sub(1))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Location;

    #[test]
    fn test_mixed_roll_uses_both_dice() {
        let tree = MoveTree::build(&BackgammonBoard::standard(), Roll::new(3, 1).unwrap());
        assert_eq!(tree.max_legs(), 2);
        assert!(tree.forfeited_dice().is_empty());
        assert!(tree.contains(&[
            Leg::new(Location::Point(8), Location::Point(5), 3),
            Leg::new(Location::Point(6), Location::Point(5), 1),
        ]));
    }

    #[test]
    fn test_options_after_prefix() {
        let tree = MoveTree::build(&BackgammonBoard::standard(), Roll::new(6, 5).unwrap());
        let first = Leg::new(Location::Point(24), Location::Point(18), 6);
        let options = tree.options_after(&[first]).unwrap();
        assert!(options.contains(&Leg::new(Location::Point(18), Location::Point(13), 5)));
        assert!(options.iter().all(|leg| leg.die == 5));
        assert!(tree.options_after(&[Leg::new(Location::Point(1), Location::Point(7), 6)]).is_none());
    }

    #[test]
    fn test_nothing_playable_is_single_pass() {
        // White on the bar against a closed board.
        let mut board = BackgammonBoard::empty();
        for point in 19..=24 {
            board.place(Color::Black, point, 2);
        }
        board.place(Color::Black, 1, 3);
        board.place(Color::White, 6, 14);
        board.set_bar(Color::White, 1);
        let tree = MoveTree::build(&board, Roll::new(4, 2).unwrap());
        assert_eq!(tree.max_legs(), 0);
        assert_eq!(tree.forfeited_dice(), &[4, 2]);
        assert_eq!(tree.sequences(), vec![Vec::<Leg>::new()]);
        assert!(tree.contains(&[]));
        assert_eq!(tree.leaf_count(), 1);
    }
}
