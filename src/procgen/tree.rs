//! Stochastic recursive tree grammar.
//!
//! A tree is a hierarchy of fixed-length segments. Each branch is a chain of
//! `NUM_SEGMENTS` nodes; while a chain grows it may spawn side branches of
//! the next order, and branches on the last order end in a leaf. Nodes live
//! in a flat arena and reference each other by [`NodeId`].

use std::collections::VecDeque;

use crate::core::{Error, Result};

use super::node::{NodeId, TreeNode, NUM_LEVELS, NUM_SEGMENTS, ROTATE_V_DEGREES};
use super::rng::TreeRng;
use super::shape::shape_ratio;

/// Total trunk length in world units
pub const TRUNK_LENGTH: f32 = 10.0;

/// Probability threshold: an eligible node branches when a uniform draw exceeds it
const BRANCH_THRESHOLD: f32 = 0.4;

/// Shape profile used for first-order branch lengths (tend flame)
const BRANCH_SHAPE: u8 = 7;

/// Owner of the node arena. Replaced wholesale on every generation.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    /// Segment length of the trunk
    pub fn trunk_segment_length() -> f32 {
        TRUNK_LENGTH / NUM_SEGMENTS as f32
    }

    /// Build a tree from an already-linked arena. `nodes[0]` must be the root.
    pub(crate) fn from_nodes(nodes: Vec<TreeNode>) -> Self {
        debug_assert!(!nodes.is_empty());
        Self { nodes }
    }

    /// Generate a random tree.
    ///
    /// Nodes are expanded in breadth-first order and all random draws happen
    /// in that order, so the result is fully determined by the RNG state.
    pub fn generate_random(rng: &mut TreeRng) -> Self {
        let mut root = TreeNode::new(None, 0, 0, Self::trunk_segment_length(), 1.0, 0.0);
        randomize_segment(&mut root, rng);

        let mut tree = Self { nodes: vec![root] };
        let mut queue = VecDeque::from([tree.root()]);

        while let Some(id) = queue.pop_front() {
            let node = &tree.nodes[id.0];
            if node.is_leaf() || node.is_last_segment() {
                continue;
            }
            let (level, index, segment_length, base_factor) =
                (node.level, node.index, node.segment_length, node.base_factor);
            let (curve, curve_back) = (node.curve, node.curve_back);

            // Extend the branch
            let mut child = TreeNode::new(Some(id), level, index + 1, segment_length, 1.0, base_factor);
            child.curve = curve;
            child.curve_back = curve_back;
            randomize_segment(&mut child, rng);
            queue.push_back(tree.push_child(id, child));

            if !can_branch(level, index, base_factor) || rng.next_float() <= BRANCH_THRESHOLD {
                continue;
            }

            let attenuation_factor = branch_attenuation(level, index, base_factor, rng);
            let mut branch = TreeNode::new(Some(id), level + 1, 0, segment_length, attenuation_factor, 0.0);
            randomize_segment(&mut branch, rng);
            queue.push_back(tree.push_child(id, branch));
        }

        log::debug!(
            "Generated tree: {} nodes, {} leaves",
            tree.len(),
            tree.leaf_count()
        );
        tree
    }

    /// Generate random trees until `accept` approves one.
    ///
    /// Gives up with [`Error::RetryBudgetExhausted`] after `max_attempts`
    /// rejected trees.
    pub fn generate_until<F>(rng: &mut TreeRng, max_attempts: u32, mut accept: F) -> Result<Self>
    where
        F: FnMut(&Tree) -> bool,
    {
        for attempt in 1..=max_attempts {
            let tree = Self::generate_random(rng);
            if accept(&tree) {
                return Ok(tree);
            }
            log::debug!("Rejected generated tree (attempt {}/{})", attempt, max_attempts);
        }
        Err(Error::RetryBudgetExhausted { attempts: max_attempts })
    }

    fn push_child(&mut self, parent: NodeId, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Root node ID
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Child nodes of `id` in slot order (continuation first)
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> + '_ {
        self.node(id).children.iter().map(|&c| self.node(c))
    }

    /// All nodes in arena order
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    #[cfg(test)]
    pub(crate) fn nodes_mut(&mut self) -> &mut [TreeNode] {
        &mut self.nodes
    }

    /// Number of nodes (segments plus leaves)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaf terminators
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Number of nodes rendered as branch segments
    pub fn segment_count(&self) -> usize {
        self.len() - self.leaf_count()
    }

    /// Node IDs in breadth-first order, children in slot order
    pub fn bfs_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut queue = VecDeque::from([self.root()]);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            queue.extend(self.node(id).children.iter().copied());
        }
        order
    }
}

/// Whether a node on `level` at `index` may spawn a side branch
fn can_branch(level: u32, index: u32, base_factor: f32) -> bool {
    level < NUM_LEVELS && (level > 0 || (index + 1) as f32 > NUM_SEGMENTS as f32 * base_factor)
}

/// Length/width scale for a branch spawned at `index` of a `level` branch
fn branch_attenuation(level: u32, index: u32, base_factor: f32, rng: &mut TreeRng) -> f32 {
    let segments = NUM_SEGMENTS as f32;
    if level == 0 {
        let remaining = (NUM_SEGMENTS - index - 1) as f32 / (segments * (1.0 - base_factor));
        rng.range(0.5, 0.8) * shape_ratio(BRANCH_SHAPE, remaining)
    } else {
        rng.range(0.3, 0.6) * (segments - index as f32 * 0.9) / segments
    }
}

/// Draw the stochastic fields of a freshly created node
fn randomize_segment(node: &mut TreeNode, rng: &mut TreeRng) {
    if node.level == 0 && node.index == 0 {
        node.base_factor = rng.range(0.0, 0.5);
    }

    let half = NUM_SEGMENTS as f32 / 2.0;
    if node.index == 0 {
        node.curve = rng.range(-90.0, 90.0);
        node.curve_back = rng.range(-90.0, 90.0);
        if node.level > 0 {
            node.curve_v = rng.range(-90.0, 90.0);
        }
    } else if (node.index as f32) < half {
        node.curve_v = rng.range(-5.0, 5.0) + node.curve / half;
    } else {
        node.curve_v = rng.range(-5.0, 5.0) + node.curve_back / half;
    }

    node.rotate_v = ROTATE_V_DEGREES;
}
