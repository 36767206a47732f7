//! Flat parameter serialization of a tree and its inverse.
//!
//! Two formats share the same breadth-first node order:
//!
//! - the summary format (`to_param_string`): `baseFactor, attenuationFactor,
//!   normalizedCurve` per node. It carries no topology and cannot be inverted.
//! - the record format (`to_record_string`): a [`NodeRecord::WIDTH`]-wide
//!   group per node that adds the remaining curvature values and the child
//!   count, which is enough for [`Tree::recover`] to rebuild the hierarchy.

use std::collections::VecDeque;
use std::fmt;

use crate::core::{Error, Result};

use super::node::{denormalize_angle, normalize_angle, NodeId, TreeNode, ROTATE_V_DEGREES};
use super::tree::Tree;

/// Per-node parameters of the record format
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeRecord {
    pub base_factor: f32,
    pub attenuation_factor: f32,
    /// `curve` mapped onto [0, 1]
    pub curve: f32,
    /// `curve_back` mapped onto [0, 1]
    pub curve_back: f32,
    /// `curve_v` mapped onto [0, 1]
    pub curve_v: f32,
    pub child_count: usize,
}

impl NodeRecord {
    /// Number of values per node
    pub const WIDTH: usize = 6;

    pub fn from_node(node: &TreeNode) -> Self {
        Self {
            base_factor: node.base_factor,
            attenuation_factor: node.attenuation_factor,
            curve: normalize_angle(node.curve),
            curve_back: normalize_angle(node.curve_back),
            curve_v: normalize_angle(node.curve_v),
            child_count: node.children.len(),
        }
    }

    /// Parse one group of [`Self::WIDTH`] values
    pub fn from_group(group: &[f32]) -> Result<Self> {
        if group.len() != Self::WIDTH {
            return Err(Error::MalformedRecord(format!(
                "expected {} values per node, got {}",
                Self::WIDTH,
                group.len()
            )));
        }
        if let Some(v) = group.iter().find(|v| !v.is_finite()) {
            return Err(Error::MalformedRecord(format!("non-finite value {}", v)));
        }

        let bounded = [
            ("base factor", group[0]),
            ("attenuation factor", group[1]),
            ("curve", group[2]),
            ("curve back", group[3]),
            ("curve v", group[4]),
        ];
        if let Some((name, v)) = bounded.iter().find(|(_, v)| !(0.0..=1.0).contains(v)) {
            return Err(Error::MalformedRecord(format!("{} {} outside [0, 1]", name, v)));
        }

        let count = group[5];
        let child_count = count.round();
        if (count - child_count).abs() > 1e-3 || !(0.0..=2.0).contains(&child_count) {
            return Err(Error::MalformedRecord(format!("invalid child count {}", count)));
        }

        Ok(Self {
            base_factor: group[0],
            attenuation_factor: group[1],
            curve: group[2],
            curve_back: group[3],
            curve_v: group[4],
            child_count: child_count as usize,
        })
    }

    fn to_node(self, parent: Option<NodeId>, level: u32, index: u32, segment_length: f32) -> TreeNode {
        let mut node = TreeNode::new(
            parent,
            level,
            index,
            segment_length,
            self.attenuation_factor,
            self.base_factor,
        );
        node.curve = denormalize_angle(self.curve);
        node.curve_back = denormalize_angle(self.curve_back);
        node.curve_v = denormalize_angle(self.curve_v);
        node.rotate_v = ROTATE_V_DEGREES;
        node
    }
}

impl fmt::Display for NodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.base_factor,
            self.attenuation_factor,
            self.curve,
            self.curve_back,
            self.curve_v,
            self.child_count
        )
    }
}

/// Split a line of comma-separated values into groups of `width` values
pub fn parse_param_line(line: &str, width: usize) -> Result<Vec<Vec<f32>>> {
    if width == 0 {
        return Err(Error::MalformedRecord("group width must be positive".into()));
    }
    let line = line.trim();
    if line.is_empty() {
        return Err(Error::MalformedRecord("empty record".into()));
    }

    let values = line
        .split(',')
        .enumerate()
        .map(|(i, field)| {
            let field = field.trim();
            field.parse::<f32>().map_err(|_| {
                Error::MalformedRecord(format!("field {} is not a number: '{}'", i, field))
            })
        })
        .collect::<Result<Vec<f32>>>()?;

    if values.len() % width != 0 {
        return Err(Error::MalformedRecord(format!(
            "{} values do not split into groups of {}",
            values.len(),
            width
        )));
    }

    Ok(values.chunks(width).map(<[f32]>::to_vec).collect())
}

impl Tree {
    /// Summary string of per-node `(baseFactor, attenuationFactor,
    /// normalizedCurve)` tuples in breadth-first order, truncated to the first
    /// `limit` nodes when given.
    pub fn to_param_string(&self, limit: Option<usize>) -> String {
        let limit = limit.unwrap_or(usize::MAX);
        self.bfs_order()
            .into_iter()
            .take(limit)
            .map(|id| {
                let node = self.node(id);
                format!(
                    "{},{},{}",
                    node.base_factor,
                    node.attenuation_factor,
                    normalize_angle(node.curve)
                )
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Records of every node in breadth-first order
    pub fn to_records(&self) -> Vec<NodeRecord> {
        self.bfs_order()
            .into_iter()
            .map(|id| NodeRecord::from_node(self.node(id)))
            .collect()
    }

    /// Record-format string accepted by [`parse_param_line`] and [`Tree::recover`]
    pub fn to_record_string(&self) -> String {
        self.to_records()
            .iter()
            .map(NodeRecord::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Rebuild a tree from breadth-first parameter groups.
    ///
    /// Levels and indices are derived from the topology: the first child of
    /// a node continues its branch and the second opens the next level.
    /// Branches may stop early, so pruned predictions still recover.
    pub fn recover(groups: &[Vec<f32>]) -> Result<Self> {
        let records = groups
            .iter()
            .map(|g| NodeRecord::from_group(g))
            .collect::<Result<Vec<_>>>()?;
        Self::from_records(&records)
    }

    /// Rebuild a tree from breadth-first node records
    pub fn from_records(records: &[NodeRecord]) -> Result<Self> {
        let first = records
            .first()
            .ok_or_else(|| Error::MalformedRecord("no node records".into()))?;

        let mut nodes = vec![first.to_node(None, 0, 0, Tree::trunk_segment_length())];
        let mut queue = VecDeque::from([NodeId(0)]);

        // Nodes are created in the same breadth-first order the records were
        // written, so node k always pairs with record k.
        while let Some(id) = queue.pop_front() {
            let child_count = records[id.0].child_count;
            if child_count == 0 {
                continue;
            }

            let node = &nodes[id.0];
            if node.is_leaf() {
                return Err(Error::MalformedRecord(format!("leaf node {} has children", id.0)));
            }
            if node.is_last_segment() {
                return Err(Error::MalformedRecord(format!(
                    "node {} extends past the end of its branch",
                    id.0
                )));
            }

            let (level, index, segment_length) = (node.level, node.index, node.segment_length);
            let mut slots = vec![(level, index + 1)];
            if child_count == 2 {
                slots.push((level + 1, 0));
            }

            for (child_level, child_index) in slots {
                let child_id = NodeId(nodes.len());
                let record = records.get(child_id.0).ok_or_else(|| {
                    Error::MalformedRecord(format!("topology needs more than {} records", records.len()))
                })?;
                nodes.push(record.to_node(Some(id), child_level, child_index, segment_length));
                nodes[id.0].children.push(child_id);
                queue.push_back(child_id);
            }
        }

        if nodes.len() != records.len() {
            return Err(Error::MalformedRecord(format!(
                "{} records left over after rebuilding {} nodes",
                records.len() - nodes.len(),
                nodes.len()
            )));
        }

        Ok(Tree::from_nodes(nodes))
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_param_string(None))
    }
}
