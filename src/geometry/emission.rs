//! Geometry emission for a generated tree.
//!
//! Walks the hierarchy depth-first with an explicit stack of frames. Each
//! frame carries the accumulated transform at the base of its node, so the
//! stack never grows past one pending side branch per segment plus the
//! current continuation.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::procgen::{NodeId, Tree, TreeNode, NUM_SEGMENTS};

use super::emitter::{GeometryEmitter, MeshBuilder, VERTICES_PER_LEAF, VERTICES_PER_SEGMENT};
use super::vertex::Vertex;

/// Trunk base width in tapered mode
pub const BASE_WIDTH: f32 = 0.3;
/// Stroke width for every segment in fixed mode
pub const FIXED_WIDTH: f32 = 0.03;
/// Floor on tapered segment widths
pub const MIN_SEGMENT_WIDTH: f32 = 0.005;
/// Leaf disc length
pub const LEAF_LENGTH: f32 = 0.1;
/// Tilt of a leaf away from its branch (degrees)
pub const LEAF_TILT_DEGREES: f32 = 75.0;

pub const TRUNK_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
pub const BRANCH_COLOR: Vec4 = Vec4::new(0.0, 1.0, 0.0, 1.0);
pub const LEAF_COLOR: Vec4 = Vec4::new(0.0, 0.0, 1.0, 1.0);

/// Points this far below y = 0 count as underground
const GROUND_TOLERANCE: f32 = 1e-4;

/// How segment widths are chosen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WidthMode {
    /// Widths taper along each branch and shrink with attenuation
    #[default]
    Tapered,
    /// Every segment uses [`FIXED_WIDTH`] (thin uniform strokes for training renders)
    Fixed,
}

/// Summary of one emission pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EmitStats {
    pub segments: usize,
    pub leaves: usize,
    /// Some segment end or leaf centre lies below the ground plane
    pub underground: bool,
}

impl EmitStats {
    /// Nodes visited (segments plus leaves)
    pub fn nodes(&self) -> usize {
        self.segments + self.leaves
    }

    /// Vertices a [`MeshBuilder`] receives for this pass
    pub fn vertex_count(&self) -> usize {
        self.segments * VERTICES_PER_SEGMENT + self.leaves * VERTICES_PER_LEAF
    }
}

/// Local frame at the base of `node`, given the frame at its attachment point
pub fn node_frame(parent: &Mat4, node: &TreeNode) -> Mat4 {
    *parent
        * Mat4::from_rotation_y(node.rotate_v.to_radians())
        * Mat4::from_rotation_z(node.curve_v.to_radians())
}

struct Frame {
    id: NodeId,
    transform: Mat4,
    length: f32,
    width: f32,
}

/// Emit every node of `tree` into `emitter`
pub fn emit_tree<E: GeometryEmitter>(tree: &Tree, mode: WidthMode, emitter: &mut E) -> EmitStats {
    let base_width = match mode {
        WidthMode::Tapered => BASE_WIDTH,
        WidthMode::Fixed => FIXED_WIDTH,
    };

    let mut stats = EmitStats::default();
    let mut stack = vec![Frame {
        id: tree.root(),
        transform: Mat4::IDENTITY,
        length: Tree::trunk_segment_length(),
        width: base_width,
    }];

    while let Some(frame) = stack.pop() {
        let node = tree.node(frame.id);

        if node.is_leaf() {
            let centre = emit_leaf(&frame.transform, node, emitter);
            stats.leaves += 1;
            stats.underground |= centre.y < -GROUND_TOLERANCE;
            continue;
        }

        let transform = node_frame(&frame.transform, node);
        let (w1, w2) = match mode {
            WidthMode::Fixed => (frame.width, frame.width),
            WidthMode::Tapered => (
                tapered_width(frame.width, node.index),
                tapered_width(frame.width, node.index + 1),
            ),
        };

        let color = if node.level == 0 { TRUNK_COLOR } else { BRANCH_COLOR };
        emitter.emit_segment(&transform, w1 * 0.5, w2 * 0.5, frame.length, color);
        stats.segments += 1;

        let end = transform * Mat4::from_translation(Vec3::Y * frame.length);
        stats.underground |= end.w_axis.y < -GROUND_TOLERANCE;

        if let Some(branch) = node.branch() {
            let attenuation = tree.node(branch).attenuation_factor;
            let width = match mode {
                WidthMode::Fixed => frame.width,
                WidthMode::Tapered => (w1 * attenuation).max(MIN_SEGMENT_WIDTH),
            };
            stack.push(Frame {
                id: branch,
                transform: end,
                length: frame.length * attenuation,
                width,
            });
        }
        if let Some(next) = node.continuation() {
            stack.push(Frame {
                id: next,
                transform: end,
                length: frame.length,
                width: frame.width,
            });
        }
    }

    stats
}

/// Width of a segment boundary `index` segments up a branch of base `width`
fn tapered_width(width: f32, index: u32) -> f32 {
    let remaining = NUM_SEGMENTS.saturating_sub(index) as f32 / NUM_SEGMENTS as f32;
    (width - MIN_SEGMENT_WIDTH) * remaining + MIN_SEGMENT_WIDTH
}

/// Emit a leaf disc, returning its world-space centre
fn emit_leaf<E: GeometryEmitter>(parent: &Mat4, node: &TreeNode, emitter: &mut E) -> Vec3 {
    let transform = *parent
        * Mat4::from_rotation_y(node.rotate_v.to_radians())
        * Mat4::from_rotation_z(LEAF_TILT_DEGREES.to_radians())
        * Mat4::from_translation(Vec3::Y * (LEAF_LENGTH * 0.5));
    emitter.emit_leaf(
        &transform,
        Vec2::new(LEAF_LENGTH * 0.25, LEAF_LENGTH * 0.5),
        LEAF_COLOR,
    );
    transform.w_axis.truncate()
}

/// Emitter that records nothing
struct Discard;

impl GeometryEmitter for Discard {
    fn emit_segment(&mut self, _: &Mat4, _: f32, _: f32, _: f32, _: Vec4) {}
    fn emit_leaf(&mut self, _: &Mat4, _: Vec2, _: Vec4) {}
}

/// Walk the tree without producing geometry
pub fn measure(tree: &Tree) -> EmitStats {
    emit_tree(tree, WidthMode::Tapered, &mut Discard)
}

/// Emit a tree into a fresh vertex buffer
pub fn build_mesh(tree: &Tree, mode: WidthMode) -> (Vec<Vertex>, EmitStats) {
    let mut mesh = MeshBuilder::new();
    let stats = emit_tree(tree, mode, &mut mesh);
    (mesh.into_vertices(), stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procgen::{NodeRecord, TreeRng};

    /// Records every call for inspection
    #[derive(Default)]
    struct Recorder {
        segments: Vec<(f32, f32, f32, Vec4)>,
        leaves: Vec<Vec4>,
    }

    impl GeometryEmitter for Recorder {
        fn emit_segment(&mut self, _: &Mat4, r0: f32, r1: f32, length: f32, color: Vec4) {
            self.segments.push((r0, r1, length, color));
        }
        fn emit_leaf(&mut self, _: &Mat4, _: Vec2, color: Vec4) {
            self.leaves.push(color);
        }
    }

    fn straight_trunk() -> Tree {
        // 30 straight trunk segments, no branches
        let mut records = vec![
            NodeRecord {
                base_factor: 0.0,
                attenuation_factor: 1.0,
                curve: 0.5,
                curve_back: 0.5,
                curve_v: 0.5,
                child_count: 1,
            };
            NUM_SEGMENTS as usize
        ];
        records.last_mut().unwrap().child_count = 0;
        Tree::from_records(&records).unwrap()
    }

    #[test]
    fn test_vertex_count_matches_nodes() {
        let tree = Tree::generate_random(&mut TreeRng::new(2024));
        let (vertices, stats) = build_mesh(&tree, WidthMode::Tapered);

        assert_eq!(stats.segments, tree.segment_count());
        assert_eq!(stats.leaves, tree.leaf_count());
        assert_eq!(
            vertices.len(),
            tree.segment_count() * VERTICES_PER_SEGMENT + tree.leaf_count() * VERTICES_PER_LEAF
        );
    }

    #[test]
    fn test_emission_visits_every_serialized_node() {
        for seed in 0..10 {
            let tree = Tree::generate_random(&mut TreeRng::new(seed));
            let serialized = tree.to_param_string(None).split(',').count() / 3;
            assert_eq!(measure(&tree).nodes(), serialized);
        }
    }

    #[test]
    fn test_colors_follow_level() {
        let tree = Tree::generate_random(&mut TreeRng::new(31));
        let mut recorder = Recorder::default();
        emit_tree(&tree, WidthMode::Tapered, &mut recorder);

        let trunk = recorder.segments.iter().filter(|s| s.3 == TRUNK_COLOR).count();
        assert_eq!(trunk, tree.nodes().iter().filter(|n| n.level == 0).count());
        assert!(recorder.leaves.iter().all(|c| *c == LEAF_COLOR));
    }

    #[test]
    fn test_fixed_width_is_uniform() {
        let tree = Tree::generate_random(&mut TreeRng::new(17));
        let mut recorder = Recorder::default();
        emit_tree(&tree, WidthMode::Fixed, &mut recorder);
        for (r0, r1, _, _) in &recorder.segments {
            assert_eq!(*r0, FIXED_WIDTH * 0.5);
            assert_eq!(*r1, FIXED_WIDTH * 0.5);
        }
    }

    #[test]
    fn test_tapered_width_shrinks_up_the_trunk() {
        let tree = straight_trunk();
        let mut recorder = Recorder::default();
        emit_tree(&tree, WidthMode::Tapered, &mut recorder);

        assert_eq!(recorder.segments.len(), NUM_SEGMENTS as usize);
        assert!((recorder.segments[0].0 - BASE_WIDTH * 0.5).abs() < 1e-6);
        for pair in recorder.segments.windows(2) {
            assert!((pair[0].1 - pair[1].0).abs() < 1e-6);
            assert!(pair[1].0 < pair[0].0);
        }
        let top = recorder.segments.last().unwrap();
        assert!((top.1 - MIN_SEGMENT_WIDTH * 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_straight_trunk_stays_above_ground() {
        let stats = measure(&straight_trunk());
        assert!(!stats.underground);
        assert_eq!(stats.segments, NUM_SEGMENTS as usize);
    }

    #[test]
    fn test_trunk_bending_down_is_underground() {
        // Planar trunk bending 12 degrees per segment curls back below its
        // base after 15 segments
        let mut tree = straight_trunk();
        for node in tree.nodes_mut() {
            node.rotate_v = 0.0;
            node.curve_v = 12.0;
        }
        assert!(measure(&tree).underground);
    }

    #[test]
    fn test_branch_length_scaled_by_attenuation() {
        let tree = Tree::generate_random(&mut TreeRng::new(9));
        let mut recorder = Recorder::default();
        emit_tree(&tree, WidthMode::Fixed, &mut recorder);
        let trunk_length = Tree::trunk_segment_length();
        for (_, _, length, color) in &recorder.segments {
            if *color == TRUNK_COLOR {
                assert!((length - trunk_length).abs() < 1e-6);
            } else {
                assert!(*length < trunk_length);
            }
        }
    }
}
