//! Branch segment nodes stored in the tree arena

/// Number of segments along every branch
pub const NUM_SEGMENTS: u32 = 30;

/// Maximum branch order. Nodes at this level are leaf terminators.
pub const NUM_LEVELS: u32 = 3;

/// Fixed azimuthal twist applied at every node, in degrees
pub const ROTATE_V_DEGREES: f32 = 59.0;

/// Index of a node inside its owning [`Tree`](super::Tree) arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// One linear segment of a branch.
///
/// Children are owned by the arena; `children` and `parent` are plain indices
/// used for traversal only. `children[0]` continues the same branch and
/// `children[1]` opens a new branch, or a leaf when this node sits on the
/// last branching level.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
    /// Branch order (0 = trunk)
    pub level: u32,
    /// Position along the current branch, 0..NUM_SEGMENTS
    pub index: u32,
    pub segment_length: f32,
    /// Fraction of the trunk below which no branching occurs
    pub base_factor: f32,
    /// Length/width scale of this branch relative to its parent
    pub attenuation_factor: f32,
    /// Curvature target for the first half of the branch (degrees)
    pub curve: f32,
    /// Curvature target for the second half of the branch (degrees)
    pub curve_back: f32,
    /// Actual curvature delta of this segment (degrees)
    pub curve_v: f32,
    /// Azimuthal rotation (degrees)
    pub rotate_v: f32,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn new(
        parent: Option<NodeId>,
        level: u32,
        index: u32,
        segment_length: f32,
        attenuation_factor: f32,
        base_factor: f32,
    ) -> Self {
        Self {
            level,
            index,
            segment_length,
            base_factor,
            attenuation_factor,
            curve: 0.0,
            curve_back: 0.0,
            curve_v: 0.0,
            rotate_v: 0.0,
            parent,
            children: Vec::new(),
        }
    }

    /// Whether this node terminates a branch with a leaf
    pub fn is_leaf(&self) -> bool {
        self.level >= NUM_LEVELS
    }

    /// Whether this is the last segment of its branch
    pub fn is_last_segment(&self) -> bool {
        self.index + 1 >= NUM_SEGMENTS
    }

    /// Continuation of the same branch, if any
    pub fn continuation(&self) -> Option<NodeId> {
        self.children.first().copied()
    }

    /// Side branch (or leaf), if any
    pub fn branch(&self) -> Option<NodeId> {
        self.children.get(1).copied()
    }

    /// Curvature mapped from [-90, 90] degrees onto [0, 1]
    pub fn normalized_curve_v(&self) -> f32 {
        normalize_angle(self.curve_v)
    }
}

/// Map an angle in [-90, 90] degrees onto [0, 1]
pub fn normalize_angle(degrees: f32) -> f32 {
    (degrees + 90.0) / 180.0
}

/// Inverse of [`normalize_angle`]
pub fn denormalize_angle(value: f32) -> f32 {
    value * 180.0 - 90.0
}
