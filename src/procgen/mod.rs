//! Procedural branching tree generation

pub mod node;
pub mod params;
pub mod rng;
pub mod shape;
pub mod tree;

pub use node::{NodeId, TreeNode, NUM_LEVELS, NUM_SEGMENTS};
pub use params::{parse_param_line, NodeRecord};
pub use rng::TreeRng;
pub use shape::shape_ratio;
pub use tree::Tree;
