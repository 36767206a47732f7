//! Tree geometry: vertex layout, shape emitters and the emission walk

pub mod emission;
pub mod emitter;
pub mod vertex;

pub use emission::{build_mesh, emit_tree, measure, node_frame, EmitStats, WidthMode};
pub use emitter::{GeometryEmitter, MeshBuilder, VERTICES_PER_LEAF, VERTICES_PER_SEGMENT};
pub use vertex::Vertex;
