//! WebGPU rendering module
//!
//! Tessellates table snapshots into flat-coloured triangles and draws them
//! with a single pipeline.

pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use pipeline::{RenderState, table_to_ndc};
pub use shapes::build_vertices;
pub use vertex::Vertex;
