//! Geometry module for tissue representation.
//!
//! Contains planar polygon measures, the shared node type, the mutable
//! polygonal vertex mesh and honeycomb tissue generators.

mod honeycomb;
mod mesh;
mod node;
pub mod polygon;

pub use honeycomb::HoneycombGenerator;
pub use mesh::{Element, MeshError, VertexMesh};
pub use node::Node;
