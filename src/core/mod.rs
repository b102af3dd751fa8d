//! Core data structures shared by the terrain builder and the GPU stages.
//! Contains vertices, render elements, bounds, meshes and the mesh catalog.

pub mod mesh_kind;
pub mod relem;
pub mod uniforms;
pub mod vertex;

// Re-export commonly used types
pub use mesh_kind::MeshKind;
pub use relem::{Bounds, DrawIndexedIndirect, Mesh, RenderElement};
pub use uniforms::MeshesParams;
pub use vertex::Vertex;
