//! Rendering-related modules
//! Contains the GPU buffer set, frustum planes and the CPU culling pass.

pub mod cull;
pub mod frustum;
pub mod gpu;

// Re-export commonly used types
pub use cull::{CullInputs, CullOutput, cull_instances};
pub use frustum::{Aabb, extract_frustum_planes};
pub use gpu::{
    CullUniforms, TerrainBuffers, cull_workgroups, terrain_primitive_state,
    terrain_required_features,
};
