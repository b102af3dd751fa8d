//! Geometry clipmap terrain.
//!
//! Builds the five tile meshes of a clipmap once, lays out a fixed set of
//! instances over them and re-anchors those instances around the camera each
//! frame. GPU buffers and a CPU culling pass consume the resulting tables.

// Core module with GPU-visible types
pub mod core;

// Terrain module with mesh building and clipmap placement
pub mod terrain;

// Render module with buffers, frustum and culling
pub mod render;

// Settings persistence
pub mod utils;

// Other modules
pub mod constants;
pub mod error;

// Re-exports
pub use constants::*;
pub use core::{Bounds, DrawIndexedIndirect, Mesh, MeshKind, MeshesParams, RenderElement, Vertex};
pub use error::{Result, TerrainError};
pub use render::{
    Aabb, CullInputs, CullOutput, TerrainBuffers, cull_instances, extract_frustum_planes,
};
pub use terrain::{ClipmapConfig, ClipmapTracker, TerrainManager, TileMeshBuilder};
pub use utils::{TerrainSettings, load_settings, save_settings};
