use bytemuck::{Pod, Zeroable};

/// Counts read by the culling kernel to bound its dispatch
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct MeshesParams {
    pub instances_count: u32,
    pub relems_count: u32,
}
