//! GPU-visible tables describing terrain geometry.
//!
//! Field order and sizes must match the culling kernel and the indirect draw
//! layout exactly.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// A single render element (relem): one indexed draw call.
///
/// Indices are relem-local, `vertex_offset` is used as the base vertex.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct RenderElement {
    pub vertex_offset: u32,
    pub index_offset: u32,
    pub index_count: u32,
    pub material: u32,
}

/// Local-space AABB of one relem (w is padding)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Bounds {
    pub min_pos: [f32; 4],
    pub max_pos: [f32; 4],
}

impl Bounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min_pos: min.extend(0.0).to_array(),
            max_pos: max.extend(0.0).to_array(),
        }
    }

    pub fn min(&self) -> Vec3 {
        Vec3::new(self.min_pos[0], self.min_pos[1], self.min_pos[2])
    }

    pub fn max(&self) -> Vec3 {
        Vec3::new(self.max_pos[0], self.max_pos[1], self.max_pos[2])
    }

    /// World-space AABB of these bounds after `transform`, with the vertical
    /// extent replaced by `height_range`.
    pub fn transformed(&self, transform: &Mat4, height_range: (f32, f32)) -> (Vec3, Vec3) {
        let (min, max) = (self.min(), self.max());
        let mut world_min = Vec3::splat(f32::INFINITY);
        let mut world_max = Vec3::splat(f32::NEG_INFINITY);

        for corner in 0..4 {
            let local = Vec3::new(
                if corner & 1 == 0 { min.x } else { max.x },
                0.0,
                if corner & 2 == 0 { min.z } else { max.z },
            );
            let p = transform.transform_point3(local);
            world_min = world_min.min(p);
            world_max = world_max.max(p);
        }

        world_min.y = height_range.0;
        world_max.y = height_range.1;
        (world_min, world_max)
    }
}

/// A mesh is a contiguous group of relems
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct Mesh {
    pub first_relem: u32,
    pub relem_count: u32,
}

impl Mesh {
    pub fn relems(&self) -> std::ops::Range<usize> {
        let first = self.first_relem as usize;
        first..first + self.relem_count as usize
    }
}

/// wgpu DrawIndexedIndirect command structure (matches GPU layout)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawIndexedIndirect {
    /// Number of indices to draw
    pub index_count: u32,
    /// Number of visible instances, filled by the culling pass
    pub instance_count: u32,
    /// First index in the index buffer
    pub first_index: u32,
    /// Value added to vertex indices before indexing into vertex buffer
    pub base_vertex: i32,
    /// Offset of this relem's range in the compacted instance index buffer
    pub first_instance: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpu_layouts_are_packed() {
        assert_eq!(std::mem::size_of::<RenderElement>(), 16);
        assert_eq!(std::mem::size_of::<Bounds>(), 32);
        assert_eq!(std::mem::size_of::<Mesh>(), 8);
        assert_eq!(std::mem::size_of::<DrawIndexedIndirect>(), 20);
    }

    #[test]
    fn transformed_bounds_follow_translation_and_scale() {
        let bounds = Bounds::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 0.0, 2.0));
        let transform = Mat4::from_translation(Vec3::new(10.0, 0.0, -6.0))
            * Mat4::from_scale(Vec3::new(2.0, 1.0, 2.0));

        let (min, max) = bounds.transformed(&transform, (-1.0, 3.0));
        assert_eq!(min, Vec3::new(10.0, -1.0, -6.0));
        assert_eq!(max, Vec3::new(18.0, 3.0, -2.0));
    }
}
