//! CPU rendition of the terrain culling kernel.
//!
//! For every instance and every relem of its mesh, a visible relem bumps the
//! instance count of its draw command and the instance index is scattered to
//! `relem_instance_offsets[relem] + previous count`.

use glam::{Mat4, Vec4};

use crate::core::{Bounds, DrawIndexedIndirect, Mesh};
use crate::render::frustum::Aabb;

/// Inputs mirroring the kernel bindings
pub struct CullInputs<'a> {
    pub bounds: &'a [Bounds],
    pub meshes: &'a [Mesh],
    pub instance_meshes: &'a [u32],
    pub transforms: &'a [Mat4],
    pub relem_instance_offsets: &'a [u32],
    pub draw_template: &'a [DrawIndexedIndirect],
    pub draw_instance_count: u32,
    pub height_range: (f32, f32),
}

#[derive(Clone, Debug, PartialEq)]
pub struct CullOutput {
    pub draw_commands: Vec<DrawIndexedIndirect>,
    pub instance_indices: Vec<u32>,
}

impl CullOutput {
    pub fn visible_relem_instances(&self) -> u32 {
        self.draw_commands.iter().map(|cmd| cmd.instance_count).sum()
    }

    /// Draw commands that will produce geometry
    pub fn active_draws(&self) -> usize {
        self.draw_commands
            .iter()
            .filter(|cmd| cmd.instance_count > 0)
            .count()
    }

    /// Instance indices written for one relem
    pub fn relem_instances(&self, relem: usize) -> &[u32] {
        let cmd = &self.draw_commands[relem];
        let start = cmd.first_instance as usize;
        &self.instance_indices[start..start + cmd.instance_count as usize]
    }
}

pub fn cull_instances(inputs: &CullInputs, frustum_planes: &[Vec4; 6]) -> CullOutput {
    assert_eq!(
        inputs.instance_meshes.len(),
        inputs.transforms.len(),
        "one transform per instance"
    );

    let mut draw_commands = inputs.draw_template.to_vec();
    let mut instance_indices = vec![0u32; inputs.draw_instance_count as usize];

    for (instance, (&mesh, transform)) in inputs
        .instance_meshes
        .iter()
        .zip(inputs.transforms)
        .enumerate()
    {
        for relem in inputs.meshes[mesh as usize].relems() {
            let aabb = Aabb::from_relem(&inputs.bounds[relem], transform, inputs.height_range);
            if !aabb.is_visible(frustum_planes) {
                continue;
            }

            let cmd = &mut draw_commands[relem];
            let slot = inputs.relem_instance_offsets[relem] + cmd.instance_count;
            cmd.instance_count += 1;
            instance_indices[slot as usize] = instance as u32;
        }
    }

    CullOutput {
        draw_commands,
        instance_indices,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_HEIGHT_RANGE;
    use crate::render::frustum::extract_frustum_planes;
    use crate::terrain::{ClipmapConfig, TerrainManager};
    use glam::Vec3;

    fn inputs(terrain: &TerrainManager) -> CullInputs<'_> {
        CullInputs {
            bounds: terrain.render_elements_bounds(),
            meshes: terrain.meshes(),
            instance_meshes: terrain.instance_meshes(),
            transforms: terrain.instance_matrices(),
            relem_instance_offsets: terrain.relem_instance_offsets(),
            draw_template: terrain.draw_command_template(),
            draw_instance_count: terrain.draw_instance_count(),
            height_range: DEFAULT_HEIGHT_RANGE,
        }
    }

    /// Planes that accept everything
    fn everything() -> [Vec4; 6] {
        [Vec4::new(0.0, 0.0, 0.0, 1.0); 6]
    }

    fn looking_north() -> [Vec4; 6] {
        let proj = Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 400.0);
        let view = Mat4::look_to_rh(Vec3::new(0.0, 30.0, 0.0), Vec3::new(0.0, -0.2, -1.0), Vec3::Y);
        extract_frustum_planes(&(proj * view))
    }

    #[test]
    fn everything_visible_fills_every_slot() {
        let terrain = TerrainManager::load_terrain(ClipmapConfig::new(3, 31, 2).unwrap());
        let output = cull_instances(&inputs(&terrain), &everything());

        assert_eq!(output.visible_relem_instances(), terrain.draw_instance_count());
        assert_eq!(output.active_draws(), terrain.render_elements().len());

        // each relem lists the instances of its mesh in instance order
        for (mesh_index, mesh) in terrain.meshes().iter().enumerate() {
            let expected: Vec<u32> = terrain
                .instance_meshes()
                .iter()
                .enumerate()
                .filter(|(_, m)| **m as usize == mesh_index)
                .map(|(i, _)| i as u32)
                .collect();
            for relem in mesh.relems() {
                assert_eq!(output.relem_instances(relem), expected.as_slice());
            }
        }
    }

    #[test]
    fn nothing_visible_keeps_template() {
        let terrain = TerrainManager::load_terrain(ClipmapConfig::new(2, 15, 1).unwrap());
        let reject = [Vec4::new(0.0, 0.0, 0.0, -1.0); 6];
        let output = cull_instances(&inputs(&terrain), &reject);

        assert_eq!(output.draw_commands, terrain.draw_command_template());
        assert_eq!(output.visible_relem_instances(), 0);
    }

    #[test]
    fn camera_frustum_culls_part_of_the_clipmap() {
        let terrain = TerrainManager::load_terrain(ClipmapConfig::new(5, 63, 2).unwrap());
        let output = cull_instances(&inputs(&terrain), &looking_north());

        let visible = output.visible_relem_instances();
        assert!(visible > 0);
        assert!(visible < terrain.draw_instance_count());

        // scattered indices stay inside each relem's region
        for (relem, cmd) in output.draw_commands.iter().enumerate() {
            let next = terrain
                .relem_instance_offsets()
                .get(relem + 1)
                .copied()
                .unwrap_or(terrain.draw_instance_count());
            assert!(cmd.first_instance + cmd.instance_count <= next);
            for &instance in output.relem_instances(relem) {
                let mesh = terrain.instance_meshes()[instance as usize] as usize;
                assert!(terrain.meshes()[mesh].relems().contains(&relem));
            }
        }
    }
}
