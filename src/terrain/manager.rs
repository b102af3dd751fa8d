//! Owns the clipmap terrain: static tables built at load, transforms updated
//! every frame.

use glam::{Mat4, Vec2, Vec3};
use tracing::{debug, info};

use crate::core::{Bounds, DrawIndexedIndirect, Mesh, MeshesParams, RenderElement, Vertex};
use crate::terrain::config::ClipmapConfig;
use crate::terrain::ring::TransformRing;
use crate::terrain::schedule::{InstanceSchedule, InstanceSlot, schedule_instances};
use crate::terrain::tiles::{TileGeometry, TileMeshBuilder};
use crate::terrain::tracker::ClipmapTracker;

pub struct TerrainManager {
    config: ClipmapConfig,
    geometry: TileGeometry,
    schedule: InstanceSchedule,
    instance_meshes: Vec<u32>,
    tracker: ClipmapTracker,
    transforms: Vec<Mat4>,
    ring: TransformRing,
    relem_instance_offsets: Vec<u32>,
    draw_instance_count: u32,
    draw_commands: Vec<DrawIndexedIndirect>,
    frozen: bool,
    last_camera: Option<Vec2>,
}

impl TerrainManager {
    /// Build tile meshes and the instance schedule, then place the clipmap
    /// around the origin.
    pub fn load_terrain(config: ClipmapConfig) -> Self {
        let geometry = TileMeshBuilder::new(config.vertex_grid_size()).build();
        let schedule = schedule_instances(config.levels());
        let instance_meshes = schedule.instance_meshes();
        let tracker = ClipmapTracker::new(config.tile_size(), &schedule);

        let (relem_instance_offsets, draw_instance_count) =
            relem_instance_offsets(&geometry.meshes, geometry.relems.len(), &instance_meshes);
        let draw_commands = draw_command_template(&geometry.relems, &relem_instance_offsets);

        let mut transforms = schedule.initial_transforms();
        tracker.update(Vec2::ZERO, schedule.slots(), &mut transforms);
        let ring = TransformRing::new(config.frames_in_flight() as usize, &transforms);

        info!(
            levels = config.levels(),
            vertex_grid_size = config.vertex_grid_size(),
            instances = instance_meshes.len(),
            relems = geometry.relems.len(),
            vertices = geometry.vertices.len(),
            indices = geometry.indices.len(),
            draw_instances = draw_instance_count,
            "Loaded clipmap terrain"
        );

        Self {
            config,
            geometry,
            schedule,
            instance_meshes,
            tracker,
            transforms,
            ring,
            relem_instance_offsets,
            draw_instance_count,
            draw_commands,
            frozen: false,
            last_camera: None,
        }
    }

    /// Re-anchor the clipmap around the camera and publish the transforms
    /// into the slot of `frame_index`. Returns the published copy.
    pub fn move_clipmap(&mut self, camera_world: Vec3, frame_index: usize) -> &[Mat4] {
        let camera = Vec2::new(camera_world.x, camera_world.z);

        if !self.frozen {
            self.tracker
                .update(camera, self.schedule.slots(), &mut self.transforms);
            if self.last_camera.map(|c| c.floor()) != Some(camera.floor()) {
                debug!(x = camera.x, z = camera.y, frame_index, "Clipmap re-anchored");
            }
            self.last_camera = Some(camera);
        }

        self.ring.publish(frame_index, &self.transforms)
    }

    /// While frozen, `move_clipmap` keeps publishing the last placement
    pub fn set_frozen(&mut self, frozen: bool) {
        if self.frozen != frozen {
            info!(frozen, "Clipmap freeze toggled");
        }
        self.frozen = frozen;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn config(&self) -> &ClipmapConfig {
        &self.config
    }

    pub fn geometry(&self) -> &TileGeometry {
        &self.geometry
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.geometry.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.geometry.indices
    }

    pub fn render_elements(&self) -> &[RenderElement] {
        &self.geometry.relems
    }

    pub fn render_elements_bounds(&self) -> &[Bounds] {
        &self.geometry.bounds
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.geometry.meshes
    }

    pub fn instance_slots(&self) -> &[InstanceSlot] {
        self.schedule.slots()
    }

    pub fn schedule(&self) -> &InstanceSchedule {
        &self.schedule
    }

    pub fn instance_meshes(&self) -> &[u32] {
        &self.instance_meshes
    }

    /// Latest transforms computed by the tracker
    pub fn instance_matrices(&self) -> &[Mat4] {
        &self.transforms
    }

    pub fn ring(&self) -> &TransformRing {
        &self.ring
    }

    pub fn relem_instance_offsets(&self) -> &[u32] {
        &self.relem_instance_offsets
    }

    /// Size of the compacted instance index buffer the culling pass fills
    pub fn draw_instance_count(&self) -> u32 {
        self.draw_instance_count
    }

    pub fn draw_command_template(&self) -> &[DrawIndexedIndirect] {
        &self.draw_commands
    }

    pub fn meshes_params(&self) -> MeshesParams {
        MeshesParams {
            instances_count: self.instance_meshes.len() as u32,
            relems_count: self.geometry.relems.len() as u32,
        }
    }
}

/// Exclusive prefix sum over how many instances reference each relem.
/// Returns the table and the total.
pub fn relem_instance_offsets(
    meshes: &[Mesh],
    relem_count: usize,
    instance_meshes: &[u32],
) -> (Vec<u32>, u32) {
    let mut counts = vec![0u32; relem_count];
    for &mesh in instance_meshes {
        for relem in meshes[mesh as usize].relems() {
            counts[relem] += 1;
        }
    }

    let mut total = 0;
    let offsets = counts
        .into_iter()
        .map(|count| {
            let offset = total;
            total += count;
            offset
        })
        .collect();
    (offsets, total)
}

/// One indirect draw per relem with no instances yet
pub fn draw_command_template(
    relems: &[RenderElement],
    offsets: &[u32],
) -> Vec<DrawIndexedIndirect> {
    relems
        .iter()
        .zip(offsets)
        .map(|(relem, &first_instance)| DrawIndexedIndirect {
            index_count: relem.index_count,
            instance_count: 0,
            first_index: relem.index_offset,
            base_vertex: relem.vertex_offset as i32,
            first_instance,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MeshKind;

    fn manager(levels: u32, grid: u32, frames: u32) -> TerrainManager {
        TerrainManager::load_terrain(ClipmapConfig::new(levels, grid, frames).unwrap())
    }

    #[test]
    fn offsets_partition_instances_by_relem() {
        let terrain = manager(7, 255, 2);
        let offsets = terrain.relem_instance_offsets();
        let meshes = terrain.meshes();

        // cross 1, squares 4 + 12L, filler/trim/seam L each
        let per_kind = |kind: MeshKind| match kind {
            MeshKind::Cross => 1,
            MeshKind::Square => 4 + 12 * 7,
            _ => 7,
        };
        let mut expected = 0;
        for kind in MeshKind::ALL {
            for relem in meshes[kind.index() as usize].relems() {
                assert_eq!(offsets[relem], expected, "relem {relem} of {kind}");
                expected += per_kind(kind);
            }
        }
        assert_eq!(terrain.draw_instance_count(), expected);
        // 2 + 88 + 4*7 + 2*7 + 7
        assert_eq!(expected, 2 + 88 + 28 + 14 + 7);
    }

    #[test]
    fn draw_template_mirrors_relems() {
        let terrain = manager(3, 31, 2);
        let template = terrain.draw_command_template();
        assert_eq!(template.len(), terrain.render_elements().len());
        for ((cmd, relem), offset) in template
            .iter()
            .zip(terrain.render_elements())
            .zip(terrain.relem_instance_offsets())
        {
            assert_eq!(cmd.index_count, relem.index_count);
            assert_eq!(cmd.instance_count, 0);
            assert_eq!(cmd.first_index, relem.index_offset);
            assert_eq!(cmd.base_vertex, relem.vertex_offset as i32);
            assert_eq!(cmd.first_instance, *offset);
        }
    }

    #[test]
    fn meshes_params_count_instances_and_relems() {
        let terrain = manager(4, 63, 1);
        assert_eq!(
            terrain.meshes_params(),
            MeshesParams {
                instances_count: 5 + 15 * 4,
                relems_count: 10,
            }
        );
    }

    #[test]
    fn frames_publish_to_separate_slots() {
        let mut terrain = manager(2, 15, 2);
        let at_origin = terrain.ring().slot(1).to_vec();

        let published = terrain.move_clipmap(Vec3::new(100.0, 5.0, -40.0), 0).to_vec();
        assert_eq!(published, terrain.instance_matrices());
        assert_eq!(terrain.ring().slot(0), published.as_slice());
        assert_eq!(terrain.ring().slot(1), at_origin.as_slice());
        assert_ne!(published, at_origin);
    }

    #[test]
    fn published_slice_is_the_ring_slot() {
        let mut terrain = manager(2, 15, 2);
        let published = terrain.move_clipmap(Vec3::new(12.0, 0.0, 7.0), 3).as_ptr();
        assert_eq!(published, terrain.ring().slot(3).as_ptr());
        assert_eq!(published, terrain.ring().slot(1).as_ptr());
        assert_ne!(published, terrain.ring().slot(0).as_ptr());
    }

    #[test]
    fn camera_height_is_ignored() {
        let mut terrain = manager(3, 15, 2);
        let low = terrain.move_clipmap(Vec3::new(3.5, 0.0, 9.0), 0).to_vec();
        let high = terrain.move_clipmap(Vec3::new(3.5, 900.0, 9.0), 1).to_vec();
        assert_eq!(low, high);
    }

    #[test]
    fn frozen_clipmap_keeps_last_placement() {
        let mut terrain = manager(3, 15, 2);
        let before = terrain.move_clipmap(Vec3::new(10.0, 0.0, 10.0), 0).to_vec();

        terrain.set_frozen(true);
        let frozen = terrain.move_clipmap(Vec3::new(500.0, 0.0, -500.0), 1).to_vec();
        assert_eq!(frozen, before);

        terrain.set_frozen(false);
        let thawed = terrain.move_clipmap(Vec3::new(500.0, 0.0, -500.0), 0).to_vec();
        assert_ne!(thawed, before);
    }

    #[test]
    fn zero_levels_loads() {
        let terrain = manager(0, 7, 1);
        assert_eq!(terrain.instance_meshes(), &[0, 1, 1, 1, 1]);
        assert_eq!(terrain.instance_matrices().len(), 5);
    }
}
