//! GPU buffers for clipmap terrain
//!
//! Static tables are uploaded once at load. Instance matrices live in one
//! buffer per frame in flight, draw commands are reset from the template
//! before every culling dispatch.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use tracing::debug;
use wgpu::util::DeviceExt;

use crate::constants::CULL_WORKGROUP_SIZE;
use crate::core::DrawIndexedIndirect;
use crate::terrain::TerrainManager;

/// Culling uniforms: frustum planes plus the vertical extent added to every
/// relem bounds. Must match the kernel struct layout (112 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct CullUniforms {
    /// 6 frustum planes (xyz = normal, w = distance)
    pub frustum_planes: [[f32; 4]; 6],
    pub height_range: [f32; 2],
    pub _padding: [u32; 2],
}

impl CullUniforms {
    pub fn new(planes: &[Vec4; 6], height_range: (f32, f32)) -> Self {
        Self {
            frustum_planes: planes.map(|p| p.to_array()),
            height_range: [height_range.0, height_range.1],
            _padding: [0; 2],
        }
    }
}

/// Workgroups needed to cover every instance once
pub fn cull_workgroups(instance_count: u32) -> u32 {
    instance_count.div_ceil(CULL_WORKGROUP_SIZE)
}

/// Primitive state of the terrain draw. Tiles are counter-clockwise in the
/// local (x, y) plane, which is clockwise once mapped onto world (x, 0, z).
pub fn terrain_primitive_state(wireframe: bool) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        front_face: wgpu::FrontFace::Cw,
        cull_mode: Some(wgpu::Face::Back),
        polygon_mode: if wireframe {
            wgpu::PolygonMode::Line
        } else {
            wgpu::PolygonMode::Fill
        },
        ..Default::default()
    }
}

/// Device features the terrain pipelines need
pub fn terrain_required_features(wireframe: bool) -> wgpu::Features {
    let mut features = wgpu::Features::INDIRECT_FIRST_INSTANCE;
    if wireframe {
        features |= wgpu::Features::POLYGON_MODE_LINE;
    }
    features
}

pub struct TerrainBuffers {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub relems_buffer: wgpu::Buffer,
    pub bounds_buffer: wgpu::Buffer,
    pub meshes_buffer: wgpu::Buffer,
    pub instance_meshes_buffer: wgpu::Buffer,
    pub relem_instance_offsets_buffer: wgpu::Buffer,
    pub draw_instance_indices_buffer: wgpu::Buffer,
    pub draw_commands_buffer: wgpu::Buffer,
    pub meshes_params_buffer: wgpu::Buffer,
    pub cull_uniforms_buffer: wgpu::Buffer,
    instance_matrix_buffers: Vec<wgpu::Buffer>,
    draw_template: Vec<DrawIndexedIndirect>,
    index_count: u32,
}

impl TerrainBuffers {
    pub fn new(device: &wgpu::Device, terrain: &TerrainManager) -> Self {
        let storage = wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST;

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Vertex Buffer"),
            contents: bytemuck::cast_slice(terrain.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Index Buffer"),
            contents: bytemuck::cast_slice(terrain.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let relems_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Relems Buffer"),
            contents: bytemuck::cast_slice(terrain.render_elements()),
            usage: storage,
        });

        let bounds_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Relem Bounds Buffer"),
            contents: bytemuck::cast_slice(terrain.render_elements_bounds()),
            usage: storage,
        });

        let meshes_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Meshes Buffer"),
            contents: bytemuck::cast_slice(terrain.meshes()),
            usage: storage,
        });

        let instance_meshes_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Instance Meshes Buffer"),
            contents: bytemuck::cast_slice(terrain.instance_meshes()),
            usage: storage,
        });

        let relem_instance_offsets_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Terrain Relem Instance Offsets Buffer"),
                contents: bytemuck::cast_slice(terrain.relem_instance_offsets()),
                usage: storage,
            });

        // Filled by the culling kernel, read as a per-instance vertex stream
        let draw_instance_indices_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Terrain Draw Instance Indices Buffer"),
            size: (terrain.draw_instance_count().max(1) as usize * std::mem::size_of::<u32>())
                as u64,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::VERTEX,
            mapped_at_creation: false,
        });

        let draw_commands_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Draw Commands Buffer"),
            contents: bytemuck::cast_slice(terrain.draw_command_template()),
            usage: wgpu::BufferUsages::INDIRECT
                | wgpu::BufferUsages::STORAGE
                | wgpu::BufferUsages::COPY_DST,
        });

        let meshes_params_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Terrain Meshes Params Buffer"),
            contents: bytemuck::bytes_of(&terrain.meshes_params()),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let cull_uniforms_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Terrain Cull Uniforms Buffer"),
            size: std::mem::size_of::<CullUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let ring = terrain.ring();
        let instance_matrix_buffers = (0..ring.frames_in_flight())
            .map(|frame| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("Terrain Instance Matrices {frame}")),
                    contents: bytemuck::cast_slice(ring.slot(frame)),
                    usage: storage,
                })
            })
            .collect::<Vec<_>>();

        debug!(
            frames_in_flight = instance_matrix_buffers.len(),
            relems = terrain.render_elements().len(),
            "Created terrain GPU buffers"
        );

        Self {
            vertex_buffer,
            index_buffer,
            relems_buffer,
            bounds_buffer,
            meshes_buffer,
            instance_meshes_buffer,
            relem_instance_offsets_buffer,
            draw_instance_indices_buffer,
            draw_commands_buffer,
            meshes_params_buffer,
            cull_uniforms_buffer,
            instance_matrix_buffers,
            draw_template: terrain.draw_command_template().to_vec(),
            index_count: terrain.indices().len() as u32,
        }
    }

    /// Write the matrices of one frame into its own buffer only
    pub fn upload_transforms(&self, queue: &wgpu::Queue, frame_index: usize, transforms: &[Mat4]) {
        queue.write_buffer(
            self.instance_matrices(frame_index),
            0,
            bytemuck::cast_slice(transforms),
        );
    }

    /// Zero every instance count before the culling kernel runs again
    pub fn reset_draw_commands(&self, queue: &wgpu::Queue) {
        queue.write_buffer(
            &self.draw_commands_buffer,
            0,
            bytemuck::cast_slice(&self.draw_template),
        );
    }

    pub fn write_cull_uniforms(&self, queue: &wgpu::Queue, uniforms: &CullUniforms) {
        queue.write_buffer(&self.cull_uniforms_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn instance_matrices(&self, frame_index: usize) -> &wgpu::Buffer {
        &self.instance_matrix_buffers[frame_index % self.instance_matrix_buffers.len()]
    }

    pub fn frames_in_flight(&self) -> usize {
        self.instance_matrix_buffers.len()
    }

    pub fn draw_command_count(&self) -> u32 {
        self.draw_template.len() as u32
    }

    pub fn index_count(&self) -> u32 {
        self.index_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cull_uniforms_layout() {
        assert_eq!(std::mem::size_of::<CullUniforms>(), 112);
    }

    #[test]
    fn workgroups_round_up() {
        assert_eq!(cull_workgroups(1), 1);
        assert_eq!(cull_workgroups(128), 1);
        assert_eq!(cull_workgroups(5 + 15 * 7), 1);
        assert_eq!(cull_workgroups(129), 2);
    }

    #[test]
    fn wireframe_switches_polygon_mode() {
        assert_eq!(terrain_primitive_state(false).polygon_mode, wgpu::PolygonMode::Fill);
        assert_eq!(terrain_primitive_state(true).polygon_mode, wgpu::PolygonMode::Line);
        assert_eq!(terrain_primitive_state(true).front_face, wgpu::FrontFace::Cw);
        assert!(!terrain_required_features(false).contains(wgpu::Features::POLYGON_MODE_LINE));
        assert!(terrain_required_features(true).contains(wgpu::Features::POLYGON_MODE_LINE));
    }

    /// Device and queue for buffer tests, `None` when no adapter is present
    fn create_device_queue() -> Option<(wgpu::Device, wgpu::Queue)> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .ok()?;

        pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("terrain_buffers_test_device"),
            required_features: wgpu::Features::empty(),
            required_limits: adapter.limits(),
            memory_hints: Default::default(),
            experimental_features: Default::default(),
            trace: wgpu::Trace::Off,
        }))
        .ok()
    }

    #[test]
    fn buffers_follow_the_transform_ring() {
        let Some((device, queue)) = create_device_queue() else {
            eprintln!("Skipping buffers_follow_the_transform_ring (no GPU)");
            return;
        };

        let mut terrain =
            TerrainManager::load_terrain(crate::terrain::ClipmapConfig::new(3, 31, 3).unwrap());
        let buffers = TerrainBuffers::new(&device, &terrain);
        let instances = terrain.instance_meshes().len() as u64;

        assert_eq!(buffers.frames_in_flight(), 3);
        for frame in 0..3 {
            assert_eq!(buffers.instance_matrices(frame).size(), instances * 64);
        }
        for frame in 0..9 {
            assert!(std::ptr::eq(
                buffers.instance_matrices(frame),
                buffers.instance_matrices(frame % 3)
            ));
        }
        assert!(!std::ptr::eq(buffers.instance_matrices(0), buffers.instance_matrices(1)));

        assert_eq!(buffers.draw_command_count(), terrain.render_elements().len() as u32);
        assert_eq!(
            buffers.draw_commands_buffer.size(),
            (terrain.render_elements().len() * std::mem::size_of::<DrawIndexedIndirect>()) as u64
        );
        assert_eq!(buffers.index_count(), terrain.indices().len() as u32);
        assert_eq!(
            buffers.draw_instance_indices_buffer.size(),
            terrain.draw_instance_count() as u64 * 4
        );

        for frame in 0..4 {
            let camera = glam::Vec3::new(frame as f32 * 37.0, 0.0, -11.0);
            buffers.upload_transforms(&queue, frame, terrain.move_clipmap(camera, frame));
        }
        buffers.reset_draw_commands(&queue);
        queue.submit(std::iter::empty());
    }

    #[test]
    fn cull_uniforms_copy_planes() {
        let planes = [Vec4::X, Vec4::Y, Vec4::Z, Vec4::W, Vec4::NEG_X, Vec4::NEG_Y];
        let uniforms = CullUniforms::new(&planes, (-10.0, 20.0));
        assert_eq!(uniforms.frustum_planes[1], [0.0, 1.0, 0.0, 0.0]);
        assert_eq!(uniforms.frustum_planes[5], [0.0, -1.0, 0.0, 0.0]);
        assert_eq!(uniforms.height_range, [-10.0, 20.0]);
    }
}
