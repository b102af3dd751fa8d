//! Clipmap terrain fly-over
//!
//! Loads the clipmap, moves a camera across the terrain and runs the CPU
//! culling pass every frame, logging what would be drawn.

use std::path::PathBuf;

use clap::Parser;
use glam::{Mat4, Vec3};
use tracing::{error, info, warn};

use clipmap_terrain::render::{cull_workgroups, terrain_primitive_state, terrain_required_features};
use clipmap_terrain::utils::ClipmapSettings;
use clipmap_terrain::{
    CullInputs, DEFAULT_HEIGHT_RANGE, DEFAULT_SETTINGS_FILE, Result, TerrainManager,
    TerrainSettings, cull_instances, extract_frustum_planes, load_settings, save_settings,
};

/// Clipmap terrain fly-over
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of clipmap levels around the center tiles
    #[arg(long)]
    levels: Option<u32>,

    /// Vertices along one side of the clipmap grid (2^k - 1)
    #[arg(long)]
    grid_size: Option<u32>,

    /// Frames in flight sharing the transform ring
    #[arg(long)]
    frames_in_flight: Option<u32>,

    /// Frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: usize,

    /// Camera speed in world units per frame
    #[arg(long, default_value_t = 3.5)]
    speed: f32,

    /// Settings file to start from
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings here before flying
    #[arg(long)]
    save_settings: Option<PathBuf>,

    /// Keep the clipmap anchored where it was loaded
    #[arg(long, default_value_t = false)]
    freeze: bool,

    /// Draw terrain as wireframe
    #[arg(long, default_value_t = false)]
    wireframe: bool,
}

fn resolve_settings(args: &Args) -> Result<TerrainSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            info!(path = %path.display(), "Loading settings");
            load_settings(path)?
        }
        None => TerrainSettings::default(),
    };

    let ClipmapSettings {
        levels,
        vertex_grid_size,
        frames_in_flight,
    } = &mut settings.clipmap;
    if let Some(value) = args.levels {
        *levels = value;
    }
    if let Some(value) = args.grid_size {
        *vertex_grid_size = value;
    }
    if let Some(value) = args.frames_in_flight {
        *frames_in_flight = value;
    }
    settings.debug.freeze_clipmap |= args.freeze;
    settings.debug.wireframe_mode |= args.wireframe;

    Ok(settings)
}

fn run(args: Args) -> Result<()> {
    let settings = resolve_settings(&args)?;
    let config = settings.clipmap.validate()?;

    if let Some(path) = &args.save_settings {
        save_settings(path, &settings)?;
        info!(path = %path.display(), "Saved settings");
    } else if args.settings.is_none() {
        info!("Settings not persisted (use --save-settings {DEFAULT_SETTINGS_FILE})");
    }

    let mut terrain = TerrainManager::load_terrain(config);
    terrain.set_frozen(settings.debug.freeze_clipmap);

    let params = terrain.meshes_params();
    info!(
        instances = params.instances_count,
        relems = params.relems_count,
        workgroups = cull_workgroups(params.instances_count),
        "Culling dispatch"
    );

    let wireframe = settings.debug.wireframe_mode;
    info!(
        polygon_mode = ?terrain_primitive_state(wireframe).polygon_mode,
        features = ?terrain_required_features(wireframe),
        "Terrain pipeline"
    );

    let proj = Mat4::perspective_rh(70f32.to_radians(), 16.0 / 9.0, 0.1, 4000.0);
    let heading = Vec3::new(0.6, 0.0, -0.8).normalize();
    let mut camera = Vec3::new(0.0, 40.0, 0.0);
    let mut total_visible = 0u64;

    for frame in 0..args.frames {
        camera += heading * args.speed;

        terrain.move_clipmap(camera, frame);
        let view = Mat4::look_to_rh(camera, heading + Vec3::new(0.0, -0.25, 0.0), Vec3::Y);
        let planes = extract_frustum_planes(&(proj * view));

        let output = cull_instances(
            &CullInputs {
                bounds: terrain.render_elements_bounds(),
                meshes: terrain.meshes(),
                instance_meshes: terrain.instance_meshes(),
                transforms: terrain.ring().slot(frame),
                relem_instance_offsets: terrain.relem_instance_offsets(),
                draw_template: terrain.draw_command_template(),
                draw_instance_count: terrain.draw_instance_count(),
                height_range: DEFAULT_HEIGHT_RANGE,
            },
            &planes,
        );

        let visible = output.visible_relem_instances();
        total_visible += visible as u64;

        if frame % 60 == 0 {
            info!(
                frame,
                x = camera.x,
                z = camera.z,
                slot = terrain.ring().slot_index(frame),
                visible,
                draws = output.active_draws(),
                "Frame"
            );
        }
    }

    if args.frames == 0 {
        warn!("No frames simulated");
    } else {
        info!(
            frames = args.frames,
            average_visible = total_visible as f64 / args.frames as f64,
            capacity = terrain.draw_instance_count(),
            "Fly-over finished"
        );
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    if let Err(err) = run(args) {
        error!("{err}");
        std::process::exit(1);
    }
}
