// Clipmap defaults
pub const DEFAULT_CLIPMAP_LEVELS: u32 = 7;
pub const DEFAULT_VERTEX_GRID_SIZE: u32 = 255;
pub const DEFAULT_FRAMES_IN_FLIGHT: u32 = 2;

// Limits
pub const MIN_VERTEX_GRID_SIZE: u32 = 7;
pub const MAX_VERTEX_GRID_SIZE: u32 = 4095;
pub const MAX_CLIPMAP_LEVELS: u32 = 16;
pub const MAX_FRAMES_IN_FLIGHT: u32 = 4;

// Culling
pub const CULL_WORKGROUP_SIZE: u32 = 128;
/// Vertical range assumed for terrain heights when culling flat tile bounds
pub const DEFAULT_HEIGHT_RANGE: (f32, f32) = (-50.0, 250.0);
/// Material id written into every terrain relem
pub const TERRAIN_MATERIAL: u32 = 0;

// Settings file
pub const DEFAULT_SETTINGS_FILE: &str = "terrain_settings.bin";
