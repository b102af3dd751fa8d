use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::constants::*;
use crate::error::Result;
use crate::terrain::ClipmapConfig;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TerrainSettings {
    pub clipmap: ClipmapSettings,
    #[serde(default)]
    pub debug: DebugSettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ClipmapSettings {
    pub levels: u32,
    pub vertex_grid_size: u32,
    pub frames_in_flight: u32,
}

impl Default for ClipmapSettings {
    fn default() -> Self {
        Self {
            levels: DEFAULT_CLIPMAP_LEVELS,
            vertex_grid_size: DEFAULT_VERTEX_GRID_SIZE,
            frames_in_flight: DEFAULT_FRAMES_IN_FLIGHT,
        }
    }
}

impl ClipmapSettings {
    pub fn validate(&self) -> Result<ClipmapConfig> {
        ClipmapConfig::new(self.levels, self.vertex_grid_size, self.frames_in_flight)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DebugSettings {
    pub freeze_clipmap: bool,
    pub wireframe_mode: bool,
}

pub fn save_settings(path: &Path, settings: &TerrainSettings) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, settings)?;
    Ok(())
}

pub fn load_settings(path: &Path) -> Result<TerrainSettings> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let settings = bincode::deserialize_from(&mut reader)?;
    Ok(settings)
}
