//! Persistent settings

pub mod settings;

pub use settings::{
    ClipmapSettings, DebugSettings, TerrainSettings, load_settings, save_settings,
};
