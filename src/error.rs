//! Error type for configuration and persistence.
//!
//! Structural bugs (topology drift, schedule desync) are assertions, not
//! variants here.

use crate::constants::{
    MAX_CLIPMAP_LEVELS, MAX_FRAMES_IN_FLIGHT, MAX_VERTEX_GRID_SIZE, MIN_VERTEX_GRID_SIZE,
};

/// Errors raised while validating or persisting terrain settings
#[derive(thiserror::Error, Debug)]
pub enum TerrainError {
    #[error(
        "vertex grid size {0} is not 2^k - 1 within [{min}, {max}]",
        min = MIN_VERTEX_GRID_SIZE,
        max = MAX_VERTEX_GRID_SIZE
    )]
    InvalidGridSize(u32),

    #[error("clipmap level count {0} exceeds {max}", max = MAX_CLIPMAP_LEVELS)]
    InvalidLevelCount(u32),

    #[error("frames in flight must be 1..={max}, got {0}", max = MAX_FRAMES_IN_FLIGHT)]
    InvalidFramesInFlight(u32),

    #[error("settings IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, TerrainError>;
