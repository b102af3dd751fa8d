use crate::constants::*;
use crate::error::{Result, TerrainError};

/// Validated clipmap parameters
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClipmapConfig {
    levels: u32,
    vertex_grid_size: u32,
    frames_in_flight: u32,
}

impl ClipmapConfig {
    pub fn new(levels: u32, vertex_grid_size: u32, frames_in_flight: u32) -> Result<Self> {
        if !is_valid_grid_size(vertex_grid_size) {
            return Err(TerrainError::InvalidGridSize(vertex_grid_size));
        }
        if levels > MAX_CLIPMAP_LEVELS {
            return Err(TerrainError::InvalidLevelCount(levels));
        }
        if frames_in_flight == 0 || frames_in_flight > MAX_FRAMES_IN_FLIGHT {
            return Err(TerrainError::InvalidFramesInFlight(frames_in_flight));
        }

        Ok(Self {
            levels,
            vertex_grid_size,
            frames_in_flight,
        })
    }

    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn vertex_grid_size(&self) -> u32 {
        self.vertex_grid_size
    }

    pub fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight
    }

    /// Cells along one side of a square block
    pub fn tile_size(&self) -> u32 {
        tile_size_for(self.vertex_grid_size)
    }

    pub fn instance_count(&self) -> usize {
        instance_count(self.levels)
    }
}

impl Default for ClipmapConfig {
    fn default() -> Self {
        Self {
            levels: DEFAULT_CLIPMAP_LEVELS,
            vertex_grid_size: DEFAULT_VERTEX_GRID_SIZE,
            frames_in_flight: DEFAULT_FRAMES_IN_FLIGHT,
        }
    }
}

/// Grid sizes must be `2^k - 1` so a level splits into four tiles, a filler
/// row and a trim row.
pub fn is_valid_grid_size(vertex_grid_size: u32) -> bool {
    (MIN_VERTEX_GRID_SIZE..=MAX_VERTEX_GRID_SIZE).contains(&vertex_grid_size)
        && (vertex_grid_size + 1).is_power_of_two()
}

pub fn tile_size_for(vertex_grid_size: u32) -> u32 {
    (vertex_grid_size + 1) / 4 - 1
}

/// 1 cross + 4 inner squares + 12 blocks, a filler, a trim and a seam per level
pub fn instance_count(levels: u32) -> usize {
    5 + 15 * levels as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_power_of_two_minus_one() {
        for k in 3..=12 {
            let size = (1u32 << k) - 1;
            assert!(is_valid_grid_size(size), "{size} should be valid");
        }
        for size in [0, 1, 3, 6, 8, 254, 256, 8191] {
            assert!(!is_valid_grid_size(size), "{size} should be rejected");
        }
    }

    #[test]
    fn tile_size_matches_grid() {
        assert_eq!(tile_size_for(255), 63);
        assert_eq!(tile_size_for(15), 3);
        assert_eq!(tile_size_for(7), 1);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            ClipmapConfig::new(7, 254, 2),
            Err(TerrainError::InvalidGridSize(254))
        ));
        assert!(matches!(
            ClipmapConfig::new(MAX_CLIPMAP_LEVELS + 1, 255, 2),
            Err(TerrainError::InvalidLevelCount(_))
        ));
        assert!(matches!(
            ClipmapConfig::new(7, 255, 0),
            Err(TerrainError::InvalidFramesInFlight(0))
        ));
        let config = ClipmapConfig::new(0, 7, 1).unwrap();
        assert_eq!(config.instance_count(), 5);
    }
}
