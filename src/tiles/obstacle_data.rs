//! Obstacle map data - Pure DOP
//!
//! NO METHODS. Just data.

use super::tile_data::TileWindow;
use crate::config::ObstacleDetectionMode;
use glam::IVec2;

/// Binary occupancy grid over a padded window of the tile map
#[derive(Debug, Clone)]
pub struct ObstacleMapData {
    pub window: TileWindow,
    pub padding: i32,
    pub mode: ObstacleDetectionMode,

    /// One byte per tile, 1 = obstacle
    pub cells: Vec<u8>,

    /// Floored display position the window was built for
    pub cached_floor: Option<IVec2>,

    /// Bumped on every rebuild
    pub revision: u64,
}

/// Obstacle texel values (RGB duplicated, opaque alpha)
pub const OBSTACLE_TEXEL_EMPTY: [u8; 4] = [0, 0, 0, 255];
pub const OBSTACLE_TEXEL_SOLID: [u8; 4] = [255, 255, 255, 255];
