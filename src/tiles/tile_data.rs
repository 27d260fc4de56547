//! Tile source data - Pure DOP
//!
//! The lighting core never owns level data. It reads it through the
//! `TileSource` seam, which the host backs with its own map storage.

use crate::constants::tiles::LAYERS;
use glam::IVec2;

/// Read-only per-tile query interface over external level data
pub trait TileSource: Send + Sync {
    /// Map width in tiles
    fn width(&self) -> i32;

    /// Map height in tiles
    fn height(&self) -> i32;

    /// True for tiles inside the map
    fn is_valid(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width() && y < self.height()
    }

    /// Region id painted on a tile (0 = none)
    fn region_id(&self, x: i32, y: i32) -> u32;

    /// Tileset id on one of the stacked layers (0 = empty)
    fn tile_id(&self, x: i32, y: i32, layer: usize) -> u32;
}

/// Rectangular window of the tile grid, anchored at `origin`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileWindow {
    pub origin: IVec2,
    pub width: u32,
    pub height: u32,
}

/// In-memory tile grid
#[derive(Debug, Clone)]
pub struct GridTileSource {
    pub width: i32,
    pub height: i32,
    pub regions: Vec<u32>,
    pub layers: [Vec<u32>; LAYERS],
}

impl TileSource for GridTileSource {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn region_id(&self, x: i32, y: i32) -> u32 {
        if !self.is_valid(x, y) {
            return 0;
        }
        self.regions[(y * self.width + x) as usize]
    }

    fn tile_id(&self, x: i32, y: i32, layer: usize) -> u32 {
        if layer >= LAYERS || !self.is_valid(x, y) {
            return 0;
        }
        self.layers[layer][(y * self.width + x) as usize]
    }
}
