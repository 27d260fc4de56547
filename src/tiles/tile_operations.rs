//! Tile source operations - Pure DOP functions

use super::tile_data::{GridTileSource, TileSource, TileWindow};
use crate::camera::{floored_display, visible_tiles, DisplayCamera};
use crate::constants::tiles::{
    AUTOTILE_SHAPES, LAYERS, TILE_ID_A1, TILE_ID_A3, TILE_ID_A4, TILE_ID_MAX,
};
use glam::{IVec2, Vec2};

// ============================================================================
// WINDOWING
// ============================================================================

/// Padded tile window around the camera
///
/// Size is `(ceil(screen/tile) + 2 + 2P)` on each axis, anchored at
/// `floor(display) - P`.
pub fn tile_window(camera: &DisplayCamera, padding: i32) -> TileWindow {
    let visible = visible_tiles(camera);
    let origin = floored_display(camera) - IVec2::splat(padding);
    TileWindow {
        origin,
        width: (visible.x + 2 + 2 * padding).max(0) as u32,
        height: (visible.y + 2 + 2 * padding).max(0) as u32,
    }
}

/// Tiles of padding needed to reach `reach` pixels past the viewport
pub fn padding_for_reach(tile_size: Vec2, reach: f32) -> i32 {
    let tile = tile_size.x.min(tile_size.y);
    if tile <= 0.0 || !reach.is_finite() || reach <= 0.0 {
        return 0;
    }
    (reach / tile).ceil() as i32
}

/// Cell index of a world tile inside a window
pub fn window_index(window: &TileWindow, tile: IVec2) -> Option<usize> {
    let local = tile - window.origin;
    if local.x < 0 || local.y < 0 || local.x >= window.width as i32 || local.y >= window.height as i32
    {
        return None;
    }
    Some(local.y as usize * window.width as usize + local.x as usize)
}

pub fn in_bounds(source: &dyn TileSource, x: i32, y: i32) -> bool {
    source.is_valid(x, y)
}

// ============================================================================
// AUTOTILE IDS
// ============================================================================

pub fn is_autotile(tile_id: u32) -> bool {
    (TILE_ID_A1..TILE_ID_MAX).contains(&tile_id)
}

pub fn is_tile_a3(tile_id: u32) -> bool {
    (TILE_ID_A3..TILE_ID_A4).contains(&tile_id)
}

pub fn is_tile_a4(tile_id: u32) -> bool {
    (TILE_ID_A4..TILE_ID_MAX).contains(&tile_id)
}

/// Autotile kind (block of 48 shape variants)
pub fn autotile_kind(tile_id: u32) -> u32 {
    (tile_id - TILE_ID_A1) / AUTOTILE_SHAPES
}

/// Autotile id for a kind and shape
pub fn make_autotile_id(kind: u32, shape: u32) -> u32 {
    TILE_ID_A1 + kind * AUTOTILE_SHAPES + shape
}

/// A3/A4 autotiles in the lower half of each 16-kind row are wall faces
pub fn is_wall_side_tile(tile_id: u32) -> bool {
    (is_tile_a3(tile_id) || is_tile_a4(tile_id)) && autotile_kind(tile_id) % 16 >= 8
}

/// A4 autotiles in the upper half of each 16-kind row are wall caps
pub fn is_wall_top_tile(tile_id: u32) -> bool {
    is_tile_a4(tile_id) && autotile_kind(tile_id) % 16 < 8
}

// ============================================================================
// GRID SOURCE
// ============================================================================

/// Create an empty grid (no regions, no tiles)
pub fn create_grid_source(width: i32, height: i32) -> GridTileSource {
    let cells = (width.max(0) * height.max(0)) as usize;
    GridTileSource {
        width,
        height,
        regions: vec![0; cells],
        layers: std::array::from_fn(|_| vec![0; cells]),
    }
}

pub fn set_region(grid: &mut GridTileSource, x: i32, y: i32, region: u32) {
    if in_bounds(&*grid, x, y) {
        grid.regions[(y * grid.width + x) as usize] = region;
    }
}

pub fn set_tile(grid: &mut GridTileSource, x: i32, y: i32, layer: usize, tile_id: u32) {
    if layer < LAYERS && in_bounds(&*grid, x, y) {
        grid.layers[layer][(y * grid.width + x) as usize] = tile_id;
    }
}

/// Fill a rectangle of regions (inclusive min, exclusive max)
pub fn fill_region(grid: &mut GridTileSource, min: IVec2, max: IVec2, region: u32) {
    for y in min.y..max.y {
        for x in min.x..max.x {
            set_region(grid, x, y, region);
        }
    }
}
