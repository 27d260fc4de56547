//! Obstacle map operations - Pure DOP functions

use super::obstacle_data::{ObstacleMapData, OBSTACLE_TEXEL_EMPTY, OBSTACLE_TEXEL_SOLID};
use super::surface_data::{SurfaceClassifier, SurfaceType};
use super::surface_operations::classify_tile;
use super::tile_data::{TileSource, TileWindow};
use super::tile_operations::{in_bounds, tile_window, window_index};
use crate::camera::{floored_display, world_to_tile, DisplayCamera};
use crate::config::ObstacleDetectionMode;
use glam::{IVec2, Vec2};

/// Create an empty obstacle map
pub fn create_obstacle_map(padding: i32, mode: ObstacleDetectionMode) -> ObstacleMapData {
    ObstacleMapData {
        window: TileWindow {
            origin: IVec2::ZERO,
            width: 0,
            height: 0,
        },
        padding,
        mode,
        cells: Vec::new(),
        cached_floor: None,
        revision: 0,
    }
}

/// Obstacle test for one map tile under a detection policy
pub fn is_obstacle_source_tile(
    source: &dyn TileSource,
    classifier: &SurfaceClassifier,
    mode: ObstacleDetectionMode,
    x: i32,
    y: i32,
) -> bool {
    if !in_bounds(source, x, y) {
        return false;
    }

    let by_region = || source.region_id(x, y) > 0;
    let by_wall = || classify_tile(classifier, source, x, y) != SurfaceType::None;

    match mode {
        ObstacleDetectionMode::Regions => by_region(),
        ObstacleDetectionMode::Walls => by_wall(),
        ObstacleDetectionMode::Both => by_region() || by_wall(),
    }
}

/// Switch detection policy; forces a rebuild on the next refresh
pub fn set_detection_mode(map: &mut ObstacleMapData, mode: ObstacleDetectionMode) {
    if map.mode != mode {
        map.mode = mode;
        map.cached_floor = None;
    }
}

/// Grow the window padding to at least `padding` tiles
///
/// Returns true when it grew; the next refresh then rebuilds. The padding
/// never shrinks, so a light leaving the scene keeps the window stable.
pub fn ensure_obstacle_padding(map: &mut ObstacleMapData, padding: i32) -> bool {
    if padding <= map.padding {
        return false;
    }

    log::debug!(
        "[ObstacleMap] Padding grown from {} to {} tiles",
        map.padding,
        padding
    );
    map.padding = padding;
    map.cached_floor = None;
    true
}

/// Force the next refresh to rebuild (level data changed)
pub fn invalidate_obstacle_map(map: &mut ObstacleMapData) {
    map.cached_floor = None;
}

/// Rebuild the window if the floored camera position moved
///
/// Returns true when the map was rebuilt. Sub-tile camera motion is a no-op.
pub fn refresh_obstacle_map(
    map: &mut ObstacleMapData,
    source: &dyn TileSource,
    classifier: &SurfaceClassifier,
    camera: &DisplayCamera,
) -> bool {
    let floor = floored_display(camera);
    if map.cached_floor == Some(floor) {
        return false;
    }

    let window = tile_window(camera, map.padding);
    let mut cells = Vec::with_capacity((window.width * window.height) as usize);
    for y in 0..window.height as i32 {
        for x in 0..window.width as i32 {
            let solid = is_obstacle_source_tile(
                source,
                classifier,
                map.mode,
                window.origin.x + x,
                window.origin.y + y,
            );
            cells.push(solid as u8);
        }
    }

    map.window = window;
    map.cells = cells;
    map.cached_floor = Some(floor);
    map.revision += 1;

    log::debug!(
        "[ObstacleMap] Rebuilt {}x{} at ({}, {}) mode {:?} rev {}",
        window.width,
        window.height,
        window.origin.x,
        window.origin.y,
        map.mode,
        map.revision
    );

    true
}

/// Obstacle flag of a world tile; tiles outside the window are empty
pub fn is_obstacle_tile(map: &ObstacleMapData, tile: IVec2) -> bool {
    window_index(&map.window, tile)
        .map(|index| map.cells[index] != 0)
        .unwrap_or(false)
}

/// Obstacle flag of the tile under a world pixel
pub fn is_obstacle_at(map: &ObstacleMapData, tile_size: Vec2, world: Vec2) -> bool {
    is_obstacle_tile(map, world_to_tile(tile_size, world))
}

/// Number of obstacle tiles in the window
pub fn obstacle_count(map: &ObstacleMapData) -> usize {
    map.cells.iter().filter(|&&cell| cell != 0).count()
}

/// RGBA texture contents for GPU upload: `(width, height, bytes)`
pub fn obstacle_texels(map: &ObstacleMapData) -> (u32, u32, Vec<u8>) {
    if map.cells.is_empty() {
        return (1, 1, OBSTACLE_TEXEL_EMPTY.to_vec());
    }

    let bytes = map
        .cells
        .iter()
        .flat_map(|&cell| {
            if cell != 0 {
                OBSTACLE_TEXEL_SOLID
            } else {
                OBSTACLE_TEXEL_EMPTY
            }
        })
        .collect();
    (map.window.width, map.window.height, bytes)
}
