//! Surface map operations - Pure DOP functions
//!
//! Classifies tiles as wall side / wall top / none and keeps a padded
//! window of classifications around the camera.

use super::surface_data::{
    SurfaceClassifier, SurfaceMapData, SurfaceSample, SurfaceType, WallColumn,
    SURFACE_TEXEL_NONE, SURFACE_TEXEL_PLACEHOLDER, SURFACE_TEXEL_WALL_SIDE,
    SURFACE_TEXEL_WALL_TOP,
};
use super::tile_data::{TileSource, TileWindow};
use super::tile_operations::{in_bounds, is_wall_side_tile, is_wall_top_tile, tile_window, window_index};
use crate::camera::{floored_display, DisplayCamera};
use crate::constants::{tiles::LAYERS, walls::SCAN_TILES};
use glam::IVec2;

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Classifier using the autotile wall rules and no extra ids
pub fn default_classifier() -> SurfaceClassifier {
    SurfaceClassifier {
        use_autotile_rules: true,
        ..Default::default()
    }
}

fn matches_wall_side(classifier: &SurfaceClassifier, tile_id: u32) -> bool {
    tile_id != 0
        && (classifier.wall_side_ids.contains(&tile_id)
            || (classifier.use_autotile_rules && is_wall_side_tile(tile_id)))
}

fn matches_wall_top(classifier: &SurfaceClassifier, tile_id: u32) -> bool {
    tile_id != 0
        && (classifier.wall_top_ids.contains(&tile_id)
            || (classifier.use_autotile_rules && is_wall_top_tile(tile_id)))
}

/// Classify a single tile id in isolation
pub fn classify_tile_id(classifier: &SurfaceClassifier, tile_id: u32) -> SurfaceType {
    if matches_wall_side(classifier, tile_id) {
        SurfaceType::WallSide
    } else if matches_wall_top(classifier, tile_id) {
        SurfaceType::WallTop
    } else {
        SurfaceType::None
    }
}

/// Classify a map tile from its stacked layers
///
/// Any layer matching a wall side wins over every wall top match.
pub fn classify_tile(
    classifier: &SurfaceClassifier,
    source: &dyn TileSource,
    x: i32,
    y: i32,
) -> SurfaceType {
    if !in_bounds(source, x, y) {
        return SurfaceType::None;
    }

    if (0..LAYERS).any(|layer| matches_wall_side(classifier, source.tile_id(x, y, layer))) {
        return SurfaceType::WallSide;
    }

    if (0..LAYERS).any(|layer| matches_wall_top(classifier, source.tile_id(x, y, layer))) {
        return SurfaceType::WallTop;
    }

    SurfaceType::None
}

// ============================================================================
// SURFACE MAP
// ============================================================================

/// Create an empty, unpopulated surface map
pub fn create_surface_map(padding: i32) -> SurfaceMapData {
    SurfaceMapData {
        window: TileWindow {
            origin: IVec2::ZERO,
            width: 0,
            height: 0,
        },
        padding,
        cells: Vec::new(),
        populated: false,
        cached_floor: None,
        revision: 0,
    }
}

/// Force the next refresh to rebuild (level data changed)
pub fn invalidate_surface_map(map: &mut SurfaceMapData) {
    map.cached_floor = None;
}

/// Rebuild the window if the floored camera position moved
///
/// Returns true when the map was rebuilt.
pub fn refresh_surface_map(
    map: &mut SurfaceMapData,
    source: &dyn TileSource,
    classifier: &SurfaceClassifier,
    camera: &DisplayCamera,
) -> bool {
    let floor = floored_display(camera);
    if map.populated && map.cached_floor == Some(floor) {
        return false;
    }

    let window = tile_window(camera, map.padding);
    let mut cells = Vec::with_capacity((window.width * window.height) as usize);
    for y in 0..window.height as i32 {
        for x in 0..window.width as i32 {
            cells.push(classify_tile(
                classifier,
                source,
                window.origin.x + x,
                window.origin.y + y,
            ));
        }
    }

    map.window = window;
    map.cells = cells;
    map.populated = true;
    map.cached_floor = Some(floor);
    map.revision += 1;

    log::debug!(
        "[SurfaceMap] Rebuilt {}x{} at ({}, {}) rev {}",
        window.width,
        window.height,
        window.origin.x,
        window.origin.y,
        map.revision
    );

    true
}

/// Surface type of a world tile; NONE outside the window or before population
pub fn surface_at(map: &SurfaceMapData, tile: IVec2) -> SurfaceType {
    if !map.populated {
        return SurfaceType::None;
    }
    window_index(&map.window, tile)
        .map(|index| map.cells[index])
        .unwrap_or(SurfaceType::None)
}

pub fn is_wall_side_at(map: &SurfaceMapData, tile: IVec2) -> bool {
    surface_at(map, tile) == SurfaceType::WallSide
}

/// Contiguous wall-side run containing `tile`, scanning a bounded distance
pub fn wall_column(map: &SurfaceMapData, tile: IVec2) -> Option<WallColumn> {
    if !is_wall_side_at(map, tile) {
        return None;
    }

    let mut base = tile.y;
    for step in 1..=SCAN_TILES {
        if is_wall_side_at(map, IVec2::new(tile.x, tile.y + step)) {
            base = tile.y + step;
        } else {
            break;
        }
    }

    let mut top = tile.y;
    for step in 1..=SCAN_TILES {
        if is_wall_side_at(map, IVec2::new(tile.x, tile.y - step)) {
            top = tile.y - step;
        } else {
            break;
        }
    }

    Some(WallColumn {
        top_tile_y: top,
        base_tile_y: base,
    })
}

// ============================================================================
// TEXEL ENCODING
// ============================================================================

pub fn encode_surface_texel(surface: SurfaceType) -> [u8; 4] {
    match surface {
        SurfaceType::None => SURFACE_TEXEL_NONE,
        SurfaceType::WallSide => SURFACE_TEXEL_WALL_SIDE,
        SurfaceType::WallTop => SURFACE_TEXEL_WALL_TOP,
    }
}

/// Decode a texel; both channels set means "no wall data loaded"
pub fn decode_surface_texel(texel: [u8; 4]) -> SurfaceSample {
    let side = texel[0] >= 128;
    let top = texel[1] >= 128;
    match (side, top) {
        (true, true) => SurfaceSample::NoData,
        (true, false) => SurfaceSample::Surface(SurfaceType::WallSide),
        (false, true) => SurfaceSample::Surface(SurfaceType::WallTop),
        (false, false) => SurfaceSample::Surface(SurfaceType::None),
    }
}

/// RGBA texture contents for GPU upload: `(width, height, bytes)`
///
/// An unpopulated map yields the 1x1 placeholder texel.
pub fn surface_texels(map: &SurfaceMapData) -> (u32, u32, Vec<u8>) {
    if !map.populated || map.cells.is_empty() {
        return (1, 1, SURFACE_TEXEL_PLACEHOLDER.to_vec());
    }

    let bytes = map
        .cells
        .iter()
        .flat_map(|surface| encode_surface_texel(*surface))
        .collect();
    (map.window.width, map.window.height, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tiles::tile_operations::{create_grid_source, make_autotile_id, set_tile};
    use glam::Vec2;

    fn camera() -> DisplayCamera {
        DisplayCamera {
            display: Vec2::ZERO,
            tile_size: Vec2::splat(32.0),
            screen_size: Vec2::new(128.0, 128.0),
        }
    }

    #[test]
    fn test_wall_side_wins_over_wall_top_on_any_layer() {
        let mut grid = create_grid_source(4, 4);
        set_tile(&mut grid, 1, 1, 0, make_autotile_id(80, 0)); // top on layer 0
        set_tile(&mut grid, 1, 1, 2, make_autotile_id(88, 0)); // side on layer 2
        let classifier = default_classifier();
        assert_eq!(classify_tile(&classifier, &grid, 1, 1), SurfaceType::WallSide);
    }

    #[test]
    fn test_override_ids() {
        let mut classifier = SurfaceClassifier::default();
        classifier.wall_top_ids.insert(17);
        assert_eq!(classify_tile_id(&classifier, 17), SurfaceType::WallTop);
        // Autotile rules disabled
        assert_eq!(
            classify_tile_id(&classifier, make_autotile_id(88, 0)),
            SurfaceType::None
        );
    }

    #[test]
    fn test_placeholder_texel_is_no_data() {
        assert_eq!(
            decode_surface_texel(SURFACE_TEXEL_PLACEHOLDER),
            SurfaceSample::NoData
        );
        for surface in [SurfaceType::None, SurfaceType::WallSide, SurfaceType::WallTop] {
            assert_eq!(
                decode_surface_texel(encode_surface_texel(surface)),
                SurfaceSample::Surface(surface)
            );
        }
    }

    #[test]
    fn test_unpopulated_map_reports_none_and_placeholder() {
        let map = create_surface_map(2);
        assert_eq!(surface_at(&map, IVec2::new(0, 0)), SurfaceType::None);
        let (w, h, bytes) = surface_texels(&map);
        assert_eq!((w, h), (1, 1));
        assert_eq!(bytes, SURFACE_TEXEL_PLACEHOLDER.to_vec());
    }

    #[test]
    fn test_wall_column_extent() {
        let mut grid = create_grid_source(6, 8);
        for y in 2..5 {
            set_tile(&mut grid, 3, y, 0, make_autotile_id(88, 0));
        }
        let mut map = create_surface_map(2);
        assert!(refresh_surface_map(&mut map, &grid, &default_classifier(), &camera()));

        let column = wall_column(&map, IVec2::new(3, 3)).unwrap();
        assert_eq!(column.top_tile_y, 2);
        assert_eq!(column.base_tile_y, 4);
        assert!(wall_column(&map, IVec2::new(2, 3)).is_none());
    }

    #[test]
    fn test_refresh_skips_sub_tile_motion() {
        let grid = create_grid_source(8, 8);
        let classifier = default_classifier();
        let mut map = create_surface_map(1);
        let mut cam = camera();
        assert!(refresh_surface_map(&mut map, &grid, &classifier, &cam));
        cam.display = Vec2::new(0.6, 0.9);
        assert!(!refresh_surface_map(&mut map, &grid, &classifier, &cam));
        cam.display = Vec2::new(1.0, 0.9);
        assert!(refresh_surface_map(&mut map, &grid, &classifier, &cam));
        assert_eq!(map.revision, 2);
    }
}
