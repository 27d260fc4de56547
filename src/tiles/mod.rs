/// Tiles Module - Data-Oriented Programming (DOP) style
///
/// Level data seam plus the two windowed maps derived from it.
///
/// - tile_data.rs / tile_operations.rs: `TileSource` seam, windows, autotile ids
/// - surface_data.rs / surface_operations.rs: WALL_SIDE / WALL_TOP classification
/// - obstacle_data.rs / obstacle_operations.rs: binary occupancy grid
pub mod obstacle_data;
pub mod obstacle_operations;
pub mod surface_data;
pub mod surface_operations;
pub mod tile_data;
pub mod tile_operations;

pub use tile_data::{GridTileSource, TileSource, TileWindow};
pub use tile_operations::{
    autotile_kind, create_grid_source, fill_region, in_bounds, is_autotile, is_tile_a3,
    is_tile_a4, is_wall_side_tile, is_wall_top_tile, make_autotile_id, padding_for_reach,
    set_region, set_tile, tile_window, window_index,
};

pub use surface_data::{
    SurfaceClassifier, SurfaceMapData, SurfaceSample, SurfaceType, WallColumn,
    SURFACE_TEXEL_NONE, SURFACE_TEXEL_PLACEHOLDER, SURFACE_TEXEL_WALL_SIDE,
    SURFACE_TEXEL_WALL_TOP,
};
pub use surface_operations::{
    classify_tile, classify_tile_id, create_surface_map, decode_surface_texel,
    default_classifier, encode_surface_texel, invalidate_surface_map, is_wall_side_at,
    refresh_surface_map, surface_at, surface_texels, wall_column,
};

pub use obstacle_data::{ObstacleMapData, OBSTACLE_TEXEL_EMPTY, OBSTACLE_TEXEL_SOLID};
pub use obstacle_operations::{
    create_obstacle_map, ensure_obstacle_padding, invalidate_obstacle_map, is_obstacle_at,
    is_obstacle_source_tile, is_obstacle_tile, obstacle_count, obstacle_texels,
    refresh_obstacle_map, set_detection_mode,
};
