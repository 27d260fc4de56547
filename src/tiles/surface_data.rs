//! Surface map data - Pure DOP
//!
//! NO METHODS. Just data.
//! Classification and windowing happen in surface_operations.rs

use super::tile_data::TileWindow;
use glam::IVec2;
use std::collections::HashSet;

/// Per-tile surface classification
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SurfaceType {
    #[default]
    None = 0,
    /// Vertical wall face
    WallSide = 1,
    /// Horizontal wall cap
    WallTop = 2,
}

/// Result of decoding a surface texel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceSample {
    Surface(SurfaceType),
    /// Both channels set: the placeholder texture, not a real tile
    NoData,
}

/// RGBA texel encodings (R = wall side, G = wall top)
pub const SURFACE_TEXEL_NONE: [u8; 4] = [0, 0, 0, 255];
pub const SURFACE_TEXEL_WALL_SIDE: [u8; 4] = [255, 0, 0, 255];
pub const SURFACE_TEXEL_WALL_TOP: [u8; 4] = [0, 255, 0, 255];
pub const SURFACE_TEXEL_PLACEHOLDER: [u8; 4] = [255, 255, 255, 255];

/// Tileset metadata used to classify tile ids
#[derive(Debug, Clone, Default)]
pub struct SurfaceClassifier {
    /// Apply the A3/A4 autotile wall rules
    pub use_autotile_rules: bool,

    /// Extra ids always treated as wall faces
    pub wall_side_ids: HashSet<u32>,

    /// Extra ids always treated as wall caps
    pub wall_top_ids: HashSet<u32>,
}

/// Windowed surface classification grid
#[derive(Debug, Clone)]
pub struct SurfaceMapData {
    pub window: TileWindow,
    pub padding: i32,
    pub cells: Vec<SurfaceType>,

    /// False until the first successful refresh
    pub populated: bool,

    /// Floored display position the window was built for
    pub cached_floor: Option<IVec2>,

    /// Bumped on every rebuild
    pub revision: u64,
}

/// Vertical run of contiguous wall-side tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallColumn {
    /// Highest wall-side tile row in the run
    pub top_tile_y: i32,
    /// Lowest wall-side tile row in the run
    pub base_tile_y: i32,
}
