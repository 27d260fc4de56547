//! Display camera data - Pure DOP
//!
//! NO METHODS. Just data.
//! All transformations happen in camera_operations.rs

use glam::Vec2;

/// 2D display camera over a tile grid
///
/// `display` is the scroll position in fractional tiles (the world tile at
/// the top-left corner of the screen). Screen pixels map to world pixels by
/// adding `display * tile_size`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayCamera {
    /// Scroll position (tiles, fractional)
    pub display: Vec2,

    /// Tile size (px)
    pub tile_size: Vec2,

    /// Viewport size (px)
    pub screen_size: Vec2,
}

/// Axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Default for DisplayCamera {
    fn default() -> Self {
        Self {
            display: Vec2::ZERO,
            tile_size: Vec2::new(48.0, 48.0),
            screen_size: Vec2::new(816.0, 624.0),
        }
    }
}
