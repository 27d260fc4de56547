//! Display camera operations - Pure DOP functions
//!
//! All functions are pure: they take data, return new data, no side effects.

use super::camera_data::{DisplayCamera, ScreenRect};
use crate::config::LightingConfig;
use glam::{IVec2, Vec2};

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Build a camera from the configured viewport at the given scroll position
pub fn init_camera(config: &LightingConfig, display: Vec2) -> DisplayCamera {
    DisplayCamera {
        display,
        tile_size: Vec2::new(config.tile_width as f32, config.tile_height as f32),
        screen_size: Vec2::new(config.screen_width as f32, config.screen_height as f32),
    }
}

/// Return a copy scrolled to a new display position
pub fn scroll_to(camera: &DisplayCamera, display: Vec2) -> DisplayCamera {
    DisplayCamera {
        display,
        ..*camera
    }
}

/// Return a copy with a new viewport size
pub fn resize(camera: &DisplayCamera, width: u32, height: u32) -> DisplayCamera {
    DisplayCamera {
        screen_size: Vec2::new(width as f32, height as f32),
        ..*camera
    }
}

// ============================================================================
// COORDINATE CONVERSION
// ============================================================================

/// Scroll offset in world pixels
pub fn scroll_px(camera: &DisplayCamera) -> Vec2 {
    camera.display * camera.tile_size
}

/// Floored display position (tiles)
pub fn floored_display(camera: &DisplayCamera) -> IVec2 {
    camera.display.floor().as_ivec2()
}

pub fn screen_to_world(camera: &DisplayCamera, screen: Vec2) -> Vec2 {
    screen + scroll_px(camera)
}

pub fn world_to_screen(camera: &DisplayCamera, world: Vec2) -> Vec2 {
    world - scroll_px(camera)
}

/// Tile containing a world pixel position
pub fn world_to_tile(tile_size: Vec2, world: Vec2) -> IVec2 {
    (world / tile_size).floor().as_ivec2()
}

/// Tile containing a screen pixel position
pub fn screen_to_tile(camera: &DisplayCamera, screen: Vec2) -> IVec2 {
    world_to_tile(camera.tile_size, screen_to_world(camera, screen))
}

/// Number of whole tiles needed to cover the viewport on each axis
pub fn visible_tiles(camera: &DisplayCamera) -> IVec2 {
    (camera.screen_size / camera.tile_size).ceil().as_ivec2()
}

/// Viewport rectangle in screen pixels
pub fn viewport_rect(camera: &DisplayCamera) -> ScreenRect {
    ScreenRect {
        min: Vec2::ZERO,
        max: camera.screen_size,
    }
}

/// Expand a rectangle by `margin` on every side
pub fn expand_rect(rect: &ScreenRect, margin: f32) -> ScreenRect {
    ScreenRect {
        min: rect.min - Vec2::splat(margin),
        max: rect.max + Vec2::splat(margin),
    }
}

pub fn rect_contains(rect: &ScreenRect, point: Vec2) -> bool {
    point.x >= rect.min.x && point.y >= rect.min.y && point.x <= rect.max.x && point.y <= rect.max.y
}

// ============================================================================
// DIAGNOSTICS
// ============================================================================

/// True when two cameras sit on different floored tiles
pub fn crossed_tile_boundary(previous: &DisplayCamera, current: &DisplayCamera) -> bool {
    floored_display(previous) != floored_display(current)
}

/// Camera movement between two frames, in tiles
pub fn movement_tiles(previous: Vec2, current: Vec2) -> f32 {
    (current - previous).length()
}

/// Log camera context for debugging
pub fn log_camera_context(camera: &DisplayCamera) {
    let floored = floored_display(camera);
    log::debug!(
        "[Camera] Display: ({:.3}, {:.3}) | Floored: ({}, {}) | Scroll: ({:.1}, {:.1})px | Viewport: {}x{}",
        camera.display.x,
        camera.display.y,
        floored.x,
        floored.y,
        scroll_px(camera).x,
        scroll_px(camera).y,
        camera.screen_size.x,
        camera.screen_size.y
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(x: f32, y: f32) -> DisplayCamera {
        DisplayCamera {
            display: Vec2::new(x, y),
            tile_size: Vec2::new(32.0, 32.0),
            screen_size: Vec2::new(320.0, 240.0),
        }
    }

    #[test]
    fn test_screen_world_round_trip() {
        let camera = camera_at(2.5, 1.25);
        let screen = Vec2::new(17.0, 99.0);
        let world = screen_to_world(&camera, screen);
        assert_eq!(world, Vec2::new(17.0 + 80.0, 99.0 + 40.0));
        assert_eq!(world_to_screen(&camera, world), screen);
    }

    #[test]
    fn test_world_to_tile_floors_negative() {
        let tile = world_to_tile(Vec2::splat(32.0), Vec2::new(-1.0, 31.9));
        assert_eq!(tile, IVec2::new(-1, 0));
    }

    #[test]
    fn test_visible_tiles_rounds_up() {
        let camera = DisplayCamera {
            screen_size: Vec2::new(330.0, 240.0),
            ..camera_at(0.0, 0.0)
        };
        assert_eq!(visible_tiles(&camera), IVec2::new(11, 8));
    }

    #[test]
    fn test_sub_tile_motion_does_not_cross_boundary() {
        assert!(!crossed_tile_boundary(&camera_at(3.1, 4.0), &camera_at(3.9, 4.5)));
        assert!(crossed_tile_boundary(&camera_at(3.9, 4.0), &camera_at(4.0, 4.0)));
        assert!(crossed_tile_boundary(&camera_at(0.2, 0.0), &camera_at(-0.2, 0.0)));
    }

    #[test]
    fn test_expand_rect_contains() {
        let rect = expand_rect(&viewport_rect(&camera_at(0.0, 0.0)), 50.0);
        assert!(rect_contains(&rect, Vec2::new(-49.0, 10.0)));
        assert!(!rect_contains(&rect, Vec2::new(-51.0, 10.0)));
        assert!(rect_contains(&rect, Vec2::new(370.0, 290.0)));
    }
}
