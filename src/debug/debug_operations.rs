//! Debug overlay operations - Pure DOP functions
//!
//! Overlays tint an already-composited frame. They read the same maps the
//! compositor reads and never feed back into lighting.

use crate::camera::{screen_to_world, world_to_tile};
use crate::compositor::CompositorInputs;
use crate::config::DebugOverlay;
use crate::lights::{angular_distance, is_cone_limited};
use crate::tiles::{is_obstacle_tile, surface_at, SurfaceType};
use glam::Vec2;
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

const OBSTACLE_TINT: [u8; 3] = [255, 40, 40];
const WALL_SIDE_TINT: [u8; 3] = [40, 80, 255];
const WALL_TOP_TINT: [u8; 3] = [40, 255, 80];
const RADIUS_TINT: [u8; 3] = [255, 230, 40];
const CONE_TINT: [u8; 3] = [255, 140, 0];

const TINT_ALPHA: f32 = 0.5;

/// Line width of the light cone diagnostics (px)
const LINE_WIDTH: f32 = 1.0;

/// Overlay tint for a screen pixel, if any
pub fn overlay_tint(
    mode: DebugOverlay,
    inputs: &CompositorInputs<'_>,
    pixel: Vec2,
) -> Option<[u8; 3]> {
    match mode {
        DebugOverlay::None => None,
        DebugOverlay::Obstacles => {
            let tile = world_to_tile(inputs.camera.tile_size, screen_to_world(inputs.camera, pixel));
            is_obstacle_tile(inputs.obstacle, tile).then_some(OBSTACLE_TINT)
        }
        DebugOverlay::Surfaces => {
            let tile = world_to_tile(inputs.camera.tile_size, screen_to_world(inputs.camera, pixel));
            match surface_at(inputs.surface, tile) {
                SurfaceType::WallSide => Some(WALL_SIDE_TINT),
                SurfaceType::WallTop => Some(WALL_TOP_TINT),
                SurfaceType::None => None,
            }
        }
        DebugOverlay::LightCones => light_cone_tint(inputs, pixel),
    }
}

fn light_cone_tint(inputs: &CompositorInputs<'_>, pixel: Vec2) -> Option<[u8; 3]> {
    for light in &inputs.lights.lights {
        let delta = pixel - light.position;
        let distance = delta.length();

        if (distance - light.radius).abs() <= LINE_WIDTH
            || (light.inner_radius > 0.0 && (distance - light.inner_radius).abs() <= LINE_WIDTH)
        {
            return Some(RADIUS_TINT);
        }

        if is_cone_limited(light) && distance < light.radius && distance > 0.0 {
            let off_axis = angular_distance(delta.y.atan2(delta.x), light.direction);
            // Distance from the pixel to the nearest cone edge ray
            let edge_gap = (off_axis - light.half_cone).abs() * distance;
            if edge_gap <= LINE_WIDTH {
                return Some(CONE_TINT);
            }
        }
    }
    None
}

fn blend(pixel: &mut Rgba<u8>, tint: [u8; 3]) {
    for channel in 0..3 {
        let base = pixel[channel] as f32;
        pixel[channel] = (base + (tint[channel] as f32 - base) * TINT_ALPHA).round() as u8;
    }
}

/// Tint a composited frame in place; no-op for `DebugOverlay::None`
///
/// Returns the number of tinted pixels.
pub fn apply_debug_overlay(
    image: &mut RgbaImage,
    mode: DebugOverlay,
    inputs: &CompositorInputs<'_>,
) -> usize {
    if mode == DebugOverlay::None {
        return 0;
    }

    if mode == DebugOverlay::Surfaces && !inputs.surface.populated {
        log::debug!("[Debug] Surface overlay requested before the surface map was populated");
        return 0;
    }

    let width = image.width() as usize;
    let tinted: usize = image
        .par_chunks_mut(width.max(1) * 4)
        .enumerate()
        .map(|(y, row)| {
            let mut count = 0;
            for (x, texel) in row.chunks_exact_mut(4).enumerate() {
                let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if let Some(tint) = overlay_tint(mode, inputs, pixel) {
                    let mut rgba = Rgba([texel[0], texel[1], texel[2], texel[3]]);
                    blend(&mut rgba, tint);
                    texel.copy_from_slice(&rgba.0);
                    count += 1;
                }
            }
            count
        })
        .sum();

    log::debug!("[Debug] {:?} overlay tinted {} pixel(s)", mode, tinted);
    tinted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_halfway() {
        let mut pixel = Rgba([0, 100, 255, 9]);
        blend(&mut pixel, [255, 100, 0]);
        assert_eq!(pixel, Rgba([128, 100, 128, 9]));
    }
}
