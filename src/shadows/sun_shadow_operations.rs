//! Sun shadow map operations - Pure DOP functions
//!
//! Every floor pixel marches towards the sun through the obstacle map.
//! Regeneration is throttled on camera motion, sun direction and style.

use super::sun_shadow_data::{
    SunShadowCacheKey, SunShadowDecision, SunShadowMapData, SunShadowStyle,
};
use crate::camera::{screen_to_world, world_to_tile, DisplayCamera};
use crate::config::{LightingConfig, RegenerationConfig, SunShadowFalloff};
use crate::constants::sun_shadow::{MAX_STEPS, MIN_STEP_PX};
use crate::lights::{angular_distance, is_sun_active, sun_direction_vector, Sun};
use crate::tiles::{is_obstacle_tile, surface_at, ObstacleMapData, SurfaceMapData, SurfaceType};
use glam::{IVec2, Vec2};
use rayon::prelude::*;

// ============================================================================
// CREATION
// ============================================================================

pub fn create_sun_shadow_map(width: u32, height: u32) -> SunShadowMapData {
    SunShadowMapData {
        width,
        height,
        texels: vec![1.0; (width * height) as usize],
        cache: None,
        generation: 0,
    }
}

/// Resize to a new viewport; forces regeneration
pub fn resize_sun_shadow_map(map: &mut SunShadowMapData, width: u32, height: u32) {
    if map.width == width && map.height == height {
        return;
    }
    map.width = width;
    map.height = height;
    map.texels = vec![1.0; (width * height) as usize];
    map.cache = None;
}

pub fn clear_sun_shadow_map(map: &mut SunShadowMapData) {
    map.texels = Vec::new();
    map.cache = None;
}

pub fn sun_shadow_style(config: &LightingConfig) -> SunShadowStyle {
    SunShadowStyle {
        strength: config.shadow.sun_shadow_strength,
        length: config.shadow.sun_shadow_length,
        precision: config.shadow.sun_shadow_precision,
        softness: config.shadow.sun_shadow_softness,
        falloff: config.shadow.sun_shadow_falloff,
    }
}

// ============================================================================
// SHADING
// ============================================================================

/// Shadow factor for an obstacle found at normalized distance `nd`
pub fn falloff_factor(falloff: SunShadowFalloff, strength: f32, nd: f32) -> f32 {
    let nd = nd.clamp(0.0, 1.0);
    match falloff {
        SunShadowFalloff::None => 1.0 - strength,
        SunShadowFalloff::Linear => 1.0 - strength * (1.0 - nd),
        SunShadowFalloff::Smooth => 1.0 - strength * (1.0 - nd * nd),
    }
}

/// March from `origin` towards the sun; 1.0 when nothing blocks it
pub fn march_sun_ray(
    obstacle: &ObstacleMapData,
    tile_size: Vec2,
    origin: Vec2,
    skip_tile: IVec2,
    sun_dir: Vec2,
    style: &SunShadowStyle,
) -> f32 {
    let max_dist = style.length * tile_size.x;
    if max_dist <= 0.0 {
        return 1.0;
    }

    let step = (tile_size.x / style.precision.max(f32::EPSILON)).max(MIN_STEP_PX);
    let mut t = step;

    for _ in 0..MAX_STEPS {
        if t > max_dist {
            break;
        }
        let tile = world_to_tile(tile_size, origin + sun_dir * t);
        if tile != skip_tile && is_obstacle_tile(obstacle, tile) {
            return falloff_factor(style.falloff, style.strength, t / max_dist);
        }
        t += step;
    }

    1.0
}

/// Sun shadow value for one screen pixel
///
/// Wall tops, wall sides and plain obstacles are written as lit; only
/// floor pixels are marched.
pub fn compute_sun_texel(
    obstacle: &ObstacleMapData,
    surface: &SurfaceMapData,
    camera: &DisplayCamera,
    sun_dir: Vec2,
    style: &SunShadowStyle,
    pixel: Vec2,
) -> f32 {
    let world = screen_to_world(camera, pixel);
    let tile = world_to_tile(camera.tile_size, world);

    if surface_at(surface, tile) != SurfaceType::None || is_obstacle_tile(obstacle, tile) {
        return 1.0;
    }

    if style.softness <= 0.0 {
        return march_sun_ray(obstacle, camera.tile_size, world, tile, sun_dir, style);
    }

    let perp = Vec2::new(-sun_dir.y, sun_dir.x) * style.softness;
    [-perp, Vec2::ZERO, perp]
        .iter()
        .map(|offset| march_sun_ray(obstacle, camera.tile_size, world + *offset, tile, sun_dir, style))
        .sum::<f32>()
        / 3.0
}

// ============================================================================
// GENERATION
// ============================================================================

/// Decide whether the cached map can be reused
pub fn sun_shadow_decision(
    cached: Option<&SunShadowCacheKey>,
    key: &SunShadowCacheKey,
    sun: &Sun,
    thresholds: &RegenerationConfig,
) -> SunShadowDecision {
    if !is_sun_active(sun) {
        return SunShadowDecision::SunInactive;
    }

    let Some(cached) = cached else {
        return SunShadowDecision::FirstGeneration;
    };

    if cached.style != key.style {
        SunShadowDecision::StyleChanged
    } else if cached.obstacle_revision != key.obstacle_revision
        || cached.surface_revision != key.surface_revision
    {
        SunShadowDecision::MapsChanged
    } else if (cached.display - key.display).length() > thresholds.camera_threshold_tiles {
        SunShadowDecision::CameraMoved
    } else if angular_distance(cached.direction, key.direction)
        > thresholds.sun_angle_threshold_radians
    {
        SunShadowDecision::DirectionChanged
    } else {
        SunShadowDecision::Reuse
    }
}

/// Regenerate the sun shadow map when its inputs changed enough
pub fn generate_sun_shadow_map(
    map: &mut SunShadowMapData,
    camera: &DisplayCamera,
    sun: &Sun,
    obstacle: &ObstacleMapData,
    surface: &SurfaceMapData,
    style: &SunShadowStyle,
    thresholds: &RegenerationConfig,
) -> SunShadowDecision {
    let key = SunShadowCacheKey {
        display: camera.display,
        direction: sun.direction,
        style: *style,
        obstacle_revision: obstacle.revision,
        surface_revision: surface.revision,
    };

    let decision = sun_shadow_decision(map.cache.as_ref(), &key, sun, thresholds);
    if matches!(decision, SunShadowDecision::Reuse | SunShadowDecision::SunInactive) {
        log::debug!("[SunShadow] Skipped ({:?})", decision);
        return decision;
    }

    let width = map.width.max(1) as usize;
    let sun_dir = sun_direction_vector(sun);
    map.texels.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        for (x, texel) in row.iter_mut().enumerate() {
            let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            *texel = compute_sun_texel(obstacle, surface, camera, sun_dir, style, pixel);
        }
    });

    map.cache = Some(key);
    map.generation += 1;

    log::debug!(
        "[SunShadow] Regenerated {}x{} ({:?}, gen {})",
        map.width,
        map.height,
        decision,
        map.generation
    );

    decision
}

/// Nearest-texel sample at a screen position, clamped to the viewport
pub fn sample_sun_shadow(map: &SunShadowMapData, pixel: Vec2) -> f32 {
    if map.texels.is_empty() || map.width == 0 || map.height == 0 {
        return 1.0;
    }
    let x = (pixel.x.floor() as i64).clamp(0, map.width as i64 - 1) as usize;
    let y = (pixel.y.floor() as i64).clamp(0, map.height as i64 - 1) as usize;
    map.texels[y * map.width as usize + x]
}
