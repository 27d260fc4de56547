//! Point shadow map operations - Pure DOP functions
//!
//! Generation ray-marches every (light, angle) texel through the obstacle
//! map; lookups turn a pixel's angle and distance from a light into a
//! visibility factor with an 11-tap angular blur.

use super::point_shadow_data::{PointShadowMapData, ShadowRayParams};
use crate::camera::{screen_to_world, world_to_tile, DisplayCamera};
use crate::constants::point_shadow::{
    BLOCKED, BLUR_WEIGHTS, DEPTH_BIAS, MAX_STEPS, MIN_STEP_PX, NO_SHADOW,
};
use crate::lights::{
    angular_distance, is_cone_limited, is_light_enabled, light_signature, Light, LightList,
};
use crate::tiles::{is_obstacle_tile, ObstacleMapData};
use glam::{IVec2, Vec2};
use rayon::prelude::*;
use std::f32::consts::{PI, TAU};

// ============================================================================
// CREATION
// ============================================================================

pub fn create_point_shadow_map(resolution: u32, rows: u32) -> PointShadowMapData {
    PointShadowMapData {
        width: resolution,
        height: rows,
        texels: vec![NO_SHADOW; (resolution * rows) as usize],
        active_rows: 0,
        signature: None,
        generation: 0,
    }
}

/// Release texel storage and forget the cached inputs
pub fn clear_point_shadow_map(map: &mut PointShadowMapData) {
    map.texels = Vec::new();
    map.active_rows = 0;
    map.signature = None;
}

// ============================================================================
// POLAR ENCODING
// ============================================================================

/// Angle represented by a texel column
pub fn column_angle(column: u32, width: u32) -> f32 {
    (column as f32 / width as f32) * TAU - PI
}

/// Texel column covering an angle in [-PI, PI]
pub fn angle_to_column(angle: f32, width: u32) -> u32 {
    let normalized = (angle + PI) / TAU;
    let column = (normalized * width as f32).floor() as i64;
    column.rem_euclid(width as i64) as u32
}

/// March parameters for a light and step budget
pub fn shadow_ray_params(light: &Light, step_budget: u32) -> ShadowRayParams {
    let budget = step_budget.max(1) as f32;
    ShadowRayParams {
        start: light.inner_radius,
        radius: light.radius,
        step: (light.radius / budget).max(MIN_STEP_PX),
    }
}

// ============================================================================
// RAY MARCH
// ============================================================================

/// Distance along a ray to where it enters an axis-aligned box
pub fn ray_box_entry(origin: Vec2, dir: Vec2, box_min: Vec2, box_max: Vec2) -> Option<f32> {
    let mut t_near = f32::NEG_INFINITY;
    let mut t_far = f32::INFINITY;

    for axis in 0..2 {
        let o = origin[axis];
        let d = dir[axis];
        if d.abs() < 1e-8 {
            if o < box_min[axis] || o > box_max[axis] {
                return None;
            }
            continue;
        }
        let t1 = (box_min[axis] - o) / d;
        let t2 = (box_max[axis] - o) / d;
        t_near = t_near.max(t1.min(t2));
        t_far = t_far.min(t1.max(t2));
    }

    if t_near > t_far || t_far < 0.0 {
        None
    } else {
        Some(t_near)
    }
}

/// Normalized distance to the first obstacle along `angle`, or NO_SHADOW
///
/// Each tile is tested once, when the march first enters it. The tile
/// holding the light is never tested.
pub fn march_shadow_ray(
    obstacle: &ObstacleMapData,
    tile_size: Vec2,
    light_world: Vec2,
    angle: f32,
    params: &ShadowRayParams,
) -> f32 {
    if params.radius <= 0.0 {
        return NO_SHADOW;
    }

    let dir = Vec2::new(angle.cos(), angle.sin());
    let mut last_tile: IVec2 = world_to_tile(tile_size, light_world);
    let mut t = params.start;

    for _ in 0..MAX_STEPS {
        if t > params.radius {
            break;
        }

        let tile = world_to_tile(tile_size, light_world + dir * t);
        if tile != last_tile {
            last_tile = tile;
            if is_obstacle_tile(obstacle, tile) {
                let tile_min = tile.as_vec2() * tile_size;
                let entry = ray_box_entry(light_world, dir, tile_min, tile_min + tile_size)
                    .unwrap_or(t)
                    .clamp(params.start, t);
                return (entry / params.radius).clamp(0.0, 1.0);
            }
        }

        t += params.step;
    }

    NO_SHADOW
}

/// Value of one polar texel for a light
pub fn compute_shadow_texel(
    obstacle: &ObstacleMapData,
    tile_size: Vec2,
    light: &Light,
    light_world: Vec2,
    angle: f32,
    step_budget: u32,
) -> f32 {
    if !is_light_enabled(light) {
        return NO_SHADOW;
    }

    if is_cone_limited(light) && angular_distance(angle, light.direction) > light.half_cone {
        return BLOCKED;
    }

    let params = shadow_ray_params(light, step_budget);
    march_shadow_ray(obstacle, tile_size, light_world, angle, &params)
}

// ============================================================================
// GENERATION
// ============================================================================

/// Regenerate the map if the lights or obstacles changed
///
/// Returns true when texels were rewritten.
pub fn generate_point_shadow_map(
    map: &mut PointShadowMapData,
    lights: &LightList,
    camera: &DisplayCamera,
    obstacle: &ObstacleMapData,
    step_budget: u32,
) -> bool {
    let signature = light_signature(lights, camera, obstacle.revision, map.width, step_budget);
    if map.signature.as_ref() == Some(&signature) {
        log::debug!("[PointShadow] Inputs unchanged, reusing map");
        return false;
    }

    let width = map.width;
    let active = (lights.lights.len() as u32).min(map.height);
    let tile_size = camera.tile_size;
    let light_worlds: Vec<Vec2> = lights
        .lights
        .iter()
        .map(|light| screen_to_world(camera, light.position))
        .collect();

    map.texels
        .par_chunks_mut(width.max(1) as usize)
        .enumerate()
        .for_each(|(row, texels)| {
            if row as u32 >= active {
                texels.fill(NO_SHADOW);
                return;
            }
            let light = &lights.lights[row];
            let light_world = light_worlds[row];
            for (column, texel) in texels.iter_mut().enumerate() {
                let angle = column_angle(column as u32, width);
                *texel = compute_shadow_texel(
                    obstacle,
                    tile_size,
                    light,
                    light_world,
                    angle,
                    step_budget,
                );
            }
        });

    map.active_rows = active;
    map.signature = Some(signature);
    map.generation += 1;

    log::debug!(
        "[PointShadow] Generated {} light row(s) at {} angles (gen {})",
        active,
        width,
        map.generation
    );

    true
}

// ============================================================================
// LOOKUP
// ============================================================================

fn texel(map: &PointShadowMapData, row: u32, column: i64) -> f32 {
    if map.texels.is_empty() || row >= map.height {
        return NO_SHADOW;
    }
    let column = column.rem_euclid(map.width as i64) as usize;
    map.texels[row as usize * map.width as usize + column]
}

/// Unfiltered texel for a light row and angle
pub fn shadow_lookup_raw(map: &PointShadowMapData, row: u32, angle: f32) -> f32 {
    texel(map, row, angle_to_column(angle, map.width) as i64)
}

/// Visibility (0-1) of a point at `angle` and normalized distance from a light
///
/// The blur spread grows with distance, so shadows soften farther out.
pub fn shadow_lookup_blurred(
    map: &PointShadowMapData,
    row: u32,
    angle: f32,
    normalized_dist: f32,
    softness: f32,
) -> f32 {
    if map.texels.is_empty() {
        return 1.0;
    }

    let center = (angle + PI) / TAU * map.width as f32;
    let spread = softness.max(0.0) * normalized_dist;
    let half = (BLUR_WEIGHTS.len() / 2) as f32;

    let mut lit = 0.0;
    let mut total = 0.0;
    for (i, weight) in BLUR_WEIGHTS.iter().enumerate() {
        let offset = (i as f32 - half) * spread;
        let column = (center + offset).floor() as i64;
        if texel(map, row, column) >= normalized_dist - DEPTH_BIAS {
            lit += weight;
        }
        total += weight;
    }

    lit / total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObstacleDetectionMode;
    use crate::lights::{build_light_list, create_point_light, create_spotlight};
    use crate::tiles::{create_grid_source, create_obstacle_map, default_classifier, refresh_obstacle_map, set_region};
    use glam::Vec3;

    fn camera() -> DisplayCamera {
        DisplayCamera {
            display: Vec2::ZERO,
            tile_size: Vec2::splat(32.0),
            screen_size: Vec2::new(320.0, 320.0),
        }
    }

    fn obstacle_with(regions: &[(i32, i32)]) -> ObstacleMapData {
        let mut grid = create_grid_source(10, 10);
        for &(x, y) in regions {
            set_region(&mut grid, x, y, 1);
        }
        let mut map = create_obstacle_map(2, ObstacleDetectionMode::Regions);
        refresh_obstacle_map(&mut map, &grid, &default_classifier(), &camera());
        map
    }

    #[test]
    fn test_column_angle_round_trip() {
        for width in [64, 256, 512] {
            for column in [0, 1, width / 4, width / 2, width - 1] {
                assert_eq!(angle_to_column(column_angle(column, width) + 1e-4, width), column);
            }
        }
        // PI wraps to column 0
        assert_eq!(angle_to_column(PI, 256), 0);
    }

    #[test]
    fn test_ray_hits_tile_entry_boundary() {
        // Light at centre of tile (1,1); obstacle tile (4,1) starts at x = 128
        let obstacle = obstacle_with(&[(4, 1)]);
        let light = create_point_light(Vec2::new(48.0, 48.0), 160.0, 1.0, Vec3::ONE);
        let value = compute_shadow_texel(&obstacle, Vec2::splat(32.0), &light, light.position, 0.0, 80);
        let expected = (128.0 - 48.0) / 160.0;
        assert!((value - expected).abs() < 1e-4, "got {value}, expected {expected}");
    }

    #[test]
    fn test_no_obstacle_is_no_shadow() {
        let obstacle = obstacle_with(&[]);
        let light = create_point_light(Vec2::new(48.0, 48.0), 100.0, 1.0, Vec3::ONE);
        let value = compute_shadow_texel(&obstacle, Vec2::splat(32.0), &light, light.position, 0.7, 64);
        assert_eq!(value, NO_SHADOW);
    }

    #[test]
    fn test_disabled_light_and_spot_cone() {
        let obstacle = obstacle_with(&[(4, 1)]);
        let tile = Vec2::splat(32.0);

        let dark = create_point_light(Vec2::new(48.0, 48.0), 160.0, 0.0, Vec3::ONE);
        assert_eq!(compute_shadow_texel(&obstacle, tile, &dark, dark.position, 0.0, 64), NO_SHADOW);

        let spot = create_spotlight(Vec2::new(48.0, 48.0), 160.0, 1.0, Vec3::ONE, 0.0, 0.4);
        assert_eq!(compute_shadow_texel(&obstacle, tile, &spot, spot.position, PI / 2.0, 64), BLOCKED);
        assert!(compute_shadow_texel(&obstacle, tile, &spot, spot.position, 0.0, 64) < 1.0);
    }

    #[test]
    fn test_generation_skips_when_unchanged() {
        let obstacle = obstacle_with(&[(4, 1)]);
        let cam = camera();
        let lights = build_light_list(
            &[create_point_light(Vec2::new(48.0, 48.0), 160.0, 1.0, Vec3::ONE)],
            &cam,
            4,
        );
        let mut map = create_point_shadow_map(128, 4);
        assert!(generate_point_shadow_map(&mut map, &lights, &cam, &obstacle, 64));
        assert!(!generate_point_shadow_map(&mut map, &lights, &cam, &obstacle, 64));
        assert_eq!(map.active_rows, 1);

        // Unused rows stay clear
        assert!(map.texels[128..].iter().all(|&t| t == NO_SHADOW));
        // The obstacle at angle 0 shows up in row 0
        assert!(shadow_lookup_raw(&map, 0, 0.0) < 1.0);
    }

    #[test]
    fn test_blurred_lookup_behind_and_before_obstacle() {
        let obstacle = obstacle_with(&[(4, 1)]);
        let cam = camera();
        let lights = build_light_list(
            &[create_point_light(Vec2::new(48.0, 48.0), 160.0, 1.0, Vec3::ONE)],
            &cam,
            4,
        );
        let mut map = create_point_shadow_map(256, 4);
        generate_point_shadow_map(&mut map, &lights, &cam, &obstacle, 64);

        // Before the wall: lit. Behind it: shadowed.
        assert_eq!(shadow_lookup_blurred(&map, 0, 0.0, 0.3, 0.0), 1.0);
        assert_eq!(shadow_lookup_blurred(&map, 0, 0.0, 0.9, 0.0), 0.0);
        // Opposite direction is open
        assert_eq!(shadow_lookup_blurred(&map, 0, PI - 0.01, 0.9, 1.5), 1.0);
    }
}
