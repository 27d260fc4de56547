//! Sprite shadow operations - Pure DOP functions
//!
//! Projectors are resolved once per (light, sprite) pair; every pixel then
//! takes the strongest contribution across all projectors.

use super::silhouette_atlas_data::SilhouetteAtlasData;
use super::silhouette_atlas_operations::sample_silhouette;
use super::sprite_shadow_data::{ProjectorSource, ShadowProjector, SpriteShadowMapData};
use crate::camera::{screen_to_world, world_to_tile, DisplayCamera};
use crate::config::SpriteShadowConfig;
use crate::constants::sprite::{
    ALPHA_THRESHOLD, MAX_STRETCH, MIN_SUN_ELEVATION, POINT_LIGHT_CONE_SPREAD,
};
use crate::lights::{
    angular_distance, is_cone_limited, is_light_enabled, is_sun_active, sun_direction_vector,
    LightList, Sun,
};
use crate::tiles::{
    is_obstacle_tile, is_wall_side_at, surface_at, wall_column, ObstacleMapData,
    SurfaceMapData, SurfaceType,
};
use glam::Vec2;
use rayon::prelude::*;

// ============================================================================
// CREATION
// ============================================================================

pub fn create_sprite_shadow_map(width: u32, height: u32) -> SpriteShadowMapData {
    SpriteShadowMapData {
        width,
        height,
        texels: vec![1.0; (width * height) as usize],
        generation: 0,
    }
}

pub fn resize_sprite_shadow_map(map: &mut SpriteShadowMapData, width: u32, height: u32) {
    if map.width != width || map.height != height {
        *map = SpriteShadowMapData {
            generation: map.generation,
            ..create_sprite_shadow_map(width, height)
        };
    }
}

pub fn clear_sprite_shadow_map(map: &mut SpriteShadowMapData) {
    map.texels = Vec::new();
}

// ============================================================================
// VISIBILITY
// ============================================================================

/// Straight-line visibility between two world points
///
/// Obstacles and wall faces block; the tiles holding either endpoint are
/// ignored.
pub fn line_of_sight_clear(
    obstacle: &ObstacleMapData,
    surface: &SurfaceMapData,
    tile_size: Vec2,
    from: Vec2,
    to: Vec2,
) -> bool {
    let delta = to - from;
    let distance = delta.length();
    if distance <= f32::EPSILON {
        return true;
    }

    let from_tile = world_to_tile(tile_size, from);
    let to_tile = world_to_tile(tile_size, to);
    let step = (tile_size.min_element() * 0.25).max(1.0);
    let dir = delta / distance;

    let mut t = step;
    while t < distance {
        let tile = world_to_tile(tile_size, from + dir * t);
        if tile != from_tile
            && tile != to_tile
            && (is_obstacle_tile(obstacle, tile) || is_wall_side_at(surface, tile))
        {
            return false;
        }
        t += step;
    }

    true
}

// ============================================================================
// PROJECTORS
// ============================================================================

/// Resolve every shadow volume for this frame
pub fn build_projectors(
    atlas: &SilhouetteAtlasData,
    lights: &LightList,
    sun: &Sun,
    camera: &DisplayCamera,
    obstacle: &ObstacleMapData,
    surface: &SurfaceMapData,
    config: &SpriteShadowConfig,
) -> Vec<ShadowProjector> {
    let mut projectors = Vec::new();
    if atlas.entries.is_empty() || config.opacity <= 0.0 {
        return projectors;
    }

    let light_height = config.light_height.max(1.0);

    for (light_index, light) in lights.lights.iter().enumerate() {
        if !is_light_enabled(light) {
            continue;
        }
        let light_world = screen_to_world(camera, light.position);

        for (entry_index, entry) in atlas.entries.iter().enumerate() {
            let delta = entry.foot - light_world;
            let distance = delta.length();
            if distance < 1e-3 || distance >= light.radius {
                continue;
            }
            if is_cone_limited(light)
                && angular_distance(delta.y.atan2(delta.x), light.direction) > light.half_cone
            {
                continue;
            }
            if !line_of_sight_clear(obstacle, surface, camera.tile_size, light_world, entry.foot) {
                continue;
            }

            let stretch = (distance / light_height * config.shadow_length).min(MAX_STRETCH);
            if stretch <= 0.0 {
                continue;
            }

            projectors.push(ShadowProjector {
                source: ProjectorSource::Light(light_index),
                entry: entry_index,
                foot: entry.foot,
                direction: delta / distance,
                length: entry.size.y as f32 * stretch,
                half_width: entry.size.x as f32 * 0.5,
                spread: POINT_LIGHT_CONE_SPREAD,
                strength: (1.0 - distance / light.radius) * config.opacity,
            });
        }
    }

    if is_sun_active(sun) {
        let stretch =
            (config.shadow_length / sun.elevation.max(MIN_SUN_ELEVATION)).min(MAX_STRETCH);
        let direction = -sun_direction_vector(sun);

        if stretch > 0.0 {
            for (entry_index, entry) in atlas.entries.iter().enumerate() {
                projectors.push(ShadowProjector {
                    source: ProjectorSource::Sun,
                    entry: entry_index,
                    foot: entry.foot,
                    direction,
                    length: entry.size.y as f32 * stretch,
                    half_width: entry.size.x as f32 * 0.5,
                    spread: 0.0,
                    strength: sun.intensity.min(1.0) * config.opacity,
                });
            }
        }
    }

    projectors
}

/// Contribution of one projector at a floor point
///
/// `climb` is extra distance along the shadow, used for wall faces where
/// height above the floor stands in for horizontal distance.
pub fn projector_contribution(
    atlas: &SilhouetteAtlasData,
    projector: &ShadowProjector,
    point: Vec2,
    climb: f32,
) -> f32 {
    let Some(entry) = atlas.entries.get(projector.entry) else {
        return 0.0;
    };
    if projector.length <= 0.0 {
        return 0.0;
    }

    let rel = point - projector.foot;
    let along = rel.dot(projector.direction) + climb;
    if along < 0.0 || along >= projector.length {
        return 0.0;
    }

    let t = along / projector.length;
    let half_width = projector.half_width * (1.0 + t * projector.spread);
    let perp = rel.dot(projector.direction.perp());
    if half_width <= 0.0 || perp.abs() > half_width {
        return 0.0;
    }

    let local = Vec2::new(0.5 + perp / (2.0 * half_width), 1.0 - t);
    let alpha = sample_silhouette(atlas, entry, local);
    if alpha < ALPHA_THRESHOLD {
        return 0.0;
    }

    alpha * (1.0 - t) * projector.strength
}

/// Sprite shadow brightness (1 = unshadowed) for a screen pixel
pub fn sprite_shadow_at(
    atlas: &SilhouetteAtlasData,
    projectors: &[ShadowProjector],
    obstacle: &ObstacleMapData,
    surface: &SurfaceMapData,
    camera: &DisplayCamera,
    pixel: Vec2,
) -> f32 {
    if projectors.is_empty() {
        return 1.0;
    }

    let world = screen_to_world(camera, pixel);
    let tile = world_to_tile(camera.tile_size, world);
    let surface_type = surface_at(surface, tile);

    let (point, climb) = match surface_type {
        SurfaceType::WallTop => return 1.0,
        SurfaceType::WallSide => match wall_column(surface, tile) {
            Some(column) => {
                let base = (column.base_tile_y + 1) as f32 * camera.tile_size.y;
                (Vec2::new(world.x, base), base - world.y)
            }
            None => (world, 0.0),
        },
        SurfaceType::None => {
            if is_obstacle_tile(obstacle, tile) {
                return 1.0;
            }
            (world, 0.0)
        }
    };

    let strongest = projectors
        .iter()
        .filter(|projector| climb <= 0.0 || projector.direction.y < 0.0)
        .map(|projector| projector_contribution(atlas, projector, point, climb))
        .fold(0.0f32, f32::max);

    1.0 - strongest.clamp(0.0, 1.0)
}

// ============================================================================
// GENERATION
// ============================================================================

/// Rewrite the sprite shadow map; returns the number of projectors used
pub fn generate_sprite_shadow_map(
    map: &mut SpriteShadowMapData,
    atlas: &SilhouetteAtlasData,
    projectors: &[ShadowProjector],
    obstacle: &ObstacleMapData,
    surface: &SurfaceMapData,
    camera: &DisplayCamera,
) -> usize {
    if projectors.is_empty() {
        map.texels.fill(1.0);
    } else {
        let width = map.width.max(1) as usize;
        map.texels.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            for (x, texel) in row.iter_mut().enumerate() {
                let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                *texel = sprite_shadow_at(atlas, projectors, obstacle, surface, camera, pixel);
            }
        });
    }

    map.generation += 1;
    log::debug!(
        "[SpriteShadow] {} projector(s) over {} sprite(s) (gen {})",
        projectors.len(),
        atlas.entries.len(),
        map.generation
    );

    projectors.len()
}

/// Nearest-texel sample at a screen position
pub fn sample_sprite_shadow(map: &SpriteShadowMapData, pixel: Vec2) -> f32 {
    if map.texels.is_empty() || map.width == 0 || map.height == 0 {
        return 1.0;
    }
    let x = (pixel.x.floor() as i64).clamp(0, map.width as i64 - 1) as usize;
    let y = (pixel.y.floor() as i64).clamp(0, map.height as i64 - 1) as usize;
    map.texels[y * map.width as usize + x]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObstacleDetectionMode;
    use crate::lights::{build_light_list, create_point_light, create_sun};
    use crate::sprites::{create_silhouette_atlas, rebuild_silhouette_atlas, CasterKind, ShadowCaster};
    use crate::tiles::{
        create_grid_source, create_obstacle_map, create_surface_map, default_classifier,
        make_autotile_id, refresh_obstacle_map, refresh_surface_map, set_region, set_tile,
        GridTileSource,
    };
    use glam::Vec3;
    use image::{Rgba, RgbaImage};

    fn camera() -> DisplayCamera {
        DisplayCamera {
            display: Vec2::ZERO,
            tile_size: Vec2::splat(32.0),
            screen_size: Vec2::new(320.0, 320.0),
        }
    }

    fn maps(grid: &GridTileSource) -> (ObstacleMapData, SurfaceMapData) {
        let classifier = default_classifier();
        let mut obstacle = create_obstacle_map(2, ObstacleDetectionMode::Regions);
        let mut surface = create_surface_map(2);
        refresh_obstacle_map(&mut obstacle, grid, &classifier, &camera());
        refresh_surface_map(&mut surface, grid, &classifier, &camera());
        (obstacle, surface)
    }

    fn atlas_with(frame: &RgbaImage, foot: Vec2) -> SilhouetteAtlasData {
        let casters = [ShadowCaster {
            kind: CasterKind::Player,
            shadow_override: None,
            foot,
            frame,
        }];
        let mut atlas = create_silhouette_atlas(128, 128);
        rebuild_silhouette_atlas(&mut atlas, &casters, &SpriteShadowConfig::default(), 8);
        atlas
    }

    #[test]
    fn test_line_of_sight() {
        let mut grid = create_grid_source(10, 10);
        set_region(&mut grid, 3, 1, 1);
        let (obstacle, surface) = maps(&grid);
        let tile = Vec2::splat(32.0);

        assert!(!line_of_sight_clear(&obstacle, &surface, tile, Vec2::new(40.0, 48.0), Vec2::new(200.0, 48.0)));
        assert!(line_of_sight_clear(&obstacle, &surface, tile, Vec2::new(40.0, 150.0), Vec2::new(200.0, 150.0)));
    }

    #[test]
    fn test_point_light_shadow_extends_away_from_light() {
        let grid = create_grid_source(10, 10);
        let (obstacle, surface) = maps(&grid);
        let frame = RgbaImage::from_pixel(16, 32, Rgba([0, 0, 0, 255]));
        let foot = Vec2::new(160.0, 160.0);
        let atlas = atlas_with(&frame, foot);

        // Light 48px to the left at the configured light height: stretch 1
        let cam = camera();
        let lights = build_light_list(
            &[create_point_light(Vec2::new(112.0, 160.0), 200.0, 1.0, Vec3::ONE)],
            &cam,
            4,
        );
        let config = SpriteShadowConfig::default();
        let projectors = build_projectors(&atlas, &lights, &Sun::default(), &cam, &obstacle, &surface, &config);
        assert_eq!(projectors.len(), 1);
        assert!((projectors[0].length - 32.0).abs() < 1e-4);

        let behind = sprite_shadow_at(&atlas, &projectors, &obstacle, &surface, &cam, Vec2::new(170.0, 160.0));
        assert!(behind < 1.0);

        // On the light's side of the sprite: no shadow
        let front = sprite_shadow_at(&atlas, &projectors, &obstacle, &surface, &cam, Vec2::new(150.0, 160.0));
        assert_eq!(front, 1.0);

        // Past the shadow length: no shadow
        let beyond = sprite_shadow_at(&atlas, &projectors, &obstacle, &surface, &cam, Vec2::new(193.0, 160.0));
        assert_eq!(beyond, 1.0);
    }

    #[test]
    fn test_blocked_light_casts_no_sprite_shadow() {
        let mut grid = create_grid_source(10, 10);
        set_region(&mut grid, 3, 5, 1);
        let (obstacle, surface) = maps(&grid);
        let frame = RgbaImage::from_pixel(16, 32, Rgba([0, 0, 0, 255]));
        let atlas = atlas_with(&frame, Vec2::new(160.0, 176.0));

        let cam = camera();
        let lights = build_light_list(
            &[create_point_light(Vec2::new(40.0, 176.0), 300.0, 1.0, Vec3::ONE)],
            &cam,
            4,
        );
        let projectors = build_projectors(
            &atlas,
            &lights,
            &Sun::default(),
            &cam,
            &obstacle,
            &surface,
            &SpriteShadowConfig::default(),
        );
        assert!(projectors.is_empty());
    }

    #[test]
    fn test_strongest_shadow_wins() {
        let grid = create_grid_source(10, 10);
        let (obstacle, surface) = maps(&grid);
        let frame = RgbaImage::from_pixel(16, 32, Rgba([0, 0, 0, 255]));
        let atlas = atlas_with(&frame, Vec2::new(160.0, 160.0));
        let cam = camera();

        let sun = create_sun(270.0, 1.0, Vec3::ONE, 0.5);
        let config = SpriteShadowConfig::default();
        let single = build_projectors(&atlas, &LightList::default(), &sun, &cam, &obstacle, &surface, &config);
        let mut doubled = single.clone();
        doubled.extend(single.iter().copied());

        let pixel = Vec2::new(160.0, 170.0);
        let a = sprite_shadow_at(&atlas, &single, &obstacle, &surface, &cam, pixel);
        let b = sprite_shadow_at(&atlas, &doubled, &obstacle, &surface, &cam, pixel);
        assert!(a < 1.0);
        assert_eq!(a, b);
    }

    /// Wall cap at row 2, face at rows 3-4 of column 5; face base at y=160
    fn walled_grid() -> GridTileSource {
        let mut grid = create_grid_source(10, 10);
        set_tile(&mut grid, 5, 2, 0, make_autotile_id(80, 0));
        set_tile(&mut grid, 5, 3, 0, make_autotile_id(88, 0));
        set_tile(&mut grid, 5, 4, 0, make_autotile_id(88, 0));
        grid
    }

    #[test]
    fn test_shadow_towards_wall_climbs_its_face() {
        let grid = walled_grid();
        let (obstacle, surface) = maps(&grid);
        let frame = RgbaImage::from_pixel(16, 32, Rgba([0, 0, 0, 255]));
        let atlas = atlas_with(&frame, Vec2::new(176.0, 200.0));
        let cam = camera();

        // Sun below the sprite: a 64px shadow pointing up-screen
        let sun = create_sun(90.0, 1.0, Vec3::ONE, 0.5);
        let config = SpriteShadowConfig::default();
        let projectors = build_projectors(&atlas, &LightList::default(), &sun, &cam, &obstacle, &surface, &config);
        assert_eq!(projectors.len(), 1);
        assert!(projectors[0].direction.y < 0.0);

        // 40px of floor to the base plus 9.5px up the face
        let low_face = sprite_shadow_at(&atlas, &projectors, &obstacle, &surface, &cam, Vec2::new(176.5, 150.5));
        assert!(low_face < 1.0);

        // 40px of floor plus 59.5px of climb is past the shadow's end
        let high_face = sprite_shadow_at(&atlas, &projectors, &obstacle, &surface, &cam, Vec2::new(176.5, 100.5));
        assert_eq!(high_face, 1.0);

        // The cap is never shadowed
        let cap = sprite_shadow_at(&atlas, &projectors, &obstacle, &surface, &cam, Vec2::new(176.5, 80.5));
        assert_eq!(cap, 1.0);
    }

    #[test]
    fn test_shadow_away_from_wall_leaves_face_lit() {
        let grid = walled_grid();
        let (obstacle, surface) = maps(&grid);
        let frame = RgbaImage::from_pixel(16, 32, Rgba([0, 0, 0, 255]));
        let atlas = atlas_with(&frame, Vec2::new(176.0, 200.0));
        let cam = camera();

        // Sun above the sprite: the shadow points down-screen, away from the wall
        let sun = create_sun(270.0, 1.0, Vec3::ONE, 0.5);
        let config = SpriteShadowConfig::default();
        let projectors = build_projectors(&atlas, &LightList::default(), &sun, &cam, &obstacle, &surface, &config);
        assert!(projectors[0].direction.y > 0.0);

        let floor = sprite_shadow_at(&atlas, &projectors, &obstacle, &surface, &cam, Vec2::new(176.5, 220.5));
        assert!(floor < 1.0);

        let face = sprite_shadow_at(&atlas, &projectors, &obstacle, &surface, &cam, Vec2::new(176.5, 150.5));
        assert_eq!(face, 1.0);
    }
}
