//! Compositor operations - Pure DOP functions
//!
//! Per-pixel lighting: ambient, sun with wall-aware routing, point and
//! spot lights with polar shadow lookups, then the sprite shadow mask.

use super::compositor_data::{CompositorInputs, LightingSample};
use crate::camera::{screen_to_world, world_to_screen, world_to_tile, DisplayCamera};
use crate::config::ambient_rgb;
use crate::constants::compositor::{
    MAX_TOTAL_LIGHT, SPOT_EDGE_FRACTION, SUN_GRADIENT_MIN, SUN_GRADIENT_STRENGTH,
    WALL_CONE_BAND_PX,
};
use crate::constants::point_shadow::OUTSIDE_CONE_EPSILON;
use crate::constants::sun_shadow::{AXIS_EPSILON, FULLY_LIT};
use crate::lights::{
    angular_distance, is_cone_limited, is_light_enabled, is_sun_active, sun_direction_vector,
    Light,
};
use crate::shadows::{sample_sun_shadow, shadow_lookup_blurred, shadow_lookup_raw};
use crate::sprites::sample_sprite_shadow;
use crate::tiles::{is_obstacle_tile, surface_at, wall_column, SurfaceType};
use glam::{IVec2, Vec2, Vec3};
use image::{Rgba, RgbaImage};
use rayon::prelude::*;

/// Classification of the tile under a pixel
#[derive(Debug, Clone, Copy)]
struct PixelSite {
    pixel: Vec2,
    world: Vec2,
    tile: IVec2,
    surface: SurfaceType,
    obstacle: bool,
}

fn pixel_site(inputs: &CompositorInputs<'_>, pixel: Vec2) -> PixelSite {
    let world = screen_to_world(inputs.camera, pixel);
    let tile = world_to_tile(inputs.camera.tile_size, world);
    PixelSite {
        pixel,
        world,
        tile,
        surface: surface_at(inputs.surface, tile),
        obstacle: is_obstacle_tile(inputs.obstacle, tile),
    }
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// World y of the floor line just below a wall column at `tile`
fn wall_base_y(inputs: &CompositorInputs<'_>, tile: IVec2) -> Option<(f32, f32)> {
    wall_column(inputs.surface, tile).map(|column| {
        let tile_h = inputs.camera.tile_size.y;
        (
            column.top_tile_y as f32 * tile_h,
            (column.base_tile_y + 1) as f32 * tile_h,
        )
    })
}

// ============================================================================
// SUN
// ============================================================================

/// Mild brightness gradient across the screen, brighter towards the sun
pub fn sun_gradient(camera: &DisplayCamera, pixel: Vec2, sun_dir: Vec2) -> f32 {
    let center = camera.screen_size * 0.5;
    let half_diagonal = center.length();
    let offset = pixel - center;
    let distance = offset.length();
    if half_diagonal <= 0.0 || distance < 1e-4 {
        return 1.0;
    }

    let t = (distance / half_diagonal).min(1.0);
    let cos = (offset / distance).dot(sun_dir);
    (1.0 + SUN_GRADIENT_STRENGTH * (cos - 1.0) * t).clamp(SUN_GRADIENT_MIN, 1.0)
}

/// Sun shadow on a wall face, read from the floor in front of its base
///
/// With the sun in front of the wall (pointing down-screen) the lookup
/// moves towards the sun by the pixel's height above the floor, so floor
/// shadows climb the wall. A sun at or behind the horizontal axis uses
/// the base sample alone.
fn wall_sun_shadow(inputs: &CompositorInputs<'_>, site: &PixelSite, sun_dir: Vec2) -> f32 {
    let Some((_, base_y)) = wall_base_y(inputs, site.tile) else {
        return 1.0;
    };

    let floor = Vec2::new(site.world.x, base_y + 1.0);
    let at_base = sample_sun_shadow(inputs.sun_shadow, world_to_screen(inputs.camera, floor));
    if at_base >= FULLY_LIT {
        return 1.0;
    }

    if sun_dir.y > AXIS_EPSILON {
        let height = (base_y - site.world.y).max(0.0);
        let climbed = floor + sun_dir * (height / sun_dir.y);
        sample_sun_shadow(inputs.sun_shadow, world_to_screen(inputs.camera, climbed))
    } else {
        at_base
    }
}

fn sun_shadow_factor(inputs: &CompositorInputs<'_>, site: &PixelSite, sun_dir: Vec2) -> f32 {
    match site.surface {
        SurfaceType::WallTop => 1.0,
        SurfaceType::WallSide if inputs.config.shadow.wall_shadow_enabled => {
            wall_sun_shadow(inputs, site, sun_dir)
        }
        _ if site.obstacle => 1.0,
        _ => sample_sun_shadow(inputs.sun_shadow, site.pixel),
    }
}

fn sun_term(inputs: &CompositorInputs<'_>, site: &PixelSite) -> Vec3 {
    let sun = inputs.sun;
    if !is_sun_active(sun) {
        return Vec3::ZERO;
    }

    let sun_dir = sun_direction_vector(sun);
    let shadow = sun_shadow_factor(inputs, site, sun_dir);
    sun.color * sun.intensity * shadow * sun_gradient(inputs.camera, site.pixel, sun_dir)
}

// ============================================================================
// POINT AND SPOT LIGHTS
// ============================================================================

/// Quadratic falloff between the inner radius and the radius
pub fn distance_falloff(light: &Light, distance: f32) -> f32 {
    if distance >= light.radius || distance < light.inner_radius {
        return 0.0;
    }
    let span = (light.radius - light.inner_radius).max(f32::EPSILON);
    let nd = ((distance - light.inner_radius) / span).clamp(0.0, 1.0);
    (1.0 - nd) * (1.0 - nd)
}

/// Cone test on a vertical wall face
///
/// The cone's edges are projected onto the pixel's row and the pixel is
/// tested for horizontal containment. `None` when an edge never reaches
/// that row.
fn wall_cone_factor(light: &Light, delta: Vec2) -> Option<f32> {
    if delta.y.abs() < 1e-3 {
        return None;
    }

    let mut edges = [0.0f32; 2];
    for (edge_x, angle) in edges
        .iter_mut()
        .zip([light.direction - light.half_cone, light.direction + light.half_cone])
    {
        let (sin, cos) = angle.sin_cos();
        if sin * delta.y <= 1e-4 {
            return None;
        }
        *edge_x = cos * (delta.y / sin);
    }

    let lo = edges[0].min(edges[1]);
    let hi = edges[0].max(edges[1]);
    if delta.x < lo || delta.x > hi {
        return Some(0.0);
    }

    Some(
        smoothstep(lo, lo + WALL_CONE_BAND_PX, delta.x)
            * (1.0 - smoothstep(hi - WALL_CONE_BAND_PX, hi, delta.x)),
    )
}

/// Spotlight cone factor (1 for point lights)
pub fn spotlight_factor(light: &Light, delta: Vec2, surface: SurfaceType) -> f32 {
    if !is_cone_limited(light) {
        return 1.0;
    }
    let distance = delta.length();
    if distance < 1e-4 {
        return 1.0;
    }

    let forward = Vec2::new(light.direction.cos(), light.direction.sin());
    if surface == SurfaceType::WallSide && (delta / distance).dot(forward) > 0.0 {
        if let Some(factor) = wall_cone_factor(light, delta) {
            return factor;
        }
    }

    let off_axis = angular_distance(delta.y.atan2(delta.x), light.direction);
    if off_axis > light.half_cone {
        return 0.0;
    }

    let edge = light.half_cone * SPOT_EDGE_FRACTION;
    if edge > 0.0 && off_axis > light.half_cone - edge {
        1.0 - smoothstep(light.half_cone - edge, light.half_cone, off_axis)
    } else {
        1.0
    }
}

/// Shadow on a wall face from a point light
///
/// A light above the column top cannot see the face; a light level with
/// the column lights it fully; a light in front of the base uses the
/// floor sample just below the wall.
fn wall_light_shadow(inputs: &CompositorInputs<'_>, site: &PixelSite, row: u32, light: &Light) -> f32 {
    let Some((top_y, base_y)) = wall_base_y(inputs, site.tile) else {
        return 1.0;
    };

    let light_world = screen_to_world(inputs.camera, light.position);
    if light_world.y < top_y {
        return 0.0;
    }
    if light_world.y <= base_y {
        return 1.0;
    }

    let floor = Vec2::new(site.world.x, base_y + 1.0);
    let delta = floor - light_world;
    shadow_lookup_blurred(
        inputs.point_shadow,
        row,
        delta.y.atan2(delta.x),
        (delta.length() / light.radius).min(1.0),
        inputs.config.shadow.shadow_softness,
    )
}

fn light_shadow_factor(
    inputs: &CompositorInputs<'_>,
    site: &PixelSite,
    row: u32,
    light: &Light,
    delta: Vec2,
    distance: f32,
) -> f32 {
    let angle = delta.y.atan2(delta.x);
    match site.surface {
        SurfaceType::WallTop => 1.0,
        SurfaceType::WallSide if inputs.config.shadow.wall_shadow_enabled => {
            wall_light_shadow(inputs, site, row, light)
        }
        _ if site.obstacle => {
            if shadow_lookup_raw(inputs.point_shadow, row, angle) < OUTSIDE_CONE_EPSILON {
                0.0
            } else {
                1.0
            }
        }
        _ => shadow_lookup_blurred(
            inputs.point_shadow,
            row,
            angle,
            distance / light.radius,
            inputs.config.shadow.shadow_softness,
        ),
    }
}

fn light_term(inputs: &CompositorInputs<'_>, site: &PixelSite, row: u32, light: &Light) -> Vec3 {
    if !is_light_enabled(light) {
        return Vec3::ZERO;
    }

    let delta = site.pixel - light.position;
    let distance = delta.length();
    let falloff = distance_falloff(light, distance);
    if falloff <= 0.0 {
        return Vec3::ZERO;
    }

    let spot = spotlight_factor(light, delta, site.surface);
    if spot <= 0.0 {
        return Vec3::ZERO;
    }

    let shadow = light_shadow_factor(inputs, site, row, light, delta, distance);
    light.color * light.intensity * falloff * shadow * spot
}

// ============================================================================
// COMPOSITE
// ============================================================================

/// All lighting terms at a screen pixel
pub fn lighting_at(inputs: &CompositorInputs<'_>, pixel: Vec2) -> LightingSample {
    let site = pixel_site(inputs, pixel);

    let ambient = ambient_rgb(inputs.config);
    let sun = sun_term(inputs, &site);
    let lights = inputs
        .lights
        .lights
        .iter()
        .enumerate()
        .map(|(row, light)| light_term(inputs, &site, row as u32, light))
        .fold(Vec3::ZERO, |sum, term| sum + term);

    let sprite_brightness = sample_sprite_shadow(inputs.sprite_shadow, pixel);
    let total = (ambient + (sun + lights) * sprite_brightness)
        .clamp(Vec3::ZERO, Vec3::splat(MAX_TOTAL_LIGHT));

    LightingSample {
        ambient,
        sun,
        lights,
        sprite_brightness,
        total,
    }
}

/// Scale a base colour by `sqrt(total)`, keeping its alpha
pub fn apply_lighting(base: Rgba<u8>, total: Vec3) -> Rgba<u8> {
    let scale = Vec3::new(total.x.sqrt(), total.y.sqrt(), total.z.sqrt());
    let channel = |value: u8, factor: f32| (value as f32 * factor).round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(base[0], scale.x),
        channel(base[1], scale.y),
        channel(base[2], scale.z),
        base[3],
    ])
}

/// Light a whole scene image (pixel centres sampled)
pub fn composite_frame(inputs: &CompositorInputs<'_>, scene: &RgbaImage) -> RgbaImage {
    let (width, height) = scene.dimensions();
    let mut output = RgbaImage::new(width, height);
    let stride = width.max(1) as usize * 4;

    output
        .par_chunks_mut(stride)
        .zip(scene.par_chunks(stride))
        .enumerate()
        .for_each(|(y, (out_row, scene_row))| {
            for (x, (out, src)) in out_row
                .chunks_exact_mut(4)
                .zip(scene_row.chunks_exact(4))
                .enumerate()
            {
                let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let sample = lighting_at(inputs, pixel);
                let lit = apply_lighting(Rgba([src[0], src[1], src[2], src[3]]), sample.total);
                out.copy_from_slice(&lit.0);
            }
        });

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LightingConfig, ObstacleDetectionMode};
    use crate::lights::{
        create_point_light, create_spotlight, create_sun, with_inner_radius, LightList, Sun,
    };
    use crate::shadows::{
        create_point_shadow_map, create_sun_shadow_map, PointShadowMapData, SunShadowMapData,
    };
    use crate::sprites::{create_sprite_shadow_map, SpriteShadowMapData};
    use crate::tiles::{
        create_grid_source, create_obstacle_map, create_surface_map, default_classifier,
        make_autotile_id, refresh_obstacle_map, refresh_surface_map, set_tile, ObstacleMapData,
        SurfaceMapData,
    };
    use std::f32::consts::PI;

    const SIZE: u32 = 128;

    /// 16px tiles; column 3 has its cap at row 1 and its face at rows 2-3,
    /// so the face spans y 32..64 and the floor starts at y 64
    struct WallScene {
        config: LightingConfig,
        camera: DisplayCamera,
        lights: LightList,
        sun: Sun,
        obstacle: ObstacleMapData,
        surface: SurfaceMapData,
        point_shadow: PointShadowMapData,
        sun_shadow: SunShadowMapData,
        sprite_shadow: SpriteShadowMapData,
    }

    fn wall_scene() -> WallScene {
        let mut grid = create_grid_source(8, 8);
        set_tile(&mut grid, 3, 1, 0, make_autotile_id(80, 0));
        set_tile(&mut grid, 3, 2, 0, make_autotile_id(88, 0));
        set_tile(&mut grid, 3, 3, 0, make_autotile_id(88, 0));

        let camera = DisplayCamera {
            display: Vec2::ZERO,
            tile_size: Vec2::splat(16.0),
            screen_size: Vec2::splat(SIZE as f32),
        };
        let classifier = default_classifier();
        let mut obstacle = create_obstacle_map(2, ObstacleDetectionMode::Regions);
        let mut surface = create_surface_map(2);
        refresh_obstacle_map(&mut obstacle, &grid, &classifier, &camera);
        refresh_surface_map(&mut surface, &grid, &classifier, &camera);

        WallScene {
            config: LightingConfig::default(),
            camera,
            lights: LightList::default(),
            sun: Sun::default(),
            obstacle,
            surface,
            point_shadow: create_point_shadow_map(64, 1),
            sun_shadow: create_sun_shadow_map(SIZE, SIZE),
            sprite_shadow: create_sprite_shadow_map(SIZE, SIZE),
        }
    }

    fn inputs(scene: &WallScene) -> CompositorInputs<'_> {
        CompositorInputs {
            config: &scene.config,
            camera: &scene.camera,
            lights: &scene.lights,
            sun: &scene.sun,
            obstacle: &scene.obstacle,
            surface: &scene.surface,
            point_shadow: &scene.point_shadow,
            sun_shadow: &scene.sun_shadow,
            sprite_shadow: &scene.sprite_shadow,
        }
    }

    fn set_sun_texel(scene: &mut WallScene, x: u32, y: u32, value: f32) {
        scene.sun_shadow.texels[(y * SIZE + x) as usize] = value;
    }

    fn sun_factor_at(scene: &WallScene, pixel: Vec2, degrees: f32) -> f32 {
        let inputs = inputs(scene);
        let sun = create_sun(degrees, 1.0, Vec3::ONE, 0.5);
        sun_shadow_factor(&inputs, &pixel_site(&inputs, pixel), sun_direction_vector(&sun))
    }

    // A face pixel 23.5px above the floor line
    const FACE: Vec2 = Vec2::new(56.5, 40.5);

    #[test]
    fn test_falloff_monotonic_and_bounded() {
        let light = with_inner_radius(create_point_light(Vec2::ZERO, 100.0, 1.0, Vec3::ONE), 20.0);
        assert_eq!(distance_falloff(&light, 10.0), 0.0);
        assert_eq!(distance_falloff(&light, 20.0), 1.0);
        assert_eq!(distance_falloff(&light, 100.0), 0.0);

        let mut previous = f32::INFINITY;
        for step in 0..=80 {
            let value = distance_falloff(&light, 20.0 + step as f32);
            assert!(value <= previous);
            previous = value;
        }
    }

    #[test]
    fn test_spotlight_cone_edges() {
        let spot = create_spotlight(Vec2::ZERO, 200.0, 1.0, Vec3::ONE, 0.0, PI / 8.0);
        assert_eq!(spotlight_factor(&spot, Vec2::new(100.0, 0.0), SurfaceType::None), 1.0);
        assert_eq!(spotlight_factor(&spot, Vec2::new(0.0, 100.0), SurfaceType::None), 0.0);

        // Inside the soft band near the edge
        let near_edge = (PI / 8.0) * 0.95;
        let f = spotlight_factor(
            &spot,
            Vec2::new(near_edge.cos(), near_edge.sin()) * 100.0,
            SurfaceType::None,
        );
        assert!(f > 0.0 && f < 1.0);
    }

    #[test]
    fn test_wall_cone_uses_row_projection() {
        // Spot pointing straight down, 30 degree half cone
        let spot = create_spotlight(Vec2::ZERO, 300.0, 1.0, Vec3::ONE, PI / 2.0, PI / 6.0);
        // Row 100px below: edges at x = +-100 * tan(30deg) ~ +-57.7
        let inside = spotlight_factor(&spot, Vec2::new(30.0, 100.0), SurfaceType::WallSide);
        let outside = spotlight_factor(&spot, Vec2::new(70.0, 100.0), SurfaceType::WallSide);
        assert_eq!(inside, 1.0);
        assert_eq!(outside, 0.0);
    }

    #[test]
    fn test_sun_gradient_range() {
        let camera = DisplayCamera::default();
        let toward = sun_gradient(&camera, Vec2::new(816.0, 312.0), Vec2::X);
        let away = sun_gradient(&camera, Vec2::new(0.0, 312.0), Vec2::X);
        assert_eq!(toward, 1.0);
        assert!(away >= 0.7 && away < 1.0);
        assert_eq!(sun_gradient(&camera, camera.screen_size * 0.5, Vec2::X), 1.0);
    }

    #[test]
    fn test_apply_lighting_preserves_alpha() {
        let lit = apply_lighting(Rgba([100, 200, 50, 77]), Vec3::new(1.0, 0.25, 4.0));
        assert_eq!(lit, Rgba([100, 100, 100, 77]));
    }

    #[test]
    fn test_floor_sun_shadow_climbs_wall_face() {
        let mut scene = wall_scene();
        set_sun_texel(&mut scene, 56, 65, 0.5);
        set_sun_texel(&mut scene, 56, 88, 0.25);

        // Sun straight down-screen: the lookup moves 23.5px further out
        assert_eq!(sun_factor_at(&scene, FACE, 90.0), 0.25);
    }

    #[test]
    fn test_axis_aligned_sun_reads_wall_base_only() {
        let mut scene = wall_scene();
        set_sun_texel(&mut scene, 56, 65, 0.5);
        set_sun_texel(&mut scene, 56, 88, 0.25);

        // Horizontal, nearly horizontal (sin 3deg < AXIS_EPSILON) and
        // behind the wall all fall back to the base sample
        assert_eq!(sun_factor_at(&scene, FACE, 0.0), 0.5);
        assert_eq!(sun_factor_at(&scene, FACE, 3.0), 0.5);
        assert_eq!(sun_factor_at(&scene, FACE, 180.0), 0.5);
        assert_eq!(sun_factor_at(&scene, FACE, 270.0), 0.5);
    }

    #[test]
    fn test_lit_wall_base_lights_whole_face() {
        let mut scene = wall_scene();
        set_sun_texel(&mut scene, 56, 88, 0.25);
        assert_eq!(sun_factor_at(&scene, FACE, 90.0), 1.0);
    }

    #[test]
    fn test_wall_routing_off_samples_face_pixel() {
        let mut scene = wall_scene();
        scene.config.shadow.wall_shadow_enabled = false;
        set_sun_texel(&mut scene, 56, 40, 0.3);
        set_sun_texel(&mut scene, 56, 65, 0.5);
        assert_eq!(sun_factor_at(&scene, FACE, 90.0), 0.3);
    }

    #[test]
    fn test_wall_top_ignores_occluders() {
        let mut scene = wall_scene();
        let cap = Vec2::new(56.5, 24.5);
        set_sun_texel(&mut scene, 56, 24, 0.0);
        scene.point_shadow.texels.fill(0.0);

        assert_eq!(sun_factor_at(&scene, cap, 90.0), 1.0);

        let inputs = inputs(&scene);
        let site = pixel_site(&inputs, cap);
        assert_eq!(site.surface, SurfaceType::WallTop);
        let light = create_point_light(Vec2::new(56.5, 100.0), 120.0, 1.0, Vec3::ONE);
        let delta = cap - light.position;
        assert_eq!(
            light_shadow_factor(&inputs, &site, 0, &light, delta, delta.length()),
            1.0
        );
    }

    #[test]
    fn test_point_light_on_wall_face_by_height() {
        let mut scene = wall_scene();
        // Every angle blocked at 10% of the radius
        scene.point_shadow.texels.fill(0.1);
        let face_light = |scene: &WallScene, position: Vec2| {
            let inputs = inputs(scene);
            let site = pixel_site(&inputs, FACE);
            let light = create_point_light(position, 100.0, 1.0, Vec3::ONE);
            wall_light_shadow(&inputs, &site, 0, &light)
        };

        // Above the column top: the face points away
        assert_eq!(face_light(&scene, Vec2::new(56.5, 10.0)), 0.0);
        // Level with the column: fully lit even with a blocked map
        assert_eq!(face_light(&scene, Vec2::new(20.0, 48.0)), 1.0);
        // In front of the base: the floor sample 35px out is blocked
        assert_eq!(face_light(&scene, Vec2::new(56.5, 100.0)), 0.0);

        scene.point_shadow.texels.fill(1.0);
        assert_eq!(face_light(&scene, Vec2::new(56.5, 100.0)), 1.0);
    }

    #[test]
    fn test_ambient_only_frame() {
        let mut scene = wall_scene();
        scene.config.ambient_color = [1.0, 1.0, 1.0];
        scene.config.ambient_intensity = 0.25;

        let base = RgbaImage::from_pixel(SIZE, SIZE, Rgba([200, 120, 40, 255]));
        let lit = composite_frame(&inputs(&scene), &base);

        // sqrt(0.25) halves every channel, on floor and wall alike
        for pixel in [Vec2::new(5.0, 5.0), FACE, Vec2::new(56.5, 24.5)] {
            assert_eq!(
                *lit.get_pixel(pixel.x as u32, pixel.y as u32),
                Rgba([100, 60, 20, 255])
            );
        }
        let sample = lighting_at(&inputs(&scene), Vec2::new(5.5, 5.5));
        assert_eq!(sample.sun, Vec3::ZERO);
        assert_eq!(sample.lights, Vec3::ZERO);
        assert_eq!(sample.total, Vec3::splat(0.25));
    }
}
