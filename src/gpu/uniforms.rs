//! Uniform layouts shared with the WGSL passes
//!
//! Field order and padding mirror `shaders/lighting/common.wgsl`; sizes are
//! pinned at compile time so a drift on either side fails the build.

use crate::camera::{scroll_px, DisplayCamera};
use crate::config::{ambient_rgb, LightingConfig, SunShadowFalloff};
use crate::constants::limits::{MAX_LIGHTS, MAX_PROJECTORS};
use crate::lights::{is_sun_active, sun_direction_vector, LightList, Sun};
use crate::sprites::{ShadowProjector, SilhouetteAtlasData};
use crate::tiles::{ObstacleMapData, SurfaceMapData};
use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;
use std::mem::size_of;

/// Per-frame parameters read by every pass
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct FrameUniforms {
    pub screen_size: [f32; 2],
    pub scroll_px: [f32; 2],
    pub tile_size: [f32; 2],
    /// Tile coordinate of obstacle texel (0, 0)
    pub obstacle_origin: [f32; 2],
    /// Tile coordinate of surface texel (0, 0)
    pub surface_origin: [f32; 2],
    pub sun_dir: [f32; 2],

    /// rgb premultiplied by intensity
    pub ambient: [f32; 4],
    /// rgb, w = intensity
    pub sun_color: [f32; 4],
    /// sun active, wall shadows, surface map valid, point shadow softness
    pub flags: [f32; 4],
    /// shadow map resolution, active light count, step budget, unused
    pub point: [f32; 4],
    /// strength, length (tiles), precision, softness (px)
    pub sun_style: [f32; 4],
    /// falloff code, projector count, unused, unused
    pub extra: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLight {
    /// Screen px
    pub position: [f32; 2],
    pub radius: f32,
    pub intensity: f32,
    pub color: [f32; 4],
    pub direction: f32,
    pub half_cone: f32,
    pub inner_radius: f32,
    pub is_spotlight: f32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightArrayUniform {
    pub lights: [GpuLight; MAX_LIGHTS],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuProjector {
    /// World px
    pub foot: [f32; 2],
    pub direction: [f32; 2],
    /// length, half width, spread, strength
    pub shape: [f32; 4],
    /// Atlas pixel rect: origin x, origin y, width, height
    pub rect: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ProjectorArrayUniform {
    pub projectors: [GpuProjector; MAX_PROJECTORS],
}

const_assert_eq!(size_of::<FrameUniforms>(), 144);
const_assert_eq!(size_of::<GpuLight>(), 48);
const_assert_eq!(size_of::<LightArrayUniform>(), 48 * MAX_LIGHTS);
const_assert_eq!(size_of::<GpuProjector>(), 48);
const_assert_eq!(size_of::<ProjectorArrayUniform>(), 48 * MAX_PROJECTORS);

pub fn falloff_code(falloff: SunShadowFalloff) -> f32 {
    match falloff {
        SunShadowFalloff::None => 0.0,
        SunShadowFalloff::Linear => 1.0,
        SunShadowFalloff::Smooth => 2.0,
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

pub fn frame_uniforms(
    config: &LightingConfig,
    camera: &DisplayCamera,
    lights: &LightList,
    sun: &Sun,
    obstacle: &ObstacleMapData,
    surface: &SurfaceMapData,
    projector_count: usize,
) -> FrameUniforms {
    let ambient = ambient_rgb(config);
    let sun_dir = sun_direction_vector(sun);
    let shadow = &config.shadow;

    FrameUniforms {
        screen_size: camera.screen_size.to_array(),
        scroll_px: scroll_px(camera).to_array(),
        tile_size: camera.tile_size.to_array(),
        obstacle_origin: obstacle.window.origin.as_vec2().to_array(),
        surface_origin: surface.window.origin.as_vec2().to_array(),
        sun_dir: sun_dir.to_array(),
        ambient: [ambient.x, ambient.y, ambient.z, 1.0],
        sun_color: [sun.color.x, sun.color.y, sun.color.z, sun.intensity],
        flags: [
            flag(is_sun_active(sun)),
            flag(shadow.wall_shadow_enabled),
            flag(surface.populated),
            shadow.shadow_softness,
        ],
        point: [
            shadow.shadow_map_resolution as f32,
            lights.lights.len().min(MAX_LIGHTS) as f32,
            shadow.point_shadow_step_budget.max(1) as f32,
            0.0,
        ],
        sun_style: [
            shadow.sun_shadow_strength,
            shadow.sun_shadow_length,
            shadow.sun_shadow_precision,
            shadow.sun_shadow_softness,
        ],
        extra: [
            falloff_code(shadow.sun_shadow_falloff),
            projector_count.min(MAX_PROJECTORS) as f32,
            0.0,
            0.0,
        ],
    }
}

/// Pack the frame's light list in shadow-map row order
pub fn light_array(lights: &LightList) -> LightArrayUniform {
    let mut uniform = LightArrayUniform::zeroed();
    for (slot, light) in uniform.lights.iter_mut().zip(&lights.lights) {
        *slot = GpuLight {
            position: light.position.to_array(),
            radius: light.radius,
            intensity: light.intensity,
            color: [light.color.x, light.color.y, light.color.z, 1.0],
            direction: light.direction,
            half_cone: light.half_cone,
            inner_radius: light.inner_radius,
            is_spotlight: flag(light.is_spotlight),
        };
    }
    uniform
}

/// Pack projectors; returns the uniform and how many were written
pub fn projector_array(
    atlas: &SilhouetteAtlasData,
    projectors: &[ShadowProjector],
) -> (ProjectorArrayUniform, usize) {
    let mut uniform = ProjectorArrayUniform::zeroed();
    let mut written = 0;

    for projector in projectors {
        let Some(entry) = atlas.entries.get(projector.entry) else {
            continue;
        };
        if written == MAX_PROJECTORS {
            log::warn!(
                "[SpriteShadow] {} projector(s) over the GPU limit of {} were dropped",
                projectors.len() - MAX_PROJECTORS,
                MAX_PROJECTORS
            );
            break;
        }

        uniform.projectors[written] = GpuProjector {
            foot: projector.foot.to_array(),
            direction: projector.direction.to_array(),
            shape: [
                projector.length,
                projector.half_width,
                projector.spread,
                projector.strength,
            ],
            rect: [
                entry.origin.x as f32,
                entry.origin.y as f32,
                entry.size.x as f32,
                entry.size.y as f32,
            ],
        };
        written += 1;
    }

    (uniform, written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::init_camera;
    use crate::config::ObstacleDetectionMode;
    use crate::lights::{build_light_list, create_point_light, create_spotlight, create_sun};
    use crate::sprites::{
        create_silhouette_atlas, rebuild_silhouette_atlas, CasterKind, ProjectorSource,
        ShadowCaster,
    };
    use crate::tiles::{create_obstacle_map, create_surface_map};
    use glam::{Vec2, Vec3};
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_light_array_preserves_row_order() {
        let camera = init_camera(&LightingConfig::default(), Vec2::ZERO);
        let lights = [
            create_point_light(Vec2::new(10.0, 20.0), 50.0, 1.0, Vec3::ONE),
            create_spotlight(Vec2::new(30.0, 40.0), 60.0, 0.5, Vec3::X, 1.0, 0.5),
        ];
        let list = build_light_list(&lights, &camera, 8);

        let uniform = light_array(&list);
        assert_eq!(uniform.lights[0].position, [10.0, 20.0]);
        assert_eq!(uniform.lights[0].is_spotlight, 0.0);
        assert_eq!(uniform.lights[1].position, [30.0, 40.0]);
        assert_eq!(uniform.lights[1].is_spotlight, 1.0);
        assert_eq!(uniform.lights[1].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(uniform.lights[2].radius, 0.0);
    }

    #[test]
    fn test_frame_uniform_flags() {
        let mut config = LightingConfig::default();
        config.shadow.sun_shadow_falloff = SunShadowFalloff::Smooth;
        let camera = init_camera(&config, Vec2::new(2.0, 1.0));
        let obstacle = create_obstacle_map(2, ObstacleDetectionMode::Regions);
        let surface = create_surface_map(1);
        let sun = create_sun(90.0, 0.8, Vec3::ONE, 0.5);

        let frame = frame_uniforms(
            &config,
            &camera,
            &LightList::default(),
            &sun,
            &obstacle,
            &surface,
            3,
        );

        assert_eq!(frame.flags[0], 1.0);
        // Never-populated surface map is reported invalid
        assert_eq!(frame.flags[2], 0.0);
        assert_eq!(frame.point[1], 0.0);
        assert_eq!(frame.extra, [2.0, 3.0, 0.0, 0.0]);
        assert_eq!(frame.sun_color[3], 0.8);
        assert_eq!(
            frame.scroll_px,
            [2.0 * config.tile_width as f32, config.tile_height as f32]
        );
    }

    #[test]
    fn test_projector_array_skips_missing_entries() {
        let config = LightingConfig::default();
        let frame = RgbaImage::from_pixel(8, 12, Rgba([0, 0, 0, 255]));
        let casters = [ShadowCaster {
            kind: CasterKind::Player,
            shadow_override: None,
            foot: Vec2::new(100.0, 100.0),
            frame: &frame,
        }];
        let mut atlas = create_silhouette_atlas(64, 64);
        rebuild_silhouette_atlas(&mut atlas, &casters, &config.sprite, 4);

        let projector = ShadowProjector {
            source: ProjectorSource::Sun,
            entry: 0,
            foot: Vec2::new(100.0, 100.0),
            direction: Vec2::new(0.0, 1.0),
            length: 24.0,
            half_width: 4.0,
            spread: 0.0,
            strength: 0.5,
        };
        let orphan = ShadowProjector {
            entry: 5,
            ..projector
        };

        let (uniform, written) = projector_array(&atlas, &[projector, orphan]);
        assert_eq!(written, 1);
        assert_eq!(uniform.projectors[0].shape, [24.0, 4.0, 0.0, 0.5]);
        assert_eq!(uniform.projectors[0].rect[2..], [8.0, 12.0]);
    }
}
