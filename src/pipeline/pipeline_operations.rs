//! Lighting pipeline operations - Pure DOP functions
//!
//! Lifecycle: `initialize_pipeline` when the scene's surface exists,
//! `update_pipeline` once per displayed frame, `teardown_pipeline` before
//! the next scene's pipeline is built. Each frame runs
//! obstacle/surface maps -> point shadows -> sun shadows -> sprite shadows,
//! and `composite_pipeline` then reads the results.

use super::pipeline_data::{
    FrameContext, FrameReport, LightingPipelineData, PassOutcome, PipelineState,
    SurfaceDescriptor,
};
use crate::camera::{init_camera, log_camera_context, resize, DisplayCamera};
use crate::compositor::{composite_frame, lighting_at, CompositorInputs, LightingSample};
use crate::config::{validate_config, LightingConfig, ShadowStyleConfig};
use crate::debug::apply_debug_overlay;
use crate::error::{LightingError, LightingResult, OptionExt};
use crate::lights::{build_light_list, is_sun_active, LightList, Sun};
use crate::shadows::{
    clear_point_shadow_map, clear_sun_shadow_map, create_point_shadow_map,
    create_sun_shadow_map, generate_point_shadow_map, generate_sun_shadow_map,
    sun_shadow_style, SunShadowDecision,
};
use crate::sprites::{
    build_projectors, clear_sprite_shadow_map, create_silhouette_atlas,
    create_sprite_shadow_map, generate_sprite_shadow_map, rebuild_silhouette_atlas,
};
use crate::tiles::{
    create_obstacle_map, create_surface_map, ensure_obstacle_padding, invalidate_obstacle_map,
    invalidate_surface_map, padding_for_reach, refresh_obstacle_map, refresh_surface_map,
    set_detection_mode, SurfaceClassifier,
};
use glam::Vec2;
use image::RgbaImage;

// ============================================================================
// LIFECYCLE
// ============================================================================

/// Create an uninitialized pipeline for a validated config
pub fn create_lighting_pipeline(
    config: LightingConfig,
    classifier: SurfaceClassifier,
) -> LightingResult<LightingPipelineData> {
    validate_config(&config)?;

    let camera = init_camera(&config, Vec2::ZERO);
    Ok(LightingPipelineData {
        obstacle: create_obstacle_map(
            config.obstacle_padding_tiles,
            config.shadow.obstacle_detection_mode,
        ),
        surface: create_surface_map(config.surface_padding_tiles),
        point_shadow: create_point_shadow_map(0, 0),
        sun_shadow: create_sun_shadow_map(0, 0),
        atlas: None,
        sprite_shadow: create_sprite_shadow_map(0, 0),
        lights: LightList::default(),
        sun: Sun::default(),
        last_projector_count: 0,
        frame: 0,
        camera,
        classifier,
        config,
        state: PipelineState::Uninitialized,
        surface_size: None,
    })
}

fn state_name(state: PipelineState) -> &'static str {
    match state {
        PipelineState::Uninitialized => "uninitialized",
        PipelineState::Ready => "ready",
        PipelineState::TornDown => "torn down",
    }
}

fn ensure_ready(pipeline: &LightingPipelineData) -> LightingResult<()> {
    if pipeline.state == PipelineState::Ready {
        Ok(())
    } else {
        Err(LightingError::StateError {
            expected: "ready".to_string(),
            actual: state_name(pipeline.state).to_string(),
        })
    }
}

/// Allocate every map for a rendering surface
///
/// Valid from the uninitialized and torn-down states only, so a scene's
/// resources are always released before new ones are built.
pub fn initialize_pipeline(
    pipeline: &mut LightingPipelineData,
    surface: SurfaceDescriptor,
) -> LightingResult<()> {
    if pipeline.state == PipelineState::Ready {
        return Err(LightingError::StateError {
            expected: "uninitialized or torn down".to_string(),
            actual: "ready".to_string(),
        });
    }

    if surface.width == 0 || surface.height == 0 {
        return Err(LightingError::InvalidConfig {
            field: "surface".to_string(),
            value: format!("{}x{}", surface.width, surface.height),
            reason: "surface dimensions must be positive".to_string(),
        });
    }

    pipeline.config.screen_width = surface.width;
    pipeline.config.screen_height = surface.height;
    let config = &pipeline.config;

    pipeline.camera = init_camera(config, Vec2::ZERO);
    pipeline.obstacle = create_obstacle_map(
        config.obstacle_padding_tiles,
        config.shadow.obstacle_detection_mode,
    );
    pipeline.surface = create_surface_map(config.surface_padding_tiles);
    pipeline.point_shadow =
        create_point_shadow_map(config.shadow.shadow_map_resolution, config.max_lights as u32);
    pipeline.sun_shadow = create_sun_shadow_map(surface.width, surface.height);
    pipeline.atlas = Some(create_silhouette_atlas(
        config.sprite.atlas_width,
        config.sprite.atlas_height,
    ));
    pipeline.sprite_shadow = create_sprite_shadow_map(surface.width, surface.height);
    pipeline.lights = LightList::default();
    pipeline.sun = Sun::default();
    pipeline.last_projector_count = 0;
    pipeline.frame = 0;
    pipeline.surface_size = Some(surface);
    pipeline.state = PipelineState::Ready;

    log::info!(
        "[LightingPipeline] Initialized {}x{} (shadow map {}x{}, atlas {}x{})",
        surface.width,
        surface.height,
        pipeline.point_shadow.width,
        pipeline.point_shadow.height,
        config.sprite.atlas_width,
        config.sprite.atlas_height
    );

    Ok(())
}

/// Release every map; the pipeline must be initialized again before use
pub fn teardown_pipeline(pipeline: &mut LightingPipelineData) {
    if pipeline.state != PipelineState::Ready {
        log::debug!(
            "[LightingPipeline] Teardown ignored in state {}",
            state_name(pipeline.state)
        );
        return;
    }

    clear_point_shadow_map(&mut pipeline.point_shadow);
    clear_sun_shadow_map(&mut pipeline.sun_shadow);
    clear_sprite_shadow_map(&mut pipeline.sprite_shadow);
    pipeline.atlas = None;
    pipeline.obstacle = create_obstacle_map(
        pipeline.config.obstacle_padding_tiles,
        pipeline.config.shadow.obstacle_detection_mode,
    );
    pipeline.surface = create_surface_map(pipeline.config.surface_padding_tiles);
    pipeline.lights = LightList::default();
    pipeline.surface_size = None;
    pipeline.state = PipelineState::TornDown;

    log::info!(
        "[LightingPipeline] Torn down after {} frame(s)",
        pipeline.frame
    );
}

// ============================================================================
// CONFIGURATION CHANGES
// ============================================================================

/// Swap the shadow style; affected maps regenerate on the next update
pub fn update_shadow_style(
    pipeline: &mut LightingPipelineData,
    style: ShadowStyleConfig,
) -> LightingResult<()> {
    let candidate = LightingConfig {
        shadow: style,
        ..pipeline.config.clone()
    };
    validate_config(&candidate)?;

    let resolution_changed =
        style.shadow_map_resolution != pipeline.config.shadow.shadow_map_resolution;
    pipeline.config = candidate;
    set_detection_mode(&mut pipeline.obstacle, style.obstacle_detection_mode);

    if resolution_changed && pipeline.state == PipelineState::Ready {
        pipeline.point_shadow = create_point_shadow_map(
            style.shadow_map_resolution,
            pipeline.config.max_lights as u32,
        );
    }

    log::debug!("[LightingPipeline] Shadow style updated: {:?}", style);
    Ok(())
}

/// Level data changed under the camera; rebuild both tile maps
pub fn invalidate_level_data(pipeline: &mut LightingPipelineData) {
    invalidate_obstacle_map(&mut pipeline.obstacle);
    invalidate_surface_map(&mut pipeline.surface);
}

// ============================================================================
// PER-FRAME UPDATE
// ============================================================================

/// Obstacle padding (tiles) that keeps every occluder a frame can query
/// inside the window
///
/// Lights survive culling while their radius still touches the viewport
/// and sun rays march `sun_shadow_length` tiles plus the soft-ray offset,
/// so the window must reach that far past the screen edge.
pub fn required_obstacle_padding(
    config: &LightingConfig,
    tile_size: Vec2,
    lights: &LightList,
    sun: &Sun,
) -> i32 {
    let light_reach = lights
        .lights
        .iter()
        .map(|light| light.radius)
        .fold(0.0f32, f32::max);
    let sun_reach = if is_sun_active(sun) {
        config.shadow.sun_shadow_length * tile_size.x + config.shadow.sun_shadow_softness
    } else {
        0.0
    };

    config
        .obstacle_padding_tiles
        .max(padding_for_reach(tile_size, light_reach.max(sun_reach)))
}

/// Grow the obstacle window for this frame's lights and sun
///
/// Returns the light list so the point shadow pass uses the same lights.
pub fn prepare_frame_lights(
    pipeline: &mut LightingPipelineData,
    ctx: &FrameContext<'_>,
    camera: &DisplayCamera,
) -> LightList {
    let lights = build_light_list(ctx.lights, camera, pipeline.config.max_lights);
    let padding =
        required_obstacle_padding(&pipeline.config, camera.tile_size, &lights, &ctx.sun);
    if ensure_obstacle_padding(&mut pipeline.obstacle, padding) {
        log::info!(
            "[LightingPipeline] Obstacle padding raised to {} tiles for light reach",
            padding
        );
    }
    lights
}

/// Refresh every map for this frame
pub fn update_pipeline(
    pipeline: &mut LightingPipelineData,
    ctx: &FrameContext<'_>,
) -> LightingResult<FrameReport> {
    ensure_ready(pipeline)?;
    let surface_size = pipeline
        .surface_size
        .ok_or_state("surface descriptor", "missing")?;

    let camera = resize(&ctx.camera, surface_size.width, surface_size.height);
    pipeline.camera = camera;
    log_camera_context(&camera);
    let lights = prepare_frame_lights(pipeline, ctx, &camera);

    // Tile maps
    let surface_rebuilt =
        refresh_surface_map(&mut pipeline.surface, ctx.tiles, &pipeline.classifier, &camera);
    let obstacle_rebuilt =
        refresh_obstacle_map(&mut pipeline.obstacle, ctx.tiles, &pipeline.classifier, &camera);

    // Point and spot shadows
    let point_ran = generate_point_shadow_map(
        &mut pipeline.point_shadow,
        &lights,
        &camera,
        &pipeline.obstacle,
        pipeline.config.shadow.point_shadow_step_budget,
    );

    // Sun shadows
    let sun_decision = generate_sun_shadow_map(
        &mut pipeline.sun_shadow,
        &camera,
        &ctx.sun,
        &pipeline.obstacle,
        &pipeline.surface,
        &sun_shadow_style(&pipeline.config),
        &pipeline.config.regeneration,
    );

    // Sprite shadows
    let atlas = pipeline.atlas.as_mut().ok_or_state("silhouette atlas", "missing")?;
    let sprite_config = &pipeline.config.sprite;
    let (sprite_shadows, sprite_casters) = if sprite_config.map_enabled {
        let packed =
            rebuild_silhouette_atlas(atlas, ctx.casters, sprite_config, pipeline.config.max_sprites);
        let projectors = build_projectors(
            atlas,
            &lights,
            &ctx.sun,
            &camera,
            &pipeline.obstacle,
            &pipeline.surface,
            sprite_config,
        );

        if projectors.is_empty() && pipeline.last_projector_count == 0 {
            (PassOutcome::Skipped, packed)
        } else {
            pipeline.last_projector_count = generate_sprite_shadow_map(
                &mut pipeline.sprite_shadow,
                atlas,
                &projectors,
                &pipeline.obstacle,
                &pipeline.surface,
                &camera,
            );
            (PassOutcome::Ran, packed)
        }
    } else {
        if pipeline.last_projector_count > 0 {
            pipeline.sprite_shadow.texels.fill(1.0);
            pipeline.last_projector_count = 0;
        }
        (PassOutcome::Disabled, 0)
    };
    let atlas_dropped = atlas.dropped;

    pipeline.frame += 1;
    let report = FrameReport {
        frame: pipeline.frame,
        obstacle_rebuilt,
        surface_rebuilt,
        point_shadows: if point_ran {
            PassOutcome::Ran
        } else {
            PassOutcome::Skipped
        },
        sun_shadows: match sun_decision {
            SunShadowDecision::Reuse => PassOutcome::Skipped,
            SunShadowDecision::SunInactive => PassOutcome::Disabled,
            _ => PassOutcome::Ran,
        },
        sun_decision,
        sprite_shadows,
        active_lights: lights.lights.len(),
        culled_lights: lights.culled,
        truncated_lights: lights.truncated,
        sprite_casters,
        atlas_dropped,
        surface_placeholder: !pipeline.surface.populated,
    };

    pipeline.lights = lights;
    pipeline.sun = ctx.sun;

    log::debug!(
        "[LightingPipeline] Frame {}: lights={} point={:?} sun={:?} sprites={:?}",
        report.frame,
        report.active_lights,
        report.point_shadows,
        report.sun_shadows,
        report.sprite_shadows
    );

    Ok(report)
}

// ============================================================================
// COMPOSITING
// ============================================================================

/// Read-only view of the current frame's maps
///
/// The light list is the one the point shadow map was built from, so
/// shadow rows always line up with lights.
pub fn compositor_inputs(pipeline: &LightingPipelineData) -> LightingResult<CompositorInputs<'_>> {
    ensure_ready(pipeline)?;
    Ok(CompositorInputs {
        config: &pipeline.config,
        camera: &pipeline.camera,
        lights: &pipeline.lights,
        sun: &pipeline.sun,
        obstacle: &pipeline.obstacle,
        surface: &pipeline.surface,
        point_shadow: &pipeline.point_shadow,
        sun_shadow: &pipeline.sun_shadow,
        sprite_shadow: &pipeline.sprite_shadow,
    })
}

/// Lighting terms at one screen pixel
pub fn lighting_sample_at(
    pipeline: &LightingPipelineData,
    pixel: Vec2,
) -> LightingResult<LightingSample> {
    Ok(lighting_at(&compositor_inputs(pipeline)?, pixel))
}

/// Light a rendered scene with the current frame's maps
pub fn composite_pipeline(
    pipeline: &LightingPipelineData,
    scene: &RgbaImage,
) -> LightingResult<RgbaImage> {
    let inputs = compositor_inputs(pipeline)?;
    let expected = pipeline
        .surface_size
        .ok_or_state("surface descriptor", "missing")?;

    if scene.dimensions() != (expected.width, expected.height) {
        return Err(LightingError::InvalidConfig {
            field: "scene".to_string(),
            value: format!("{}x{}", scene.width(), scene.height()),
            reason: format!(
                "scene must match the {}x{} surface",
                expected.width, expected.height
            ),
        });
    }

    let mut output = composite_frame(&inputs, scene);
    apply_debug_overlay(&mut output, pipeline.config.debug, &inputs);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lights::{create_point_light, create_sun};
    use crate::pipeline::pipeline_data::FrameContext;
    use crate::sprites::{CasterKind, ShadowCaster};
    use crate::tiles::{create_grid_source, default_classifier, set_region};
    use glam::{IVec2, Vec3};
    use image::Rgba;

    fn small_config() -> LightingConfig {
        let mut config = LightingConfig {
            tile_width: 16,
            tile_height: 16,
            ..Default::default()
        };
        config.shadow.shadow_map_resolution = 64;
        config.sprite.atlas_width = 64;
        config.sprite.atlas_height = 64;
        config
    }

    fn surface() -> SurfaceDescriptor {
        SurfaceDescriptor {
            width: 64,
            height: 48,
        }
    }

    fn camera() -> DisplayCamera {
        DisplayCamera {
            display: Vec2::ZERO,
            tile_size: Vec2::splat(16.0),
            screen_size: Vec2::new(64.0, 48.0),
        }
    }

    #[test]
    fn test_update_before_initialize_is_rejected() {
        let mut pipeline = create_lighting_pipeline(small_config(), default_classifier()).unwrap();
        let grid = create_grid_source(4, 4);
        let ctx = FrameContext {
            camera: camera(),
            lights: &[],
            sun: Sun::default(),
            tiles: &grid,
            casters: &[],
        };
        assert!(matches!(
            update_pipeline(&mut pipeline, &ctx),
            Err(LightingError::StateError { .. })
        ));
    }

    #[test]
    fn test_lifecycle_and_second_frame_skips() {
        let mut pipeline = create_lighting_pipeline(small_config(), default_classifier()).unwrap();
        initialize_pipeline(&mut pipeline, surface()).unwrap();
        assert!(initialize_pipeline(&mut pipeline, surface()).is_err());

        let mut grid = create_grid_source(8, 8);
        set_region(&mut grid, 2, 1, 1);
        let lights = [create_point_light(Vec2::new(8.0, 24.0), 40.0, 1.0, Vec3::ONE)];
        let ctx = FrameContext {
            camera: camera(),
            lights: &lights,
            sun: create_sun(45.0, 0.5, Vec3::ONE, 0.5),
            tiles: &grid,
            casters: &[],
        };

        let first = update_pipeline(&mut pipeline, &ctx).unwrap();
        assert!(first.obstacle_rebuilt);
        assert_eq!(first.point_shadows, PassOutcome::Ran);
        assert_eq!(first.sun_shadows, PassOutcome::Ran);
        assert_eq!(first.sprite_shadows, PassOutcome::Skipped);
        assert!(!first.surface_placeholder);

        let second = update_pipeline(&mut pipeline, &ctx).unwrap();
        assert!(!second.obstacle_rebuilt);
        assert_eq!(second.point_shadows, PassOutcome::Skipped);
        assert_eq!(second.sun_shadows, PassOutcome::Skipped);

        let scene = RgbaImage::from_pixel(64, 48, Rgba([200, 200, 200, 255]));
        let lit = composite_pipeline(&pipeline, &scene).unwrap();
        assert_eq!(lit.dimensions(), (64, 48));

        teardown_pipeline(&mut pipeline);
        assert_eq!(pipeline.state, PipelineState::TornDown);
        assert!(composite_pipeline(&pipeline, &scene).is_err());
        assert!(update_pipeline(&mut pipeline, &ctx).is_err());

        // A fresh scene can initialize again after teardown
        initialize_pipeline(&mut pipeline, surface()).unwrap();
        assert!(update_pipeline(&mut pipeline, &ctx).is_ok());
    }

    #[test]
    fn test_atlas_overflow_is_reported_not_fatal() {
        let mut pipeline = create_lighting_pipeline(small_config(), default_classifier()).unwrap();
        initialize_pipeline(&mut pipeline, surface()).unwrap();

        let frame = RgbaImage::from_pixel(40, 40, Rgba([0, 0, 0, 255]));
        let casters: Vec<ShadowCaster<'_>> = (0..3)
            .map(|i| ShadowCaster {
                kind: CasterKind::Player,
                shadow_override: None,
                foot: Vec2::new(10.0 + i as f32 * 10.0, 40.0),
                frame: &frame,
            })
            .collect();
        let grid = create_grid_source(8, 8);
        let ctx = FrameContext {
            camera: camera(),
            lights: &[],
            sun: create_sun(270.0, 1.0, Vec3::ONE, 0.5),
            tiles: &grid,
            casters: &casters,
        };

        let report = update_pipeline(&mut pipeline, &ctx).unwrap();
        assert_eq!(report.sprite_casters, 1);
        assert_eq!(report.atlas_dropped, 2);
        assert_eq!(report.sprite_shadows, PassOutcome::Ran);
    }

    #[test]
    fn test_obstacle_padding_follows_light_and_sun_reach() {
        let mut config = small_config();
        let tile = Vec2::splat(16.0);
        let none = LightList::default();
        assert_eq!(required_obstacle_padding(&config, tile, &none, &Sun::default()), 8);

        let lights = LightList {
            lights: vec![
                create_point_light(Vec2::ZERO, 40.0, 1.0, Vec3::ONE),
                create_point_light(Vec2::ZERO, 200.0, 1.0, Vec3::ONE),
            ],
            ..Default::default()
        };
        // 200 / 16 = 12.5
        assert_eq!(required_obstacle_padding(&config, tile, &lights, &Sun::default()), 13);

        // 20 tiles of sun march plus the 1px soft-ray offset
        config.shadow.sun_shadow_length = 20.0;
        let sun = create_sun(90.0, 1.0, Vec3::ONE, 0.5);
        assert_eq!(required_obstacle_padding(&config, tile, &none, &sun), 21);
    }

    #[test]
    fn test_update_grows_obstacle_window_for_long_lights() {
        let mut pipeline = create_lighting_pipeline(small_config(), default_classifier()).unwrap();
        initialize_pipeline(&mut pipeline, surface()).unwrap();
        let grid = create_grid_source(8, 8);
        let short = [create_point_light(Vec2::new(8.0, 24.0), 40.0, 1.0, Vec3::ONE)];
        let long = [create_point_light(Vec2::new(-100.0, 24.0), 320.0, 1.0, Vec3::ONE)];
        let short_ctx = FrameContext {
            camera: camera(),
            lights: &short,
            sun: Sun::default(),
            tiles: &grid,
            casters: &[],
        };
        let long_ctx = FrameContext {
            lights: &long,
            ..short_ctx
        };

        update_pipeline(&mut pipeline, &short_ctx).unwrap();
        assert_eq!(pipeline.obstacle.padding, 8);

        let report = update_pipeline(&mut pipeline, &long_ctx).unwrap();
        assert!(report.obstacle_rebuilt);
        assert_eq!(pipeline.obstacle.padding, 20);
        assert_eq!(pipeline.obstacle.window.origin, IVec2::new(-20, -20));

        // Never shrinks back once the long light is gone
        let report = update_pipeline(&mut pipeline, &short_ctx).unwrap();
        assert!(!report.obstacle_rebuilt);
        assert_eq!(pipeline.obstacle.padding, 20);
    }

    #[test]
    fn test_scene_size_mismatch() {
        let mut pipeline = create_lighting_pipeline(small_config(), default_classifier()).unwrap();
        initialize_pipeline(&mut pipeline, surface()).unwrap();
        let scene = RgbaImage::new(10, 10);
        assert!(matches!(
            composite_pipeline(&pipeline, &scene),
            Err(LightingError::InvalidConfig { .. })
        ));
    }
}
