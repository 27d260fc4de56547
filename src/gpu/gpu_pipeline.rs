//! GPU lighting pipeline
//!
//! Runs the shadow generators and the compositor as render passes on a
//! wgpu device. Level data, light lists, the silhouette atlas and every
//! cache key stay on the host in a `LightingPipelineData`; the shadow
//! texels live only in GPU render targets.

use std::sync::Arc;

use bytemuck::Zeroable;
use image::RgbaImage;
use wgpu::util::DeviceExt;

use super::error_recovery::GpuErrorRecovery;
use super::gpu_data::{formats, GpuResources, GpuTexture, LightingPasses};
use super::passes::{
    create_lighting_passes, create_pass_bind_group, encode_clear_pass, encode_fullscreen_pass,
};
use super::resource_guard::GuardedResource;
use super::textures::{
    create_guarded_texture, read_rgba_texture, upload_texture, INPUT_USAGE, TARGET_USAGE,
};
use super::uniforms::{
    frame_uniforms, light_array, projector_array, FrameUniforms, LightArrayUniform,
    ProjectorArrayUniform,
};
use crate::camera::{log_camera_context, resize};
use crate::config::{LightingConfig, ShadowStyleConfig};
use crate::debug::apply_debug_overlay;
use crate::error::{LightingError, LightingResult, OptionExt};
use crate::lights::light_signature;
use crate::pipeline::{
    compositor_inputs, create_lighting_pipeline, initialize_pipeline, invalidate_level_data,
    prepare_frame_lights, teardown_pipeline, FrameContext, FrameReport, LightingPipelineData,
    PassOutcome, PipelineState, SurfaceDescriptor,
};
use crate::shadows::{
    clear_point_shadow_map, clear_sun_shadow_map, sun_shadow_decision, sun_shadow_style,
    SunShadowCacheKey, SunShadowDecision,
};
use crate::sprites::{build_projectors, clear_sprite_shadow_map, rebuild_silhouette_atlas};
use crate::tiles::{
    obstacle_texels, refresh_obstacle_map, refresh_surface_map, surface_texels, SurfaceClassifier,
};

/// Lighting pipeline backed by a wgpu device
pub struct GpuLightingPipeline {
    recovery: GpuErrorRecovery,
    passes: LightingPasses,
    host: LightingPipelineData,
    resources: Option<GpuResources>,
}

impl GpuLightingPipeline {
    /// Validate the config and compile every pass
    pub fn new(
        device: Arc<wgpu::Device>,
        queue: Arc<wgpu::Queue>,
        config: LightingConfig,
        classifier: SurfaceClassifier,
    ) -> LightingResult<Self> {
        let host = create_lighting_pipeline(config, classifier)?;
        let recovery = GpuErrorRecovery::new(device, queue);
        let passes = create_lighting_passes(&recovery)?;

        Ok(Self {
            recovery,
            passes,
            host,
            resources: None,
        })
    }

    pub fn host(&self) -> &LightingPipelineData {
        &self.host
    }

    pub fn state(&self) -> PipelineState {
        self.host.state
    }

    pub fn recovery(&self) -> &GpuErrorRecovery {
        &self.recovery
    }

    /// Number of textures running on a 1x1 placeholder
    pub fn placeholder_count(&self) -> usize {
        self.resources
            .as_ref()
            .map_or(0, |resources| resources.placeholders)
    }

    /// Current GPU resources; stale after teardown
    pub fn resources(&self) -> LightingResult<&GpuResources> {
        let resources = self
            .resources
            .as_ref()
            .ok_or_state("gpu resources", "uninitialized")?;
        resources.frame_uniform.get()?;
        Ok(resources)
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Allocate host maps and GPU targets for a rendering surface
    pub fn initialize(&mut self, surface: SurfaceDescriptor) -> LightingResult<()> {
        initialize_pipeline(&mut self.host, surface)?;

        // The GPU targets own the shadow texels
        clear_point_shadow_map(&mut self.host.point_shadow);
        clear_sun_shadow_map(&mut self.host.sun_shadow);
        clear_sprite_shadow_map(&mut self.host.sprite_shadow);

        let resources = match create_gpu_resources(&self.recovery, &self.host.config, surface) {
            Ok(resources) => resources,
            Err(e) => {
                teardown_pipeline(&mut self.host);
                return Err(e);
            }
        };
        if let Err(e) = clear_shadow_targets(&self.recovery, &resources) {
            teardown_pipeline(&mut self.host);
            return Err(e);
        }

        if resources.placeholders > 0 {
            log::warn!(
                "[GpuLighting] {} texture(s) fell back to placeholders; their passes are skipped",
                resources.placeholders
            );
        }
        log::info!(
            "[GpuLighting] Initialized {}x{} on the GPU",
            surface.width,
            surface.height
        );

        self.resources = Some(resources);
        Ok(())
    }

    /// Release every GPU resource; handles held elsewhere become stale
    pub fn teardown(&mut self) {
        if let Some(resources) = self.resources.as_mut() {
            invalidate_resources(resources);
        }
        teardown_pipeline(&mut self.host);
    }

    pub fn invalidate_level_data(&mut self) {
        invalidate_level_data(&mut self.host);
    }

    /// Swap the shadow style; a new resolution reallocates the polar target
    pub fn update_shadow_style(&mut self, style: ShadowStyleConfig) -> LightingResult<()> {
        let previous = self.host.config.shadow.shadow_map_resolution;
        crate::pipeline::update_shadow_style(&mut self.host, style)?;

        if style.shadow_map_resolution == previous {
            return Ok(());
        }
        clear_point_shadow_map(&mut self.host.point_shadow);

        let Some(resources) = self.resources.as_mut() else {
            return Ok(());
        };
        if !resources.point_shadow.is_valid() {
            return Ok(());
        }

        let was_placeholder = resources.point_shadow.is_placeholder();
        resources.point_shadow = create_guarded_texture(
            &self.recovery,
            "point_shadow",
            style.shadow_map_resolution,
            self.host.config.max_lights as u32,
            formats::POINT_SHADOW,
            TARGET_USAGE,
        );
        match (was_placeholder, resources.point_shadow.is_placeholder()) {
            (false, true) => resources.placeholders += 1,
            (true, false) => resources.placeholders -= 1,
            _ => {}
        }
        if !resources.point_shadow.is_placeholder() {
            let mut encoder = self.recovery.device().create_command_encoder(
                &wgpu::CommandEncoderDescriptor {
                    label: Some("point_shadow_reset"),
                },
            );
            encode_clear_pass(&mut encoder, "point_shadow_reset", &resources.point_shadow.get()?.view);
            self.recovery.submit_with_recovery(vec![encoder.finish()])?;
        }
        Ok(())
    }

    // ========================================================================
    // PER-FRAME UPDATE
    // ========================================================================

    /// Refresh host maps and render every shadow pass whose inputs changed
    pub fn update(&mut self, ctx: &FrameContext<'_>) -> LightingResult<FrameReport> {
        let Self {
            recovery,
            passes,
            host,
            resources,
        } = self;
        let resources = resources
            .as_mut()
            .ok_or_state("gpu resources", "uninitialized")?;
        resources.frame_uniform.get()?;
        if host.state != PipelineState::Ready {
            return Err(LightingError::StateError {
                expected: "ready".to_string(),
                actual: format!("{:?}", host.state),
            });
        }
        let surface_size = host
            .surface_size
            .ok_or_state("surface descriptor", "missing")?;

        let camera = resize(&ctx.camera, surface_size.width, surface_size.height);
        host.camera = camera;
        log_camera_context(&camera);
        let lights = prepare_frame_lights(host, ctx, &camera);

        // Tile maps
        let surface_rebuilt =
            refresh_surface_map(&mut host.surface, ctx.tiles, &host.classifier, &camera);
        let obstacle_rebuilt =
            refresh_obstacle_map(&mut host.obstacle, ctx.tiles, &host.classifier, &camera);
        if surface_rebuilt {
            let (width, height, bytes) = surface_texels(&host.surface);
            upload_texture(recovery, &mut resources.surface, width, height, &bytes)?;
        }
        if obstacle_rebuilt {
            let (width, height, bytes) = obstacle_texels(&host.obstacle);
            upload_texture(recovery, &mut resources.obstacle, width, height, &bytes)?;
        }

        let config = &host.config;

        // Point and spot shadows
        let signature = light_signature(
            &lights,
            &camera,
            host.obstacle.revision,
            config.shadow.shadow_map_resolution,
            config.shadow.point_shadow_step_budget,
        );
        let point_dirty = host.point_shadow.signature.as_ref() != Some(&signature);
        let point_ran = point_dirty && !resources.point_shadow.is_placeholder();

        // Sun shadows
        let sun_key = SunShadowCacheKey {
            display: camera.display,
            direction: ctx.sun.direction,
            style: sun_shadow_style(config),
            obstacle_revision: host.obstacle.revision,
            surface_revision: host.surface.revision,
        };
        let sun_decision = sun_shadow_decision(
            host.sun_shadow.cache.as_ref(),
            &sun_key,
            &ctx.sun,
            &config.regeneration,
        );
        let sun_dirty = !matches!(
            sun_decision,
            SunShadowDecision::Reuse | SunShadowDecision::SunInactive
        );
        let sun_ran = sun_dirty && !resources.sun_shadow.is_placeholder();

        // Sprite shadows
        let atlas = host
            .atlas
            .as_mut()
            .ok_or_state("silhouette atlas", "missing")?;
        let mut projector_uniform = ProjectorArrayUniform::zeroed();
        let mut projector_count = 0;
        let (sprite_casters, sprite_dirty, sprite_outcome) = if config.sprite.map_enabled {
            let packed =
                rebuild_silhouette_atlas(atlas, ctx.casters, &config.sprite, config.max_sprites);
            if !atlas.entries.is_empty() {
                upload_texture(
                    recovery,
                    &mut resources.atlas,
                    atlas.width,
                    atlas.height,
                    atlas.image.as_raw(),
                )?;
            }
            let projectors = build_projectors(
                atlas,
                &lights,
                &ctx.sun,
                &camera,
                &host.obstacle,
                &host.surface,
                &config.sprite,
            );
            (projector_uniform, projector_count) = projector_array(atlas, &projectors);

            if projector_count == 0 && host.last_projector_count == 0 {
                (packed, false, PassOutcome::Skipped)
            } else {
                (packed, true, PassOutcome::Ran)
            }
        } else {
            // One empty pass resets a map left over from enabled frames
            (0, host.last_projector_count > 0, PassOutcome::Disabled)
        };
        let sprite_ran = sprite_dirty && !resources.sprite_shadow.is_placeholder();
        let atlas_dropped = atlas.dropped;

        // Uniforms
        let frame = frame_uniforms(
            config,
            &camera,
            &lights,
            &ctx.sun,
            &host.obstacle,
            &host.surface,
            projector_count,
        );
        let queue = recovery.queue();
        queue.write_buffer(resources.frame_uniform.get()?, 0, bytemuck::bytes_of(&frame));
        queue.write_buffer(
            resources.light_uniform.get()?,
            0,
            bytemuck::bytes_of(&light_array(&lights)),
        );
        if sprite_ran {
            queue.write_buffer(
                resources.projector_uniform.get()?,
                0,
                bytemuck::bytes_of(&projector_uniform),
            );
        }

        // Passes
        let device = recovery.device();
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lighting_shadows"),
        });

        if point_ran {
            let bind_group = create_pass_bind_group(
                device,
                &passes.point_shadow,
                &[
                    resources.frame_uniform.get()?.as_entire_binding(),
                    resources.light_uniform.get()?.as_entire_binding(),
                    wgpu::BindingResource::TextureView(&resources.obstacle.get()?.view),
                ],
            );
            encode_fullscreen_pass(
                &mut encoder,
                &passes.point_shadow,
                &bind_group,
                &resources.point_shadow.get()?.view,
            );
        }

        if sun_ran {
            let bind_group = create_pass_bind_group(
                device,
                &passes.sun_shadow,
                &[
                    resources.frame_uniform.get()?.as_entire_binding(),
                    wgpu::BindingResource::TextureView(&resources.obstacle.get()?.view),
                    wgpu::BindingResource::TextureView(&resources.surface.get()?.view),
                ],
            );
            encode_fullscreen_pass(
                &mut encoder,
                &passes.sun_shadow,
                &bind_group,
                &resources.sun_shadow.get()?.view,
            );
        }

        if sprite_ran {
            let bind_group = create_pass_bind_group(
                device,
                &passes.sprite_shadow,
                &[
                    resources.frame_uniform.get()?.as_entire_binding(),
                    resources.projector_uniform.get()?.as_entire_binding(),
                    wgpu::BindingResource::TextureView(&resources.obstacle.get()?.view),
                    wgpu::BindingResource::TextureView(&resources.surface.get()?.view),
                    wgpu::BindingResource::TextureView(&resources.atlas.get()?.view),
                ],
            );
            encode_fullscreen_pass(
                &mut encoder,
                &passes.sprite_shadow,
                &bind_group,
                &resources.sprite_shadow.get()?.view,
            );
        }

        recovery.submit_with_recovery(vec![encoder.finish()])?;

        // Cache keys only advance once the passes were submitted
        if point_ran {
            host.point_shadow.active_rows =
                (lights.lights.len() as u32).min(config.max_lights as u32);
            host.point_shadow.signature = Some(signature);
            host.point_shadow.generation += 1;
        }
        if sun_ran {
            host.sun_shadow.cache = Some(sun_key);
            host.sun_shadow.generation += 1;
        }
        if sprite_ran {
            host.last_projector_count = projector_count;
        }

        host.frame += 1;
        let report = FrameReport {
            frame: host.frame,
            obstacle_rebuilt,
            surface_rebuilt,
            point_shadows: pass_outcome(point_dirty, point_ran),
            sun_shadows: match sun_decision {
                SunShadowDecision::Reuse => PassOutcome::Skipped,
                SunShadowDecision::SunInactive => PassOutcome::Disabled,
                _ => pass_outcome(sun_dirty, sun_ran),
            },
            sun_decision,
            sprite_shadows: if sprite_dirty && !sprite_ran {
                PassOutcome::Disabled
            } else {
                sprite_outcome
            },
            active_lights: lights.lights.len(),
            culled_lights: lights.culled,
            truncated_lights: lights.truncated,
            sprite_casters,
            atlas_dropped,
            surface_placeholder: !host.surface.populated,
        };

        host.lights = lights;
        host.sun = ctx.sun;

        log::debug!(
            "[GpuLighting] Frame {}: lights={} point={:?} sun={:?} sprites={:?}",
            report.frame,
            report.active_lights,
            report.point_shadows,
            report.sun_shadows,
            report.sprite_shadows
        );

        Ok(report)
    }

    // ========================================================================
    // COMPOSITING
    // ========================================================================

    /// Record the composite of `scene` into `target` on a host encoder
    ///
    /// `target` must be an Rgba8Unorm view the size of the surface.
    pub fn encode_composite(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        scene: &wgpu::TextureView,
        target: &wgpu::TextureView,
    ) -> LightingResult<()> {
        let resources = self.resources()?;
        let bind_group = create_pass_bind_group(
            self.recovery.device(),
            &self.passes.composite,
            &[
                resources.frame_uniform.get()?.as_entire_binding(),
                resources.light_uniform.get()?.as_entire_binding(),
                wgpu::BindingResource::TextureView(&resources.obstacle.get()?.view),
                wgpu::BindingResource::TextureView(&resources.surface.get()?.view),
                wgpu::BindingResource::TextureView(&resources.point_shadow.get()?.view),
                wgpu::BindingResource::TextureView(&resources.sun_shadow.get()?.view),
                wgpu::BindingResource::TextureView(&resources.sprite_shadow.get()?.view),
                wgpu::BindingResource::TextureView(scene),
            ],
        );
        encode_fullscreen_pass(encoder, &self.passes.composite, &bind_group, target);
        Ok(())
    }

    /// Light a host image on the GPU and read the result back
    pub fn render_composite(&mut self, scene: &RgbaImage) -> LightingResult<RgbaImage> {
        self.resources()?;
        let expected = self
            .host
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

        let resources = self
            .resources
            .as_mut()
            .ok_or_state("gpu resources", "uninitialized")?;
        let uploaded = upload_texture(
            &self.recovery,
            &mut resources.scene,
            expected.width,
            expected.height,
            scene.as_raw(),
        )?;

        let inputs = compositor_inputs(&self.host)?;
        let resources = self.resources()?;
        if !uploaded || resources.output.is_placeholder() {
            log::warn!("[GpuLighting] Composite targets unavailable, passing the scene through");
            let mut output = scene.clone();
            apply_debug_overlay(&mut output, self.host.config.debug, &inputs);
            return Ok(output);
        }

        let mut encoder = self
            .recovery
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("lighting_composite"),
            });
        let output_texture = resources.output.get()?;
        self.encode_composite(&mut encoder, &resources.scene.get()?.view, &output_texture.view)?;
        self.recovery.submit_with_recovery(vec![encoder.finish()])?;

        let mut output = read_rgba_texture(&self.recovery, output_texture)?;
        apply_debug_overlay(&mut output, self.host.config.debug, &inputs);
        Ok(output)
    }
}

fn pass_outcome(dirty: bool, ran: bool) -> PassOutcome {
    match (dirty, ran) {
        (_, true) => PassOutcome::Ran,
        (true, false) => PassOutcome::Disabled,
        (false, false) => PassOutcome::Skipped,
    }
}

// ============================================================================
// RESOURCES
// ============================================================================

fn create_uniform_buffer<T: bytemuck::Pod>(
    recovery: &GpuErrorRecovery,
    name: &'static str,
    initial: &T,
) -> LightingResult<GuardedResource<wgpu::Buffer>> {
    let buffer = recovery.create_scoped(name, |device| {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(name),
            contents: bytemuck::bytes_of(initial),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    })?;
    Ok(GuardedResource::new(name, buffer))
}

/// Allocate uniforms, inputs and targets for one scene
///
/// Uniform buffers are required. Textures that cannot be allocated fall
/// back to 1x1 placeholders.
pub fn create_gpu_resources(
    recovery: &GpuErrorRecovery,
    config: &LightingConfig,
    surface: SurfaceDescriptor,
) -> LightingResult<GpuResources> {
    let (width, height) = (surface.width, surface.height);
    let texture = |name, w, h, format, usage| {
        create_guarded_texture(recovery, name, w, h, format, usage)
    };

    let mut resources = GpuResources {
        frame_uniform: create_uniform_buffer(recovery, "frame_uniform", &FrameUniforms::zeroed())?,
        light_uniform: create_uniform_buffer(
            recovery,
            "light_uniform",
            &LightArrayUniform::zeroed(),
        )?,
        projector_uniform: create_uniform_buffer(
            recovery,
            "projector_uniform",
            &ProjectorArrayUniform::zeroed(),
        )?,
        obstacle: texture("obstacle_map", 1, 1, formats::COLOR, INPUT_USAGE),
        surface: texture("surface_map", 1, 1, formats::COLOR, INPUT_USAGE),
        atlas: texture(
            "silhouette_atlas",
            config.sprite.atlas_width,
            config.sprite.atlas_height,
            formats::COLOR,
            INPUT_USAGE,
        ),
        scene: texture("scene", width, height, formats::COLOR, INPUT_USAGE),
        point_shadow: texture(
            "point_shadow",
            config.shadow.shadow_map_resolution,
            config.max_lights as u32,
            formats::POINT_SHADOW,
            TARGET_USAGE,
        ),
        sun_shadow: texture("sun_shadow", width, height, formats::SUN_SHADOW, TARGET_USAGE),
        sprite_shadow: texture(
            "sprite_shadow",
            width,
            height,
            formats::SPRITE_SHADOW,
            TARGET_USAGE,
        ),
        output: texture("lit_output", width, height, formats::COLOR, TARGET_USAGE),
        placeholders: 0,
    };

    resources.placeholders = [
        &resources.obstacle,
        &resources.surface,
        &resources.atlas,
        &resources.scene,
        &resources.point_shadow,
        &resources.sun_shadow,
        &resources.sprite_shadow,
        &resources.output,
    ]
    .iter()
    .filter(|guard| guard.is_placeholder())
    .count();

    Ok(resources)
}

/// Start every shadow target fully lit
fn clear_shadow_targets(recovery: &GpuErrorRecovery, resources: &GpuResources) -> LightingResult<()> {
    let mut encoder = recovery
        .device()
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("lighting_reset"),
        });

    let targets: [&GuardedResource<GpuTexture>; 3] = [
        &resources.point_shadow,
        &resources.sun_shadow,
        &resources.sprite_shadow,
    ];
    for guard in targets {
        if !guard.is_placeholder() {
            encode_clear_pass(&mut encoder, guard.name(), &guard.get()?.view);
        }
    }

    recovery.submit_with_recovery(vec![encoder.finish()])?;
    Ok(())
}

/// Drop every resource; later access reports `StaleResource`
pub fn invalidate_resources(resources: &mut GpuResources) {
    resources.frame_uniform.invalidate();
    resources.light_uniform.invalidate();
    resources.projector_uniform.invalidate();
    resources.obstacle.invalidate();
    resources.surface.invalidate();
    resources.atlas.invalidate();
    resources.scene.invalidate();
    resources.point_shadow.invalidate();
    resources.sun_shadow.invalidate();
    resources.sprite_shadow.invalidate();
    resources.output.invalidate();
    log::debug!("[GpuLighting] Released all GPU resources");
}
