//! Full-screen lighting passes
//!
//! Every generator and the compositor is a fragment shader over a single
//! full-screen triangle. Textures are read with `textureLoad`, so no
//! samplers are bound.

use super::error_recovery::GpuErrorRecovery;
use super::gpu_data::{formats, FullscreenPass, LightingPasses};
use super::shader_validation::{
    validate_pass_shader, COMPOSITE_SHADER, FRAGMENT_ENTRY, POINT_SHADOW_SHADER,
    SPRITE_SHADOW_SHADER, SUN_SHADOW_SHADER, VERTEX_ENTRY,
};
use crate::error::LightingResult;

// ============================================================================
// LAYOUT ENTRIES
// ============================================================================

pub fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub fn texture_entry(binding: u32, filterable: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

// ============================================================================
// PIPELINE CREATION
// ============================================================================

fn create_fullscreen_pass(
    recovery: &GpuErrorRecovery,
    label: &'static str,
    source: &'static str,
    entries: &[wgpu::BindGroupLayoutEntry],
    target: wgpu::TextureFormat,
) -> LightingResult<FullscreenPass> {
    validate_pass_shader(label, source)?;

    let pass = recovery.create_scoped(label, |device| {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: VERTEX_ENTRY,
                buffers: &[],
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: FRAGMENT_ENTRY,
                targets: &[Some(wgpu::ColorTargetState {
                    format: target,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        FullscreenPass {
            label,
            pipeline,
            layout,
        }
    })?;

    log::debug!("[LightingPasses] Created {} pass", label);
    Ok(pass)
}

/// Validate and compile all four passes
pub fn create_lighting_passes(recovery: &GpuErrorRecovery) -> LightingResult<LightingPasses> {
    let point_shadow = create_fullscreen_pass(
        recovery,
        "point_shadow",
        POINT_SHADOW_SHADER,
        &[uniform_entry(0), uniform_entry(1), texture_entry(2, true)],
        formats::POINT_SHADOW,
    )?;

    let sun_shadow = create_fullscreen_pass(
        recovery,
        "sun_shadow",
        SUN_SHADOW_SHADER,
        &[uniform_entry(0), texture_entry(1, true), texture_entry(2, true)],
        formats::SUN_SHADOW,
    )?;

    let sprite_shadow = create_fullscreen_pass(
        recovery,
        "sprite_shadow",
        SPRITE_SHADOW_SHADER,
        &[
            uniform_entry(0),
            uniform_entry(1),
            texture_entry(2, true),
            texture_entry(3, true),
            texture_entry(4, true),
        ],
        formats::SPRITE_SHADOW,
    )?;

    // The point shadow map is R32Float, which is not filterable
    let composite = create_fullscreen_pass(
        recovery,
        "composite",
        COMPOSITE_SHADER,
        &[
            uniform_entry(0),
            uniform_entry(1),
            texture_entry(2, true),
            texture_entry(3, true),
            texture_entry(4, false),
            texture_entry(5, true),
            texture_entry(6, true),
            texture_entry(7, true),
        ],
        formats::COLOR,
    )?;

    log::info!("[LightingPasses] All lighting passes compiled");

    Ok(LightingPasses {
        point_shadow,
        sun_shadow,
        sprite_shadow,
        composite,
    })
}

// ============================================================================
// RECORDING
// ============================================================================

/// Bind resources in binding-index order
pub fn create_pass_bind_group(
    device: &wgpu::Device,
    pass: &FullscreenPass,
    resources: &[wgpu::BindingResource<'_>],
) -> wgpu::BindGroup {
    let entries: Vec<wgpu::BindGroupEntry<'_>> = resources
        .iter()
        .enumerate()
        .map(|(binding, resource)| wgpu::BindGroupEntry {
            binding: binding as u32,
            resource: resource.clone(),
        })
        .collect();

    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(pass.label),
        layout: &pass.layout,
        entries: &entries,
    })
}

fn begin_target_pass<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    label: &'static str,
    target: &'a wgpu::TextureView,
) -> wgpu::RenderPass<'a> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: target,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

/// Record one full-screen draw into `target`
pub fn encode_fullscreen_pass(
    encoder: &mut wgpu::CommandEncoder,
    pass: &FullscreenPass,
    bind_group: &wgpu::BindGroup,
    target: &wgpu::TextureView,
) {
    let mut render_pass = begin_target_pass(encoder, pass.label, target);
    render_pass.set_pipeline(&pass.pipeline);
    render_pass.set_bind_group(0, bind_group, &[]);
    render_pass.draw(0..3, 0..1);
}

/// Reset a target to fully lit (1.0 in every channel)
pub fn encode_clear_pass(
    encoder: &mut wgpu::CommandEncoder,
    label: &'static str,
    target: &wgpu::TextureView,
) {
    let _render_pass = begin_target_pass(encoder, label, target);
}
