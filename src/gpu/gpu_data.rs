//! GPU lighting data - Pure DOP
//!
//! NO METHODS. Just data.
//! Creation and per-frame work happen in textures.rs, passes.rs and
//! gpu_pipeline.rs

use super::resource_guard::GuardedResource;

/// A 2D texture with its default view
#[derive(Debug)]
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

/// One full-screen-triangle pass and its bind group layout
#[derive(Debug)]
pub struct FullscreenPass {
    pub label: &'static str,
    pub pipeline: wgpu::RenderPipeline,
    pub layout: wgpu::BindGroupLayout,
}

/// Compiled pipelines for every lighting pass; built once per device
#[derive(Debug)]
pub struct LightingPasses {
    pub point_shadow: FullscreenPass,
    pub sun_shadow: FullscreenPass,
    pub sprite_shadow: FullscreenPass,
    pub composite: FullscreenPass,
}

/// Everything one scene allocates on the GPU
///
/// Released as a unit on teardown; each guard then reports the resource
/// as stale.
#[derive(Debug)]
pub struct GpuResources {
    pub frame_uniform: GuardedResource<wgpu::Buffer>,
    pub light_uniform: GuardedResource<wgpu::Buffer>,
    pub projector_uniform: GuardedResource<wgpu::Buffer>,

    // Inputs uploaded from the host maps
    pub obstacle: GuardedResource<GpuTexture>,
    pub surface: GuardedResource<GpuTexture>,
    pub atlas: GuardedResource<GpuTexture>,
    pub scene: GuardedResource<GpuTexture>,

    // Render targets
    pub point_shadow: GuardedResource<GpuTexture>,
    pub sun_shadow: GuardedResource<GpuTexture>,
    pub sprite_shadow: GuardedResource<GpuTexture>,
    pub output: GuardedResource<GpuTexture>,

    /// Textures replaced by a placeholder at creation
    pub placeholders: usize,
}

/// Texture formats of the lighting targets
pub mod formats {
    pub const POINT_SHADOW: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;
    pub const SUN_SHADOW: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;
    pub const SPRITE_SHADOW: wgpu::TextureFormat = wgpu::TextureFormat::R8Unorm;
    pub const COLOR: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
}
