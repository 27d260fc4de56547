/// GPU Module - wgpu backend for the lighting pipeline
///
/// The CPU modules define every pass; this backend renders the same passes
/// as full-screen fragment shaders.
///
/// - gpu_data.rs: Textures, compiled passes, per-scene resources
/// - resource_guard.rs: Handles that report staleness after teardown
/// - error_recovery.rs: Error scopes, panic capture, device-loss tracking
/// - shader_validation.rs: Embedded WGSL and entry point checks
/// - uniforms.rs: Pod uniform layouts shared with the shaders
/// - textures.rs: Allocation with placeholder fallback, upload, readback
/// - passes.rs: Render pipelines and pass recording
/// - gpu_pipeline.rs: `GpuLightingPipeline` lifecycle and per-frame work
pub mod error_recovery;
pub mod gpu_data;
pub mod gpu_pipeline;
pub mod passes;
pub mod resource_guard;
pub mod shader_validation;
pub mod textures;
pub mod uniforms;

pub use error_recovery::{GpuErrorRecovery, GpuRecoveryError, GpuResultExt};
pub use gpu_data::{formats, FullscreenPass, GpuResources, GpuTexture, LightingPasses};
pub use gpu_pipeline::{create_gpu_resources, invalidate_resources, GpuLightingPipeline};
pub use passes::{
    create_lighting_passes, create_pass_bind_group, encode_clear_pass, encode_fullscreen_pass,
};
pub use resource_guard::GuardedResource;
pub use shader_validation::{
    extract_function_names, validate_entry_point, validate_pass_shader, ShaderStage,
    COMPOSITE_SHADER, POINT_SHADOW_SHADER, SPRITE_SHADOW_SHADER, SUN_SHADOW_SHADER,
};
pub use textures::{
    create_guarded_texture, read_rgba_texture, upload_texture, write_texture, INPUT_USAGE,
    TARGET_USAGE,
};
pub use uniforms::{
    frame_uniforms, light_array, projector_array, FrameUniforms, GpuLight, GpuProjector,
    LightArrayUniform, ProjectorArrayUniform,
};
