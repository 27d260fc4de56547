// Hearth Lighting 2D - Data-Oriented Programming (DOP) Architecture
//
// Dynamic lighting for tile-based 2D games: polar point/spot shadow maps,
// a directional sun shadow map, projected sprite silhouettes and a
// per-pixel compositor, with wall-aware routing for top-down tile maps.
//
// - *_data.rs files hold plain data
// - *_operations.rs files hold the pure functions that transform it
// - pipeline::* sequences the passes on the CPU
// - gpu::GpuLightingPipeline renders the same passes with wgpu

// Constants module
pub mod constants;

// Core modules
pub mod error;

pub mod camera;
pub mod compositor;
pub mod config;
pub mod debug;
pub mod lights;
pub mod pipeline;
pub mod shadows;
pub mod sprites;
pub mod tiles;

// GPU backend
pub mod gpu;

pub use error::{ErrorContext, LightingError, LightingResult, OptionExt};

// === Configuration ===
pub use config::{
    load_config_from_file, load_config_from_str, validate_config, DebugOverlay, LightingConfig,
    ObstacleDetectionMode, RegenerationConfig, ShadowStyleConfig, SpriteShadowConfig,
    SunShadowFalloff,
};

// === Scene inputs ===
pub use camera::{init_camera, scroll_to, DisplayCamera};
pub use lights::{create_point_light, create_spotlight, create_sun, Light, LightList, Sun};
pub use sprites::{CasterKind, ShadowCaster};
pub use tiles::{
    create_grid_source, default_classifier, GridTileSource, SurfaceClassifier, SurfaceType,
    TileSource,
};

// === Pipeline ===
pub use pipeline::{
    composite_pipeline, compositor_inputs, create_lighting_pipeline, initialize_pipeline,
    invalidate_level_data, lighting_sample_at, teardown_pipeline, update_pipeline,
    update_shadow_style, FrameContext, FrameReport, LightingPipelineData, PassOutcome,
    PipelineState, SurfaceDescriptor,
};
pub use compositor::LightingSample;
pub use gpu::GpuLightingPipeline;

// Re-export wgpu for hosts that drive the GPU backend
pub use wgpu;
