/// Pipeline Module - Data-Oriented Programming (DOP) style
///
/// Per-scene orchestration of every lighting pass.
///
/// - pipeline_data.rs: Pipeline state, frame context, frame report
/// - pipeline_operations.rs: initialize / update / composite / teardown
pub mod pipeline_data;
pub mod pipeline_operations;

pub use pipeline_data::{
    FrameContext, FrameReport, LightingPipelineData, PassOutcome, PipelineState,
    SurfaceDescriptor,
};

pub use pipeline_operations::{
    // Lifecycle
    create_lighting_pipeline,
    initialize_pipeline,
    teardown_pipeline,

    // Configuration
    invalidate_level_data,
    update_shadow_style,

    // Per frame
    compositor_inputs,
    composite_pipeline,
    lighting_sample_at,
    prepare_frame_lights,
    required_obstacle_padding,
    update_pipeline,
};
