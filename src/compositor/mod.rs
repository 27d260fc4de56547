/// Compositor Module - Data-Oriented Programming (DOP) style
///
/// - compositor_data.rs: Per-frame read-only inputs and per-pixel results
/// - compositor_operations.rs: Per-pixel lighting and whole-frame composite
pub mod compositor_data;
pub mod compositor_operations;

pub use compositor_data::{CompositorInputs, LightingSample};
pub use compositor_operations::{
    apply_lighting, composite_frame, distance_falloff, lighting_at, smoothstep,
    spotlight_factor, sun_gradient,
};
