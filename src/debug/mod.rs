/// Debug Module
///
/// Pass-through visualisation of the obstacle mask, surface
/// classification and per-light cone boundaries.
pub mod debug_operations;

pub use debug_operations::{apply_debug_overlay, overlay_tint};
