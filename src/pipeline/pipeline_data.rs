//! Lighting pipeline data - Pure DOP
//!
//! NO METHODS. Just data.
//! Lifecycle and per-frame sequencing happen in pipeline_operations.rs

use crate::camera::DisplayCamera;
use crate::config::LightingConfig;
use crate::lights::{Light, LightList, Sun};
use crate::shadows::{PointShadowMapData, SunShadowDecision, SunShadowMapData};
use crate::sprites::{ShadowCaster, SilhouetteAtlasData, SpriteShadowMapData};
use crate::tiles::{ObstacleMapData, SurfaceClassifier, SurfaceMapData, TileSource};

/// Lifecycle state of a pipeline instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Uninitialized,
    Ready,
    TornDown,
}

/// Size of the rendering surface the pipeline lights
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceDescriptor {
    pub width: u32,
    pub height: u32,
}

/// Everything the host supplies for one frame
pub struct FrameContext<'a> {
    pub camera: DisplayCamera,

    /// Frame lights in caller order (screen px)
    pub lights: &'a [Light],

    pub sun: Sun,
    pub tiles: &'a dyn TileSource,
    pub casters: &'a [ShadowCaster<'a>],
}

/// What a pass did this frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Ran,
    /// Cached result reused
    Skipped,
    /// Feature off for this frame
    Disabled,
}

/// Per-frame summary returned by `update`
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,

    pub obstacle_rebuilt: bool,
    pub surface_rebuilt: bool,

    pub point_shadows: PassOutcome,
    pub sun_shadows: PassOutcome,
    pub sun_decision: SunShadowDecision,
    pub sprite_shadows: PassOutcome,

    pub active_lights: usize,
    pub culled_lights: usize,
    pub truncated_lights: usize,

    pub sprite_casters: usize,

    /// Eligible sprites dropped because the atlas was full
    pub atlas_dropped: usize,

    /// Surface map holds no level data; wall routing is off
    pub surface_placeholder: bool,
}

/// One scene's lighting pipeline
pub struct LightingPipelineData {
    pub config: LightingConfig,
    pub classifier: SurfaceClassifier,
    pub state: PipelineState,
    pub surface_size: Option<SurfaceDescriptor>,

    pub camera: DisplayCamera,
    pub obstacle: ObstacleMapData,
    pub surface: SurfaceMapData,
    pub point_shadow: PointShadowMapData,
    pub sun_shadow: SunShadowMapData,
    pub atlas: Option<SilhouetteAtlasData>,
    pub sprite_shadow: SpriteShadowMapData,

    /// Light list of the last update, in shadow-map row order
    pub lights: LightList,
    pub sun: Sun,

    /// Projectors used by the last sprite shadow pass
    pub last_projector_count: usize,

    pub frame: u64,
}
