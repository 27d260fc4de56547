//! Lighting configuration data - Pure DOP
//!
//! NO METHODS. Just data.
//! Validation and loading happen in config_operations.rs

use serde::{Deserialize, Serialize};

/// Which tiles count as light-blocking obstacles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleDetectionMode {
    /// Region id > 0
    Regions,
    /// Any tile classified as WALL_SIDE or WALL_TOP
    Walls,
    /// Either of the above
    Both,
}

/// Shadow darkness as a function of distance to the blocking obstacle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SunShadowFalloff {
    None,
    Linear,
    Smooth,
}

/// Pass-through debug overlays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebugOverlay {
    None,
    Obstacles,
    Surfaces,
    LightCones,
}

/// Shadow style options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowStyleConfig {
    pub obstacle_detection_mode: ObstacleDetectionMode,

    /// Angular samples per light in the point shadow map
    pub shadow_map_resolution: u32,

    /// Blur spread of point shadows, in angular texels at the light radius
    pub shadow_softness: f32,

    /// Perpendicular ray offset for soft sun shadows (px)
    pub sun_shadow_softness: f32,

    /// Sun ray-march steps per tile
    pub sun_shadow_precision: f32,

    /// 0 = no darkening, 1 = black shadows
    pub sun_shadow_strength: f32,

    /// Maximum sun shadow length, in tiles
    pub sun_shadow_length: f32,

    pub sun_shadow_falloff: SunShadowFalloff,

    /// Height-aware shadow routing on vertical wall faces
    pub wall_shadow_enabled: bool,

    /// Target number of march steps across a light's radius
    pub point_shadow_step_budget: u32,
}

/// Character sprite shadow options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteShadowConfig {
    /// Map-level switch; nothing casts when false
    pub map_enabled: bool,
    pub player: bool,
    pub followers: bool,
    pub events: bool,

    pub opacity: f32,

    /// Multiplier on the projected shadow length
    pub shadow_length: f32,

    /// Virtual height of point lights above the floor (px)
    pub light_height: f32,

    pub atlas_width: u32,
    pub atlas_height: u32,
}

/// Throttling thresholds for shadow map regeneration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegenerationConfig {
    /// Camera movement (tiles) that forces a sun shadow rebuild
    pub camera_threshold_tiles: f32,

    /// Sun direction change (radians) that forces a sun shadow rebuild
    pub sun_angle_threshold_radians: f32,
}

/// Top-level configuration for a lighting pipeline instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    pub screen_width: u32,
    pub screen_height: u32,
    pub tile_width: u32,
    pub tile_height: u32,

    pub max_lights: usize,
    pub max_sprites: usize,

    pub obstacle_padding_tiles: i32,
    pub surface_padding_tiles: i32,

    pub ambient_color: [f32; 3],
    pub ambient_intensity: f32,
    pub debug: DebugOverlay,

    pub shadow: ShadowStyleConfig,
    pub sprite: SpriteShadowConfig,
    pub regeneration: RegenerationConfig,
}

impl Default for ShadowStyleConfig {
    fn default() -> Self {
        Self {
            obstacle_detection_mode: ObstacleDetectionMode::Both,
            shadow_map_resolution: 512,
            shadow_softness: 1.5,
            sun_shadow_softness: 1.0,
            sun_shadow_precision: 4.0,
            sun_shadow_strength: 0.6,
            sun_shadow_length: 3.0,
            sun_shadow_falloff: SunShadowFalloff::Linear,
            wall_shadow_enabled: true,
            point_shadow_step_budget: 96,
        }
    }
}

impl Default for SpriteShadowConfig {
    fn default() -> Self {
        Self {
            map_enabled: true,
            player: true,
            followers: true,
            events: false,
            opacity: 0.5,
            shadow_length: 1.0,
            light_height: 48.0,
            atlas_width: 1024,
            atlas_height: 512,
        }
    }
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            camera_threshold_tiles: 0.02,
            sun_angle_threshold_radians: 0.5_f32.to_radians(),
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            screen_width: 816,
            screen_height: 624,
            tile_width: 48,
            tile_height: 48,
            max_lights: crate::constants::limits::MAX_LIGHTS,
            max_sprites: crate::constants::limits::MAX_SPRITES,
            obstacle_padding_tiles: 8,
            surface_padding_tiles: 4,
            ambient_color: [1.0, 1.0, 1.0],
            ambient_intensity: 0.25,
            debug: DebugOverlay::None,
            shadow: ShadowStyleConfig::default(),
            sprite: SpriteShadowConfig::default(),
            regeneration: RegenerationConfig::default(),
        }
    }
}
