//! Sun shadow map data - Pure DOP
//!
//! NO METHODS. Just data.

use crate::config::SunShadowFalloff;
use glam::Vec2;

/// Full-viewport shadow factors for floor pixels (0 = shadowed, 1 = lit)
#[derive(Debug, Clone)]
pub struct SunShadowMapData {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<f32>,

    /// Inputs of the last generation
    pub cache: Option<SunShadowCacheKey>,

    pub generation: u64,
}

/// Shadow style settings that shape the sun shadow map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunShadowStyle {
    pub strength: f32,

    /// Tiles
    pub length: f32,

    /// Steps per tile
    pub precision: f32,

    /// Perpendicular ray offset (px)
    pub softness: f32,

    pub falloff: SunShadowFalloff,
}

/// What the cached sun shadow map was generated from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SunShadowCacheKey {
    pub display: Vec2,
    pub direction: f32,
    pub style: SunShadowStyle,
    pub obstacle_revision: u64,
    pub surface_revision: u64,
}

/// Why the sun shadow map was or was not regenerated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SunShadowDecision {
    /// Nothing relevant changed
    Reuse,
    /// Sun disabled; the map is left untouched
    SunInactive,
    FirstGeneration,
    CameraMoved,
    DirectionChanged,
    StyleChanged,
    MapsChanged,
}
