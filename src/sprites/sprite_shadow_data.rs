//! Sprite shadow data - Pure DOP
//!
//! NO METHODS. Just data.

use glam::Vec2;

/// Full-viewport brightness multiplier from character shadows (1 = unshadowed)
#[derive(Debug, Clone)]
pub struct SpriteShadowMapData {
    pub width: u32,
    pub height: u32,
    pub texels: Vec<f32>,
    pub generation: u64,
}

/// What projects a sprite shadow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectorSource {
    /// Index into the frame's light list
    Light(usize),
    Sun,
}

/// One (light, sprite) or (sun, sprite) shadow volume, resolved once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowProjector {
    pub source: ProjectorSource,

    /// Index into the silhouette atlas entries
    pub entry: usize,

    /// Foot anchor (world px)
    pub foot: Vec2,

    /// Unit direction the shadow extends in
    pub direction: Vec2,

    /// Shadow length (px)
    pub length: f32,

    /// Half sprite width at the foot (px)
    pub half_width: f32,

    /// Widening at the far end, as a fraction of the width
    pub spread: f32,

    /// Peak contribution (falloff and opacity folded in)
    pub strength: f32,
}
