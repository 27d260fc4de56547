//! Silhouette Atlas Data - Pure DOP
//!
//! NO METHODS. Just data.
//! Packing happens in silhouette_atlas_operations.rs

use glam::{UVec2, Vec2};
use image::RgbaImage;

/// What kind of character a caster is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasterKind {
    Player,
    Follower { visible: bool },
    Event { sprite_name: String },
}

/// A character that may cast a sprite shadow this frame
#[derive(Debug, Clone)]
pub struct ShadowCaster<'a> {
    pub kind: CasterKind,

    /// Per-character switch; `None` defers to the config
    pub shadow_override: Option<bool>,

    /// Foot anchor (world px, bottom centre of the sprite)
    pub foot: Vec2,

    /// Current animation frame; alpha is the silhouette
    pub frame: &'a RgbaImage,
}

/// UV rectangle within the atlas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtlasUv {
    pub min: Vec2,
    pub max: Vec2,
}

/// One packed silhouette
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilhouetteEntry {
    pub uv: AtlasUv,

    /// Top-left pixel in the atlas
    pub origin: UVec2,

    /// Sprite size (px)
    pub size: UVec2,

    /// Foot anchor (world px)
    pub foot: Vec2,
}

/// Shelf-packed atlas of the frame's shadow-casting sprites
pub struct SilhouetteAtlasData {
    pub width: u32,
    pub height: u32,
    pub padding: u32,
    pub image: RgbaImage,
    pub entries: Vec<SilhouetteEntry>,

    /// Eligible sprites that did not fit last rebuild
    pub dropped: usize,

    pub generation: u64,
}
