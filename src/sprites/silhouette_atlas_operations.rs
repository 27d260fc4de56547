//! Silhouette Atlas Operations - Pure DOP Functions
//!
//! Rebuilt every frame from the set of shadow-casting characters.

use super::silhouette_atlas_data::{
    AtlasUv, CasterKind, ShadowCaster, SilhouetteAtlasData, SilhouetteEntry,
};
use crate::config::SpriteShadowConfig;
use crate::constants::limits::MAX_ATLAS_DIMENSION;
use crate::constants::sprite::ATLAS_PADDING;
use glam::{UVec2, Vec2};
use image::{imageops, Rgba, RgbaImage};

/// Create an empty atlas
pub fn create_silhouette_atlas(width: u32, height: u32) -> SilhouetteAtlasData {
    let width = width.clamp(1, MAX_ATLAS_DIMENSION);
    let height = height.clamp(1, MAX_ATLAS_DIMENSION);

    SilhouetteAtlasData {
        width,
        height,
        padding: ATLAS_PADDING,
        image: RgbaImage::new(width, height),
        entries: Vec::new(),
        dropped: 0,
        generation: 0,
    }
}

/// Whether a character casts a sprite shadow this frame
pub fn casts_shadow(caster: &ShadowCaster<'_>, config: &SpriteShadowConfig) -> bool {
    if !config.map_enabled {
        return false;
    }

    if let Some(allowed) = caster.shadow_override {
        return allowed;
    }

    match &caster.kind {
        CasterKind::Player => config.player,
        CasterKind::Follower { visible } => *visible && config.followers,
        CasterKind::Event { sprite_name } => !sprite_name.is_empty() && config.events,
    }
}

/// Transform a sprite-local UV (0-1) to atlas UV
pub fn transform_uv(uv: &AtlasUv, local: Vec2) -> Vec2 {
    uv.min + (uv.max - uv.min) * local
}

/// Repack the atlas from this frame's casters
///
/// Sprites advance along a shelf by width plus padding and wrap to a new
/// shelf at the atlas edge. Once the atlas height is exceeded the remaining
/// sprites are dropped. Returns the number of packed entries.
pub fn rebuild_silhouette_atlas(
    atlas: &mut SilhouetteAtlasData,
    casters: &[ShadowCaster<'_>],
    config: &SpriteShadowConfig,
    max_sprites: usize,
) -> usize {
    atlas.entries.clear();
    atlas.dropped = 0;
    for pixel in atlas.image.pixels_mut() {
        *pixel = Rgba([0, 0, 0, 0]);
    }

    let eligible: Vec<&ShadowCaster<'_>> = casters
        .iter()
        .filter(|caster| casts_shadow(caster, config))
        .filter(|caster| caster.frame.width() > 0 && caster.frame.height() > 0)
        .collect();

    let mut x = 0u32;
    let mut y = 0u32;
    let mut shelf_height = 0u32;

    for (index, caster) in eligible.iter().enumerate() {
        let width = caster.frame.width();
        let height = caster.frame.height();

        if atlas.entries.len() >= max_sprites {
            atlas.dropped = eligible.len() - index;
            break;
        }

        if x > 0 && x + width > atlas.width {
            x = 0;
            y += shelf_height + atlas.padding;
            shelf_height = 0;
        }

        if x + width > atlas.width || y + height > atlas.height {
            atlas.dropped = eligible.len() - index;
            break;
        }

        imageops::replace(&mut atlas.image, caster.frame, x as i64, y as i64);

        let atlas_size = Vec2::new(atlas.width as f32, atlas.height as f32);
        atlas.entries.push(SilhouetteEntry {
            uv: AtlasUv {
                min: Vec2::new(x as f32, y as f32) / atlas_size,
                max: Vec2::new((x + width) as f32, (y + height) as f32) / atlas_size,
            },
            origin: UVec2::new(x, y),
            size: UVec2::new(width, height),
            foot: caster.foot,
        });

        x += width + atlas.padding;
        shelf_height = shelf_height.max(height);
    }

    if atlas.dropped > 0 {
        log::warn!(
            "[SilhouetteAtlas] Atlas {}x{} full, {} sprite shadow(s) dropped",
            atlas.width,
            atlas.height,
            atlas.dropped
        );
    }

    atlas.generation += 1;
    atlas.entries.len()
}

/// Silhouette alpha (0-1) at a sprite-local UV; nearest texel
pub fn sample_silhouette(atlas: &SilhouetteAtlasData, entry: &SilhouetteEntry, local: Vec2) -> f32 {
    if !(0.0..=1.0).contains(&local.x) || !(0.0..=1.0).contains(&local.y) {
        return 0.0;
    }
    let size = entry.size.as_vec2();
    let px = ((local.x * size.x) as u32).min(entry.size.x.saturating_sub(1));
    let py = ((local.y * size.y) as u32).min(entry.size.y.saturating_sub(1));
    let pixel = atlas.image.get_pixel(entry.origin.x + px, entry.origin.y + py);
    pixel[3] as f32 / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_pixel(width, height, Rgba([10, 20, 30, 255]))
    }

    fn player(frame: &RgbaImage) -> ShadowCaster<'_> {
        ShadowCaster {
            kind: CasterKind::Player,
            shadow_override: None,
            foot: Vec2::new(100.0, 200.0),
            frame,
        }
    }

    #[test]
    fn test_eligibility_rules() {
        let frame = solid(4, 4);
        let mut config = SpriteShadowConfig::default();
        config.events = false;

        assert!(casts_shadow(&player(&frame), &config));

        let hidden = ShadowCaster {
            kind: CasterKind::Follower { visible: false },
            ..player(&frame)
        };
        assert!(!casts_shadow(&hidden, &config));

        let event = ShadowCaster {
            kind: CasterKind::Event {
                sprite_name: "Lamp".to_string(),
            },
            ..player(&frame)
        };
        assert!(!casts_shadow(&event, &config));

        let forced = ShadowCaster {
            shadow_override: Some(true),
            ..event.clone()
        };
        assert!(casts_shadow(&forced, &config));

        let blank = ShadowCaster {
            kind: CasterKind::Event {
                sprite_name: String::new(),
            },
            ..player(&frame)
        };
        config.events = true;
        assert!(!casts_shadow(&blank, &config));

        config.map_enabled = false;
        assert!(!casts_shadow(&forced, &config));
    }

    #[test]
    fn test_shelf_packing_wraps_and_pads() {
        let frame = solid(30, 40);
        let casters: Vec<_> = (0..3).map(|_| player(&frame)).collect();
        let mut atlas = create_silhouette_atlas(64, 128);

        let packed = rebuild_silhouette_atlas(&mut atlas, &casters, &SpriteShadowConfig::default(), 16);
        assert_eq!(packed, 3);
        assert_eq!(atlas.entries[0].origin, UVec2::new(0, 0));
        assert_eq!(atlas.entries[1].origin, UVec2::new(32, 0));
        // 64 + 30 > 64: wraps below the first shelf plus padding
        assert_eq!(atlas.entries[2].origin, UVec2::new(0, 42));
        assert_eq!(atlas.dropped, 0);
    }

    #[test]
    fn test_overflow_drops_remaining() {
        let frame = solid(30, 40);
        let casters: Vec<_> = (0..6).map(|_| player(&frame)).collect();
        let mut atlas = create_silhouette_atlas(64, 90);

        let packed = rebuild_silhouette_atlas(&mut atlas, &casters, &SpriteShadowConfig::default(), 16);
        // Two shelves of two fit (rows at y = 0 and y = 42)
        assert_eq!(packed, 4);
        assert_eq!(atlas.dropped, 2);
    }

    #[test]
    fn test_sample_reads_alpha() {
        let mut frame = RgbaImage::new(4, 4);
        frame.put_pixel(1, 2, Rgba([0, 0, 0, 255]));
        let casters = [player(&frame)];
        let mut atlas = create_silhouette_atlas(16, 16);
        rebuild_silhouette_atlas(&mut atlas, &casters, &SpriteShadowConfig::default(), 4);

        let entry = atlas.entries[0];
        assert_eq!(sample_silhouette(&atlas, &entry, Vec2::new(0.3, 0.6)), 1.0);
        assert_eq!(sample_silhouette(&atlas, &entry, Vec2::new(0.9, 0.1)), 0.0);
        assert_eq!(sample_silhouette(&atlas, &entry, Vec2::new(1.5, 0.1)), 0.0);
    }
}
