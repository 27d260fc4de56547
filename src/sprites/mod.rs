/// Sprites Module - Data-Oriented Programming (DOP) style
///
/// Character sprite shadows.
///
/// - silhouette_atlas_data.rs / silhouette_atlas_operations.rs: casters and shelf packing
/// - sprite_shadow_data.rs / sprite_shadow_operations.rs: projected shadow volumes
pub mod silhouette_atlas_data;
pub mod silhouette_atlas_operations;
pub mod sprite_shadow_data;
pub mod sprite_shadow_operations;

pub use silhouette_atlas_data::{
    AtlasUv, CasterKind, ShadowCaster, SilhouetteAtlasData, SilhouetteEntry,
};
pub use silhouette_atlas_operations::{
    casts_shadow, create_silhouette_atlas, rebuild_silhouette_atlas, sample_silhouette,
    transform_uv,
};

pub use sprite_shadow_data::{ProjectorSource, ShadowProjector, SpriteShadowMapData};
pub use sprite_shadow_operations::{
    build_projectors, clear_sprite_shadow_map, create_sprite_shadow_map,
    generate_sprite_shadow_map, line_of_sight_clear, projector_contribution,
    resize_sprite_shadow_map, sample_sprite_shadow, sprite_shadow_at,
};
