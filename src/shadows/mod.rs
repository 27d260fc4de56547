/// Shadows Module - Data-Oriented Programming (DOP) style
///
/// Shadow map generators sampled by the compositor.
///
/// - point_shadow_data.rs / point_shadow_operations.rs: polar map, one row per light
/// - sun_shadow_data.rs / sun_shadow_operations.rs: full-viewport directional map
pub mod point_shadow_data;
pub mod point_shadow_operations;
pub mod sun_shadow_data;
pub mod sun_shadow_operations;

pub use point_shadow_data::{PointShadowMapData, ShadowRayParams};
pub use point_shadow_operations::{
    angle_to_column, clear_point_shadow_map, column_angle, compute_shadow_texel,
    create_point_shadow_map, generate_point_shadow_map, march_shadow_ray, ray_box_entry,
    shadow_lookup_blurred, shadow_lookup_raw, shadow_ray_params,
};

pub use sun_shadow_data::{
    SunShadowCacheKey, SunShadowDecision, SunShadowMapData, SunShadowStyle,
};
pub use sun_shadow_operations::{
    clear_sun_shadow_map, compute_sun_texel, create_sun_shadow_map, falloff_factor,
    generate_sun_shadow_map, march_sun_ray, resize_sun_shadow_map, sample_sun_shadow,
    sun_shadow_decision, sun_shadow_style,
};
