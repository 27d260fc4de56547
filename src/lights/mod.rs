/// Lights Module - Data-Oriented Programming (DOP) style
///
/// - light_data.rs: Light, Sun, LightList, LightSignature
/// - light_operations.rs: Construction, validation, culling, signatures
pub mod light_data;
pub mod light_operations;

pub use light_data::{Light, LightList, LightSignature, Sun};

pub use light_operations::{
    // Construction
    create_point_light,
    create_spotlight,
    create_sun,
    with_inner_radius,

    // Queries
    angular_distance,
    is_cone_limited,
    is_light_enabled,
    is_light_visible,
    is_sun_active,
    sun_direction_vector,
    wrap_angle,

    // Per-frame list
    build_light_list,
    light_signature,
    sanitize_light,
};
