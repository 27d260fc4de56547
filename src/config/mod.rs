/// Config Module - Data-Oriented Programming (DOP) style
///
/// - config_data.rs: Pure data structures (serde, TOML-loadable)
/// - config_operations.rs: Validation and loading

pub mod config_data;
pub mod config_operations;

pub use config_data::{
    DebugOverlay, LightingConfig, ObstacleDetectionMode, RegenerationConfig, ShadowStyleConfig,
    SpriteShadowConfig, SunShadowFalloff,
};

pub use config_operations::{
    ambient_rgb, config_to_toml, load_config_from_file, load_config_from_str, validate_config,
};
