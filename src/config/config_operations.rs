//! Lighting configuration operations - Pure DOP functions
//!
//! Loading, validation and derived values. No methods, just transformations.

use super::config_data::LightingConfig;
use crate::constants::limits;
use crate::error::{LightingError, LightingResult};
use std::path::Path;

fn invalid(field: &str, value: impl ToString, reason: &str) -> LightingError {
    LightingError::InvalidConfig {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Validate configuration parameters
pub fn validate_config(config: &LightingConfig) -> LightingResult<()> {
    if config.screen_width == 0 || config.screen_height == 0 {
        return Err(invalid(
            "screen_size",
            format!("{}x{}", config.screen_width, config.screen_height),
            "screen dimensions must be positive",
        ));
    }

    if config.tile_width == 0 || config.tile_height == 0 {
        return Err(invalid(
            "tile_size",
            format!("{}x{}", config.tile_width, config.tile_height),
            "tile dimensions must be positive",
        ));
    }

    if config.max_lights == 0 || config.max_lights > limits::MAX_LIGHTS {
        return Err(invalid(
            "max_lights",
            config.max_lights,
            "must be between 1 and MAX_LIGHTS (32)",
        ));
    }

    if config.max_sprites > limits::MAX_SPRITES {
        return Err(invalid(
            "max_sprites",
            config.max_sprites,
            "exceeds MAX_SPRITES (64)",
        ));
    }

    if config.obstacle_padding_tiles < 0 || config.surface_padding_tiles < 0 {
        return Err(invalid(
            "padding_tiles",
            format!(
                "{}/{}",
                config.obstacle_padding_tiles, config.surface_padding_tiles
            ),
            "padding cannot be negative",
        ));
    }

    if config.ambient_intensity < 0.0 {
        return Err(invalid(
            "ambient_intensity",
            config.ambient_intensity,
            "cannot be negative",
        ));
    }

    let shadow = &config.shadow;
    if shadow.shadow_map_resolution < limits::MIN_SHADOW_MAP_RESOLUTION
        || shadow.shadow_map_resolution > limits::MAX_SHADOW_MAP_RESOLUTION
    {
        return Err(invalid(
            "shadow.shadow_map_resolution",
            shadow.shadow_map_resolution,
            "must be within [16, 4096]",
        ));
    }

    if !(0.0..=1.0).contains(&shadow.sun_shadow_strength) {
        return Err(invalid(
            "shadow.sun_shadow_strength",
            shadow.sun_shadow_strength,
            "must be within [0, 1]",
        ));
    }

    if shadow.sun_shadow_length <= 0.0 {
        return Err(invalid(
            "shadow.sun_shadow_length",
            shadow.sun_shadow_length,
            "must be positive",
        ));
    }

    if shadow.sun_shadow_precision <= 0.0 {
        return Err(invalid(
            "shadow.sun_shadow_precision",
            shadow.sun_shadow_precision,
            "must be positive",
        ));
    }

    if shadow.point_shadow_step_budget == 0 {
        return Err(invalid(
            "shadow.point_shadow_step_budget",
            0,
            "must be positive",
        ));
    }

    if shadow.shadow_softness < 0.0 || shadow.sun_shadow_softness < 0.0 {
        return Err(invalid(
            "shadow.softness",
            format!("{}/{}", shadow.shadow_softness, shadow.sun_shadow_softness),
            "cannot be negative",
        ));
    }

    let sprite = &config.sprite;
    if !(0.0..=1.0).contains(&sprite.opacity) {
        return Err(invalid(
            "sprite.opacity",
            sprite.opacity,
            "must be within [0, 1]",
        ));
    }

    if sprite.light_height <= 0.0 {
        return Err(invalid(
            "sprite.light_height",
            sprite.light_height,
            "must be positive",
        ));
    }

    if sprite.atlas_width == 0
        || sprite.atlas_height == 0
        || sprite.atlas_width > limits::MAX_ATLAS_DIMENSION
        || sprite.atlas_height > limits::MAX_ATLAS_DIMENSION
    {
        return Err(invalid(
            "sprite.atlas_size",
            format!("{}x{}", sprite.atlas_width, sprite.atlas_height),
            "atlas dimensions must be within [1, 4096]",
        ));
    }

    log::info!(
        "[LightingConfig] Validated: screen={}x{}, tile={}x{}, max_lights={}, shadow_res={}, detection={:?}",
        config.screen_width,
        config.screen_height,
        config.tile_width,
        config.tile_height,
        config.max_lights,
        shadow.shadow_map_resolution,
        shadow.obstacle_detection_mode
    );

    Ok(())
}

/// Parse and validate a configuration from TOML text
pub fn load_config_from_str(text: &str) -> LightingResult<LightingConfig> {
    let config: LightingConfig = toml::from_str(text)?;
    validate_config(&config)?;
    Ok(config)
}

/// Read, parse and validate a configuration file
pub fn load_config_from_file(path: impl AsRef<Path>) -> LightingResult<LightingConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| LightingError::Io {
        path: path.display().to_string(),
        error: e.to_string(),
    })?;

    load_config_from_str(&text).map_err(|e| match e {
        LightingError::ConfigParse { error, .. } => LightingError::ConfigParse {
            context: path.display().to_string(),
            error,
        },
        other => other,
    })
}

/// Serialize a configuration back to TOML
pub fn config_to_toml(config: &LightingConfig) -> LightingResult<String> {
    toml::to_string_pretty(config).map_err(|e| LightingError::ConfigParse {
        context: "serialize".to_string(),
        error: e.to_string(),
    })
}

/// Ambient term as linear RGB
pub fn ambient_rgb(config: &LightingConfig) -> glam::Vec3 {
    glam::Vec3::from(config.ambient_color) * config.ambient_intensity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_data::{ObstacleDetectionMode, SunShadowFalloff};
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&LightingConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_zero_tile_size() {
        let config = LightingConfig {
            tile_width: 0,
            ..Default::default()
        };
        assert!(matches!(
            validate_config(&config),
            Err(LightingError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_rejects_too_many_lights() {
        let config = LightingConfig {
            max_lights: limits::MAX_LIGHTS + 1,
            ..Default::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_rejects_strength_out_of_range() {
        let mut config = LightingConfig::default();
        config.shadow.sun_shadow_strength = 1.5;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let text = r#"
            tile_width = 32
            tile_height = 32

            [shadow]
            obstacle_detection_mode = "regions"
            sun_shadow_falloff = "smooth"
        "#;
        let config = load_config_from_str(text).unwrap();
        assert_eq!(config.tile_width, 32);
        assert_eq!(
            config.shadow.obstacle_detection_mode,
            ObstacleDetectionMode::Regions
        );
        assert_eq!(config.shadow.sun_shadow_falloff, SunShadowFalloff::Smooth);
        assert_eq!(config.shadow.shadow_map_resolution, 512);
        assert_eq!(config.screen_width, 816);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = load_config_from_str("tile_width = \"wide\"").unwrap_err();
        assert!(matches!(err, LightingError::ConfigParse { .. }));
    }

    #[test]
    fn test_load_from_file_round_trip() {
        let mut config = LightingConfig::default();
        config.ambient_intensity = 0.4;
        config.shadow.wall_shadow_enabled = false;
        let text = config_to_toml(&config).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();

        let loaded = load_config_from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config_from_file("/nonexistent/lighting.toml").unwrap_err();
        assert!(matches!(err, LightingError::Io { .. }));
    }
}
