//! Error handling for Hearth Lighting 2D
//!
//! Almost every failure inside the lighting pipeline is recovered locally
//! (placeholder textures, skipped passes, dropped sprites). The variants
//! below are what still crosses the public API: configuration problems and
//! lifecycle misuse, plus the recoverable conditions that are reported
//! through `FrameReport` and the log.

use thiserror::Error;

/// Main error type for the lighting pipeline
#[derive(Debug, Error)]
pub enum LightingError {
    #[error("Invalid config: {field} = {value} ({reason})")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Config parse error in {context}: {error}")]
    ConfigParse { context: String, error: String },

    #[error("IO error for {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to create {resource}: {error}")]
    ResourceCreation { resource: String, error: String },

    #[error("Stale resource '{resource}' accessed after teardown")]
    StaleResource { resource: String },

    #[error("Silhouette atlas full: {dropped} sprite(s) dropped")]
    AtlasOverflow { dropped: usize },

    #[error("Surface map not initialized")]
    SurfaceNotInitialized,

    #[error("Pipeline state error: expected {expected}, actual {actual}")]
    StateError { expected: String, actual: String },

    #[error("GPU operation '{operation}' failed: {error}")]
    Gpu { operation: String, error: String },
}

/// Type alias for Results in the lighting pipeline
pub type LightingResult<T> = Result<T, LightingError>;

impl From<std::io::Error> for LightingError {
    fn from(error: std::io::Error) -> Self {
        LightingError::Io {
            path: String::new(),
            error: error.to_string(),
        }
    }
}

impl From<toml::de::Error> for LightingError {
    fn from(error: toml::de::Error) -> Self {
        LightingError::ConfigParse {
            context: "toml".to_string(),
            error: error.to_string(),
        }
    }
}

/// Attach context to foreign errors while converting them
pub trait ErrorContext<T> {
    fn context(self, context: &str) -> LightingResult<T>;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, context: &str) -> LightingResult<T> {
        self.map_err(|e| LightingError::Gpu {
            operation: context.to_string(),
            error: e.to_string(),
        })
    }
}

/// Convert a missing value into a state error
pub trait OptionExt<T> {
    fn ok_or_state(self, expected: &str, actual: &str) -> LightingResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_state(self, expected: &str, actual: &str) -> LightingResult<T> {
        self.ok_or_else(|| LightingError::StateError {
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_message() {
        let err = LightingError::InvalidConfig {
            field: "tile_width".to_string(),
            value: "0".to_string(),
            reason: "must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid config: tile_width = 0 (must be positive)"
        );
    }

    #[test]
    fn test_option_ext() {
        let missing: Option<u32> = None;
        let err = missing.ok_or_state("ready", "uninitialized").unwrap_err();
        assert!(matches!(err, LightingError::StateError { .. }));
        assert_eq!(Some(3).ok_or_state("ready", "ready").unwrap(), 3);
    }

    #[test]
    fn test_error_context() {
        let result: Result<(), String> = Err("boom".to_string());
        let err = result.context("upload obstacle map").unwrap_err();
        assert_eq!(
            err.to_string(),
            "GPU operation 'upload obstacle map' failed: boom"
        );
    }
}
