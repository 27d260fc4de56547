//! WGSL sources and source-level validation
//!
//! Each pass shader is the shared `common.wgsl` prelude followed by the
//! pass body. Entry points are checked before pipeline creation so a bad
//! edit fails with a readable message instead of a wgpu panic.

use super::error_recovery::GpuRecoveryError;

pub const POINT_SHADOW_SHADER: &str = concat!(
    include_str!("../shaders/lighting/common.wgsl"),
    include_str!("../shaders/lighting/point_shadow.wgsl"),
);

pub const SUN_SHADOW_SHADER: &str = concat!(
    include_str!("../shaders/lighting/common.wgsl"),
    include_str!("../shaders/lighting/sun_shadow.wgsl"),
);

pub const SPRITE_SHADOW_SHADER: &str = concat!(
    include_str!("../shaders/lighting/common.wgsl"),
    include_str!("../shaders/lighting/sprite_shadow.wgsl"),
);

pub const COMPOSITE_SHADER: &str = concat!(
    include_str!("../shaders/lighting/common.wgsl"),
    include_str!("../shaders/lighting/composite.wgsl"),
);

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn annotation(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "@vertex",
            ShaderStage::Fragment => "@fragment",
        }
    }
}

/// Check that `entry_point` exists and carries the stage annotation
pub fn validate_entry_point(
    source: &str,
    entry_point: &str,
    stage: ShaderStage,
) -> Result<(), GpuRecoveryError> {
    let fn_pattern = format!("fn {}(", entry_point);
    let lines: Vec<&str> = source.lines().collect();

    let Some(index) = lines.iter().position(|line| line.contains(&fn_pattern)) else {
        return Err(GpuRecoveryError::ShaderValidation {
            message: format!(
                "Entry point '{}' not found. Available functions: {}",
                entry_point,
                extract_function_names(source).join(", ")
            ),
        });
    };

    // The annotation may sit on the same line or on the lines just above
    let mut annotated = lines[index].contains(stage.annotation());
    for line in lines[..index].iter().rev() {
        if annotated {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if line.contains(stage.annotation()) {
            annotated = true;
        }
        if !line.starts_with('@') {
            break;
        }
    }

    if !annotated {
        return Err(GpuRecoveryError::ShaderValidation {
            message: format!(
                "Entry point '{}' is missing its {} annotation",
                entry_point,
                stage.annotation()
            ),
        });
    }

    log::debug!("[ShaderValidation] Entry point '{}' ok", entry_point);
    Ok(())
}

/// Function names declared in a WGSL source
pub fn extract_function_names(source: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("fn ")?;
            let name = rest[..rest.find('(')?].trim();
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

/// Validate both entry points of a full-screen pass shader
pub fn validate_pass_shader(label: &str, source: &str) -> Result<(), GpuRecoveryError> {
    validate_entry_point(source, VERTEX_ENTRY, ShaderStage::Vertex)
        .and_then(|_| validate_entry_point(source, FRAGMENT_ENTRY, ShaderStage::Fragment))
        .map_err(|e| GpuRecoveryError::ShaderValidation {
            message: format!("{}: {}", label, e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pass_shader_has_entry_points() {
        for (label, source) in [
            ("point_shadow", POINT_SHADOW_SHADER),
            ("sun_shadow", SUN_SHADOW_SHADER),
            ("sprite_shadow", SPRITE_SHADOW_SHADER),
            ("composite", COMPOSITE_SHADER),
        ] {
            validate_pass_shader(label, source).unwrap();
        }
    }

    #[test]
    fn test_missing_entry_point_lists_functions() {
        let source = "fn helper(x: f32) -> f32 { return x; }\n";
        let err = validate_entry_point(source, "fs_main", ShaderStage::Fragment).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("fs_main"));
        assert!(message.contains("helper"));
    }

    #[test]
    fn test_missing_annotation() {
        let source = "// lit\nfn fs_main() -> f32 { return 1.0; }\n";
        assert!(validate_entry_point(source, "fs_main", ShaderStage::Fragment).is_err());

        let annotated = "@fragment\n// lit\nfn fs_main() -> f32 { return 1.0; }\n";
        assert!(validate_entry_point(annotated, "fs_main", ShaderStage::Fragment).is_ok());

        let wrong_stage = "@vertex\nfn fs_main() -> f32 { return 1.0; }\n";
        assert!(validate_entry_point(wrong_stage, "fs_main", ShaderStage::Fragment).is_err());
    }

    #[test]
    fn test_extract_function_names() {
        let names = extract_function_names("fn a(x: f32) {}\n  fn b_c() {}\nlet fn_x = 1;\n");
        assert_eq!(names, vec!["a".to_string(), "b_c".to_string()]);
    }
}
