//! Light operations - Pure DOP functions
//!
//! Light construction, invariant checks, per-frame culling and the
//! signature used to decide whether the point shadow map is dirty.

use super::light_data::{Light, LightList, LightSignature, Sun};
use crate::camera::{expand_rect, rect_contains, screen_to_world, viewport_rect, DisplayCamera};
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

// ============================================================================
// CONSTRUCTION
// ============================================================================

pub fn create_point_light(position: Vec2, radius: f32, intensity: f32, color: Vec3) -> Light {
    Light {
        position,
        radius,
        intensity,
        color,
        ..Default::default()
    }
}

pub fn create_spotlight(
    position: Vec2,
    radius: f32,
    intensity: f32,
    color: Vec3,
    direction: f32,
    half_cone: f32,
) -> Light {
    Light {
        position,
        radius,
        intensity,
        color,
        is_spotlight: true,
        direction,
        half_cone,
        inner_radius: 0.0,
    }
}

pub fn with_inner_radius(light: Light, inner_radius: f32) -> Light {
    Light {
        inner_radius,
        ..light
    }
}

pub fn create_sun(direction_degrees: f32, intensity: f32, color: Vec3, elevation: f32) -> Sun {
    Sun {
        enabled: true,
        direction: direction_degrees.to_radians(),
        intensity,
        color,
        elevation,
    }
}

// ============================================================================
// QUERIES
// ============================================================================

/// Disabled lights cast no light and no shadow
pub fn is_light_enabled(light: &Light) -> bool {
    light.intensity > 0.0 && light.radius > 0.0
}

/// A spotlight whose cone covers the full circle behaves as a point light
pub fn is_cone_limited(light: &Light) -> bool {
    light.is_spotlight && light.half_cone < PI
}

pub fn is_sun_active(sun: &Sun) -> bool {
    sun.enabled && sun.intensity > 0.0
}

/// Unit vector pointing towards the sun (screen space, y down)
pub fn sun_direction_vector(sun: &Sun) -> Vec2 {
    Vec2::new(sun.direction.cos(), sun.direction.sin())
}

/// Wrap an angle to [-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Absolute angular distance between two angles, in [0, PI]
pub fn angular_distance(a: f32, b: f32) -> f32 {
    wrap_angle(a - b).abs()
}

// ============================================================================
// VALIDATION
// ============================================================================

/// Enforce `intensity >= 0`, `radius >= 0`, `0 <= inner < radius`
pub fn sanitize_light(light: &Light) -> Light {
    let mut fixed = *light;

    if !(fixed.intensity >= 0.0) {
        log::warn!("[Lights] Negative intensity {} clamped to 0", fixed.intensity);
        fixed.intensity = 0.0;
    }

    if !(fixed.radius >= 0.0) {
        log::warn!("[Lights] Negative radius {} clamped to 0", fixed.radius);
        fixed.radius = 0.0;
    }

    if !(fixed.inner_radius >= 0.0) {
        fixed.inner_radius = 0.0;
    }

    if fixed.radius > 0.0 && fixed.inner_radius >= fixed.radius {
        log::warn!(
            "[Lights] Inner radius {} >= radius {}, ignoring inner radius",
            fixed.inner_radius,
            fixed.radius
        );
        fixed.inner_radius = 0.0;
    }

    fixed.half_cone = fixed.half_cone.clamp(0.0, PI);
    fixed.color = fixed.color.max(Vec3::ZERO);
    fixed
}

// ============================================================================
// PER-FRAME LIST
// ============================================================================

/// Light can illuminate part of the viewport
pub fn is_light_visible(light: &Light, camera: &DisplayCamera) -> bool {
    let bounds = expand_rect(&viewport_rect(camera), light.radius);
    rect_contains(&bounds, light.position)
}

/// Sanitize, cull and cap the frame's lights, preserving input order
pub fn build_light_list(lights: &[Light], camera: &DisplayCamera, max_lights: usize) -> LightList {
    let mut list = LightList::default();

    for light in lights {
        let light = sanitize_light(light);
        if !is_light_visible(&light, camera) {
            list.culled += 1;
            continue;
        }
        if list.lights.len() >= max_lights {
            list.truncated += 1;
            continue;
        }
        list.lights.push(light);
    }

    if list.truncated > 0 {
        log::warn!(
            "[Lights] {} light(s) over the limit of {} were dropped",
            list.truncated,
            max_lights
        );
    }

    list
}

/// Fingerprint of the point shadow map inputs
///
/// Positions are taken in world space so scrolling alone never dirties
/// the map.
pub fn light_signature(
    list: &LightList,
    camera: &DisplayCamera,
    obstacle_revision: u64,
    resolution: u32,
    step_budget: u32,
) -> LightSignature {
    let entries = list
        .lights
        .iter()
        .map(|light| {
            let world = screen_to_world(camera, light.position);
            [
                world.x.to_bits(),
                world.y.to_bits(),
                light.radius.to_bits(),
                light.intensity.to_bits(),
                light.direction.to_bits(),
                light.half_cone.to_bits(),
                light.inner_radius.to_bits(),
                light.is_spotlight as u32,
            ]
        })
        .collect();

    LightSignature {
        entries,
        obstacle_revision,
        resolution,
        step_budget,
    }
}
