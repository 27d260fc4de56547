//! Light data - Pure DOP
//!
//! NO METHODS. Just data.
//! Construction, validation and culling happen in light_operations.rs

use glam::{Vec2, Vec3};
use std::f32::consts::PI;

/// Point or spot light
///
/// `position` is in screen pixels for the current frame. A `half_cone` of
/// PI covers the full circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec2,

    /// Hard cutoff distance (px)
    pub radius: f32,

    pub intensity: f32,

    /// Linear RGB, 0-1
    pub color: Vec3,

    pub is_spotlight: bool,

    /// Direction the cone points (radians, 0 = right, PI/2 = down)
    pub direction: f32,

    pub half_cone: f32,

    /// No illumination closer than this (px)
    pub inner_radius: f32,
}

/// Global directional light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sun {
    pub enabled: bool,

    /// Compass direction towards the sun (radians, 0 = right, PI/2 = down)
    pub direction: f32,

    pub intensity: f32,
    pub color: Vec3,

    /// Height of the sun above the horizon, 0-1
    pub elevation: f32,
}

/// Lights surviving culling for one frame, in shadow-map row order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LightList {
    pub lights: Vec<Light>,

    /// Lights dropped because `max_lights` was exceeded
    pub truncated: usize,

    /// Lights dropped because they cannot reach the viewport
    pub culled: usize,
}

/// Fingerprint of everything the point shadow map depends on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightSignature {
    /// Per light: world x, world y, radius, intensity, direction, half cone,
    /// inner radius, spotlight flag (f32 bit patterns)
    pub entries: Vec<[u32; 8]>,
    pub obstacle_revision: u64,
    pub resolution: u32,
    pub step_budget: u32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            radius: 0.0,
            intensity: 0.0,
            color: Vec3::ONE,
            is_spotlight: false,
            direction: 0.0,
            half_cone: PI,
            inner_radius: 0.0,
        }
    }
}

impl Default for Sun {
    fn default() -> Self {
        Self {
            enabled: false,
            direction: PI * 0.75,
            intensity: 0.0,
            color: Vec3::ONE,
            elevation: 0.5,
        }
    }
}
