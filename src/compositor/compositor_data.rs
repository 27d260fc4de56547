//! Compositor data - Pure DOP
//!
//! NO METHODS. Just data.

use crate::camera::DisplayCamera;
use crate::config::LightingConfig;
use crate::lights::{LightList, Sun};
use crate::shadows::{PointShadowMapData, SunShadowMapData};
use crate::sprites::SpriteShadowMapData;
use crate::tiles::{ObstacleMapData, SurfaceMapData};
use glam::Vec3;

/// Read-only view of everything the compositor samples for one frame
///
/// `lights` must be the same list the point shadow map was generated
/// from; its order is the shadow map row order.
#[derive(Clone, Copy)]
pub struct CompositorInputs<'a> {
    pub config: &'a LightingConfig,
    pub camera: &'a DisplayCamera,
    pub lights: &'a LightList,
    pub sun: &'a Sun,
    pub obstacle: &'a ObstacleMapData,
    pub surface: &'a SurfaceMapData,
    pub point_shadow: &'a PointShadowMapData,
    pub sun_shadow: &'a SunShadowMapData,
    pub sprite_shadow: &'a SpriteShadowMapData,
}

/// Lighting terms at one pixel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightingSample {
    pub ambient: Vec3,
    pub sun: Vec3,
    pub lights: Vec3,

    /// Sprite shadow multiplier applied to `sun + lights`
    pub sprite_brightness: f32,

    /// Clamped final multiplier before the gamma approximation
    pub total: Vec3,
}
