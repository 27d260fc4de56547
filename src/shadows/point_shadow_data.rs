//! Point shadow map data - Pure DOP
//!
//! NO METHODS. Just data.
//!
//! Polar shadow map: one row per light, one column per angle. Texel
//! `(a, l)` holds the distance from light `l` to the first obstacle along
//! angle `(a / width) * 2PI - PI`, normalized by the light radius.

use crate::lights::LightSignature;

#[derive(Debug, Clone)]
pub struct PointShadowMapData {
    /// Angular resolution
    pub width: u32,

    /// Row capacity (maximum simultaneous lights)
    pub height: u32,

    /// Row-major, `width * height` texels
    pub texels: Vec<f32>,

    /// Rows holding real light data; the rest stay at NO_SHADOW
    pub active_rows: u32,

    /// Inputs the current texels were generated from
    pub signature: Option<LightSignature>,

    /// Bumped on every regeneration
    pub generation: u64,
}

/// Parameters of a single ray march through the obstacle map
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowRayParams {
    /// March start (px from the light)
    pub start: f32,

    /// March end (px from the light)
    pub radius: f32,

    /// Distance between samples (px)
    pub step: f32,
}
