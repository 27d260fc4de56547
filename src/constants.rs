//! Shared constants for the lighting pipeline
//!
//! Values that the WGSL shaders hard-code as well live here, so the CPU
//! kernels and the GPU passes agree.

/// Capacity limits baked into the uniform layouts
pub mod limits {
    /// Rows in the point shadow map and entries in the light uniform array
    pub const MAX_LIGHTS: usize = 32;

    /// Sprites packed into the silhouette atlas per frame
    pub const MAX_SPRITES: usize = 64;

    /// Entries in the sprite shadow projector uniform array
    pub const MAX_PROJECTORS: usize = 256;

    pub const MIN_SHADOW_MAP_RESOLUTION: u32 = 16;
    pub const MAX_SHADOW_MAP_RESOLUTION: u32 = 4096;

    pub const MAX_ATLAS_DIMENSION: u32 = 4096;
}

/// Point/spot shadow map generation and lookup
pub mod point_shadow {
    /// Texel value for "no obstacle within radius"
    pub const NO_SHADOW: f32 = 1.0;

    /// Texel value for "outside the spotlight cone"
    pub const BLOCKED: f32 = 0.0;

    pub const MIN_STEP_PX: f32 = 2.0;
    pub const MAX_STEPS: u32 = 256;

    /// Raw values below this are treated as outside the cone
    pub const OUTSIDE_CONE_EPSILON: f32 = 0.001;

    /// Symmetric 11-tap kernel, centre tap in the middle
    pub const BLUR_WEIGHTS: [f32; 11] = [
        0.01, 0.05, 0.09, 0.12, 0.15, 0.16, 0.15, 0.12, 0.09, 0.05, 0.01,
    ];

    /// Bias applied to the distance comparison to avoid self-shadowing acne
    pub const DEPTH_BIAS: f32 = 0.002;
}

/// Sun shadow map generation
pub mod sun_shadow {
    pub const MAX_STEPS: u32 = 512;
    pub const MIN_STEP_PX: f32 = 0.5;

    /// A sample at or above this is considered fully lit
    pub const FULLY_LIT: f32 = 0.999;

    /// Below this |sin| the sun counts as horizontal for wall routing
    pub const AXIS_EPSILON: f32 = 0.1;
}

/// Lighting compositor
pub mod compositor {
    /// Fraction of the half-cone used as the soft spotlight edge
    pub const SPOT_EDGE_FRACTION: f32 = 0.2;

    pub const MAX_TOTAL_LIGHT: f32 = 2.0;

    pub const SUN_GRADIENT_MIN: f32 = 0.7;
    pub const SUN_GRADIENT_STRENGTH: f32 = 0.15;

    /// Horizontal smoothing band for the vertical wall cone test (px)
    pub const WALL_CONE_BAND_PX: f32 = 4.0;
}

/// Wall-side column scanning
pub mod walls {
    /// Tiles scanned up/down when looking for a wall column's extent
    pub const SCAN_TILES: i32 = 8;
}

/// Sprite silhouette atlas and sprite shadows
pub mod sprite {
    pub const ATLAS_PADDING: u32 = 2;
    pub const ALPHA_THRESHOLD: f32 = 0.3;
    pub const MIN_SUN_ELEVATION: f32 = 0.1;

    /// Widening of a point-light sprite shadow at its far end
    pub const POINT_LIGHT_CONE_SPREAD: f32 = 0.5;

    pub const MAX_STRETCH: f32 = 8.0;
}

/// Tileset autotile id ranges
pub mod tiles {
    pub const LAYERS: usize = 4;

    pub const TILE_ID_A1: u32 = 2048;
    pub const TILE_ID_A2: u32 = 2816;
    pub const TILE_ID_A3: u32 = 4352;
    pub const TILE_ID_A4: u32 = 5888;
    pub const TILE_ID_MAX: u32 = 8192;

    /// Tile ids per autotile kind
    pub const AUTOTILE_SHAPES: u32 = 48;
}
