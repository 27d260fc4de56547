//! Render one lit frame to PNG
//!
//! Lights a flat grey scene containing a wall block, a pillar and a player
//! sprite with two lamps and a low sun. The CPU pipeline always runs; the
//! GPU pipeline runs too when an adapter is available.
//!
//! Usage: cargo run --example headless_frame [output.png]

use anyhow::{Context, Result};
use glam::{IVec2, Vec2, Vec3};
use hearth_lighting2d::tiles::{fill_region, make_autotile_id, set_tile};
use hearth_lighting2d::{
    composite_pipeline, create_grid_source, create_lighting_pipeline, create_point_light,
    create_spotlight, create_sun, default_classifier, initialize_pipeline, teardown_pipeline,
    update_pipeline, CasterKind, DisplayCamera, FrameContext, GpuLightingPipeline,
    GridTileSource, LightingConfig, ShadowCaster, SurfaceDescriptor,
};
use image::{Rgba, RgbaImage};
use std::sync::Arc;

const WIDTH: u32 = 480;
const HEIGHT: u32 = 320;

fn build_level() -> GridTileSource {
    let mut grid = create_grid_source(20, 14);

    // Solid block in the middle of the floor
    fill_region(&mut grid, IVec2::new(6, 4), IVec2::new(8, 6), 1);
    fill_region(&mut grid, IVec2::new(14, 7), IVec2::new(15, 8), 1);

    // A4 wall: cap row (kind 80) over two rows of face (kind 88)
    for x in 2..12 {
        set_tile(&mut grid, x, 0, 0, make_autotile_id(80, 0));
        set_tile(&mut grid, x, 1, 0, make_autotile_id(88, 0));
        set_tile(&mut grid, x, 2, 0, make_autotile_id(88, 0));
    }

    grid
}

fn main() -> Result<()> {
    env_logger::init();

    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "lit_frame.png".to_string());

    let config = LightingConfig {
        tile_width: 32,
        tile_height: 32,
        ambient_intensity: 0.15,
        ..Default::default()
    };

    let grid = build_level();
    let lights = [
        create_point_light(Vec2::new(150.0, 200.0), 180.0, 1.0, Vec3::new(1.0, 0.8, 0.5)),
        create_spotlight(
            Vec2::new(380.0, 120.0),
            240.0,
            1.2,
            Vec3::new(0.6, 0.8, 1.0),
            135_f32.to_radians(),
            30_f32.to_radians(),
        ),
    ];
    let sun = create_sun(225.0, 0.5, Vec3::new(1.0, 0.95, 0.85), 0.4);

    let sprite = RgbaImage::from_fn(16, 32, |x, y| {
        let head = (6..10).contains(&x) && (2..8).contains(&y);
        let body = (4..12).contains(&x) && (8..30).contains(&y);
        let inside = head || body;
        Rgba([40, 40, 60, if inside { 255 } else { 0 }])
    });
    let casters = [ShadowCaster {
        kind: CasterKind::Player,
        shadow_override: None,
        foot: Vec2::new(250.0, 240.0),
        frame: &sprite,
    }];

    let ctx = FrameContext {
        camera: DisplayCamera {
            display: Vec2::ZERO,
            tile_size: Vec2::splat(32.0),
            screen_size: Vec2::new(WIDTH as f32, HEIGHT as f32),
        },
        lights: &lights,
        sun,
        tiles: &grid,
        casters: &casters,
    };
    let surface = SurfaceDescriptor {
        width: WIDTH,
        height: HEIGHT,
    };
    let scene = RgbaImage::from_pixel(WIDTH, HEIGHT, Rgba([180, 180, 180, 255]));

    // CPU
    let mut pipeline = create_lighting_pipeline(config.clone(), default_classifier())?;
    initialize_pipeline(&mut pipeline, surface)?;
    let report = update_pipeline(&mut pipeline, &ctx)?;
    println!("CPU frame: {:?}", report);

    let lit = composite_pipeline(&pipeline, &scene)?;
    lit.save(&output)
        .with_context(|| format!("writing {}", output))?;
    println!("Wrote {}", output);
    teardown_pipeline(&mut pipeline);

    // GPU
    match pollster::block_on(request_device()) {
        Some((device, queue)) => {
            let mut gpu = GpuLightingPipeline::new(device, queue, config, default_classifier())?;
            gpu.initialize(surface)?;
            let report = gpu.update(&ctx)?;
            println!("GPU frame: {:?}", report);

            let gpu_output = format!("gpu_{}", output);
            gpu.render_composite(&scene)?
                .save(&gpu_output)
                .with_context(|| format!("writing {}", gpu_output))?;
            println!("Wrote {}", gpu_output);
            gpu.teardown();
        }
        None => println!("No GPU adapter available, skipping the GPU frame"),
    }

    Ok(())
}

async fn request_device() -> Option<(Arc<wgpu::Device>, Arc<wgpu::Queue>)> {
    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends: wgpu::Backends::all(),
        ..Default::default()
    });

    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        })
        .await?;

    let (device, queue) = adapter
        .request_device(
            &wgpu::DeviceDescriptor {
                label: Some("headless_frame"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
            },
            None,
        )
        .await
        .ok()?;

    Some((Arc::new(device), Arc::new(queue)))
}
