//! Texture creation, upload and readback
//!
//! Creation goes through the recovery layer's error scopes. A texture that
//! fails to allocate is replaced by a 1x1 placeholder holding the neutral
//! value for its format (fully lit, no shadow), so later passes always have
//! something valid to bind.

use super::error_recovery::{GpuErrorRecovery, GpuResultExt};
use super::gpu_data::GpuTexture;
use super::resource_guard::GuardedResource;
use crate::error::{LightingError, LightingResult};
use image::RgbaImage;

/// Usage of textures rendered into by a pass
pub const TARGET_USAGE: wgpu::TextureUsages = wgpu::TextureUsages::RENDER_ATTACHMENT
    .union(wgpu::TextureUsages::TEXTURE_BINDING)
    .union(wgpu::TextureUsages::COPY_SRC)
    .union(wgpu::TextureUsages::COPY_DST);

/// Usage of textures filled from host data
pub const INPUT_USAGE: wgpu::TextureUsages =
    wgpu::TextureUsages::TEXTURE_BINDING.union(wgpu::TextureUsages::COPY_DST);

pub fn bytes_per_texel(format: wgpu::TextureFormat) -> u32 {
    match format {
        wgpu::TextureFormat::R8Unorm => 1,
        _ => 4,
    }
}

/// Neutral texel: 1.0 in every channel
pub fn placeholder_texel(format: wgpu::TextureFormat) -> Vec<u8> {
    match format {
        wgpu::TextureFormat::R32Float => bytemuck::bytes_of(&1.0f32).to_vec(),
        wgpu::TextureFormat::R8Unorm => vec![255],
        _ => vec![255; 4],
    }
}

fn build_texture(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> GpuTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

    GpuTexture {
        texture,
        view,
        width,
        height,
        format,
    }
}

/// Overwrite a whole texture with tightly packed texels
pub fn write_texture(queue: &wgpu::Queue, target: &GpuTexture, bytes: &[u8]) {
    queue.write_texture(
        target.texture.as_image_copy(),
        bytes,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(target.width * bytes_per_texel(target.format)),
            rows_per_image: Some(target.height),
        },
        wgpu::Extent3d {
            width: target.width,
            height: target.height,
            depth_or_array_layers: 1,
        },
    );
}

fn placeholder_texture(
    recovery: &GpuErrorRecovery,
    name: &'static str,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> GuardedResource<GpuTexture> {
    let texture = build_texture(
        recovery.device(),
        name,
        1,
        1,
        format,
        usage | wgpu::TextureUsages::COPY_DST,
    );
    write_texture(recovery.queue(), &texture, &placeholder_texel(format));
    GuardedResource::placeholder(name, texture)
}

/// Create a texture, substituting a placeholder when allocation fails
pub fn create_guarded_texture(
    recovery: &GpuErrorRecovery,
    name: &'static str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    usage: wgpu::TextureUsages,
) -> GuardedResource<GpuTexture> {
    let created = recovery.create_scoped(name, |device| {
        build_texture(device, name, width.max(1), height.max(1), format, usage)
    });

    match created {
        Ok(texture) => GuardedResource::new(name, texture),
        Err(e) => {
            log::warn!(
                "[GpuTextures] {} ({}x{} {:?}) unavailable, using placeholder: {}",
                name,
                width,
                height,
                format,
                e
            );
            placeholder_texture(recovery, name, format, usage)
        }
    }
}

/// Upload host texels, recreating the texture when the size changed
///
/// Returns false when the texture is a placeholder and nothing was written.
pub fn upload_texture(
    recovery: &GpuErrorRecovery,
    guard: &mut GuardedResource<GpuTexture>,
    width: u32,
    height: u32,
    bytes: &[u8],
) -> LightingResult<bool> {
    let current = guard.get()?;
    let expected = (width * height * bytes_per_texel(current.format)) as usize;
    if bytes.len() != expected {
        return Err(LightingError::Gpu {
            operation: format!("upload {}", guard.name()),
            error: format!("{} bytes for a {}x{} texture", bytes.len(), width, height),
        });
    }

    if current.width != width || current.height != height {
        let format = current.format;
        let usage = current.texture.usage();
        *guard = create_guarded_texture(recovery, guard.name(), width, height, format, usage);
        log::debug!("[GpuTextures] Resized {} to {}x{}", guard.name(), width, height);
    }

    if guard.is_placeholder() {
        return Ok(false);
    }

    write_texture(recovery.queue(), guard.get()?, bytes);
    Ok(true)
}

/// Copy an RGBA8 texture back to the host
pub fn read_rgba_texture(recovery: &GpuErrorRecovery, source: &GpuTexture) -> LightingResult<RgbaImage> {
    let device = recovery.device();
    let unpadded = source.width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded = unpadded.div_ceil(align) * align;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("lighting_readback"),
        size: padded as u64 * source.height as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("lighting_readback"),
    });
    encoder.copy_texture_to_buffer(
        source.texture.as_image_copy(),
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded),
                rows_per_image: Some(source.height),
            },
        },
        wgpu::Extent3d {
            width: source.width,
            height: source.height,
            depth_or_array_layers: 1,
        },
    );
    recovery.submit_with_recovery(vec![encoder.finish()])?;

    let slice = staging.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    device.poll(wgpu::Maintain::Wait);
    receiver
        .recv()
        .gpu_context("readback channel")?
        .gpu_context("readback map")?;

    let mapped = slice.get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded * source.height) as usize);
    for row in mapped.chunks(padded as usize) {
        pixels.extend_from_slice(&row[..unpadded as usize]);
    }
    drop(mapped);
    staging.unmap();

    RgbaImage::from_raw(source.width, source.height, pixels).ok_or_else(|| LightingError::Gpu {
        operation: "readback".to_string(),
        error: "pixel buffer size mismatch".to_string(),
    })
}
