//! Numeric codes accepted at the scripting boundary.
//!
//! A control layer that only speaks integers passes enum values and bitmasks
//! using the WebGPU C header numbering (`webgpu.h`). These functions turn them
//! into typed wgpu values. Bitmask bit positions are identical in both, so
//! masks are converted directly and unknown bits are dropped.
//!
//! Decoding happens at the boundary. Entry points such as
//! [`Gpu::create_buffer`](crate::Gpu::create_buffer),
//! [`create_texture`](crate::Gpu::create_texture),
//! [`create_sampler`](crate::Gpu::create_sampler) and
//! [`set_index_buffer`](crate::Gpu::set_index_buffer) take typed values, so
//! the caller runs each code through the matching function here first. The
//! flat pipeline shapes are the exception: their parameter lists carry codes
//! and decode them internally.

use crate::error::{GpuError, Result};

fn unknown(kind: &'static str, code: u32) -> GpuError {
    GpuError::UnknownCode { kind, code }
}

// ── bitmasks ──────────────────────────────────────────────────────────────

pub fn buffer_usages(bits: u32) -> wgpu::BufferUsages {
    wgpu::BufferUsages::from_bits_truncate(bits)
}

pub fn texture_usages(bits: u32) -> wgpu::TextureUsages {
    wgpu::TextureUsages::from_bits_truncate(bits)
}

pub fn shader_stages(bits: u32) -> wgpu::ShaderStages {
    wgpu::ShaderStages::from_bits_truncate(bits)
}

// ── enums ─────────────────────────────────────────────────────────────────

pub fn vertex_format(code: u32) -> Result<wgpu::VertexFormat> {
    use wgpu::VertexFormat as F;
    Ok(match code {
        0x01 => F::Uint8,
        0x02 => F::Uint8x2,
        0x03 => F::Uint8x4,
        0x04 => F::Sint8,
        0x05 => F::Sint8x2,
        0x06 => F::Sint8x4,
        0x07 => F::Unorm8,
        0x08 => F::Unorm8x2,
        0x09 => F::Unorm8x4,
        0x0A => F::Snorm8,
        0x0B => F::Snorm8x2,
        0x0C => F::Snorm8x4,
        0x0D => F::Uint16,
        0x0E => F::Uint16x2,
        0x0F => F::Uint16x4,
        0x10 => F::Sint16,
        0x11 => F::Sint16x2,
        0x12 => F::Sint16x4,
        0x13 => F::Unorm16,
        0x14 => F::Unorm16x2,
        0x15 => F::Unorm16x4,
        0x16 => F::Snorm16,
        0x17 => F::Snorm16x2,
        0x18 => F::Snorm16x4,
        0x19 => F::Float16,
        0x1A => F::Float16x2,
        0x1B => F::Float16x4,
        0x1C => F::Float32,
        0x1D => F::Float32x2,
        0x1E => F::Float32x3,
        0x1F => F::Float32x4,
        0x20 => F::Uint32,
        0x21 => F::Uint32x2,
        0x22 => F::Uint32x3,
        0x23 => F::Uint32x4,
        0x24 => F::Sint32,
        0x25 => F::Sint32x2,
        0x26 => F::Sint32x3,
        0x27 => F::Sint32x4,
        0x28 => F::Unorm10_10_10_2,
        0x29 => F::Unorm8x4Bgra,
        _ => return Err(unknown("vertex format", code)),
    })
}

/// Common color and depth formats. Block-compressed and exotic formats are
/// not reachable through codes.
pub fn texture_format(code: u32) -> Result<wgpu::TextureFormat> {
    use wgpu::TextureFormat as T;
    Ok(match code {
        0x01 => T::R8Unorm,
        0x0C => T::R32Float,
        0x12 => T::Rgba8Unorm,
        0x13 => T::Rgba8UnormSrgb,
        0x17 => T::Bgra8Unorm,
        0x18 => T::Bgra8UnormSrgb,
        0x22 => T::Rgba16Float,
        0x23 => T::Rgba32Float,
        0x27 => T::Depth16Unorm,
        0x28 => T::Depth24Plus,
        0x29 => T::Depth24PlusStencil8,
        0x2A => T::Depth32Float,
        _ => return Err(unknown("texture format", code)),
    })
}

/// `0` (undefined) and `1` both mean no culling.
pub fn cull_mode(code: u32) -> Result<Option<wgpu::Face>> {
    match code {
        0 | 1 => Ok(None),
        2 => Ok(Some(wgpu::Face::Front)),
        3 => Ok(Some(wgpu::Face::Back)),
        _ => Err(unknown("cull mode", code)),
    }
}

pub fn blend_factor(code: u32) -> Result<wgpu::BlendFactor> {
    use wgpu::BlendFactor as B;
    Ok(match code {
        0x01 => B::Zero,
        0x02 => B::One,
        0x03 => B::Src,
        0x04 => B::OneMinusSrc,
        0x05 => B::SrcAlpha,
        0x06 => B::OneMinusSrcAlpha,
        0x07 => B::Dst,
        0x08 => B::OneMinusDst,
        0x09 => B::DstAlpha,
        0x0A => B::OneMinusDstAlpha,
        0x0B => B::SrcAlphaSaturated,
        0x0C => B::Constant,
        0x0D => B::OneMinusConstant,
        0x0E => B::Src1,
        0x0F => B::OneMinusSrc1,
        0x10 => B::Src1Alpha,
        0x11 => B::OneMinusSrc1Alpha,
        _ => return Err(unknown("blend factor", code)),
    })
}

pub fn blend_operation(code: u32) -> Result<wgpu::BlendOperation> {
    use wgpu::BlendOperation as O;
    Ok(match code {
        0x01 => O::Add,
        0x02 => O::Subtract,
        0x03 => O::ReverseSubtract,
        0x04 => O::Min,
        0x05 => O::Max,
        _ => return Err(unknown("blend operation", code)),
    })
}

pub fn index_format(code: u32) -> Result<wgpu::IndexFormat> {
    match code {
        0x01 => Ok(wgpu::IndexFormat::Uint16),
        0x02 => Ok(wgpu::IndexFormat::Uint32),
        _ => Err(unknown("index format", code)),
    }
}

pub fn address_mode(code: u32) -> Result<wgpu::AddressMode> {
    match code {
        0x01 => Ok(wgpu::AddressMode::ClampToEdge),
        0x02 => Ok(wgpu::AddressMode::Repeat),
        0x03 => Ok(wgpu::AddressMode::MirrorRepeat),
        _ => Err(unknown("address mode", code)),
    }
}

pub fn filter_mode(code: u32) -> Result<wgpu::FilterMode> {
    match code {
        0x01 => Ok(wgpu::FilterMode::Nearest),
        0x02 => Ok(wgpu::FilterMode::Linear),
        _ => Err(unknown("filter mode", code)),
    }
}
