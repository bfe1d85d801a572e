#![cfg_attr(target_arch = "spirv", no_std)]

#[cfg(feature = "wgpu")]
pub mod wgpu;

use spirv_std::glam::Mat4;

/// Descriptor set holding the per-draw `QuadUniform`.
pub const UNIFORM_SET: u32 = 0;
/// Descriptor set holding the flat texture and the texture array.
pub const TEXTURE_SET: u32 = 1;

pub const FLAT_TEXTURE_BINDING: u32 = 0;
pub const FLAT_SAMPLER_BINDING: u32 = 1;
pub const ARRAY_TEXTURE_BINDING: u32 = 2;
pub const ARRAY_SAMPLER_BINDING: u32 = 3;

/// GPU view of the per-draw uniform buffer.
///
/// The host writes the same 80 bytes from a plain-array mirror of this struct,
/// `use_texture_array` is followed by 12 bytes of padding.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct QuadUniform {
    pub transform: Mat4,
    pub use_texture_array: i32,
}

impl QuadUniform {
    pub const SIZE: u64 = 80;

    pub fn new(transform: Mat4, use_texture_array: bool) -> Self {
        Self {
            transform,
            use_texture_array: use_texture_array as i32,
        }
    }
}
