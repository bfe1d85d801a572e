//! CPU evaluation of the quad shaders.
//!
//! The functions here call the same compositing code the GPU runs, with
//! software samplers standing in for bound textures. They are used to check
//! blend behaviour without a device.

use image::RgbaImage;
use log::trace;
use quad_shader::{Varyings, VertexOutput};
use spirv_std::glam::{Vec2, Vec3, Vec4};

use crate::blend::BlendMode;
use crate::draw::QuadUniformRaw;
use crate::geometry::QuadVertex;

pub trait Sample2d {
    fn sample(&self, uv: Vec2) -> Vec4;
}

pub trait Sample2dArray {
    fn sample(&self, uvw: Vec3) -> Vec4;
}

/// Nearest-neighbour, clamp-to-edge sampler over straight-alpha texels.
#[derive(Debug, Clone)]
pub struct CpuTexture {
    image: RgbaImage,
}

impl CpuTexture {
    pub fn new(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

impl Sample2d for CpuTexture {
    fn sample(&self, uv: Vec2) -> Vec4 {
        sample_nearest(&self.image, uv)
    }
}

#[derive(Debug, Clone)]
pub struct CpuTextureArray {
    layers: Vec<RgbaImage>,
}

impl CpuTextureArray {
    pub fn new(layers: Vec<RgbaImage>) -> Self {
        Self { layers }
    }

    /// Layer addressed by the third coordinate, rounded and clamped like the
    /// hardware does.
    pub fn layer_index(&self, w: f32) -> usize {
        let last = self.layers.len().saturating_sub(1) as f32;
        w.round().max(0.0).min(last) as usize
    }
}

impl Sample2dArray for CpuTextureArray {
    fn sample(&self, uvw: Vec3) -> Vec4 {
        match self.layers.get(self.layer_index(uvw.z)) {
            Some(layer) => sample_nearest(layer, uvw.truncate()),
            None => Vec4::ZERO,
        }
    }
}

fn sample_nearest(image: &RgbaImage, uv: Vec2) -> Vec4 {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Vec4::ZERO;
    }

    let texel = |coord: f32, size: u32| -> u32 {
        let scaled = (coord * size as f32).floor();
        scaled.max(0.0).min((size - 1) as f32) as u32
    };
    let pixel = image.get_pixel(texel(uv.x, width), texel(uv.y, height));
    Vec4::from_array(pixel.0.map(|channel| channel as f32 / 255.0))
}

/// Result of a single fragment invocation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Fragment {
    Color(Vec4),
    /// Nothing is written, neither color nor depth.
    Discarded,
}

impl Fragment {
    pub fn color(self) -> Option<Vec4> {
        match self {
            Fragment::Color(color) => Some(color),
            Fragment::Discarded => None,
        }
    }
}

pub fn run_vertex_stage(uniform: &QuadUniformRaw, vertex: &QuadVertex) -> VertexOutput {
    quad_shader::transform_vertex(
        &uniform.to_shader(),
        Vec4::from_array(vertex.position),
        Vec3::from_array(vertex.uv),
        Vec4::from_array(vertex.color),
        vertex.additivity,
    )
}

/// Varyings at barycentric coordinates `weights` of a triangle.
pub fn interpolate(corners: &[Varyings; 3], weights: [f32; 3]) -> Varyings {
    let mut uv = Vec3::ZERO;
    let mut color = Vec4::ZERO;
    let mut additivity = 0.0;
    for (corner, weight) in corners.iter().zip(weights) {
        uv += corner.uv * weight;
        color += corner.color * weight;
        additivity += corner.additivity * weight;
    }
    Varyings {
        uv,
        color,
        additivity,
    }
}

pub fn shade_fragment<F, A>(
    mode: BlendMode,
    use_texture_array: i32,
    varyings: &Varyings,
    flat: &F,
    array: &A,
) -> Fragment
where
    F: Sample2d + ?Sized,
    A: Sample2dArray + ?Sized,
{
    let select = |uv: Vec3| {
        quad_shader::sample_source(
            use_texture_array,
            uv,
            |uv| flat.sample(uv),
            |uvw| array.sample(uvw),
        )
    };

    let color = match mode {
        BlendMode::VertexColorFallback => {
            let texel = flat.sample(varyings.uv.truncate());
            return Fragment::Color(quad_shader::composite_vertex_color_fallback(
                texel,
                varyings.color,
            ));
        }
        BlendMode::Premultiplied => {
            quad_shader::composite_premultiplied(select(varyings.uv), varyings.color)
        }
        BlendMode::Additive => quad_shader::composite_additive(
            select(varyings.uv),
            varyings.color,
            varyings.additivity,
        ),
    };

    if quad_shader::should_discard(color) {
        trace!("Discarding fragment at uv {:?}", varyings.uv);
        Fragment::Discarded
    } else {
        Fragment::Color(color)
    }
}

/// Framebuffer value after blending `fragment` onto `dst` with the mode's
/// blend state.
pub fn composite_over(mode: BlendMode, fragment: Fragment, dst: Vec4) -> Vec4 {
    match fragment {
        Fragment::Color(src) => mode.blend_state().apply(src, dst),
        Fragment::Discarded => dst,
    }
}
