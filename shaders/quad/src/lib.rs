#![cfg_attr(target_arch = "spirv", no_std)]

#[cfg(feature = "wgpu")]
pub mod pipeline;

use shared::QuadUniform;
use spirv_std::glam::{Vec2, Vec3, Vec4, Vec4Swizzles};
use spirv_std::{spirv, Image, Sampler};

type Image2d = Image!(2D, type=f32, sampled);
type Image2dArray = Image!(2D, type=f32, sampled, arrayed);

/// Per-vertex values handed to the fragment stage for interpolation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Varyings {
    pub uv: Vec3,
    pub color: Vec4,
    pub additivity: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VertexOutput {
    pub clip_position: Vec4,
    pub varyings: Varyings,
}

pub fn transform_vertex(
    uniform: &QuadUniform,
    position: Vec4,
    uv: Vec3,
    color: Vec4,
    additivity: f32,
) -> VertexOutput {
    VertexOutput {
        clip_position: uniform.transform * position,
        varyings: Varyings {
            uv,
            color,
            additivity,
        },
    }
}

/// Picks the texel source. Only a flag of exactly 1 reads the array, and
/// then all three coordinates are used; the flat texture sees `uv.xy`.
pub fn sample_source<F, A>(use_texture_array: i32, uv: Vec3, flat: F, array: A) -> Vec4
where
    F: FnOnce(Vec2) -> Vec4,
    A: FnOnce(Vec3) -> Vec4,
{
    if use_texture_array == 1 {
        array(uv)
    } else {
        flat(uv.truncate())
    }
}

/// Opaque output where transparent texel regions show the vertex color.
pub fn composite_vertex_color_fallback(texel: Vec4, color: Vec4) -> Vec4 {
    let a = texel.w;
    let rgb = texel.xyz() * a + color.xyz() * (1.0 - a);
    rgb.extend(1.0)
}

pub fn composite_premultiplied(texel: Vec4, color: Vec4) -> Vec4 {
    premultiply(texel) * color
}

/// `additivity` 0 is plain alpha compositing, 1 removes all coverage so the
/// premultiplied blend stage adds the color on top of the destination.
pub fn composite_additive(texel: Vec4, color: Vec4, additivity: f32) -> Vec4 {
    let coverage = texel.w * color.w;
    let rgb = texel.xyz() * color.xyz() * coverage;
    rgb.extend(coverage * (1.0 - additivity))
}

pub fn premultiply(color: Vec4) -> Vec4 {
    (color.xyz() * color.w).extend(color.w)
}

/// True when every channel is zero, such fragments are not written at all.
pub fn should_discard(color: Vec4) -> bool {
    color.length_squared() == 0.0
}

#[spirv(vertex)]
pub fn main_vs(
    position: Vec4,
    uv: Vec3,
    color: Vec4,
    additivity: f32,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] uniform: &QuadUniform,
    #[spirv(position)] builtin_pos: &mut Vec4,
    out_uv: &mut Vec3,
    out_color: &mut Vec4,
    out_additivity: &mut f32,
) {
    let output = transform_vertex(uniform, position, uv, color, additivity);
    *builtin_pos = output.clip_position;
    *out_uv = output.varyings.uv;
    *out_color = output.varyings.color;
    *out_additivity = output.varyings.additivity;
}

#[spirv(fragment)]
pub fn fs_vertex_color_fallback(
    uv: Vec3,
    color: Vec4,
    #[spirv(descriptor_set = 1, binding = 0)] t_flat: &Image2d,
    #[spirv(descriptor_set = 1, binding = 1)] s_flat: &Sampler,
    output: &mut Vec4,
) {
    let texel: Vec4 = t_flat.sample(*s_flat, uv.truncate());
    *output = composite_vertex_color_fallback(texel, color);
}

#[spirv(fragment)]
pub fn fs_premultiplied(
    uv: Vec3,
    color: Vec4,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] uniform: &QuadUniform,
    #[spirv(descriptor_set = 1, binding = 0)] t_flat: &Image2d,
    #[spirv(descriptor_set = 1, binding = 1)] s_flat: &Sampler,
    #[spirv(descriptor_set = 1, binding = 2)] t_array: &Image2dArray,
    #[spirv(descriptor_set = 1, binding = 3)] s_array: &Sampler,
    output: &mut Vec4,
) {
    let texel = sample_source(
        uniform.use_texture_array,
        uv,
        |uv| t_flat.sample(*s_flat, uv),
        |uvw| t_array.sample(*s_array, uvw),
    );
    let result = composite_premultiplied(texel, color);
    if should_discard(result) {
        spirv_std::arch::kill();
    }
    *output = result;
}

#[spirv(fragment)]
pub fn fs_additive(
    uv: Vec3,
    color: Vec4,
    additivity: f32,
    #[spirv(uniform, descriptor_set = 0, binding = 0)] uniform: &QuadUniform,
    #[spirv(descriptor_set = 1, binding = 0)] t_flat: &Image2d,
    #[spirv(descriptor_set = 1, binding = 1)] s_flat: &Sampler,
    #[spirv(descriptor_set = 1, binding = 2)] t_array: &Image2dArray,
    #[spirv(descriptor_set = 1, binding = 3)] s_array: &Sampler,
    output: &mut Vec4,
) {
    let texel = sample_source(
        uniform.use_texture_array,
        uv,
        |uv| t_flat.sample(*s_flat, uv),
        |uvw| t_array.sample(*s_array, uvw),
    );
    let result = composite_additive(texel, color, additivity);
    if should_discard(result) {
        spirv_std::arch::kill();
    }
    *output = result;
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_std::glam::{vec3, vec4, Mat4};

    #[test]
    fn fallback_shows_vertex_color_through_transparent_texels() {
        let color = vec4(0.2, 0.4, 0.6, 0.3);
        let out = composite_vertex_color_fallback(vec4(0.9, 0.9, 0.9, 0.0), color);
        assert_eq!(out, vec4(0.2, 0.4, 0.6, 1.0));
    }

    #[test]
    fn fallback_shows_texel_where_opaque() {
        let out = composite_vertex_color_fallback(vec4(0.1, 0.5, 0.7, 1.0), Vec4::ONE);
        assert_eq!(out, vec4(0.1, 0.5, 0.7, 1.0));
    }

    #[test]
    fn premultiplied_multiplies_by_vertex_color() {
        let out = composite_premultiplied(vec4(1.0, 0.0, 0.0, 0.5), vec4(0.0, 1.0, 0.0, 1.0));
        assert_eq!(out, vec4(0.0, 0.0, 0.0, 0.5));
        assert!(!should_discard(out));
    }

    #[test]
    fn transparent_black_is_discarded() {
        let texel = Vec4::ZERO;
        for color in [Vec4::ONE, vec4(0.3, 0.2, 0.1, 0.5), Vec4::ZERO] {
            assert!(should_discard(composite_premultiplied(texel, color)));
            assert!(should_discard(composite_additive(texel, color, 0.0)));
            assert!(should_discard(composite_additive(texel, color, 1.0)));
        }
    }

    #[test]
    fn fully_additive_has_no_alpha() {
        let out = composite_additive(vec4(0.5, 0.5, 1.0, 0.8), vec4(1.0, 0.5, 0.5, 0.5), 1.0);
        assert_eq!(out.w, 0.0);
        assert_eq!(out.xyz(), vec3(0.2, 0.1, 0.2));
        assert!(!should_discard(out));
    }

    #[test]
    fn non_additive_alpha_is_product_of_alphas() {
        let out = composite_additive(vec4(0.5, 0.5, 1.0, 0.8), vec4(1.0, 0.5, 0.5, 0.5), 0.0);
        assert_eq!(out.w, 0.8 * 0.5);
    }

    #[test]
    fn only_flag_one_selects_array() {
        let uv = vec3(0.25, 0.75, 2.0);
        let flat = |uv: Vec2| uv.extend(0.0).extend(1.0);
        let array = |uvw: Vec3| uvw.extend(-1.0);

        assert_eq!(sample_source(1, uv, flat, array), vec4(0.25, 0.75, 2.0, -1.0));
        for flag in [0, 2, -1, i32::MAX] {
            assert_eq!(sample_source(flag, uv, flat, array), vec4(0.25, 0.75, 0.0, 1.0));
        }
    }

    #[test]
    fn identity_transform_passes_vertex_through() {
        let uniform = QuadUniform::new(Mat4::IDENTITY, false);
        let position = vec4(3.0, -2.0, 0.5, 1.0);
        let uv = vec3(0.1, 0.2, 3.0);
        let color = vec4(0.9, 0.8, 0.7, 0.6);

        let out = transform_vertex(&uniform, position, uv, color, 0.25);
        assert_eq!(out.clip_position, position);
        assert_eq!(
            out.varyings,
            Varyings {
                uv,
                color,
                additivity: 0.25
            }
        );
    }
}
