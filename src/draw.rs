use cgmath::Matrix4;
use serde::{Deserialize, Serialize};
use spirv_std::glam::Mat4;

use crate::blend::BlendMode;
use crate::geometry::{QuadVertex, VertexIndex};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    Fill,
    Lines,
}

impl Default for DrawMode {
    fn default() -> Self {
        DrawMode::Fill
    }
}

/// Texture a draw call samples from. Both slots are always bound on the GPU,
/// this only decides which one the fragment stage reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TextureBinding {
    Flat(String),
    Array(String),
}

impl TextureBinding {
    pub fn name(&self) -> &str {
        match self {
            TextureBinding::Flat(name) | TextureBinding::Array(name) => name,
        }
    }

    pub fn use_texture_array(&self) -> bool {
        matches!(self, TextureBinding::Array(_))
    }
}

// Host mirror of `shared::QuadUniform`, matrices are stored column by column.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadUniformRaw {
    pub transform: [[f32; 4]; 4],
    pub use_texture_array: i32,
    _padding: [i32; 3],
}

impl QuadUniformRaw {
    pub fn new(transform: Matrix4<f32>, use_texture_array: bool) -> Self {
        Self {
            transform: transform.into(),
            use_texture_array: use_texture_array as i32,
            _padding: [0; 3],
        }
    }

    /// The value the shader code sees for this buffer.
    pub fn to_shader(&self) -> shared::QuadUniform {
        shared::QuadUniform {
            transform: Mat4::from_cols_array_2d(&self.transform),
            use_texture_array: self.use_texture_array,
        }
    }
}

#[derive(Clone)]
pub struct DrawCall {
    pub transform: Matrix4<f32>,
    pub blend_mode: BlendMode,
    pub draw_mode: DrawMode,
    pub texture: TextureBinding,
    pub vertices: Vec<QuadVertex>,
    pub indices: Vec<VertexIndex>,
}

impl DrawCall {
    pub fn uniform(&self) -> QuadUniformRaw {
        QuadUniformRaw::new(self.transform, self.texture.use_texture_array())
    }
}

impl std::fmt::Debug for DrawCall {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("DrawCall")
            .field("blend_mode", &self.blend_mode)
            .field("draw_mode", &self.draw_mode)
            .field("texture", &self.texture)
            .field("num_vertices", &self.vertices.len())
            .field("num_indices", &self.indices.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::SquareMatrix;

    fn draw_call(texture: TextureBinding) -> DrawCall {
        DrawCall {
            transform: Matrix4::identity(),
            blend_mode: BlendMode::Premultiplied,
            draw_mode: DrawMode::Fill,
            texture,
            vertices: vec![],
            indices: vec![],
        }
    }

    #[test]
    fn uniform_is_80_bytes() {
        assert_eq!(
            std::mem::size_of::<QuadUniformRaw>() as u64,
            shared::QuadUniform::SIZE
        );
    }

    #[test]
    fn array_binding_sets_flag() {
        assert_eq!(
            draw_call(TextureBinding::Array("tiles".into()))
                .uniform()
                .use_texture_array,
            1
        );
        assert_eq!(
            draw_call(TextureBinding::Flat("checker".into()))
                .uniform()
                .use_texture_array,
            0
        );
    }

    #[test]
    fn transform_keeps_column_order() {
        let transform = Matrix4::from_translation(cgmath::Vector3::new(2.0, 3.0, 0.0));
        let uniform = QuadUniformRaw::new(transform, false).to_shader();
        assert_eq!(uniform.transform.w_axis.x, 2.0);
        assert_eq!(uniform.transform.w_axis.y, 3.0);
    }
}
