use std::mem;

use serde::{Deserialize, Serialize};

pub type VertexIndex = u16;
pub type Color = [f32; 4];

pub const ADDITIVITY_NONE: f32 = 0.0;
pub const ADDITIVITY_MAX: f32 = 1.0;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 4],
    /// `z` is the texture array layer, ignored when sampling a flat texture.
    pub uv: [f32; 3],
    pub color: Color,
    pub additivity: f32,
}

impl QuadVertex {
    pub const STRIDE: u64 = mem::size_of::<QuadVertex>() as u64;

    #[cfg(feature = "gpu")]
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        shared::wgpu::quad_vertex_layout(Self::STRIDE)
    }
}

/// Axis aligned rectangle with y pointing up.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left_top: (f32, f32),
    pub right_bottom: (f32, f32),
}

impl Rect {
    pub const UNIT: Rect = Rect {
        left_top: (0., 1.),
        right_bottom: (1., 0.),
    };

    /// Rectangle from its bottom-left corner and size.
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            left_top: (x, y + height),
            right_bottom: (x + width, y),
        }
    }

    pub fn width(&self) -> f32 {
        self.right_bottom.0 - self.left_top.0
    }

    pub fn height(&self) -> f32 {
        self.left_top.1 - self.right_bottom.1
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Quad {
    pub rect: Rect,
    pub depth: f32,
    pub color: Color,
    pub additivity: f32,
}

impl Quad {
    pub fn new(rect: Rect, depth: f32, color: Color) -> Self {
        Self {
            rect,
            depth,
            color,
            additivity: ADDITIVITY_NONE,
        }
    }

    pub fn with_additivity(mut self, additivity: f32) -> Self {
        self.additivity = additivity;
        self
    }

    /// Counter-clockwise from the bottom-left corner. The uv y axis is flipped
    /// so images come out upright.
    pub fn into_vertices(self, uv_bounds: Rect, layer: u32) -> [QuadVertex; 4] {
        let (left, top) = self.rect.left_top;
        let (right, bottom) = self.rect.right_bottom;
        let (uv_left, uv_top) = uv_bounds.left_top;
        let (uv_right, uv_bottom) = uv_bounds.right_bottom;
        let layer = layer as f32;

        let vertex = |x: f32, y: f32, u: f32, v: f32| QuadVertex {
            position: [x, y, self.depth, 1.0],
            uv: [u, v, layer],
            color: self.color,
            additivity: self.additivity,
        };

        [
            vertex(left, bottom, uv_left, uv_top),
            vertex(right, bottom, uv_right, uv_top),
            vertex(right, top, uv_right, uv_bottom),
            vertex(left, top, uv_left, uv_bottom),
        ]
    }
}

#[derive(Debug, Default)]
pub struct QuadBatch {
    vertices: Vec<QuadVertex>,
    indices: Vec<VertexIndex>,
}

impl QuadBatch {
    const VERTICES_PER_QUAD: usize = 4;
    const INDICES_PER_QUAD: usize = 6;
    /// Largest batch whose vertices are all addressable by a `VertexIndex`.
    pub const MAX_QUADS: usize = (VertexIndex::MAX as usize + 1) / Self::VERTICES_PER_QUAD;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vertices.len() / Self::VERTICES_PER_QUAD
    }

    /// Pushing more quads would overflow the index type, extract first.
    pub fn is_full(&self) -> bool {
        self.len() >= Self::MAX_QUADS
    }

    /// Keeps the index cache, it only depends on the number of quads.
    pub fn clear(&mut self) {
        self.vertices.clear();
    }

    pub fn push_quad(&mut self, quad: Quad, uv_bounds: Rect, layer: u32) {
        self.vertices
            .extend_from_slice(&quad.into_vertices(uv_bounds, layer));
    }

    pub fn extract_vertices_indices(&mut self) -> (Vec<QuadVertex>, Vec<VertexIndex>) {
        let num_quads = self.len();
        let num_indices = num_quads * Self::INDICES_PER_QUAD;
        let num_cached_quads = self.indices.len() / Self::INDICES_PER_QUAD;

        for quad_index in num_cached_quads..num_quads {
            let first = (Self::VERTICES_PER_QUAD * quad_index) as VertexIndex;
            self.indices.extend_from_slice(&[
                first,
                first + 1,
                first + 2,
                first + 2,
                first + 3,
                first,
            ]);
        }

        let vertices = mem::take(&mut self.vertices);
        (vertices, self.indices[..num_indices].to_vec())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub start: (f32, f32),
    pub end: (f32, f32),
}

#[derive(Debug, Default)]
pub struct LineBatch {
    vertices: Vec<QuadVertex>,
}

impl LineBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines sample a single texel row of `uv`, the horizontal axis of the
    /// sprite they were given.
    pub fn push_line(&mut self, line: Line, uv: Line, depth: f32, color: Color) {
        let vertex = |(x, y): (f32, f32), (u, v): (f32, f32)| QuadVertex {
            position: [x, y, depth, 1.0],
            uv: [u, v, 0.0],
            color,
            additivity: ADDITIVITY_NONE,
        };
        self.vertices.push(vertex(line.start, uv.start));
        self.vertices.push(vertex(line.end, uv.end));
    }

    pub fn extract_vertices_indices(&mut self) -> (Vec<QuadVertex>, Vec<VertexIndex>) {
        let indices = (0..self.vertices.len() as VertexIndex).collect();
        (mem::take(&mut self.vertices), indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Color = [1.0, 1.0, 1.0, 1.0];

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(QuadVertex::STRIDE, 48);
    }

    #[test]
    fn rect_from_origin_size() {
        let rect = Rect::from_origin_size(-50., -50., 100., 100.);

        assert_eq!(rect.left_top, (-50., 50.));
        assert_eq!(rect.right_bottom, (50., -50.));
        assert_eq!(rect.width(), 100.);
        assert_eq!(rect.height(), 100.);
    }

    #[test]
    fn quad_uvs_are_flipped() {
        let quad = Quad::new(Rect::from_origin_size(10., 20., 30., 40.), 0.5, WHITE)
            .with_additivity(ADDITIVITY_MAX);
        let vertices = quad.into_vertices(Rect::UNIT, 3);

        assert_eq!(vertices[0].position, [10., 20., 0.5, 1.0]);
        assert_eq!(vertices[0].uv, [0., 1., 3.]);
        assert_eq!(vertices[2].position, [40., 60., 0.5, 1.0]);
        assert_eq!(vertices[2].uv, [1., 0., 3.]);
        assert!(vertices.iter().all(|v| v.additivity == ADDITIVITY_MAX));
    }

    #[test]
    fn batch_emits_two_triangles_per_quad() {
        let mut batch = QuadBatch::new();
        for i in 0..2 {
            let rect = Rect::from_origin_size(i as f32, 0., 1., 1.);
            batch.push_quad(Quad::new(rect, 0., WHITE), Rect::UNIT, 0);
        }

        let (vertices, indices) = batch.extract_vertices_indices();
        assert_eq!(vertices.len(), 8);
        assert_eq!(indices, vec![0, 1, 2, 2, 3, 0, 4, 5, 6, 6, 7, 4]);
        assert!(batch.is_empty());
    }

    #[test]
    fn batch_reuses_index_cache() {
        let mut batch = QuadBatch::new();
        let quad = Quad::new(Rect::UNIT, 0., WHITE);
        batch.push_quad(quad, Rect::UNIT, 0);
        batch.push_quad(quad, Rect::UNIT, 0);
        batch.extract_vertices_indices();

        batch.push_quad(quad, Rect::UNIT, 0);
        let (vertices, indices) = batch.extract_vertices_indices();
        assert_eq!(vertices.len(), 4);
        assert_eq!(indices, vec![0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn clear_drops_quads_but_keeps_index_cache() {
        let mut batch = QuadBatch::new();
        let quad = Quad::new(Rect::UNIT, 0., WHITE);
        for _ in 0..3 {
            batch.push_quad(quad, Rect::UNIT, 0);
        }
        batch.extract_vertices_indices();

        batch.push_quad(quad, Rect::UNIT, 0);
        batch.clear();
        assert!(batch.is_empty());
        assert_eq!(batch.indices.len(), 18);

        batch.push_quad(quad, Rect::UNIT, 1);
        let (vertices, indices) = batch.extract_vertices_indices();
        assert_eq!(vertices.len(), 4);
        assert!(vertices.iter().all(|v| v.uv[2] == 1.0));
        assert_eq!(indices, vec![0, 1, 2, 2, 3, 0]);
    }

    #[test]
    fn full_batch_indices_stay_in_range() {
        let mut batch = QuadBatch::new();
        let quad = Quad::new(Rect::UNIT, 0., WHITE);
        while !batch.is_full() {
            batch.push_quad(quad, Rect::UNIT, 0);
        }
        assert_eq!(batch.len(), 16384);

        let (vertices, indices) = batch.extract_vertices_indices();
        let max_index = indices.iter().copied().max().unwrap_or(0) as usize;
        assert_eq!(max_index + 1, vertices.len());
        assert_eq!(&indices[indices.len() - 6..], &[65532, 65533, 65534, 65534, 65535, 65532]);
    }

    #[test]
    fn lines_use_two_indices_each() {
        let mut batch = LineBatch::new();
        let uv = Line {
            start: (0., 0.),
            end: (1., 0.),
        };
        batch.push_line(
            Line {
                start: (0., 0.),
                end: (5., 5.),
            },
            uv,
            0.,
            WHITE,
        );

        let (vertices, indices) = batch.extract_vertices_indices();
        assert_eq!(vertices.len(), 2);
        assert_eq!(vertices[1].position, [5., 5., 0., 1.0]);
        assert_eq!(indices, vec![0, 1]);
    }
}
