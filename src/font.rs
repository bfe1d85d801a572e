use std::path::Path;

use cgmath::Matrix4;
use image::{Rgba, RgbaImage};
use log::{debug, warn};
use rusttype::{point, Font, Scale};

use crate::blend::BlendMode;
use crate::draw::{DrawCall, DrawMode, TextureBinding};
use crate::error::{Error, Result};
use crate::geometry::{Quad, QuadBatch, Rect};
use crate::scene::LabelConfig;

const LABEL_PADDING: (f32, f32) = (8.0, 4.0);

pub struct FontRenderer {
    font: Font<'static>,
}

impl FontRenderer {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let font_data = std::fs::read(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = Font::try_from_vec(font_data)
            .ok_or_else(|| Error::Font(format!("{:?} is not a TrueType font", path)))?;

        Ok(Self { font })
    }

    /// Rasterises `text` into glyph coverage over a transparent background.
    pub fn render_image(
        &self,
        text: &str,
        font_size: f32,
        padding: (f32, f32),
        color: [u8; 3],
    ) -> RgbaImage {
        let scale = Scale::uniform(font_size);
        let v_metrics = self.font.v_metrics(scale);

        let glyphs = self
            .font
            .layout(text, scale, point(padding.0, padding.1 + v_metrics.ascent))
            .collect::<Vec<_>>();

        let glyphs_height = (v_metrics.ascent - v_metrics.descent).ceil() as u32;
        let glyphs_width = glyphs
            .iter()
            .filter_map(|g| g.pixel_bounding_box())
            .map(|bb| bb.max.x)
            .max()
            .map(|max_x| (max_x as f32 - padding.0).max(0.0) as u32)
            .unwrap_or(0);

        let mut image = RgbaImage::new(
            glyphs_width + (padding.0 * 2.) as u32,
            glyphs_height + (padding.1 * 2.) as u32,
        );

        for glyph in glyphs {
            if let Some(bounding_box) = glyph.pixel_bounding_box() {
                glyph.draw(|x, y, v| {
                    let x = x as i32 + bounding_box.min.x;
                    let y = y as i32 + bounding_box.min.y;
                    if x >= 0 && y >= 0 && (x as u32) < image.width() && (y as u32) < image.height()
                    {
                        image.put_pixel(
                            x as u32,
                            y as u32,
                            Rgba([color[0], color[1], color[2], (v * 255.0) as u8]),
                        );
                    }
                });
            }
        }

        image
    }

    /// Label image plus the fallback-mode draw call showing it. The label
    /// background is the vertex color, glyphs are the texture.
    pub fn label(
        &self,
        label: &LabelConfig,
        texture_name: &str,
        transform: Matrix4<f32>,
    ) -> (RgbaImage, DrawCall) {
        let image = self.render_image(&label.text, label.size, LABEL_PADDING, label.glyph_color);
        if label.text.trim().is_empty() {
            warn!("Label at {:?} has no text", label.position);
        }
        debug!(
            "Label {:?} rendered to {}x{}",
            label.text,
            image.width(),
            image.height()
        );

        let (x, y) = label.position;
        let rect = Rect::from_origin_size(x, y, image.width() as f32, image.height() as f32);
        let mut batch = QuadBatch::new();
        batch.push_quad(Quad::new(rect, label.depth, label.background), Rect::UNIT, 0);
        let (vertices, indices) = batch.extract_vertices_indices();

        let draw_call = DrawCall {
            transform,
            blend_mode: BlendMode::VertexColorFallback,
            draw_mode: DrawMode::Fill,
            texture: TextureBinding::Flat(texture_name.to_string()),
            vertices,
            indices,
        };
        (image, draw_call)
    }
}
