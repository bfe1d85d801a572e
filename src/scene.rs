//! Scene description for the viewer.
//!
//! A scene is a TOML file listing textures, quads, lines and text labels.
//! Every field has a default, so an empty file is a valid (empty) scene.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cgmath::Matrix4;
use image::RgbaImage;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::blend::BlendMode;
use crate::draw::{DrawCall, DrawMode, TextureBinding};
use crate::error::{Error, Result};
use crate::geometry::{
    Color, Line, LineBatch, Quad, QuadBatch, Rect, ADDITIVITY_MAX, ADDITIVITY_NONE,
};
use crate::pattern::Pattern;
use crate::projection;

const WHITE: Color = [1.0, 1.0, 1.0, 1.0];

/// Where the pixels of a texture or texture array layer come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    pub path: Option<PathBuf>,
    pub pattern: Option<Pattern>,
    /// Size of a generated pattern, ignored for files.
    #[serde(default = "default_pattern_size")]
    pub size: (u32, u32),
    #[serde(default = "default_pattern_color")]
    pub color: [u8; 4],
}

fn default_pattern_size() -> (u32, u32) {
    (64, 64)
}

fn default_pattern_color() -> [u8; 4] {
    [255, 255, 255, 255]
}

impl ImageSource {
    pub fn pattern(pattern: Pattern, color: [u8; 4]) -> Self {
        Self {
            path: None,
            pattern: Some(pattern),
            size: default_pattern_size(),
            color,
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.path.is_none() {
            if self.pattern.is_none() {
                return Err(Error::MissingTextureSource {
                    name: name.to_string(),
                });
            }
            let (width, height) = self.size;
            if width == 0 || height == 0 {
                return Err(Error::EmptyImage {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Files take precedence over patterns. Relative paths are resolved
    /// against `base_dir`.
    pub fn load(&self, name: &str, base_dir: &Path) -> Result<RgbaImage> {
        let image = self.decode(name, base_dir)?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage {
                name: name.to_string(),
            });
        }
        Ok(image)
    }

    fn decode(&self, name: &str, base_dir: &Path) -> Result<RgbaImage> {
        if let Some(path) = &self.path {
            let path = base_dir.join(path);
            debug!("Loading image {:?} for texture {:?}", path, name);
            let image = image::open(&path).map_err(|source| Error::Image {
                path: path.clone(),
                source,
            })?;
            return Ok(image.to_rgba8());
        }

        match self.pattern {
            Some(pattern) => {
                let (width, height) = self.size;
                Ok(pattern.generate(width, height, self.color))
            }
            None => Err(Error::MissingTextureSource {
                name: name.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureConfig {
    pub name: String,
    #[serde(flatten)]
    pub source: ImageSource,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureArrayConfig {
    pub name: String,
    pub layers: Vec<ImageSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuadConfig {
    /// `(x, y, width, height)` from the bottom-left corner, in pixels.
    pub rect: (f32, f32, f32, f32),
    pub texture: String,
    #[serde(default)]
    pub blend: BlendMode,
    #[serde(default)]
    pub depth: f32,
    #[serde(default = "default_color")]
    pub color: Color,
    #[serde(default)]
    pub additivity: f32,
    /// Texture array layer, ignored for flat textures.
    #[serde(default)]
    pub layer: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineConfig {
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub texture: String,
    #[serde(default)]
    pub blend: BlendMode,
    #[serde(default)]
    pub depth: f32,
    #[serde(default = "default_color")]
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelConfig {
    pub text: String,
    /// Bottom-left corner of the label box, in pixels.
    pub position: (f32, f32),
    #[serde(default = "default_font_size")]
    pub size: f32,
    /// Fill shown behind the glyphs.
    #[serde(default = "default_label_background")]
    pub background: Color,
    #[serde(default = "default_glyph_color")]
    pub glyph_color: [u8; 3],
    #[serde(default)]
    pub depth: f32,
}

fn default_color() -> Color {
    WHITE
}

fn default_font_size() -> f32 {
    20.0
}

fn default_label_background() -> Color {
    [0.05, 0.05, 0.1, 1.0]
}

fn default_glyph_color() -> [u8; 3] {
    [180, 100, 40]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub clear_color: [f64; 4],
    /// TrueType font used for labels. Labels are skipped without one.
    pub font: Option<PathBuf>,
    pub textures: Vec<TextureConfig>,
    pub texture_arrays: Vec<TextureArrayConfig>,
    pub quads: Vec<QuadConfig>,
    pub lines: Vec<LineConfig>,
    pub labels: Vec<LabelConfig>,
    /// Directory relative asset paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            title: "quad-blend".to_string(),
            width: 800,
            height: 600,
            clear_color: [0.02, 0.02, 0.05, 1.0],
            font: None,
            textures: vec![],
            texture_arrays: vec![],
            quads: vec![],
            lines: vec![],
            labels: vec![],
            base_dir: PathBuf::new(),
        }
    }
}

impl SceneConfig {
    /// Built-in scene showing every blend mode, needs no asset files.
    pub fn demo() -> Self {
        Self {
            textures: vec![
                TextureConfig {
                    name: "checker".to_string(),
                    source: ImageSource::pattern(Pattern::Checker, [255, 255, 255, 255]),
                },
                TextureConfig {
                    name: "glow".to_string(),
                    source: ImageSource::pattern(Pattern::Glow, [255, 160, 60, 255]),
                },
            ],
            texture_arrays: vec![TextureArrayConfig {
                name: "tiles".to_string(),
                layers: vec![
                    ImageSource::pattern(Pattern::Gradient, [80, 200, 255, 255]),
                    ImageSource::pattern(Pattern::Checker, [255, 80, 160, 255]),
                    ImageSource::pattern(Pattern::Plain, [120, 255, 120, 160]),
                ],
            }],
            quads: Self::demo_quads(),
            lines: vec![LineConfig {
                start: (40.0, 40.0),
                end: (760.0, 40.0),
                texture: "checker".to_string(),
                blend: BlendMode::Premultiplied,
                depth: 0.0,
                color: [0.6, 0.6, 0.6, 1.0],
            }],
            ..Self::default()
        }
    }

    fn demo_quads() -> Vec<QuadConfig> {
        let quad = |x: f32, y: f32, texture: &str, blend: BlendMode| QuadConfig {
            rect: (x, y, 160.0, 160.0),
            texture: texture.to_string(),
            blend,
            depth: 0.5,
            color: WHITE,
            additivity: ADDITIVITY_NONE,
            layer: 0,
        };

        let mut quads = vec![
            quad(40.0, 400.0, "checker", BlendMode::Premultiplied),
            QuadConfig {
                color: [0.2, 0.4, 1.0, 1.0],
                ..quad(240.0, 400.0, "checker", BlendMode::VertexColorFallback)
            },
        ];
        for layer in 0..3 {
            quads.push(QuadConfig {
                layer,
                ..quad(40.0 + 200.0 * layer as f32, 200.0, "tiles", BlendMode::Premultiplied)
            });
        }
        for (i, additivity) in [ADDITIVITY_NONE, 0.5, ADDITIVITY_MAX].iter().enumerate() {
            quads.push(QuadConfig {
                additivity: *additivity,
                depth: 0.25,
                ..quad(440.0 + 100.0 * i as f32, 400.0, "glow", BlendMode::Additive)
            });
        }
        quads
    }

    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading scene {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut scene = Self::parse(&content)?;
        scene.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(scene)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let scene: Self = toml::from_str(content)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn validate(&self) -> Result<()> {
        for texture in &self.textures {
            texture.source.validate(&texture.name)?;
        }

        for array in &self.texture_arrays {
            if array.layers.is_empty() {
                return Err(Error::EmptyTextureArray {
                    name: array.name.clone(),
                });
            }
            for layer in &array.layers {
                layer.validate(&array.name)?;
            }
        }

        for quad in &self.quads {
            self.check_blend_mode(&quad.texture, quad.blend)?;
            if !(ADDITIVITY_NONE..=ADDITIVITY_MAX).contains(&quad.additivity) {
                return Err(Error::AdditivityOutOfRange {
                    value: quad.additivity,
                });
            }
        }

        for line in &self.lines {
            self.check_blend_mode(&line.texture, line.blend)?;
        }

        Ok(())
    }

    /// The fallback fragment stage only reads the flat texture slot.
    fn check_blend_mode(&self, texture: &str, blend: BlendMode) -> Result<()> {
        match self.texture_binding(texture)? {
            TextureBinding::Array(name) if blend == BlendMode::VertexColorFallback => {
                Err(Error::FallbackOnTextureArray { name })
            }
            _ => Ok(()),
        }
    }

    /// Flat textures shadow texture arrays of the same name.
    pub fn texture_binding(&self, name: &str) -> Result<TextureBinding> {
        if self.textures.iter().any(|texture| texture.name == name) {
            Ok(TextureBinding::Flat(name.to_string()))
        } else if self.texture_arrays.iter().any(|array| array.name == name) {
            Ok(TextureBinding::Array(name.to_string()))
        } else {
            Err(Error::UnknownTexture {
                name: name.to_string(),
            })
        }
    }

    pub fn load_images(&self) -> Result<SceneImages> {
        let mut images = SceneImages::default();

        for texture in &self.textures {
            let image = texture.source.load(&texture.name, &self.base_dir)?;
            images.flat.insert(texture.name.clone(), image);
        }

        for array in &self.texture_arrays {
            let layers = array
                .layers
                .iter()
                .map(|layer| layer.load(&array.name, &self.base_dir))
                .collect::<Result<Vec<_>>>()?;
            let expected = match layers.first() {
                Some(first) => first.dimensions(),
                None => {
                    return Err(Error::EmptyTextureArray {
                        name: array.name.clone(),
                    })
                }
            };
            for (layer, image) in layers.iter().enumerate() {
                if image.dimensions() != expected {
                    return Err(Error::LayerSizeMismatch {
                        name: array.name.clone(),
                        layer,
                        expected,
                        actual: image.dimensions(),
                    });
                }
            }
            images.arrays.insert(array.name.clone(), layers);
        }

        info!(
            "Loaded {} textures and {} texture arrays",
            images.flat.len(),
            images.arrays.len()
        );
        Ok(images)
    }

    /// Batches the scene into draw calls for a `width` x `height` viewport.
    /// Consecutive quads that share a texture and blend mode end up in the
    /// same call, so configuration order is kept.
    pub fn build_draw_calls(&self, width: f32, height: f32) -> Result<Vec<DrawCall>> {
        let transform = projection::ortho_bottom_left(width, height, -1.0, 1.0);
        let mut draw_calls = Vec::new();

        let mut batch = QuadBatch::new();
        let mut current: Option<(TextureBinding, BlendMode)> = None;
        for quad in &self.quads {
            let key = (self.texture_binding(&quad.texture)?, quad.blend);
            if current.as_ref() != Some(&key) || batch.is_full() {
                if let Some((texture, blend_mode)) = current.take() {
                    draw_calls.push(fill_draw_call(transform, texture, blend_mode, &mut batch));
                }
                current = Some(key);
            }

            let (x, y, w, h) = quad.rect;
            let shape = Quad::new(Rect::from_origin_size(x, y, w, h), quad.depth, quad.color)
                .with_additivity(quad.additivity);
            batch.push_quad(shape, Rect::UNIT, quad.layer);
        }
        if let Some((texture, blend_mode)) = current {
            draw_calls.push(fill_draw_call(transform, texture, blend_mode, &mut batch));
        }

        for line in &self.lines {
            let mut lines = LineBatch::new();
            let uv = Line {
                start: (0.0, 0.5),
                end: (1.0, 0.5),
            };
            lines.push_line(
                Line {
                    start: line.start,
                    end: line.end,
                },
                uv,
                line.depth,
                line.color,
            );
            let (vertices, indices) = lines.extract_vertices_indices();
            draw_calls.push(DrawCall {
                transform,
                blend_mode: line.blend,
                draw_mode: DrawMode::Lines,
                texture: self.texture_binding(&line.texture)?,
                vertices,
                indices,
            });
        }

        debug!("Built {} draw calls", draw_calls.len());
        Ok(draw_calls)
    }
}

fn fill_draw_call(
    transform: Matrix4<f32>,
    texture: TextureBinding,
    blend_mode: BlendMode,
    batch: &mut QuadBatch,
) -> DrawCall {
    let (vertices, indices) = batch.extract_vertices_indices();
    DrawCall {
        transform,
        blend_mode,
        draw_mode: DrawMode::Fill,
        texture,
        vertices,
        indices,
    }
}

/// Decoded pixels of every texture a scene references.
#[derive(Debug, Default)]
pub struct SceneImages {
    pub flat: BTreeMap<String, RgbaImage>,
    pub arrays: BTreeMap<String, Vec<RgbaImage>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_default_scene() {
        let scene = SceneConfig::parse("").unwrap();
        assert_eq!(scene, SceneConfig::default());
        assert!(scene.build_draw_calls(800.0, 600.0).unwrap().is_empty());
    }

    #[test]
    fn demo_scene_is_valid() {
        let scene = SceneConfig::demo();
        assert!(scene.validate().is_ok());
        let images = scene.load_images().unwrap();
        assert_eq!(images.flat.len(), 2);
        assert_eq!(images.arrays["tiles"].len(), 3);
    }

    #[test]
    fn bundled_demo_parses() {
        let scene = SceneConfig::parse(include_str!("../res/demo.toml")).unwrap();
        assert_eq!(scene.title, "quad-blend demo");
        assert!(scene.quads.iter().any(|q| q.blend == BlendMode::Additive));
        assert!(scene.load_images().is_ok());
    }

    #[test]
    fn parses_quads_with_defaults() {
        let scene = SceneConfig::parse(
            r#"
            title = "test"

            [[textures]]
            name = "dot"
            pattern = "glow"
            size = [8, 8]

            [[quads]]
            rect = [0.0, 0.0, 10.0, 10.0]
            texture = "dot"
            blend = "additive"
            additivity = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(scene.width, 800);
        let quad = &scene.quads[0];
        assert_eq!(quad.blend, BlendMode::Additive);
        assert_eq!(quad.color, WHITE);
        assert_eq!(quad.layer, 0);
        assert_eq!(scene.textures[0].source.size, (8, 8));
    }

    #[test]
    fn rejects_unknown_texture() {
        let err = SceneConfig::parse(
            r#"
            [[quads]]
            rect = [0.0, 0.0, 1.0, 1.0]
            texture = "missing"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownTexture { name } if name == "missing"));
    }

    #[test]
    fn rejects_additivity_out_of_range() {
        let mut scene = SceneConfig::demo();
        scene.quads[0].additivity = 1.5;
        assert!(matches!(
            scene.validate(),
            Err(Error::AdditivityOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_texture_without_source() {
        let mut scene = SceneConfig::demo();
        scene.textures[0].source.pattern = None;
        assert!(matches!(
            scene.validate(),
            Err(Error::MissingTextureSource { .. })
        ));
    }

    #[test]
    fn rejects_zero_sized_pattern() {
        let mut scene = SceneConfig::demo();
        scene.textures[1].source.size = (0, 0);
        assert!(matches!(
            scene.validate(),
            Err(Error::EmptyImage { name }) if name == "glow"
        ));

        let flat_layer = ImageSource {
            size: (16, 0),
            ..ImageSource::pattern(Pattern::Plain, [255, 255, 255, 255])
        };
        assert!(matches!(
            flat_layer.load("strip", Path::new("")),
            Err(Error::EmptyImage { .. })
        ));
    }

    #[test]
    fn rejects_fallback_mode_on_texture_array() {
        let mut scene = SceneConfig::demo();
        scene.quads[2].blend = BlendMode::VertexColorFallback;
        assert!(matches!(
            scene.validate(),
            Err(Error::FallbackOnTextureArray { name }) if name == "tiles"
        ));

        let mut scene = SceneConfig::demo();
        scene.lines[0].texture = "tiles".to_string();
        scene.lines[0].blend = BlendMode::VertexColorFallback;
        assert!(matches!(
            scene.validate(),
            Err(Error::FallbackOnTextureArray { .. })
        ));
    }

    #[test]
    fn long_quad_runs_are_split_to_fit_indices() {
        let mut scene = SceneConfig::demo();
        let quad = scene.quads[0].clone();
        scene.quads = vec![quad; QuadBatch::MAX_QUADS + 1];
        scene.lines.clear();

        let calls = scene.build_draw_calls(800.0, 600.0).unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].vertices.len(), QuadBatch::MAX_QUADS * 4);
        assert_eq!(calls[1].vertices.len(), 4);
        assert_eq!(calls[0].texture, calls[1].texture);
        for call in &calls {
            let max_index = call.indices.iter().copied().max().unwrap_or(0) as usize;
            assert_eq!(max_index + 1, call.vertices.len());
        }
    }

    #[test]
    fn rejects_empty_texture_array() {
        let mut scene = SceneConfig::demo();
        scene.texture_arrays[0].layers.clear();
        assert!(matches!(
            scene.validate(),
            Err(Error::EmptyTextureArray { .. })
        ));
    }

    #[test]
    fn rejects_mismatched_layers() {
        let mut scene = SceneConfig::demo();
        scene.texture_arrays[0].layers[1].size = (32, 32);
        match scene.load_images() {
            Err(Error::LayerSizeMismatch {
                layer,
                expected,
                actual,
                ..
            }) => {
                assert_eq!(layer, 1);
                assert_eq!(expected, (64, 64));
                assert_eq!(actual, (32, 32));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn missing_file_reports_path() {
        let mut scene = SceneConfig::demo();
        scene.textures[0].source.path = Some(PathBuf::from("does/not/exist.png"));
        assert!(matches!(scene.load_images(), Err(Error::Image { .. })));
    }

    #[test]
    fn draw_calls_follow_configuration_order() {
        let scene = SceneConfig::demo();
        let calls = scene.build_draw_calls(800.0, 600.0).unwrap();

        let summary: Vec<_> = calls
            .iter()
            .map(|call| (call.texture.clone(), call.blend_mode, call.draw_mode))
            .collect();
        assert_eq!(
            summary,
            vec![
                (
                    TextureBinding::Flat("checker".into()),
                    BlendMode::Premultiplied,
                    DrawMode::Fill
                ),
                (
                    TextureBinding::Flat("checker".into()),
                    BlendMode::VertexColorFallback,
                    DrawMode::Fill
                ),
                (
                    TextureBinding::Array("tiles".into()),
                    BlendMode::Premultiplied,
                    DrawMode::Fill
                ),
                (
                    TextureBinding::Flat("glow".into()),
                    BlendMode::Additive,
                    DrawMode::Fill
                ),
                (
                    TextureBinding::Flat("checker".into()),
                    BlendMode::Premultiplied,
                    DrawMode::Lines
                ),
            ]
        );

        let tiles = &calls[2];
        assert_eq!(tiles.vertices.len(), 12);
        assert_eq!(tiles.indices.len(), 18);
        assert_eq!(tiles.uniform().use_texture_array, 1);
        assert_eq!(tiles.vertices[8].uv[2], 2.0);

        let glow = &calls[3];
        assert_eq!(glow.vertices[8].additivity, ADDITIVITY_MAX);
        assert_eq!(glow.uniform().use_texture_array, 0);
    }
}
