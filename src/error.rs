use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to load image {path:?}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture `{name}` has neither a path nor a pattern")]
    MissingTextureSource { name: String },

    #[error("unknown texture `{name}`")]
    UnknownTexture { name: String },

    #[error("texture `{name}` has a zero-sized image")]
    EmptyImage { name: String },

    #[error("texture array `{name}` can't be drawn with the vertex color fallback mode")]
    FallbackOnTextureArray { name: String },

    #[error("texture array `{name}` has no layers")]
    EmptyTextureArray { name: String },

    #[error(
        "layer {layer} of texture array `{name}` is {actual:?}, expected {expected:?}"
    )]
    LayerSizeMismatch {
        name: String,
        layer: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("additivity {value} is outside 0..=1")]
    AdditivityOutOfRange { value: f32 },

    #[error("failed to load font: {0}")]
    Font(String),
}
