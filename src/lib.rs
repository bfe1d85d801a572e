pub mod blend;
pub mod draw;
pub mod error;
pub mod geometry;
pub mod pattern;
pub mod projection;
pub mod reference;
pub mod scene;

#[cfg(feature = "gpu")]
pub mod font;
#[cfg(feature = "gpu")]
pub mod shaders;
#[cfg(feature = "gpu")]
pub mod state;
#[cfg(feature = "gpu")]
pub mod texture;

pub use blend::{BlendMode, BlendState};
pub use draw::{DrawCall, DrawMode, QuadUniformRaw, TextureBinding};
pub use error::{Error, Result};
pub use geometry::{Quad, QuadBatch, QuadVertex, Rect, ADDITIVITY_MAX, ADDITIVITY_NONE};
pub use scene::SceneConfig;
