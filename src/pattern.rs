use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

/// Procedural images, so scenes can run without any asset files.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Alternating cells of `color` and fully transparent black.
    Checker,
    /// `color` with alpha ramping from 0 on the left to 255 on the right.
    Gradient,
    Plain,
    /// Radial falloff of `color`, opaque in the middle, transparent at the edge.
    Glow,
}

const CHECKER_CELLS: u32 = 8;

impl Pattern {
    pub fn generate(self, width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
        let [r, g, b, a] = color;
        match self {
            Pattern::Plain => RgbaImage::from_pixel(width, height, Rgba(color)),
            Pattern::Checker => {
                let cell_w = (width / CHECKER_CELLS).max(1);
                let cell_h = (height / CHECKER_CELLS).max(1);
                RgbaImage::from_fn(width, height, |x, y| {
                    if (x / cell_w + y / cell_h) % 2 == 0 {
                        Rgba(color)
                    } else {
                        Rgba([0, 0, 0, 0])
                    }
                })
            }
            Pattern::Gradient => RgbaImage::from_fn(width, height, |x, _| {
                let t = if width > 1 {
                    x as f32 / (width - 1) as f32
                } else {
                    1.0
                };
                Rgba([r, g, b, (t * a as f32).round() as u8])
            }),
            Pattern::Glow => {
                let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
                let radius = cx.min(cy).max(1.0);
                RgbaImage::from_fn(width, height, |x, y| {
                    let dx = x as f32 + 0.5 - cx;
                    let dy = y as f32 + 0.5 - cy;
                    let falloff = (1.0 - (dx * dx + dy * dy).sqrt() / radius).max(0.0);
                    Rgba([r, g, b, (falloff * falloff * a as f32).round() as u8])
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORANGE: [u8; 4] = [255, 128, 0, 255];

    #[test]
    fn checker_alternates_with_transparent_black() {
        let image = Pattern::Checker.generate(16, 16, ORANGE);
        assert_eq!(image.get_pixel(0, 0).0, ORANGE);
        assert_eq!(image.get_pixel(2, 0).0, [0, 0, 0, 0]);
        assert_eq!(image.get_pixel(2, 2).0, ORANGE);
    }

    #[test]
    fn gradient_ramps_alpha() {
        let image = Pattern::Gradient.generate(3, 1, ORANGE);
        assert_eq!(image.get_pixel(0, 0).0[3], 0);
        assert_eq!(image.get_pixel(2, 0).0[3], 255);
    }

    #[test]
    fn glow_fades_out() {
        let image = Pattern::Glow.generate(32, 32, ORANGE);
        assert!(image.get_pixel(16, 16).0[3] > 200);
        assert_eq!(image.get_pixel(0, 0).0[3], 0);
    }
}
