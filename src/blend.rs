use serde::{Deserialize, Serialize};
use spirv_std::glam::{Vec3, Vec4, Vec4Swizzles};

/// Fragment policy of a draw call. Every mode has its own fragment entry
/// point and framebuffer blend state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Opaque output, transparent texels reveal the vertex color. Used for text.
    VertexColorFallback,
    /// Premultiplied texel modulated by the vertex color.
    Premultiplied,
    /// Premultiplied output whose alpha is scaled by `1 - additivity`.
    Additive,
}

impl Default for BlendMode {
    fn default() -> Self {
        BlendMode::Premultiplied
    }
}

impl BlendMode {
    pub const ALL: [BlendMode; 3] = [
        BlendMode::VertexColorFallback,
        BlendMode::Premultiplied,
        BlendMode::Additive,
    ];

    pub fn fragment_entry_point(self) -> &'static str {
        match self {
            BlendMode::VertexColorFallback => "fs_vertex_color_fallback",
            BlendMode::Premultiplied => "fs_premultiplied",
            BlendMode::Additive => "fs_additive",
        }
    }

    pub fn blend_state(self) -> BlendState {
        match self {
            BlendMode::VertexColorFallback => BlendState::REPLACE,
            BlendMode::Premultiplied | BlendMode::Additive => BlendState::PREMULTIPLIED_ALPHA,
        }
    }

    /// Whether the fragment stage may discard, which also skips the depth write.
    pub fn discards(self) -> bool {
        !matches!(self, BlendMode::VertexColorFallback)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

impl BlendFactor {
    fn weight(self, src_alpha: f32) -> f32 {
        match self {
            BlendFactor::Zero => 0.0,
            BlendFactor::One => 1.0,
            BlendFactor::SrcAlpha => src_alpha,
            BlendFactor::OneMinusSrcAlpha => 1.0 - src_alpha,
        }
    }
}

/// `src * src_factor + dst * dst_factor`, the only operation the quads use.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlendComponent {
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
}

impl BlendComponent {
    pub const REPLACE: Self = Self {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
    };

    pub const OVER: Self = Self {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
    };
}

/// CPU mirror of the fixed-function blend stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BlendState {
    pub color: BlendComponent,
    pub alpha: BlendComponent,
}

impl BlendState {
    pub const REPLACE: Self = Self {
        color: BlendComponent::REPLACE,
        alpha: BlendComponent::REPLACE,
    };

    pub const PREMULTIPLIED_ALPHA: Self = Self {
        color: BlendComponent::OVER,
        alpha: BlendComponent::OVER,
    };

    pub fn apply(&self, src: Vec4, dst: Vec4) -> Vec4 {
        let src_alpha = src.w;
        let rgb: Vec3 = src.xyz() * self.color.src_factor.weight(src_alpha)
            + dst.xyz() * self.color.dst_factor.weight(src_alpha);
        let alpha = src.w * self.alpha.src_factor.weight(src_alpha)
            + dst.w * self.alpha.dst_factor.weight(src_alpha);
        rgb.extend(alpha)
    }
}

#[cfg(feature = "gpu")]
mod gpu {
    use super::{BlendComponent, BlendFactor, BlendState};

    impl From<BlendFactor> for wgpu::BlendFactor {
        fn from(factor: BlendFactor) -> Self {
            match factor {
                BlendFactor::Zero => wgpu::BlendFactor::Zero,
                BlendFactor::One => wgpu::BlendFactor::One,
                BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
                BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            }
        }
    }

    impl From<BlendComponent> for wgpu::BlendComponent {
        fn from(component: BlendComponent) -> Self {
            wgpu::BlendComponent {
                src_factor: component.src_factor.into(),
                dst_factor: component.dst_factor.into(),
                operation: wgpu::BlendOperation::Add,
            }
        }
    }

    impl From<BlendState> for wgpu::BlendState {
        fn from(state: BlendState) -> Self {
            wgpu::BlendState {
                color: state.color.into(),
                alpha: state.alpha.into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use spirv_std::glam::vec4;

    fn assert_vec4_eq(a: Vec4, b: Vec4) {
        for (x, y) in a.to_array().into_iter().zip(b.to_array()) {
            assert_relative_eq!(x, y, epsilon = 1e-6);
        }
    }

    #[test]
    fn replace_ignores_destination() {
        let src = vec4(0.2, 0.3, 0.4, 1.0);
        assert_eq!(BlendState::REPLACE.apply(src, Vec4::ONE), src);
    }

    #[test]
    fn premultiplied_over_keeps_destination_behind_coverage() {
        let src = vec4(0.25, 0.0, 0.0, 0.5);
        let dst = vec4(0.0, 0.0, 1.0, 1.0);
        let out = BlendState::PREMULTIPLIED_ALPHA.apply(src, dst);
        assert_vec4_eq(out, vec4(0.25, 0.0, 0.5, 1.0));
    }

    #[test]
    fn zero_alpha_source_is_added() {
        let src = vec4(0.1, 0.2, 0.3, 0.0);
        let dst = vec4(0.5, 0.5, 0.5, 1.0);
        let out = BlendState::PREMULTIPLIED_ALPHA.apply(src, dst);
        assert_vec4_eq(out, vec4(0.6, 0.7, 0.8, 1.0));
    }

    #[test]
    fn entry_points_are_distinct() {
        let names: std::collections::HashSet<_> = BlendMode::ALL
            .iter()
            .map(|mode| mode.fragment_entry_point())
            .collect();
        assert_eq!(names.len(), BlendMode::ALL.len());
    }

    #[test]
    fn only_text_mode_replaces() {
        assert_eq!(
            BlendMode::VertexColorFallback.blend_state(),
            BlendState::REPLACE
        );
        assert!(!BlendMode::VertexColorFallback.discards());
        for mode in [BlendMode::Premultiplied, BlendMode::Additive] {
            assert_eq!(mode.blend_state(), BlendState::PREMULTIPLIED_ALPHA);
            assert!(mode.discards());
        }
    }
}
