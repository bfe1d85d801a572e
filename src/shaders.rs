use std::collections::BTreeMap;

use log::debug;

use crate::blend::BlendMode;
use crate::draw::DrawMode;
use crate::geometry::QuadVertex;

/// One pipeline per blend mode and draw mode, all built from the quad shader module.
pub struct Shaders {
    pipelines: BTreeMap<(BlendMode, DrawMode), wgpu::RenderPipeline>,
}

impl Shaders {
    pub fn init(
        device: &wgpu::Device,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let module = device.create_shader_module(&wgpu::ShaderModuleDescriptor {
            label: Some("Quad Shader"),
            source: wgpu::ShaderSource::SpirV(wgpu::util::make_spirv_raw(include_bytes!(env!(
                "quad_shader.spv"
            )))),
        });
        let layout = quad_shader::pipeline::layout(device);

        let mut pipelines = BTreeMap::new();
        for blend_mode in BlendMode::ALL {
            for draw_mode in [DrawMode::Fill, DrawMode::Lines] {
                let label = format!("Quad Pipeline {:?} {:?}", blend_mode, draw_mode);
                debug!("Creating {}", label);
                let pipeline = create_render_pipeline(
                    device,
                    &label,
                    &layout,
                    &module,
                    color_format,
                    depth_format,
                    blend_mode,
                    draw_mode,
                );
                pipelines.insert((blend_mode, draw_mode), pipeline);
            }
        }

        Self { pipelines }
    }

    pub fn by_mode(&self, blend_mode: BlendMode, draw_mode: DrawMode) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(&(blend_mode, draw_mode))
    }
}

#[allow(clippy::too_many_arguments)]
fn create_render_pipeline(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    blend_mode: BlendMode,
    draw_mode: DrawMode,
) -> wgpu::RenderPipeline {
    let topology = match draw_mode {
        DrawMode::Fill => wgpu::PrimitiveTopology::TriangleList,
        DrawMode::Lines => wgpu::PrimitiveTopology::LineList,
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: "main_vs",
            buffers: &[QuadVertex::desc()],
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: blend_mode.fragment_entry_point(),
            targets: &[wgpu::ColorTargetState {
                format: color_format,
                blend: Some(blend_mode.blend_state().into()),
                write_mask: wgpu::ColorWrites::ALL,
            }],
        }),
        primitive: wgpu::PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
            unclipped_depth: false,
        },
        depth_stencil: depth_format.map(|format| wgpu::DepthStencilState {
            format,
            depth_write_enabled: true,
            // Equal depth keeps configuration order
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
    })
}
