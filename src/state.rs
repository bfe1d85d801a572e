use std::collections::BTreeMap;

use anyhow::{Context, Result};
use log::{debug, info, warn};
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use winit::window::Window;

use crate::blend::BlendMode;
use crate::draw::{DrawCall, DrawMode, QuadUniformRaw, TextureBinding};
use crate::font::FontRenderer;
use crate::projection;
use crate::scene::SceneConfig;
use crate::shaders::Shaders;
use crate::texture::{self, DepthTexture, Texture};

/// GPU resources of a single draw call.
struct PreparedDraw {
    blend_mode: BlendMode,
    draw_mode: DrawMode,
    use_texture_array: bool,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    num_indices: u32,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_bind_group: wgpu::BindGroup,
}

struct SceneTextures {
    flat: BTreeMap<String, Texture>,
    arrays: BTreeMap<String, Texture>,
    placeholder: Texture,
    placeholder_array: Texture,
}

impl SceneTextures {
    /// The unused slot gets a placeholder, both slots are always bound.
    fn slots(&self, binding: &TextureBinding) -> (&Texture, &Texture) {
        match binding {
            TextureBinding::Flat(name) => (
                self.flat.get(name).unwrap_or(&self.placeholder),
                &self.placeholder_array,
            ),
            TextureBinding::Array(name) => (
                &self.placeholder,
                self.arrays.get(name).unwrap_or(&self.placeholder_array),
            ),
        }
    }
}

pub struct State {
    pub size: winit::dpi::PhysicalSize<u32>,
    surface: wgpu::Surface,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_texture: DepthTexture,
    shaders: Shaders,
    clear_color: wgpu::Color,
    // Kept alive for the bind groups referencing them
    _textures: SceneTextures,
    draws: Vec<PreparedDraw>,
}

impl State {
    // Creating some of the wgpu types requires async code
    pub async fn new(window: &Window, scene: &SceneConfig) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(wgpu::Backends::all());
        let surface = unsafe { instance.create_surface(window) };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No compatible graphics adapter")?;

        info!("Adapter info: {:?}", adapter.get_info());
        debug!("Adapter features: {:?}", adapter.features());

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    features: wgpu::Features::empty(),
                    limits: wgpu::Limits::default(),
                    label: None,
                },
                None,
            )
            .await
            .context("Failed to request device")?;

        info!("Device limits: {:?}", device.limits());

        let format = surface
            .get_preferred_format(&adapter)
            .context("Surface is incompatible with the adapter")?;
        info!("Surface format: {:?}", format);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
        };
        surface.configure(&device, &config);

        let depth_texture = DepthTexture::new(&device, &config, "Depth Texture");
        let shaders = Shaders::init(&device, config.format, Some(DepthTexture::FORMAT));

        // TEXTURES

        let images = scene.load_images().context("Failed to load scene textures")?;
        let mut textures = SceneTextures {
            flat: images
                .flat
                .iter()
                .map(|(name, image)| {
                    let texture = Texture::from_image(&device, &queue, image, Some(name));
                    (name.clone(), texture)
                })
                .collect(),
            arrays: images
                .arrays
                .iter()
                .map(|(name, layers)| {
                    let texture = Texture::array_from_images(&device, &queue, layers, Some(name));
                    (name.clone(), texture)
                })
                .collect(),
            placeholder: Texture::placeholder(&device, &queue, false),
            placeholder_array: Texture::placeholder(&device, &queue, true),
        };

        // DRAW CALLS

        let transform = projection::ortho_bottom_left(
            config.width as f32,
            config.height as f32,
            -1.0,
            1.0,
        );
        let mut draw_calls = scene
            .build_draw_calls(config.width as f32, config.height as f32)
            .context("Failed to build draw calls")?;

        match (&scene.font, scene.labels.is_empty()) {
            (_, true) => {}
            (None, false) => warn!(
                "Scene has {} labels but no font, skipping them",
                scene.labels.len()
            ),
            (Some(font), false) => {
                let font_path = scene.base_dir.join(font);
                let font = FontRenderer::load(&font_path)
                    .with_context(|| format!("Failed to load font {:?}", font_path))?;
                for (i, label) in scene.labels.iter().enumerate() {
                    let name = format!("label:{}", i);
                    let (image, draw_call) = font.label(label, &name, transform);
                    let texture = Texture::from_image(&device, &queue, &image, Some(&name));
                    textures.flat.insert(name, texture);
                    draw_calls.push(draw_call);
                }
            }
        }

        let uniform_layout =
            device.create_bind_group_layout(&shared::wgpu::uniform_bind_group_layout_desc());
        let texture_layout =
            device.create_bind_group_layout(&shared::wgpu::texture_bind_group_layout_desc());

        let draws = draw_calls
            .iter()
            .filter(|draw_call| !draw_call.indices.is_empty())
            .map(|draw_call| {
                prepare_draw(
                    &device,
                    &uniform_layout,
                    &texture_layout,
                    &textures,
                    draw_call,
                )
            })
            .collect::<Vec<_>>();
        info!("Prepared {} draw calls", draws.len());

        let [r, g, b, a] = scene.clear_color;

        Ok(Self {
            size,
            surface,
            device,
            queue,
            config,
            depth_texture,
            shaders,
            clear_color: wgpu::Color { r, g, b, a },
            _textures: textures,
            draws,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            debug!("Resizing to {}x{}", new_size.width, new_size.height);
            self.size = new_size;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = DepthTexture::new(&self.device, &self.config, "Depth Texture");

            let transform = projection::ortho_bottom_left(
                new_size.width as f32,
                new_size.height as f32,
                -1.0,
                1.0,
            );
            for draw in &self.draws {
                let uniform = QuadUniformRaw::new(transform, draw.use_texture_array);
                self.queue
                    .write_buffer(&draw.uniform_buffer, 0, bytemuck::cast_slice(&[uniform]));
            }
        }
    }

    pub fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: true,
                    },
                }],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: true,
                    }),
                    stencil_ops: None,
                }),
            });

            for draw in &self.draws {
                let pipeline = match self.shaders.by_mode(draw.blend_mode, draw.draw_mode) {
                    Some(pipeline) => pipeline,
                    None => continue,
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(shared::UNIFORM_SET, &draw.uniform_bind_group, &[]);
                render_pass.set_bind_group(shared::TEXTURE_SET, &draw.texture_bind_group, &[]);
                render_pass.set_vertex_buffer(0, draw.vertex_buffer.slice(..));
                render_pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
                render_pass.draw_indexed(0..draw.num_indices, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

fn prepare_draw(
    device: &wgpu::Device,
    uniform_layout: &wgpu::BindGroupLayout,
    texture_layout: &wgpu::BindGroupLayout,
    textures: &SceneTextures,
    draw_call: &DrawCall,
) -> PreparedDraw {
    let label = format!("{:?} {}", draw_call.blend_mode, draw_call.texture.name());

    let vertex_buffer = device.create_buffer_init(&BufferInitDescriptor {
        label: Some(&format!("Vertex Buffer {}", label)),
        contents: bytemuck::cast_slice(&draw_call.vertices),
        usage: wgpu::BufferUsages::VERTEX,
    });

    // Uint16 index data has to be padded to a multiple of 4 bytes
    let mut indices = draw_call.indices.clone();
    if indices.len() % 2 == 1 {
        indices.push(0);
    }
    let index_buffer = device.create_buffer_init(&BufferInitDescriptor {
        label: Some(&format!("Index Buffer {}", label)),
        contents: bytemuck::cast_slice(&indices),
        usage: wgpu::BufferUsages::INDEX,
    });

    let uniform_buffer = device.create_buffer_init(&BufferInitDescriptor {
        label: Some(&format!("Uniform Buffer {}", label)),
        contents: bytemuck::cast_slice(&[draw_call.uniform()]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("Uniform Bind Group {}", label)),
        layout: uniform_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }],
    });

    let (flat, array) = textures.slots(&draw_call.texture);
    let texture_bind_group = texture::create_texture_bind_group(
        device,
        texture_layout,
        flat,
        array,
        Some(&format!("Texture Bind Group {}", label)),
    );

    PreparedDraw {
        blend_mode: draw_call.blend_mode,
        draw_mode: draw_call.draw_mode,
        use_texture_array: draw_call.texture.use_texture_array(),
        vertex_buffer,
        index_buffer,
        num_indices: draw_call.indices.len() as u32,
        uniform_buffer,
        uniform_bind_group,
        texture_bind_group,
    }
}
