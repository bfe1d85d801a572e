use std::num::NonZeroU32;

use image::RgbaImage;
use log::debug;

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: wgpu::Extent3d,
}

impl Texture {
    pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: Option<&str>,
    ) -> Self {
        Self::from_layers(
            device,
            queue,
            std::slice::from_ref(img),
            label,
            wgpu::TextureViewDimension::D2,
        )
    }

    /// All layers must have the same dimensions, scene loading checks this.
    pub fn array_from_images(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layers: &[RgbaImage],
        label: Option<&str>,
    ) -> Self {
        Self::from_layers(
            device,
            queue,
            layers,
            label,
            wgpu::TextureViewDimension::D2Array,
        )
    }

    fn from_layers(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layers: &[RgbaImage],
        label: Option<&str>,
        view_dimension: wgpu::TextureViewDimension,
    ) -> Self {
        let (width, height) = layers.first().map(|l| l.dimensions()).unwrap_or((1, 1));
        debug!(
            "Creating {:?} texture {:?} {}x{} with {} layers",
            view_dimension,
            label,
            width,
            height,
            layers.len()
        );

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: layers.len().max(1) as u32,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            // Texels are fed to the blend math as stored, without sRGB decoding
            format: Self::COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        });

        for (layer, rgba) in layers.iter().enumerate() {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                rgba,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: NonZeroU32::new(4 * width),
                    rows_per_image: NonZeroU32::new(height),
                },
                wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(view_dimension),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self {
            texture,
            view,
            sampler,
            size,
        }
    }

    /// 1x1 transparent texture bound to whichever slot a draw call doesn't sample.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, array: bool) -> Self {
        let transparent_image = RgbaImage::new(1, 1);
        if array {
            Self::array_from_images(
                device,
                queue,
                &[transparent_image],
                Some("Transparent 1x1 texture array"),
            )
        } else {
            Self::from_image(
                device,
                queue,
                &transparent_image,
                Some("Transparent 1x1 texture"),
            )
        }
    }
}

/// Depth attachment of the render pass, never sampled.
pub struct DepthTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl DepthTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: config.width,
                height: config.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self { texture, view }
    }
}

/// Bind group for set 1: the flat texture and the texture array.
pub fn create_texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    flat: &Texture,
    array: &Texture,
    label: Option<&str>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label,
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: shared::FLAT_TEXTURE_BINDING,
                resource: wgpu::BindingResource::TextureView(&flat.view),
            },
            wgpu::BindGroupEntry {
                binding: shared::FLAT_SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(&flat.sampler),
            },
            wgpu::BindGroupEntry {
                binding: shared::ARRAY_TEXTURE_BINDING,
                resource: wgpu::BindingResource::TextureView(&array.view),
            },
            wgpu::BindGroupEntry {
                binding: shared::ARRAY_SAMPLER_BINDING,
                resource: wgpu::BindingResource::Sampler(&array.sampler),
            },
        ],
    })
}
