use crate::constants::{ALPHA_DISCARD, INITIAL_INSTANCE_CAPACITY};
use fnv::FnvHashMap;
use gallery_core::{
    Camera, CardDescriptor, CardTexture, GalleryError, MeshHandle, RenderBackend, Resource,
    SceneFrame, SurfaceHandle, TextureHandle, Viewport,
};
use web_sys as web;

mod helpers;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub const CARD_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

static CARDS_WGSL: &str = include_str!("../shaders/cards.wgsl");

#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct CardUniforms {
    view_proj: [[f32; 4]; 4],
    scene: [[f32; 4]; 4],
    alpha_cutoff: f32,
    _pad: [f32; 3],
}

/// One card quad, read per instance by the vertex shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub(crate) struct CardInstance {
    center: [f32; 3],
    size: [f32; 2],
    orientation: [f32; 4],
}

impl From<&CardDescriptor> for CardInstance {
    fn from(d: &CardDescriptor) -> Self {
        Self {
            center: d.position.to_array(),
            size: [d.width, d.height],
            orientation: d.orientation.to_array(),
        }
    }
}

struct GpuTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct GpuCard {
    instance: CardInstance,
    texture: u32,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    depth: (wgpu::Texture, wgpu::TextureView),
    instances: wgpu::Buffer,
    instance_capacity: usize,
    textures: FnvHashMap<u32, GpuTexture>,
    cards: FnvHashMap<u32, GpuCard>,
    surface_handle: Option<u32>,
    next_id: u32,
    width: u32,
    height: u32,
}

impl GpuState {
    pub async fn new(canvas: &web::HtmlCanvasElement) -> anyhow::Result<Self> {
        let width = canvas.width().max(1);
        let height = canvas.height().max(1);

        let instance = wgpu::Instance::default();
        let surface = instance.create_surface(wgpu::SurfaceTarget::Canvas(canvas.clone()))?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| anyhow::anyhow!("No WebGPU adapter"))?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                    label: None,
                },
                None,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format!("request_device error: {:?}", e)))?;
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| {
                matches!(
                    f,
                    wgpu::TextureFormat::Bgra8UnormSrgb | wgpu::TextureFormat::Rgba8UnormSrgb
                )
            })
            .or_else(|| caps.formats.first().copied())
            .ok_or_else(|| anyhow::anyhow!("surface reports no formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width,
            height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("cards_shader"),
            source: wgpu::ShaderSource::Wgsl(CARDS_WGSL.into()),
        });
        let uniform_layout = helpers::uniform_layout(&device);
        let texture_layout = helpers::texture_layout(&device);
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("cards_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });
        let pipeline =
            helpers::make_card_pipeline(&device, &pipeline_layout, &shader, format, DEPTH_FORMAT);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("card_uniforms"),
            size: std::mem::size_of::<CardUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("card_uniforms_bg"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("card_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let depth = helpers::create_color_texture_device(
            &device,
            "depth",
            width,
            height,
            DEPTH_FORMAT,
            wgpu::TextureUsages::RENDER_ATTACHMENT,
        );
        let instances = helpers::create_instance_buffer(&device, INITIAL_INSTANCE_CAPACITY);

        log::info!("[gpu] surface {width}x{height} format={format:?}");
        Ok(Self {
            surface,
            device,
            queue,
            config,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            sampler,
            depth,
            instances,
            instance_capacity: INITIAL_INSTANCE_CAPACITY,
            textures: FnvHashMap::default(),
            cards: FnvHashMap::default(),
            surface_handle: None,
            next_id: 0,
            width,
            height,
        })
    }

    fn alloc_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn resize_if_needed(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.config.width = width;
            self.config.height = height;
            self.surface.configure(&self.device, &self.config);
            self.depth = helpers::create_color_texture_device(
                &self.device,
                "depth",
                width,
                height,
                DEPTH_FORMAT,
                wgpu::TextureUsages::RENDER_ATTACHMENT,
            );
        }
    }

    fn ensure_instance_capacity(&mut self, n: usize) {
        if n <= self.instance_capacity {
            return;
        }
        let capacity = n.next_power_of_two();
        self.instances = helpers::create_instance_buffer(&self.device, capacity);
        self.instance_capacity = capacity;
    }
}

impl RenderBackend for GpuState {
    fn create_surface(&mut self, viewport: Viewport) -> gallery_core::Result<SurfaceHandle> {
        self.resize_if_needed(viewport.width, viewport.height);
        let id = self.alloc_id();
        self.surface_handle = Some(id);
        Ok(SurfaceHandle(id))
    }

    fn resize_surface(&mut self, viewport: Viewport) {
        self.resize_if_needed(viewport.width, viewport.height);
    }

    fn create_texture(&mut self, texture: &CardTexture) -> gallery_core::Result<TextureHandle> {
        let (width, height, rgba): (u32, u32, &[u8]) = match texture {
            CardTexture::Image(img) => (img.width(), img.height(), img.as_raw().as_slice()),
            CardTexture::Flat(color) => (1, 1, &color[..]),
        };
        let max_side = self.device.limits().max_texture_dimension_2d;
        if width == 0 || height == 0 || width > max_side || height > max_side {
            return Err(GalleryError::backend(format!(
                "texture {width}x{height} outside 1..={max_side}"
            )));
        }
        let id = self.alloc_id();
        let (tex, view) = helpers::upload_rgba(
            &self.device,
            &self.queue,
            "card_texture",
            width,
            height,
            CARD_TEXTURE_FORMAT,
            rgba,
        );
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("card_texture_bg"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.textures.insert(
            id,
            GpuTexture {
                texture: tex,
                bind_group,
            },
        );
        Ok(TextureHandle(id))
    }

    fn create_card(
        &mut self,
        card: &CardDescriptor,
        texture: TextureHandle,
    ) -> gallery_core::Result<MeshHandle> {
        if !self.textures.contains_key(&texture.0) {
            return Err(GalleryError::backend(format!("unknown texture {}", texture.0)));
        }
        let id = self.alloc_id();
        self.cards.insert(
            id,
            GpuCard {
                instance: CardInstance::from(card),
                texture: texture.0,
            },
        );
        Ok(MeshHandle(id))
    }

    fn set_card_texture(
        &mut self,
        mesh: MeshHandle,
        texture: TextureHandle,
    ) -> gallery_core::Result<()> {
        if !self.textures.contains_key(&texture.0) {
            return Err(GalleryError::backend(format!("unknown texture {}", texture.0)));
        }
        let card = self
            .cards
            .get_mut(&mesh.0)
            .ok_or_else(|| GalleryError::backend(format!("unknown mesh {}", mesh.0)))?;
        card.texture = texture.0;
        Ok(())
    }

    fn present(&mut self, frame: &SceneFrame, camera: &Camera) -> gallery_core::Result<()> {
        let scene = frame.transform();
        let uniforms = CardUniforms {
            view_proj: camera.view_projection().to_cols_array_2d(),
            scene: scene.to_cols_array_2d(),
            alpha_cutoff: ALPHA_DISCARD,
            _pad: [0.0; 3],
        };
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        // back to front, so rounded-corner edges blend over what lies behind
        let view_from_scene = camera.view_matrix() * scene;
        let mut order: Vec<(f32, u32, CardInstance)> = self
            .cards
            .values()
            .filter(|c| self.textures.contains_key(&c.texture))
            .map(|c| {
                let z = view_from_scene
                    .transform_point3(glam::Vec3::from_array(c.instance.center))
                    .z;
                (z, c.texture, c.instance)
            })
            .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.ensure_instance_capacity(order.len());
        let packed: Vec<CardInstance> = order.iter().map(|(_, _, i)| *i).collect();
        self.queue
            .write_buffer(&self.instances, 0, bytemuck::cast_slice(&packed));

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(e @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                self.surface.configure(&self.device, &self.config);
                return Err(GalleryError::backend(format!("surface: {e}")));
            }
            Err(e) => return Err(GalleryError::backend(format!("surface: {e}"))),
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let [r, g, b] = frame.background;
        let clear = wgpu::Color {
            r: helpers::srgb_to_linear(r),
            g: helpers::srgb_to_linear(g),
            b: helpers::srgb_to_linear(b),
            a: 1.0,
        };
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("encoder"),
            });
        {
            let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("cards_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.1,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            if !order.is_empty() {
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &self.uniform_bind_group, &[]);
                rpass.set_vertex_buffer(0, self.instances.slice(..));
                for (i, (_, texture, _)) in order.iter().enumerate() {
                    let Some(tex) = self.textures.get(texture) else {
                        continue;
                    };
                    let i = i as u32;
                    rpass.set_bind_group(1, &tex.bind_group, &[]);
                    rpass.draw(0..6, i..i + 1);
                }
            }
        }
        self.queue.submit(Some(encoder.finish()));
        output.present();
        Ok(())
    }

    fn dispose(&mut self, resource: Resource) {
        match resource {
            Resource::Surface(h) => {
                if self.surface_handle == Some(h.0) {
                    self.surface_handle = None;
                }
            }
            Resource::Texture(h) => {
                if let Some(t) = self.textures.remove(&h.0) {
                    t.texture.destroy();
                }
            }
            Resource::Mesh(h) => {
                self.cards.remove(&h.0);
            }
        }
    }
}
