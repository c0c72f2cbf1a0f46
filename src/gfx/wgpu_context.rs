// wgpu implementation of the graphics context

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::{Mat4, Vec3};
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use super::model::{texture_bind_group, Model, ModelData, PositionVertex};
use super::shader::{ShaderProgram, Uniforms};
use super::texture::{CubemapFaces, Texture};
use super::{
    CubemapId, DepthFunc, GraphicsContext, MeshId, ModelId, ResourceLoader, ShaderId, ShaderKind,
};
use crate::error::{AssetError, RenderError};

const UNIFORM_SIZE: u64 = std::mem::size_of::<Uniforms>() as u64;
/// Draw slots allocated up front; the buffer grows past this on demand.
const INITIAL_UNIFORM_SLOTS: usize = 64;

/// Round `size` up to a multiple of `alignment`.
pub fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

struct Layouts {
    uniforms: wgpu::BindGroupLayout,
    texture_2d: wgpu::BindGroupLayout,
    cubemap: wgpu::BindGroupLayout,
    textured_pipeline: wgpu::PipelineLayout,
    cubemap_pipeline: wgpu::PipelineLayout,
}

impl Layouts {
    fn new(device: &wgpu::Device) -> Self {
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Uniform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        let texture_layout = |label, view_dimension| {
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(label),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            })
        };
        let texture_2d = texture_layout("Texture Bind Group Layout", wgpu::TextureViewDimension::D2);
        let cubemap = texture_layout("Cubemap Bind Group Layout", wgpu::TextureViewDimension::Cube);

        let textured_pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Textured Pipeline Layout"),
            bind_group_layouts: &[&uniforms, &texture_2d],
            push_constant_ranges: &[],
        });
        let cubemap_pipeline = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Cubemap Pipeline Layout"),
            bind_group_layouts: &[&uniforms, &cubemap],
            push_constant_ranges: &[],
        });

        Self {
            uniforms,
            texture_2d,
            cubemap,
            textured_pipeline,
            cubemap_pipeline,
        }
    }

    fn pipeline_for(&self, kind: ShaderKind) -> &wgpu::PipelineLayout {
        match kind {
            ShaderKind::Textured => &self.textured_pipeline,
            ShaderKind::Skybox | ShaderKind::Reflective => &self.cubemap_pipeline,
        }
    }
}

/// Per-draw uniform snapshots for one frame, addressed by dynamic offset.
struct FrameUniforms {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    stride: u64,
    capacity: usize,
    staging: Vec<u8>,
}

impl FrameUniforms {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, stride: u64, capacity: usize) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Uniform Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(UNIFORM_SIZE),
                }),
            }],
        });
        Self {
            buffer,
            bind_group,
            stride,
            capacity,
            staging: Vec::with_capacity(stride as usize * capacity),
        }
    }

    fn push(&mut self, uniforms: &Uniforms) -> u32 {
        let offset = self.staging.len();
        self.staging.extend_from_slice(bytemuck::bytes_of(uniforms));
        self.staging.resize(offset + self.stride as usize, 0);
        offset as u32
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, layout: &wgpu::BindGroupLayout) {
        let slots = self.staging.len() / self.stride as usize;
        if slots > self.capacity {
            let staging = std::mem::take(&mut self.staging);
            *self = Self::new(device, layout, self.stride, slots.next_power_of_two());
            self.staging = staging;
            log::debug!("Grew uniform buffer to {} draws", self.capacity);
        }
        if !self.staging.is_empty() {
            queue.write_buffer(&self.buffer, 0, &self.staging);
        }
    }

    fn reset(&mut self) {
        self.staging.clear();
    }
}

struct PositionMesh {
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

struct Cubemap {
    _texture: Texture,
    bind_group: wgpu::BindGroup,
}

#[derive(Debug, Clone, Copy)]
enum DrawSource {
    Arrays { mesh: MeshId, vertex_count: u32 },
    Model(ModelId),
}

#[derive(Debug, Clone, Copy)]
struct RecordedDraw {
    shader: ShaderId,
    depth: DepthFunc,
    uniform_offset: u32,
    cubemap: Option<CubemapId>,
    source: DrawSource,
}

/// GPU context for one window. Draws issued during a frame are recorded and
/// encoded into a single render pass by [`GraphicsContext::present`].
pub struct WgpuContext {
    clear_color: Option<wgpu::Color>,
    depth_func: DepthFunc,
    current_shader: Option<ShaderId>,
    bound_cubemaps: HashMap<u32, CubemapId>,
    draws: Vec<RecordedDraw>,
    uniforms: FrameUniforms,

    shaders: Vec<ShaderProgram>,
    models: Vec<Model>,
    meshes: Vec<PositionMesh>,
    cubemaps: Vec<Cubemap>,
    blank_cubemap: Cubemap,
    depth_view: wgpu::TextureView,
    layouts: Layouts,

    config: wgpu::SurfaceConfiguration,
    surface: wgpu::Surface<'static>,
    queue: wgpu::Queue,
    device: wgpu::Device,
    window: Arc<Window>,
}

impl WgpuContext {
    pub async fn new(window: Arc<Window>) -> Result<Self, RenderError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("Using adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Renderer Device"),
                    required_features: wgpu::Features::default(),
                    required_limits: wgpu::Limits::default(),
                },
                None, // Trace path
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first().copied())
            .ok_or(RenderError::NoAdapter)?;

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            // vsync paces the loop
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let layouts = Layouts::new(&device);
        let stride = align_to(
            UNIFORM_SIZE,
            device.limits().min_uniform_buffer_offset_alignment as u64,
        );
        let uniforms = FrameUniforms::new(&device, &layouts.uniforms, stride, INITIAL_UNIFORM_SLOTS);
        let depth_view = Texture::depth_view(&device, config.width, config.height);

        let blank_faces = CubemapFaces {
            width: 1,
            height: 1,
            faces: Default::default(),
        };
        let blank_texture = Texture::cubemap(&device, &queue, &blank_faces);
        let blank_cubemap = Cubemap {
            bind_group: texture_bind_group(&device, &layouts.cubemap, &blank_texture),
            _texture: blank_texture,
        };

        Ok(Self {
            clear_color: None,
            depth_func: DepthFunc::Less,
            current_shader: None,
            bound_cubemaps: HashMap::new(),
            draws: Vec::new(),
            uniforms,
            shaders: Vec::new(),
            models: Vec::new(),
            meshes: Vec::new(),
            cubemaps: Vec::new(),
            blank_cubemap,
            depth_view,
            layouts,
            config,
            surface,
            queue,
            device,
            window,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = Texture::depth_view(&self.device, new_size.width, new_size.height);
    }

    fn current_program(&mut self) -> Option<&mut ShaderProgram> {
        let id = self.current_shader?;
        self.shaders.get_mut(id.0)
    }

    fn record(&mut self, source: DrawSource) {
        let Some(shader_id) = self.current_shader else {
            log::warn!("Draw issued with no shader bound");
            return;
        };
        let Some(shader) = self.shaders.get(shader_id.0) else {
            return;
        };

        let compatible = match source {
            DrawSource::Arrays { .. } => shader.kind == ShaderKind::Skybox,
            DrawSource::Model(_) => shader.kind != ShaderKind::Skybox,
        };
        if !compatible {
            log::debug!("Shader `{}` cannot draw {:?}", shader.name, source);
            return;
        }

        let cubemap = u32::try_from(shader.uniforms.skybox_unit)
            .ok()
            .and_then(|unit| self.bound_cubemaps.get(&unit).copied());
        let uniform_offset = self.uniforms.push(&shader.uniforms.to_uniforms());

        self.draws.push(RecordedDraw {
            shader: shader_id,
            depth: self.depth_func,
            uniform_offset,
            cubemap,
            source,
        });
    }

    fn cubemap_bind_group(&self, cubemap: Option<CubemapId>) -> &wgpu::BindGroup {
        cubemap
            .and_then(|id| self.cubemaps.get(id.0))
            .map_or(&self.blank_cubemap.bind_group, |cubemap| &cubemap.bind_group)
    }

    fn encode_draw<'a>(&'a self, render_pass: &mut wgpu::RenderPass<'a>, draw: &RecordedDraw) {
        let Some(shader) = self.shaders.get(draw.shader.0) else {
            return;
        };

        render_pass.set_pipeline(shader.pipeline(draw.depth));
        render_pass.set_bind_group(0, &self.uniforms.bind_group, &[draw.uniform_offset]);

        match draw.source {
            DrawSource::Arrays { mesh, vertex_count } => {
                let Some(mesh) = self.meshes.get(mesh.0) else {
                    return;
                };
                render_pass.set_bind_group(1, self.cubemap_bind_group(draw.cubemap), &[]);
                render_pass.set_vertex_buffer(0, mesh.buffer.slice(..));
                render_pass.draw(0..vertex_count.min(mesh.vertex_count), 0..1);
            }
            DrawSource::Model(model) => {
                let Some(model) = self.models.get(model.0) else {
                    return;
                };
                for mesh in &model.meshes {
                    let textures = match shader.kind {
                        ShaderKind::Textured => &model.textures[mesh.texture],
                        _ => self.cubemap_bind_group(draw.cubemap),
                    };
                    render_pass.set_bind_group(1, textures, &[]);
                    render_pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
                    render_pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                    render_pass.draw_indexed(0..mesh.index_count, 0, 0..1);
                }
            }
        }
    }

    fn discard_frame(&mut self) {
        self.draws.clear();
        self.uniforms.reset();
        self.clear_color = None;
    }
}

impl GraphicsContext for WgpuContext {
    fn clear(&mut self, color: [f32; 4]) {
        let [r, g, b, a] = color.map(f64::from);
        self.clear_color = Some(wgpu::Color { r, g, b, a });
    }

    fn depth_func(&self) -> DepthFunc {
        self.depth_func
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.depth_func = func;
    }

    fn use_shader(&mut self, shader: ShaderId) {
        self.current_shader = Some(shader);
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        if let Some(program) = self.current_program() {
            if !program.uniforms.set_mat4(name, value) {
                log::trace!("Shader `{}` has no mat4 uniform `{}`", program.name, name);
            }
        }
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        if let Some(program) = self.current_program() {
            if !program.uniforms.set_vec3(name, value) {
                log::trace!("Shader `{}` has no vec3 uniform `{}`", program.name, name);
            }
        }
    }

    fn set_int(&mut self, name: &str, value: i32) {
        if let Some(program) = self.current_program() {
            if !program.uniforms.set_int(name, value) {
                log::trace!("Shader `{}` has no int uniform `{}`", program.name, name);
            }
        }
    }

    fn bind_cubemap(&mut self, unit: u32, cubemap: CubemapId) {
        self.bound_cubemaps.insert(unit, cubemap);
    }

    fn draw_arrays(&mut self, mesh: MeshId, vertex_count: u32) {
        self.record(DrawSource::Arrays { mesh, vertex_count });
    }

    fn draw_model(&mut self, model: ModelId) {
        self.record(DrawSource::Model(model));
    }

    fn present(&mut self) {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.resize(self.window.inner_size());
                self.discard_frame();
                return;
            }
            Err(error) => {
                log::warn!("Dropping frame: {error}");
                self.discard_frame();
                return;
            }
        };

        self.uniforms.upload(&self.device, &self.queue, &self.layouts.uniforms);
        let draws = std::mem::take(&mut self.draws);
        let (color_load, depth_load) = match self.clear_color.take() {
            Some(color) => (wgpu::LoadOp::Clear(color), wgpu::LoadOp::Clear(1.0)),
            None => (wgpu::LoadOp::Load, wgpu::LoadOp::Load),
        };

        let view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Render Encoder"),
        });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: depth_load,
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            for draw in &draws {
                self.encode_draw(&mut render_pass, draw);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();

        self.uniforms.reset();
        self.draws = draws;
        self.draws.clear();
    }
}

impl ResourceLoader for WgpuContext {
    fn load_shader(&mut self, name: &str, path: &Path, kind: ShaderKind) -> Result<ShaderId, RenderError> {
        let program = ShaderProgram::load(
            &self.device,
            self.layouts.pipeline_for(kind),
            self.config.format,
            name,
            path,
            kind,
        )?;
        self.shaders.push(program);
        Ok(ShaderId(self.shaders.len() - 1))
    }

    fn load_model(&mut self, path: &Path) -> Result<ModelId, AssetError> {
        let data = ModelData::load(path)?;
        let model = Model::upload(&self.device, &self.queue, &self.layouts.texture_2d, &data);
        self.models.push(model);
        Ok(ModelId(self.models.len() - 1))
    }

    fn create_mesh(&mut self, label: &str, positions: &[f32]) -> MeshId {
        let vertices: Vec<PositionVertex> = positions
            .chunks_exact(3)
            .map(|p| PositionVertex {
                position: [p[0], p[1], p[2]],
            })
            .collect();
        let buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.meshes.push(PositionMesh {
            buffer,
            vertex_count: vertices.len() as u32,
        });
        MeshId(self.meshes.len() - 1)
    }

    fn load_cubemap(&mut self, faces: &[PathBuf; 6]) -> CubemapId {
        let faces = CubemapFaces::load(faces);
        let texture = Texture::cubemap(&self.device, &self.queue, &faces);
        self.cubemaps.push(Cubemap {
            bind_group: texture_bind_group(&self.device, &self.layouts.cubemap, &texture),
            _texture: texture,
        });
        CubemapId(self.cubemaps.len() - 1)
    }
}
