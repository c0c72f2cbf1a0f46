// Shader programs and their uniform state

use std::path::Path;

use glam::{Mat4, Vec3};

use super::model::{ModelVertex, PositionVertex};
use super::texture::DEPTH_FORMAT;
use super::{DepthFunc, ShaderKind};
use crate::error::RenderError;

/// Remaps OpenGL clip-space depth ([-1, 1]) to the [0, 1] range wgpu expects.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Mat4 = Mat4::from_cols_array(&[
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
]);

// Uniform block layout shared by every shader program
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Uniforms {
    model: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    camera_pos: [f32; 4],
}

/// Named uniform values of one program, kept between frames like GL
/// program state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UniformState {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    pub camera_pos: Vec3,
    /// Texture unit the cubemap sampler reads from.
    pub skybox_unit: i32,
}

impl Default for UniformState {
    fn default() -> Self {
        Self {
            model: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            camera_pos: Vec3::ZERO,
            skybox_unit: 0,
        }
    }
}

impl UniformState {
    /// Returns false for names the program does not declare.
    pub fn set_mat4(&mut self, name: &str, value: Mat4) -> bool {
        match name {
            "model" => self.model = value,
            "view" => self.view = value,
            "projection" => self.projection = value,
            _ => return false,
        }
        true
    }

    pub fn set_vec3(&mut self, name: &str, value: Vec3) -> bool {
        match name {
            "cameraPos" => self.camera_pos = value,
            _ => return false,
        }
        true
    }

    pub fn set_int(&mut self, name: &str, value: i32) -> bool {
        match name {
            "skybox" => self.skybox_unit = value,
            _ => return false,
        }
        true
    }

    /// Pack for upload, converting the projection to wgpu's depth range.
    pub fn to_uniforms(&self) -> Uniforms {
        Uniforms {
            model: self.model.to_cols_array_2d(),
            view: self.view.to_cols_array_2d(),
            projection: (OPENGL_TO_WGPU_MATRIX * self.projection).to_cols_array_2d(),
            camera_pos: self.camera_pos.extend(1.0).to_array(),
        }
    }
}

/// A compiled program with one pipeline per depth comparison.
pub struct ShaderProgram {
    pub name: String,
    pub kind: ShaderKind,
    pub uniforms: UniformState,
    less: wgpu::RenderPipeline,
    less_equal: wgpu::RenderPipeline,
}

impl ShaderProgram {
    /// Read and compile `path`. Any validation error is fatal.
    pub fn load(
        device: &wgpu::Device,
        layout: &wgpu::PipelineLayout,
        surface_format: wgpu::TextureFormat,
        name: &str,
        path: &Path,
        kind: ShaderKind,
    ) -> Result<Self, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|source| RenderError::ShaderSource {
            name: name.to_string(),
            path: path.to_path_buf(),
            source,
        })?;

        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });
        let less = create_pipeline(device, layout, &module, surface_format, name, kind, DepthFunc::Less);
        let less_equal = create_pipeline(device, layout, &module, surface_format, name, kind, DepthFunc::LessEqual);
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(RenderError::ShaderCompile {
                name: name.to_string(),
                message: error.to_string(),
            });
        }

        log::info!("Compiled shader `{}` from {}", name, path.display());
        Ok(Self {
            name: name.to_string(),
            kind,
            uniforms: UniformState::default(),
            less,
            less_equal,
        })
    }

    pub fn pipeline(&self, depth: DepthFunc) -> &wgpu::RenderPipeline {
        match depth {
            DepthFunc::Less => &self.less,
            DepthFunc::LessEqual => &self.less_equal,
        }
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    module: &wgpu::ShaderModule,
    surface_format: wgpu::TextureFormat,
    name: &str,
    kind: ShaderKind,
    depth: DepthFunc,
) -> wgpu::RenderPipeline {
    let vertex_layout = match kind {
        ShaderKind::Skybox => PositionVertex::layout(),
        ShaderKind::Reflective | ShaderKind::Textured => ModelVertex::layout(),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{name} Pipeline ({depth:?})")),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module,
            entry_point: "vs_main",
            buffers: &[vertex_layout],
        },
        fragment: Some(wgpu::FragmentState {
            module,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: depth.into(),
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
