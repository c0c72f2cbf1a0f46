// Recording graphics context for tests

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};

use super::{
    CubemapId, DepthFunc, GraphicsContext, MeshId, ModelId, ResourceLoader, ShaderId, ShaderKind,
};
use crate::error::{AssetError, RenderError};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Clear([f32; 4]),
    DepthFunc(DepthFunc),
    UseShader(ShaderId),
    Mat4(String, Mat4),
    Vec3(String, Vec3),
    Int(String, i32),
    BindCubemap(u32, CubemapId),
    DrawArrays {
        shader: Option<ShaderId>,
        mesh: MeshId,
        vertex_count: u32,
        depth: DepthFunc,
    },
    DrawModel {
        shader: Option<ShaderId>,
        model: ModelId,
        depth: DepthFunc,
    },
    Present,
}

/// Records every context call instead of talking to a GPU.
#[derive(Debug, Default)]
pub struct RecordingContext {
    pub calls: Vec<Call>,
    pub shaders: Vec<(String, PathBuf, ShaderKind)>,
    pub models: Vec<PathBuf>,
    pub meshes: Vec<(String, usize)>,
    pub cubemaps: Vec<[PathBuf; 6]>,
    pub broken_model: Option<PathBuf>,
    pub broken_shader: Option<String>,
    depth: DepthFunc,
    current: Option<ShaderId>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shader_named(&self, name: &str) -> Option<ShaderId> {
        self.shaders.iter().position(|(n, _, _)| n == name).map(ShaderId)
    }

    /// Uniform values set on the shader bound right before the `draw_index`th draw.
    pub fn mat4_before_draw(&self, draw_index: usize, name: &str) -> Option<Mat4> {
        let draw_pos = self
            .calls
            .iter()
            .enumerate()
            .filter(|(_, call)| matches!(call, Call::DrawArrays { .. } | Call::DrawModel { .. }))
            .nth(draw_index)?
            .0;
        self.calls[..draw_pos].iter().rev().find_map(|call| match call {
            Call::Mat4(n, m) if n == name => Some(*m),
            _ => None,
        })
    }

    pub fn draws(&self) -> Vec<&Call> {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::DrawArrays { .. } | Call::DrawModel { .. }))
            .collect()
    }
}

impl GraphicsContext for RecordingContext {
    fn clear(&mut self, color: [f32; 4]) {
        self.calls.push(Call::Clear(color));
    }

    fn depth_func(&self) -> DepthFunc {
        self.depth
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.depth = func;
        self.calls.push(Call::DepthFunc(func));
    }

    fn use_shader(&mut self, shader: ShaderId) {
        self.current = Some(shader);
        self.calls.push(Call::UseShader(shader));
    }

    fn set_mat4(&mut self, name: &str, value: Mat4) {
        self.calls.push(Call::Mat4(name.to_string(), value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.calls.push(Call::Vec3(name.to_string(), value));
    }

    fn set_int(&mut self, name: &str, value: i32) {
        self.calls.push(Call::Int(name.to_string(), value));
    }

    fn bind_cubemap(&mut self, unit: u32, cubemap: CubemapId) {
        self.calls.push(Call::BindCubemap(unit, cubemap));
    }

    fn draw_arrays(&mut self, mesh: MeshId, vertex_count: u32) {
        self.calls.push(Call::DrawArrays {
            shader: self.current,
            mesh,
            vertex_count,
            depth: self.depth,
        });
    }

    fn draw_model(&mut self, model: ModelId) {
        self.calls.push(Call::DrawModel {
            shader: self.current,
            model,
            depth: self.depth,
        });
    }

    fn present(&mut self) {
        self.calls.push(Call::Present);
    }
}

impl ResourceLoader for RecordingContext {
    fn load_shader(&mut self, name: &str, path: &Path, kind: ShaderKind) -> Result<ShaderId, RenderError> {
        if self.broken_shader.as_deref() == Some(name) {
            return Err(RenderError::ShaderCompile {
                name: name.to_string(),
                message: "expected `;`".to_string(),
            });
        }
        self.shaders.push((name.to_string(), path.to_path_buf(), kind));
        Ok(ShaderId(self.shaders.len() - 1))
    }

    fn load_model(&mut self, path: &Path) -> Result<ModelId, AssetError> {
        if self.broken_model.as_deref() == Some(path) {
            return Err(AssetError::Model {
                path: path.to_path_buf(),
                source: tobj::LoadError::OpenFileFailed,
            });
        }
        self.models.push(path.to_path_buf());
        Ok(ModelId(self.models.len() - 1))
    }

    fn create_mesh(&mut self, label: &str, positions: &[f32]) -> MeshId {
        self.meshes.push((label.to_string(), positions.len()));
        MeshId(self.meshes.len() - 1)
    }

    fn load_cubemap(&mut self, faces: &[PathBuf; 6]) -> CubemapId {
        self.cubemaps.push(faces.clone());
        CubemapId(self.cubemaps.len() - 1)
    }
}
