// Graphics context abstraction for Penguin World
//
// The frame pipeline talks to the GPU through `GraphicsContext`: bind a
// shader, set named uniforms on it, flip the depth comparison, bind a cubemap,
// draw. `ResourceLoader` covers startup loading of shaders, meshes and textures.

use std::path::{Path, PathBuf};

use glam::{Mat4, Vec3};

use crate::error::{AssetError, RenderError};

pub mod model;
pub mod shader;
pub mod texture;
pub mod wgpu_context;

#[cfg(test)]
pub mod recording;

pub use wgpu_context::WgpuContext;

/// Handle to a compiled shader program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderId(pub(crate) usize);

/// Handle to a loaded model (one or more textured meshes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModelId(pub(crate) usize);

/// Handle to a bare position-only vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub(crate) usize);

/// Handle to a cubemap texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubemapId(pub(crate) usize);

/// Depth comparison used by subsequent draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    #[default]
    Less,
    LessEqual,
}

impl From<DepthFunc> for wgpu::CompareFunction {
    fn from(func: DepthFunc) -> Self {
        match func {
            DepthFunc::Less => wgpu::CompareFunction::Less,
            DepthFunc::LessEqual => wgpu::CompareFunction::LessEqual,
        }
    }
}

/// What a shader program expects as vertex input and texture binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    /// Position-only cube sampled with a cubemap.
    Skybox,
    /// Model meshes reflecting a cubemap environment.
    Reflective,
    /// Model meshes sampled with their own diffuse texture.
    Textured,
}

pub trait GraphicsContext {
    fn clear(&mut self, color: [f32; 4]);

    fn depth_func(&self) -> DepthFunc;

    fn set_depth_func(&mut self, func: DepthFunc);

    /// Make `shader` the target of uniform setters and draws.
    fn use_shader(&mut self, shader: ShaderId);

    fn set_mat4(&mut self, name: &str, value: Mat4);

    fn set_vec3(&mut self, name: &str, value: Vec3);

    fn set_int(&mut self, name: &str, value: i32);

    fn bind_cubemap(&mut self, unit: u32, cubemap: CubemapId);

    /// Draw `vertex_count` non-indexed vertices from `mesh`.
    fn draw_arrays(&mut self, mesh: MeshId, vertex_count: u32);

    /// Draw every mesh of `model`, each with its own material textures.
    fn draw_model(&mut self, model: ModelId);

    /// Finish the frame and show it.
    fn present(&mut self);
}

pub trait ResourceLoader {
    /// Compile a shader program. Compile failures are fatal.
    fn load_shader(&mut self, name: &str, path: &Path, kind: ShaderKind) -> Result<ShaderId, RenderError>;

    /// Load a model file. A missing or corrupt file is fatal.
    fn load_model(&mut self, path: &Path) -> Result<ModelId, AssetError>;

    /// Upload tightly packed xyz positions.
    fn create_mesh(&mut self, label: &str, positions: &[f32]) -> MeshId;

    /// Assemble a cubemap from faces in +X, -X, +Y, -Y, +Z, -Z order. Faces
    /// that fail to decode are left blank.
    fn load_cubemap(&mut self, faces: &[PathBuf; 6]) -> CubemapId;
}
