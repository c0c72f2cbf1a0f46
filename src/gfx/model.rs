// Model loading: Wavefront OBJ meshes with diffuse textures

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use wgpu::util::DeviceExt;

use super::texture::Texture;
use crate::error::AssetError;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub tex_coords: [f32; 2],
}

impl ModelVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ModelVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Vertex of a bare position-only mesh such as the skybox cube.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

impl PositionVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PositionVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Interleave a tobj mesh. Missing normals or texture coordinates are zeroed.
pub fn interleave(mesh: &tobj::Mesh) -> Vec<ModelVertex> {
    (0..mesh.positions.len() / 3)
        .map(|i| ModelVertex {
            position: [
                mesh.positions[i * 3],
                mesh.positions[i * 3 + 1],
                mesh.positions[i * 3 + 2],
            ],
            normal: if mesh.normals.len() >= (i + 1) * 3 {
                [mesh.normals[i * 3], mesh.normals[i * 3 + 1], mesh.normals[i * 3 + 2]]
            } else {
                [0.0; 3]
            },
            tex_coords: if mesh.texcoords.len() >= (i + 1) * 2 {
                [mesh.texcoords[i * 2], mesh.texcoords[i * 2 + 1]]
            } else {
                [0.0; 2]
            },
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct MeshData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// Index into [`ModelData::diffuse_textures`].
    pub material: Option<usize>,
}

/// CPU-side contents of a model file.
#[derive(Debug, Clone)]
pub struct ModelData {
    pub path: PathBuf,
    pub meshes: Vec<MeshData>,
    /// Diffuse texture path per material, resolved next to the model file.
    pub diffuse_textures: Vec<Option<PathBuf>>,
}

impl ModelData {
    pub fn load(path: &Path) -> Result<Self, AssetError> {
        let (models, materials) =
            tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS).map_err(|source| AssetError::Model {
                path: path.to_path_buf(),
                source,
            })?;

        let materials = materials.unwrap_or_else(|error| {
            log::warn!("Materials for {} failed to load: {error}", path.display());
            Vec::new()
        });

        let directory = path.parent().unwrap_or_else(|| Path::new(""));
        let diffuse_textures = materials
            .iter()
            .map(|material| {
                material
                    .diffuse_texture
                    .as_ref()
                    .map(|texture| directory.join(texture))
            })
            .collect();

        let meshes = models
            .into_iter()
            .map(|model| MeshData {
                vertices: interleave(&model.mesh),
                material: model.mesh.material_id.filter(|&id| id < materials.len()),
                indices: model.mesh.indices,
                name: model.name,
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            meshes,
            diffuse_textures,
        })
    }
}

pub struct GpuMesh {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    /// Index into [`Model::textures`].
    pub texture: usize,
}

/// Uploaded model: meshes plus the texture bind groups they reference.
pub struct Model {
    pub meshes: Vec<GpuMesh>,
    pub textures: Vec<wgpu::BindGroup>,
}

impl Model {
    pub fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture_layout: &wgpu::BindGroupLayout,
        data: &ModelData,
    ) -> Self {
        let mut textures = Vec::new();
        let mut by_path: HashMap<Option<&Path>, usize> = HashMap::new();

        let mut meshes = Vec::with_capacity(data.meshes.len());
        for mesh in data.meshes.iter().filter(|mesh| !mesh.indices.is_empty()) {
            let diffuse = mesh
                .material
                .and_then(|id| data.diffuse_textures.get(id))
                .and_then(|texture| texture.as_deref());

            let texture = *by_path.entry(diffuse).or_insert_with(|| {
                let texture = match diffuse {
                    Some(path) => Texture::load_2d(device, queue, path),
                    None => Texture::blank_2d(device, queue),
                };
                textures.push(texture_bind_group(device, texture_layout, &texture));
                textures.len() - 1
            });

            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Vertex Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{} Index Buffer", mesh.name)),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

            meshes.push(GpuMesh {
                vertex_buffer,
                index_buffer,
                index_count: mesh.indices.len() as u32,
                texture,
            });
        }

        log::info!(
            "Loaded model {} ({} meshes, {} textures)",
            data.path.display(),
            meshes.len(),
            textures.len()
        );

        Self { meshes, textures }
    }
}

pub fn texture_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    texture: &Texture,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Texture Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            },
        ],
    })
}
