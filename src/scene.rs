// Scene catalog for Penguin World

use std::collections::HashMap;
use std::path::PathBuf;

use glam::Vec3;

use crate::config::AssetConfig;
use crate::error::RenderError;
use crate::gfx::{CubemapId, MeshId, ModelId, ResourceLoader, ShaderId, ShaderKind};
use crate::math::{wrapped_degrees_as_radians, Transform};

/// Shader that receives the first, geometry-less pass of every frame.
pub const PRIMARY_SHADER: &str = "cubemaps";
pub const SKYBOX_SHADER: &str = "skybox";

/// Every shader program the scene compiles at startup.
pub const SHADERS: &[(&str, ShaderKind)] = &[
    (PRIMARY_SHADER, ShaderKind::Reflective),
    (SKYBOX_SHADER, ShaderKind::Skybox),
    ("penguin", ShaderKind::Textured),
    ("glacier", ShaderKind::Textured),
];

pub const SKYBOX_VERTEX_COUNT: u32 = 36;

/// Unit cube as 12 triangles, positions only.
#[rustfmt::skip]
pub const SKYBOX_VERTICES: [f32; 108] = [
    -1.0,  1.0, -1.0,
    -1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,
     1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,

    -1.0, -1.0,  1.0,
    -1.0, -1.0, -1.0,
    -1.0,  1.0, -1.0,
    -1.0,  1.0, -1.0,
    -1.0,  1.0,  1.0,
    -1.0, -1.0,  1.0,

     1.0, -1.0, -1.0,
     1.0, -1.0,  1.0,
     1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,
     1.0,  1.0, -1.0,
     1.0, -1.0, -1.0,

    -1.0, -1.0,  1.0,
    -1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,
     1.0, -1.0,  1.0,
    -1.0, -1.0,  1.0,

    -1.0,  1.0, -1.0,
     1.0,  1.0, -1.0,
     1.0,  1.0,  1.0,
     1.0,  1.0,  1.0,
    -1.0,  1.0,  1.0,
    -1.0,  1.0, -1.0,

    -1.0, -1.0, -1.0,
    -1.0, -1.0,  1.0,
     1.0, -1.0, -1.0,
     1.0, -1.0, -1.0,
    -1.0, -1.0,  1.0,
     1.0, -1.0,  1.0,
];

/// Literal placement of one object in the world.
#[derive(Debug, Clone, Copy)]
pub struct ObjectEntry {
    pub name: &'static str,
    pub model: &'static str,
    pub shader: &'static str,
    pub translation: [f32; 3],
    pub scale: [f32; 3],
    /// Whole degrees about +Y; see [`wrapped_degrees_as_radians`].
    pub rotation_degrees: i32,
}

impl ObjectEntry {
    pub fn transform(&self) -> Transform {
        Transform::new(
            Vec3::from_array(self.translation),
            Vec3::from_array(self.scale),
            Vec3::Y,
            wrapped_degrees_as_radians(self.rotation_degrees),
        )
    }
}

const GLACIER: &str = "resources/objects/glacier/glacier.obj";
const LITTLE_PENGUIN: &str = "resources/objects/penguin/penguin_little/penguin_stand.obj";

/// The glacier and penguin colony, in draw order.
pub const PENGUIN_WORLD: &[ObjectEntry] = &[
    ObjectEntry {
        name: "glacier",
        model: GLACIER,
        shader: "glacier",
        translation: [230.0, -15.0, -18.0],
        scale: [30.0, 4.0, 40.0],
        rotation_degrees: 0,
    },
    ObjectEntry {
        name: "glacier1",
        model: GLACIER,
        shader: "glacier",
        translation: [95.0, -7.0, 12.0],
        scale: [15.0, 4.0, 7.0],
        rotation_degrees: 0,
    },
    ObjectEntry {
        name: "adult_penguin",
        model: "resources/objects/penguin/penguin_tall/adult_penguin.obj",
        shader: "penguin",
        translation: [-20.0, -5.0, 0.0],
        scale: [1.0, 1.0, 1.0],
        rotation_degrees: 90,
    },
    ObjectEntry {
        name: "adult_penguin_hi",
        model: "resources/objects/penguin/penguin_tall/adult_penguin_hi.obj",
        shader: "penguin",
        translation: [-20.0, -5.0, -9.7],
        scale: [1.0, 1.0, 1.0],
        rotation_degrees: 20,
    },
    ObjectEntry {
        name: "little_penguin",
        model: LITTLE_PENGUIN,
        shader: "penguin",
        translation: [-11.0, -5.0, 0.0],
        scale: [1.0, 1.0, 1.0],
        rotation_degrees: 5,
    },
    ObjectEntry {
        name: "little_penguin1",
        model: LITTLE_PENGUIN,
        shader: "penguin",
        translation: [-15.0, -5.0, -4.0],
        scale: [1.0, 1.0, 1.0],
        rotation_degrees: 20,
    },
    ObjectEntry {
        name: "little_penguin2",
        model: LITTLE_PENGUIN,
        shader: "penguin",
        translation: [-11.0, -5.0, -6.0],
        scale: [1.0, 1.0, 1.0],
        rotation_degrees: 0,
    },
];

/// A model drawn with a shader at a fixed place in the world.
#[derive(Debug, Clone)]
pub struct DrawableObject {
    pub name: String,
    pub model: ModelId,
    pub shader: ShaderId,
    pub transform: Transform,
}

#[derive(Debug, Clone, Copy)]
pub struct SkyboxState {
    pub shader: ShaderId,
    pub mesh: MeshId,
    pub vertex_count: u32,
    pub cubemap: CubemapId,
}

/// Everything drawn each frame: the skybox plus a fixed list of objects.
#[derive(Debug)]
pub struct SceneCatalog {
    pub primary_shader: ShaderId,
    pub skybox: SkyboxState,
    objects: Vec<DrawableObject>,
}

impl SceneCatalog {
    /// Compile the scene's shaders and load its models, skybox mesh and
    /// cubemap. Models and shaders named more than once are loaded once.
    pub fn build<L: ResourceLoader>(
        loader: &mut L,
        assets: &AssetConfig,
        entries: &[ObjectEntry],
    ) -> Result<Self, RenderError> {
        let mut shaders = HashMap::new();
        for &(name, kind) in SHADERS {
            let id = loader.load_shader(name, &assets.shader_path(name), kind)?;
            shaders.insert(name, id);
        }
        log::info!("Compiled {} shader programs", shaders.len());

        let shader = |name: &str| {
            shaders
                .get(name)
                .copied()
                .ok_or_else(|| RenderError::UnknownShader(name.to_string()))
        };

        let mut models: HashMap<PathBuf, ModelId> = HashMap::new();
        let mut objects = Vec::with_capacity(entries.len());
        for entry in entries {
            let path = assets.resolve(entry.model);
            let model = match models.get(&path) {
                Some(&id) => id,
                None => {
                    let id = loader.load_model(&path)?;
                    models.insert(path, id);
                    id
                }
            };
            objects.push(DrawableObject {
                name: entry.name.to_string(),
                model,
                shader: shader(entry.shader)?,
                transform: entry.transform(),
            });
        }
        log::info!("Scene has {} objects from {} models", objects.len(), models.len());

        let skybox = SkyboxState {
            shader: shader(SKYBOX_SHADER)?,
            mesh: loader.create_mesh("Skybox Vertex Buffer", &SKYBOX_VERTICES),
            vertex_count: SKYBOX_VERTEX_COUNT,
            cubemap: loader.load_cubemap(&assets.skybox_paths()),
        };

        Ok(Self {
            primary_shader: shader(PRIMARY_SHADER)?,
            skybox,
            objects,
        })
    }

    /// Objects in draw order.
    pub fn objects(&self) -> &[DrawableObject] {
        self.objects.as_slice()
    }

    /// Gets an object by name.
    pub fn get_object(&self, name: &str) -> Option<&DrawableObject> {
        self.objects.iter().find(|obj| obj.name == name)
    }
}
