// Configuration for Penguin World, loaded from TOML

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "PENGUIN_WORLD_CONFIG";
/// Configuration file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "penguin_world.toml";

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parse error
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
    pub assets: AssetConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Penguin World".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Initial camera state. Angles are in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: [f32; 3],
    pub yaw: f32,
    pub pitch: f32,
    pub speed: f32,
    pub sensitivity: f32,
    pub zoom: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 3.0],
            yaw: -90.0,
            pitch: 0.0,
            speed: 2.5,
            sensitivity: 0.1,
            zoom: 45.0,
        }
    }
}

/// Which view matrix the object passes receive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectView {
    /// The full camera view, translation included.
    #[default]
    Camera,
    /// The rotation-only view built for the skybox pass.
    Skybox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub near: f32,
    pub far: f32,
    pub clear_color: [f32; 4],
    pub object_view: ObjectView,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            near: 0.1,
            far: 100.0,
            clear_color: [0.1, 0.1, 0.1, 1.0],
            object_view: ObjectView::Camera,
        }
    }
}

/// Asset locations. Relative paths resolve against `root`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    pub root: PathBuf,
    pub shader_dir: PathBuf,
    /// Cubemap faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub skybox_faces: [PathBuf; 6],
}

impl Default for AssetConfig {
    fn default() -> Self {
        let face = |name: &str| PathBuf::from(format!("resources/textures/skybox/winter/{name}.jpg"));
        Self {
            root: PathBuf::from("."),
            shader_dir: PathBuf::from("shader"),
            skybox_faces: [
                face("posx"),
                face("negx"),
                face("posy"),
                face("negy"),
                face("posz"),
                face("negz"),
            ],
        }
    }
}

impl AssetConfig {
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.root.join(relative)
    }

    pub fn shader_path(&self, name: &str) -> PathBuf {
        self.root.join(&self.shader_dir).join(format!("{name}.wgsl"))
    }

    pub fn skybox_paths(&self) -> [PathBuf; 6] {
        self.skybox_faces.clone().map(|face| self.root.join(face))
    }
}

impl AppConfig {
    pub fn from_toml(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(path, &contents)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the config path from the environment.
    pub fn path_from_env() -> PathBuf {
        std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml(Path::new("empty.toml"), "").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.render.object_view, ObjectView::Camera);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let toml = r#"
            [camera]
            speed = 10.0

            [render]
            far = 500.0
            object_view = "skybox"
        "#;
        let config = AppConfig::from_toml(Path::new("partial.toml"), toml).unwrap();
        assert_eq!(config.camera.speed, 10.0);
        assert_eq!(config.camera.yaw, -90.0);
        assert_eq!(config.render.far, 500.0);
        assert_eq!(config.render.near, 0.1);
        assert_eq!(config.render.object_view, ObjectView::Skybox);
    }

    #[test]
    fn malformed_file_reports_path() {
        let err = AppConfig::from_toml(Path::new("broken.toml"), "[window\nwidth = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default(Path::new("/nonexistent/penguin_world.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn asset_paths_resolve_against_root() {
        let assets = AssetConfig {
            root: PathBuf::from("/data"),
            ..AssetConfig::default()
        };
        assert_eq!(assets.shader_path("skybox"), PathBuf::from("/data/shader/skybox.wgsl"));
        let faces = assets.skybox_paths();
        assert_eq!(faces[0], PathBuf::from("/data/resources/textures/skybox/winter/posx.jpg"));
        assert_eq!(faces[5], PathBuf::from("/data/resources/textures/skybox/winter/negz.jpg"));
    }
}
