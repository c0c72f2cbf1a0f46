// Error types for Penguin World

use std::path::PathBuf;

/// Fatal failures while bringing up the window, GPU or shaders.
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no compatible graphics adapter found")]
    NoAdapter,

    #[error("failed to request device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("failed to read shader `{name}` at {path}: {source}")]
    ShaderSource {
        name: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader `{name}` failed to compile: {message}")]
    ShaderCompile { name: String, message: String },

    #[error("no shader program named `{0}`")]
    UnknownShader(String),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Failures loading model or image files from disk.
#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("failed to load model {path}: {source}")]
    Model {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
