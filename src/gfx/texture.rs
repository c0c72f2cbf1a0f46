// Texture loading

use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::AssetError;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
/// Texel used wherever an image failed to load.
const BLANK_TEXEL: [u8; 4] = [0, 0, 0, 255];

pub fn decode(path: &Path) -> Result<RgbaImage, AssetError> {
    image::open(path)
        .map(|image| image.to_rgba8())
        .map_err(|source| AssetError::Image {
            path: path.to_path_buf(),
            source,
        })
}

pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl Texture {
    /// Load a 2D texture, or a blank one if the file cannot be decoded.
    pub fn load_2d(device: &wgpu::Device, queue: &wgpu::Queue, path: &Path) -> Self {
        match decode(path) {
            Ok(image) => Self::from_image(device, queue, &image, &path.display().to_string()),
            Err(error) => {
                log::warn!("Texture failed to load at path: {} ({error})", path.display());
                Self::blank_2d(device, queue)
            }
        }
    }

    pub fn blank_2d(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let image = RgbaImage::from_pixel(1, 1, image::Rgba(BLANK_TEXEL));
        Self::from_image(device, queue, &image, "Blank Texture")
    }

    pub fn from_image(device: &wgpu::Device, queue: &wgpu::Queue, image: &RgbaImage, label: &str) -> Self {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_layer(queue, &texture, 0, image);

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Texture Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self { texture, view, sampler }
    }

    pub fn cubemap(device: &wgpu::Device, queue: &wgpu::Queue, faces: &CubemapFaces) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Skybox Cubemap"),
            size: wgpu::Extent3d {
                width: faces.width,
                height: faces.height,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: COLOR_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        // Missing faces keep the zero-initialised contents
        for (layer, face) in faces.faces.iter().enumerate() {
            if let Some(image) = face {
                write_layer(queue, &texture, layer as u32, image);
            }
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("Skybox Cubemap View"),
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Cubemap Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        Self { texture, view, sampler }
    }

    pub fn depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Depth Texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }
}

fn write_layer(queue: &wgpu::Queue, texture: &wgpu::Texture, layer: u32, image: &RgbaImage) {
    let (width, height) = image.dimensions();
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * width),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
}

/// Decoded cubemap faces in +X, -X, +Y, -Y, +Z, -Z order, all of one size.
#[derive(Debug)]
pub struct CubemapFaces {
    pub width: u32,
    pub height: u32,
    pub faces: [Option<RgbaImage>; 6],
}

impl CubemapFaces {
    pub fn load(paths: &[PathBuf; 6]) -> Self {
        let decoded = paths.each_ref().map(|path| decode(path));
        Self::assemble(paths, decoded)
    }

    /// The first decoded face fixes the size. Faces that failed, or whose size
    /// differs, are dropped with a warning and stay blank.
    pub fn assemble(paths: &[PathBuf; 6], decoded: [Result<RgbaImage, AssetError>; 6]) -> Self {
        let mut extent: Option<(u32, u32)> = None;
        let mut faces: [Option<RgbaImage>; 6] = Default::default();

        for (slot, (path, result)) in paths.iter().zip(decoded).enumerate() {
            let image = match result {
                Ok(image) => image,
                Err(error) => {
                    log::warn!("Cubemap texture failed to load at path: {} ({error})", path.display());
                    continue;
                }
            };
            let dimensions = image.dimensions();
            match extent {
                None => extent = Some(dimensions),
                Some(expected) if expected != dimensions => {
                    log::warn!(
                        "Cubemap face {} is {}x{}, expected {}x{}; leaving it blank",
                        path.display(),
                        dimensions.0,
                        dimensions.1,
                        expected.0,
                        expected.1
                    );
                    continue;
                }
                Some(_) => {}
            }
            faces[slot] = Some(image);
        }

        let (width, height) = extent.unwrap_or((1, 1));
        let cubemap = Self { width, height, faces };
        log::info!("Assembled {width}x{height} cubemap with {}/6 faces", cubemap.loaded_faces());
        cubemap
    }

    pub fn loaded_faces(&self) -> usize {
        self.faces.iter().filter(|face| face.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> [PathBuf; 6] {
        ["posx", "negx", "posy", "negy", "posz", "negz"].map(|name| PathBuf::from(format!("{name}.jpg")))
    }

    fn missing(path: &str) -> Result<RgbaImage, AssetError> {
        Err(AssetError::Image {
            path: PathBuf::from(path),
            source: image::ImageError::IoError(std::io::Error::new(std::io::ErrorKind::NotFound, "missing")),
        })
    }

    #[test]
    fn all_faces_loaded() {
        let decoded = std::array::from_fn(|_| Ok(RgbaImage::new(4, 4)));
        let faces = CubemapFaces::assemble(&paths(), decoded);
        assert_eq!((faces.width, faces.height), (4, 4));
        assert_eq!(faces.loaded_faces(), 6);
    }

    #[test]
    fn failed_face_stays_blank() {
        let decoded = std::array::from_fn(|i| if i == 2 { missing("posy.jpg") } else { Ok(RgbaImage::new(8, 8)) });
        let faces = CubemapFaces::assemble(&paths(), decoded);
        assert_eq!(faces.loaded_faces(), 5);
        assert!(faces.faces[2].is_none());
        assert!(faces.faces[3].is_some());
    }

    #[test]
    fn extent_comes_from_first_decoded_face() {
        let decoded = std::array::from_fn(|i| match i {
            0 => missing("posx.jpg"),
            1 => Ok(RgbaImage::new(16, 16)),
            4 => Ok(RgbaImage::new(32, 32)),
            _ => Ok(RgbaImage::new(16, 16)),
        });
        let faces = CubemapFaces::assemble(&paths(), decoded);
        assert_eq!((faces.width, faces.height), (16, 16));
        assert!(faces.faces[4].is_none());
        assert_eq!(faces.loaded_faces(), 4);
    }

    #[test]
    fn no_faces_gives_one_texel_cube() {
        let decoded = std::array::from_fn(|_| missing("gone.jpg"));
        let faces = CubemapFaces::assemble(&paths(), decoded);
        assert_eq!((faces.width, faces.height), (1, 1));
        assert_eq!(faces.loaded_faces(), 0);
    }

    #[test]
    fn decode_reports_path() {
        let err = decode(Path::new("/nonexistent/skybox/posx.jpg")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/skybox/posx.jpg"));
    }
}
