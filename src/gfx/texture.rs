//! Texture provider for sampler uniforms
//!
//! Images are decoded with the `image` crate into RGBA8, flipped so the first
//! row is the bottom one (GL's texture origin), and uploaded with mipmaps.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::backend::{GlHandle, GpuBackend};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image {path}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to upload texture: {0}")]
    Upload(String),
}

/// A texture unit index (`GL_TEXTURE0 + n`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextureUnit(pub u32);

/// Anything a sampler uniform can point at
pub trait TextureBinding {
    fn id(&self) -> GlHandle;

    /// Binds the texture to the currently active unit
    fn bind(&self, gl: &dyn GpuBackend);
}

/// 2D RGBA texture handle. Owns its GL name, so it is neither `Clone` nor
/// `Copy`; share it by reference.
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    id: GlHandle,
    width: u32,
    height: u32,
}

impl Texture {
    pub fn from_rgba8(
        gl: &dyn GpuBackend,
        width: u32,
        height: u32,
        pixels: &[u8],
    ) -> Result<Self, TextureError> {
        let id = gl
            .create_texture_rgba8(width, height, pixels)
            .map_err(TextureError::Upload)?;
        log::debug!("Uploaded {width}x{height} texture {id}");
        Ok(Self { id, width, height })
    }

    pub fn from_file(gl: &dyn GpuBackend, path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let image = image::open(path)
            .map_err(|source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .flipv()
            .to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba8(gl, width, height, image.as_raw())
    }

    /// A 1x1 texture of a single color
    pub fn solid(gl: &dyn GpuBackend, rgba: [u8; 4]) -> Result<Self, TextureError> {
        Self::from_rgba8(gl, 1, 1, &rgba)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn release(&mut self, gl: &dyn GpuBackend) {
        if self.id != 0 {
            gl.delete_texture(self.id);
            self.id = 0;
        }
    }
}

impl TextureBinding for Texture {
    fn id(&self) -> GlHandle {
        self.id
    }

    fn bind(&self, gl: &dyn GpuBackend) {
        gl.bind_texture_2d(self.id);
    }
}
