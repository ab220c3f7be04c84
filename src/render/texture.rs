use image::DynamicImage;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::gl::{GraphicsApi, PixelFormat, TextureHandle};

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image at {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image of {width}x{height} exceeds the GL size range")]
    TooLarge { width: u32, height: u32 },
    #[error("image needs {expected} bytes of pixel data, got {actual}")]
    PixelCount { expected: usize, actual: usize },
    #[error("failed to create texture object")]
    CreateTexture,
}

/// Decoded pixels ready for upload, bottom row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref()).map_err(|source| TextureError::Decode {
            path: path.as_ref().to_path_buf(),
            source,
        })?;
        Ok(Self::from_image(img))
    }

    /// Flips `img` vertically so texture coordinate (0, 0) lands on the
    /// bottom-left pixel, keeping an alpha channel only when the source has one.
    pub fn from_image(img: DynamicImage) -> Self {
        let img = img.flipv();
        let (width, height) = (img.width(), img.height());

        if img.color().has_alpha() {
            Self {
                width,
                height,
                format: PixelFormat::Rgba,
                pixels: img.to_rgba8().into_raw(),
            }
        } else {
            Self {
                width,
                height,
                format: PixelFormat::Rgb,
                pixels: img.to_rgb8().into_raw(),
            }
        }
    }
}

/// A 2D texture object with repeat wrapping, linear filtering and mipmaps.
pub struct Texture<'gl, G: GraphicsApi> {
    gl: &'gl G,
    handle: TextureHandle,
    width: u32,
    height: u32,
}

impl<'gl, G: GraphicsApi> Texture<'gl, G> {
    pub fn from_file<P: AsRef<Path>>(gl: &'gl G, path: P) -> Result<Self, TextureError> {
        let image = TextureImage::load(path.as_ref())?;
        let texture = Self::upload(gl, &image)?;
        log::info!(
            "Loaded texture {:?} ({}x{}, {:?})",
            path.as_ref(),
            image.width,
            image.height,
            image.format
        );
        Ok(texture)
    }

    pub fn upload(gl: &'gl G, image: &TextureImage) -> Result<Self, TextureError> {
        let too_large = || TextureError::TooLarge {
            width: image.width,
            height: image.height,
        };
        let width = i32::try_from(image.width).map_err(|_| too_large())?;
        let height = i32::try_from(image.height).map_err(|_| too_large())?;

        // The driver reads exactly this many bytes from `pixels`.
        let expected = (image.width as usize)
            .checked_mul(image.height as usize)
            .and_then(|texels| texels.checked_mul(image.format.channels()))
            .ok_or_else(too_large)?;
        if image.pixels.len() != expected {
            return Err(TextureError::PixelCount {
                expected,
                actual: image.pixels.len(),
            });
        }

        let handle = gl.create_texture().ok_or(TextureError::CreateTexture)?;
        gl.bind_texture_2d(Some(handle));
        gl.texture_2d_default_parameters();
        gl.texture_2d_image(width, height, image.format, &image.pixels);
        gl.generate_mipmap_2d();
        gl.bind_texture_2d(None);

        Ok(Self {
            gl,
            handle,
            width: image.width,
            height: image.height,
        })
    }

    /// Binds this texture to texture unit `unit`.
    pub fn bind(&self, unit: u32) {
        self.gl.active_texture(unit);
        self.gl.bind_texture_2d(Some(self.handle));
    }

    pub fn handle(&self) -> TextureHandle {
        self.handle
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl<G: GraphicsApi> Drop for Texture<'_, G> {
    fn drop(&mut self) {
        self.gl.delete_texture(self.handle);
    }
}

impl<G: GraphicsApi> std::fmt::Debug for Texture<'_, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("handle", &self.handle)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}
