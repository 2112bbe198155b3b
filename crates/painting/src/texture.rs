//! Brush textures and their fallbacks
//!
//! Textures are decoded once, up front, and shared between the brush and the
//! render primitives through [`Arc`]. A missing shape texture is replaced by a
//! generated disc; a missing grain texture turns the grain overlay off.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::FALLBACK_TEXTURE_SIZE;
use crate::surface::CpuSurface;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("Failed to load texture {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Texture {0} has zero size")]
    Empty(PathBuf),
    #[error("No texture configured")]
    Missing,
}

/// An immutable drawable image
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    bitmap: CpuSurface,
}

impl Texture {
    pub fn from_surface(bitmap: CpuSurface) -> Self {
        Self { bitmap }
    }

    /// Decode an image file into a texture
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|source| TextureError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        if rgba.width() == 0 || rgba.height() == 0 {
            return Err(TextureError::Empty(path.to_path_buf()));
        }
        debug!("Texture::load: {} ({}x{})", path.display(), rgba.width(), rgba.height());
        Ok(Self::from_surface(CpuSurface::from_rgba8(&rgba)))
    }

    /// Generate a white disc whose edge softens as `falloff` goes from 0 to 1
    pub fn filled_circle(diameter: u32, falloff: f32) -> Self {
        let diameter = diameter.max(1);
        let radius = diameter as f32 / 2.0;
        let hardness = 1.0 - falloff.clamp(0.0, 1.0);
        let mut bitmap = CpuSurface::new(diameter, diameter);

        for py in 0..diameter {
            for px in 0..diameter {
                let dx = (px as f32 + 0.5 - radius) / radius;
                let dy = (py as f32 + 0.5 - radius) / radius;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance > 1.0 {
                    continue;
                }
                let alpha = edge_falloff(distance, hardness);
                bitmap.set_pixel(px, py, [1.0, 1.0, 1.0, alpha]);
            }
        }

        Self { bitmap }
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height
    }

    /// Sample at normalized coordinates; outside [0, 1] is transparent
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> [f32; 4] {
        self.bitmap.sample_bilinear(u, v)
    }

    pub fn bitmap(&self) -> &CpuSurface {
        &self.bitmap
    }
}

/// Alpha at normalized distance `distance_normalized` (0 center, 1 edge)
/// for a disc of the given hardness (0 soft, 1 hard)
#[inline]
pub fn edge_falloff(distance_normalized: f32, hardness: f32) -> f32 {
    if distance_normalized > 1.0 {
        return 0.0;
    }
    if hardness >= 1.0 {
        return 1.0;
    }
    let t = distance_normalized.clamp(0.0, 1.0);
    let soft = 1.0 - t;
    soft * (1.0 - hardness) + hardness
}

/// Grain overlay texture, or the explicit "no grain" sentinel
#[derive(Debug, Clone, Default)]
pub enum GrainTexture {
    #[default]
    None,
    Texture(Arc<Texture>),
}

impl GrainTexture {
    pub fn texture(&self) -> Option<&Arc<Texture>> {
        match self {
            GrainTexture::None => None,
            GrainTexture::Texture(texture) => Some(texture),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, GrainTexture::None)
    }
}

/// Supplies brush textures before any stamping occurs
pub trait TextureProvider {
    fn shape_texture(&self) -> Result<Texture, TextureError>;
    fn grain_texture(&self) -> Result<Texture, TextureError>;
}

/// Loads textures from image files on disk
#[derive(Debug, Clone, Default)]
pub struct FileTextureProvider {
    pub shape_path: Option<PathBuf>,
    pub grain_path: Option<PathBuf>,
}

impl TextureProvider for FileTextureProvider {
    fn shape_texture(&self) -> Result<Texture, TextureError> {
        let path = self.shape_path.as_ref().ok_or(TextureError::Missing)?;
        Texture::load(path)
    }

    fn grain_texture(&self) -> Result<Texture, TextureError> {
        let path = self.grain_path.as_ref().ok_or(TextureError::Missing)?;
        Texture::load(path)
    }
}

/// The pair of textures a brush stamps with
#[derive(Debug, Clone)]
pub struct BrushShape {
    pub base_texture: Arc<Texture>,
    pub grain_texture: GrainTexture,
}

impl Default for BrushShape {
    fn default() -> Self {
        Self::fallback(0.0)
    }
}

impl BrushShape {
    /// Generated disc shape with no grain
    pub fn fallback(falloff: f32) -> Self {
        Self {
            base_texture: Arc::new(Texture::filled_circle(FALLBACK_TEXTURE_SIZE, falloff)),
            grain_texture: GrainTexture::None,
        }
    }

    /// Resolve both textures from a provider. Never fails: a missing shape
    /// becomes a generated disc, a missing grain disables the overlay.
    pub fn from_provider(provider: &dyn TextureProvider, falloff: f32) -> Self {
        let base_texture = match provider.shape_texture() {
            Ok(texture) => Arc::new(texture),
            Err(TextureError::Missing) => Arc::new(Texture::filled_circle(FALLBACK_TEXTURE_SIZE, falloff)),
            Err(e) => {
                warn!("Shape texture unavailable, using generated disc: {}", e);
                Arc::new(Texture::filled_circle(FALLBACK_TEXTURE_SIZE, falloff))
            }
        };

        let grain_texture = match provider.grain_texture() {
            Ok(texture) => GrainTexture::Texture(Arc::new(texture)),
            Err(TextureError::Missing) => GrainTexture::None,
            Err(e) => {
                warn!("Grain texture unavailable, disabling grain: {}", e);
                GrainTexture::None
            }
        };

        Self {
            base_texture,
            grain_texture,
        }
    }
}
