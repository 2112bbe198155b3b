//! CPU bitmap for painting - f32 RGBA storage
//!
//! Used for the persistent flattened canvas and for decoded brush textures.

use image::RgbaImage;

/// An f32 RGBA CPU bitmap
/// Stores pixels as [f32; 4] (Rgba32Float compatible, straight alpha)
#[derive(Debug, Clone, PartialEq)]
pub struct CpuSurface {
    /// Surface dimensions
    pub width: u32,
    pub height: u32,
    /// Pixel data in row-major order, each pixel is [r, g, b, a] as f32
    pixels: Vec<[f32; 4]>,
}

impl CpuSurface {
    /// Create a new surface with the given dimensions, initialized to transparent black
    pub fn new(width: u32, height: u32) -> Self {
        let pixel_count = (width as usize) * (height as usize);
        Self {
            width,
            height,
            pixels: vec![[0.0, 0.0, 0.0, 0.0]; pixel_count],
        }
    }

    /// Build a surface from an 8-bit RGBA image
    pub fn from_rgba8(image: &RgbaImage) -> Self {
        let pixels = image
            .pixels()
            .map(|p| {
                [
                    p[0] as f32 / 255.0,
                    p[1] as f32 / 255.0,
                    p[2] as f32 / 255.0,
                    p[3] as f32 / 255.0,
                ]
            })
            .collect();
        Self {
            width: image.width(),
            height: image.height(),
            pixels,
        }
    }

    /// Quantize to an 8-bit RGBA image (for PNG export)
    pub fn to_rgba8_image(&self) -> RgbaImage {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let p = self.pixels[self.index(x, y)];
            image::Rgba([to_u8(p[0]), to_u8(p[1]), to_u8(p[2]), to_u8(p[3])])
        })
    }

    /// Clear the surface to a solid color
    pub fn clear(&mut self, color: [f32; 4]) {
        self.pixels.fill(color);
    }

    /// True when every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|p| p[3] == 0.0)
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    /// Get a pixel at the given coordinates
    /// Returns None if coordinates are out of bounds
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Set a pixel at the given coordinates
    /// Does nothing if coordinates are out of bounds
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [f32; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        self.pixels[index] = color;
    }

    /// Blend a color onto an existing pixel using source-over compositing
    #[inline]
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: [f32; 4], opacity: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        let dst = self.pixels[index];

        let src_alpha = (color[3] * opacity).clamp(0.0, 1.0);
        if src_alpha <= 0.0 {
            return;
        }
        let out_alpha = src_alpha + dst[3] * (1.0 - src_alpha);
        let mix = |s: f32, d: f32| (s * src_alpha + d * dst[3] * (1.0 - src_alpha)) / out_alpha;

        self.pixels[index] = [
            mix(color[0], dst[0]),
            mix(color[1], dst[1]),
            mix(color[2], dst[2]),
            out_alpha,
        ];
    }

    /// Multiply the destination color by a source color, weighted by
    /// `color[3] * opacity`. Destination alpha is left unchanged, so
    /// multiply only darkens what is already there.
    #[inline]
    pub fn multiply_pixel(&mut self, x: u32, y: u32, color: [f32; 4], opacity: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        let dst = self.pixels[index];

        let weight = (color[3] * opacity).clamp(0.0, 1.0);
        let mul = |s: f32, d: f32| d * (1.0 - weight + s * weight);

        self.pixels[index] = [
            mul(color[0], dst[0]),
            mul(color[1], dst[1]),
            mul(color[2], dst[2]),
            dst[3],
        ];
    }

    /// Bilinearly sample at normalized coordinates `(u, v)` in [0, 1].
    /// Coordinates outside the surface return transparent black.
    pub fn sample_bilinear(&self, u: f32, v: f32) -> [f32; 4] {
        if self.width == 0 || self.height == 0 || !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return [0.0; 4];
        }

        let fx = (u * self.width as f32 - 0.5).max(0.0);
        let fy = (v * self.height as f32 - 0.5).max(0.0);
        let x0 = (fx.floor() as u32).min(self.width - 1);
        let y0 = (fy.floor() as u32).min(self.height - 1);
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);
        let tx = fx - x0 as f32;
        let ty = fy - y0 as f32;

        let p00 = self.pixels[self.index(x0, y0)];
        let p10 = self.pixels[self.index(x1, y0)];
        let p01 = self.pixels[self.index(x0, y1)];
        let p11 = self.pixels[self.index(x1, y1)];

        let mut out = [0.0; 4];
        for c in 0..4 {
            let top = p00[c] + (p10[c] - p00[c]) * tx;
            let bottom = p01[c] + (p11[c] - p01[c]) * tx;
            out[c] = top + (bottom - top) * ty;
        }
        out
    }

    /// Raw f32 RGBA pixel data as bytes
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }

    /// Get direct access to pixel data (for advanced operations)
    #[inline]
    pub fn pixels(&self) -> &[[f32; 4]] {
        &self.pixels
    }
}
