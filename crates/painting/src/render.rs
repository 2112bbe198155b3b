//! Render surface contract and a CPU implementation
//!
//! The core only talks to a [`RenderSurface`]: it adds stamp primitives,
//! destroys them, and asks for the whole composition (persistent bitmap
//! plus live primitives) as a new bitmap. [`CpuCanvas`] is the software
//! implementation used by the headless host and the tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::color::ColorMatrix;
use crate::surface::CpuSurface;
use crate::texture::Texture;
use crate::types::{BlendMode, Point2D};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RasterError {
    #[error("Cannot rasterize a {width}x{height} canvas")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("Render backend failure: {0}")]
    Backend(String),
}

/// Opaque id of a live primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PrimitiveHandle(pub u64);

/// One textured quad drawn centered on `position`
#[derive(Debug, Clone)]
pub struct StampPrimitive {
    pub texture: Arc<Texture>,
    pub position: Point2D,
    /// Edge length of the (square) quad in pixels
    pub size: f64,
    /// Rotation in radians
    pub rotation: f64,
    pub alpha: f64,
    pub blend_mode: BlendMode,
    pub color_matrix: ColorMatrix,
}

pub trait RenderSurface {
    /// Add a primitive on top of everything drawn so far
    fn add_primitive(&mut self, primitive: StampPrimitive) -> PrimitiveHandle;

    /// Remove and free a live primitive. Unknown handles are ignored.
    fn destroy_primitive(&mut self, handle: PrimitiveHandle);

    /// Render persistent bitmap plus live primitives into a new bitmap
    fn rasterize(&self) -> Result<CpuSurface, RasterError>;

    /// Replace the persistent bitmap
    fn set_persistent(&mut self, bitmap: CpuSurface);

    /// Reset the persistent bitmap to empty
    fn clear_persistent(&mut self);

    /// Number of live primitives
    fn primitive_count(&self) -> usize;
}

/// Software render surface
#[derive(Debug, Clone)]
pub struct CpuCanvas {
    width: u32,
    height: u32,
    persistent: CpuSurface,
    primitives: BTreeMap<PrimitiveHandle, StampPrimitive>,
    next_handle: u64,
}

impl CpuCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            persistent: CpuSurface::new(width, height),
            primitives: BTreeMap::new(),
            next_handle: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn persistent(&self) -> &CpuSurface {
        &self.persistent
    }

    pub fn primitive(&self, handle: PrimitiveHandle) -> Option<&StampPrimitive> {
        self.primitives.get(&handle)
    }

    /// Live primitives in draw order
    pub fn primitives(&self) -> impl Iterator<Item = &StampPrimitive> {
        self.primitives.values()
    }
}

impl RenderSurface for CpuCanvas {
    fn add_primitive(&mut self, primitive: StampPrimitive) -> PrimitiveHandle {
        let handle = PrimitiveHandle(self.next_handle);
        self.next_handle += 1;
        self.primitives.insert(handle, primitive);
        handle
    }

    fn destroy_primitive(&mut self, handle: PrimitiveHandle) {
        self.primitives.remove(&handle);
    }

    fn rasterize(&self) -> Result<CpuSurface, RasterError> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::EmptyCanvas {
                width: self.width,
                height: self.height,
            });
        }

        let mut target = self.persistent.clone();
        for primitive in self.primitives.values() {
            draw_primitive(&mut target, primitive);
        }
        debug!("CpuCanvas::rasterize: {} primitives", self.primitives.len());
        Ok(target)
    }

    fn set_persistent(&mut self, bitmap: CpuSurface) {
        self.persistent = bitmap;
    }

    fn clear_persistent(&mut self) {
        self.persistent = CpuSurface::new(self.width, self.height);
    }

    fn primitive_count(&self) -> usize {
        self.primitives.len()
    }
}

/// Draw a rotated, scaled, tinted texture quad onto `target`.
/// Returns the touched region (x, y, width, height), or None if nothing
/// landed on the surface.
pub fn draw_primitive(target: &mut CpuSurface, primitive: &StampPrimitive) -> Option<(u32, u32, u32, u32)> {
    let size = primitive.size;
    if size <= 0.0 || primitive.alpha <= 0.0 || !primitive.position.is_finite() {
        return None;
    }

    let center = primitive.position;
    let (sin_a, cos_a) = primitive.rotation.sin_cos();
    // Half extent of the rotated square's bounding box
    let half = size / 2.0 * (sin_a.abs() + cos_a.abs());

    let x_min = ((center.x - half).floor().max(0.0) as u32).min(target.width);
    let y_min = ((center.y - half).floor().max(0.0) as u32).min(target.height);
    let x_max = ((center.x + half).ceil().max(0.0) as u32).min(target.width);
    let y_max = ((center.y + half).ceil().max(0.0) as u32).min(target.height);
    if x_min >= x_max || y_min >= y_max {
        return None;
    }

    let opacity = primitive.alpha.clamp(0.0, 1.0) as f32;
    let tinted = !primitive.color_matrix.is_identity();

    for py in y_min..y_max {
        for px in x_min..x_max {
            let dx = px as f64 + 0.5 - center.x;
            let dy = py as f64 + 0.5 - center.y;

            // Rotate by -angle into texture space
            let local_x = dx * cos_a + dy * sin_a;
            let local_y = -dx * sin_a + dy * cos_a;
            let u = (local_x / size + 0.5) as f32;
            let v = (local_y / size + 0.5) as f32;

            let mut texel = primitive.texture.sample(u, v);
            if texel[3] <= 0.0 {
                continue;
            }
            if tinted {
                texel = primitive.color_matrix.apply(texel);
            }

            match primitive.blend_mode {
                BlendMode::Normal => target.blend_pixel(px, py, texel, opacity),
                BlendMode::Multiply => target.multiply_pixel(px, py, texel, opacity),
            }
        }
    }

    Some((x_min, y_min, x_max - x_min, y_max - y_min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    fn white_square(size: u32) -> Arc<Texture> {
        let mut bitmap = CpuSurface::new(size, size);
        bitmap.clear([1.0, 1.0, 1.0, 1.0]);
        Arc::new(Texture::from_surface(bitmap))
    }

    fn stamp(x: f64, y: f64, size: f64) -> StampPrimitive {
        StampPrimitive {
            texture: white_square(8),
            position: Point2D::new(x, y),
            size,
            rotation: 0.0,
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
            color_matrix: ColorMatrix::tint(Rgb::new(255, 0, 0)),
        }
    }

    #[test]
    fn test_handles_are_unique_and_ordered() {
        let mut canvas = CpuCanvas::new(16, 16);
        let a = canvas.add_primitive(stamp(4.0, 4.0, 4.0));
        let b = canvas.add_primitive(stamp(8.0, 8.0, 4.0));
        assert!(a < b);
        assert_eq!(canvas.primitive_count(), 2);

        canvas.destroy_primitive(a);
        canvas.destroy_primitive(a);
        assert_eq!(canvas.primitive_count(), 1);
        assert!(canvas.primitive(b).is_some());
    }

    #[test]
    fn test_rasterize_draws_tinted_stamp() {
        let mut canvas = CpuCanvas::new(16, 16);
        canvas.add_primitive(stamp(8.0, 8.0, 6.0));

        let bitmap = canvas.rasterize().unwrap();
        let center = bitmap.get_pixel(8, 8).unwrap();
        assert!((center[0] - 1.0).abs() < 1e-5);
        assert!(center[1].abs() < 1e-5);
        assert!((center[3] - 1.0).abs() < 1e-5);
        assert_eq!(bitmap.get_pixel(0, 0), Some([0.0; 4]));
        // Rasterizing does not touch the persistent bitmap
        assert!(canvas.persistent().is_blank());
    }

    #[test]
    fn test_rasterize_includes_persistent() {
        let mut canvas = CpuCanvas::new(4, 4);
        let mut bitmap = CpuSurface::new(4, 4);
        bitmap.set_pixel(0, 0, [0.0, 0.0, 1.0, 1.0]);
        canvas.set_persistent(bitmap);

        let out = canvas.rasterize().unwrap();
        assert_eq!(out.get_pixel(0, 0), Some([0.0, 0.0, 1.0, 1.0]));

        canvas.clear_persistent();
        assert!(canvas.rasterize().unwrap().is_blank());
    }

    #[test]
    fn test_multiply_primitive_darkens_only() {
        let mut canvas = CpuCanvas::new(16, 16);
        let mut background = CpuSurface::new(16, 16);
        for x in 0..8 {
            for y in 0..16 {
                background.set_pixel(x, y, [1.0, 1.0, 1.0, 1.0]);
            }
        }
        canvas.set_persistent(background);

        let mut grey = CpuSurface::new(4, 4);
        grey.clear([0.5, 0.5, 0.5, 1.0]);
        canvas.add_primitive(StampPrimitive {
            texture: Arc::new(Texture::from_surface(grey)),
            position: Point2D::new(8.0, 8.0),
            size: 8.0,
            rotation: 0.3,
            alpha: 1.0,
            blend_mode: BlendMode::Multiply,
            color_matrix: ColorMatrix::IDENTITY,
        });

        let out = canvas.rasterize().unwrap();
        let painted = out.get_pixel(6, 8).unwrap();
        assert!((painted[0] - 0.5).abs() < 1e-4);
        // Transparent area stays transparent
        assert_eq!(out.get_pixel(9, 8), Some([0.0; 4]));
    }

    #[test]
    fn test_empty_canvas_fails() {
        let canvas = CpuCanvas::new(0, 10);
        assert_eq!(
            canvas.rasterize(),
            Err(RasterError::EmptyCanvas { width: 0, height: 10 })
        );
    }

    #[test]
    fn test_offscreen_primitive_is_skipped() {
        let mut target = CpuSurface::new(8, 8);
        assert_eq!(draw_primitive(&mut target, &stamp(-50.0, -50.0, 4.0)), None);
        assert_eq!(draw_primitive(&mut target, &stamp(4.0, 4.0, 0.0)), None);
        assert!(target.is_blank());
    }
}
