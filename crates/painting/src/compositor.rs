//! Stamp compositing
//!
//! Turns a [`StampRequest`] into render primitives: an optional grain
//! overlay followed by the tinted base stamp.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::brush::Brush;
use crate::color::ColorMatrix;
use crate::constants::MIN_STAMP_ALPHA;
use crate::render::StampPrimitive;
use crate::types::{BlendMode, Point2D, StampRequest, effective_pressure};

/// Source of per-stamp positional noise
pub trait JitterSource {
    /// Uniform sample in [-0.5, 0.5]
    fn sample(&mut self) -> f64;
}

/// Jitter backed by a `rand` generator
#[derive(Debug, Clone)]
pub struct RandomJitter<R = StdRng> {
    rng: R,
}

impl RandomJitter<StdRng> {
    /// Seed from the operating system; strokes are not replayable
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed seed, useful for deterministic tests
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomJitter<StdRng> {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl<R: Rng> RandomJitter<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> JitterSource for RandomJitter<R> {
    fn sample(&mut self) -> f64 {
        self.rng.gen_range(-0.5..=0.5)
    }
}

/// Always returns the same value
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedJitter(pub f64);

impl JitterSource for FixedJitter {
    fn sample(&mut self) -> f64 {
        self.0.clamp(-0.5, 0.5)
    }
}

/// Primitives produced for one stamp
#[derive(Debug, Clone)]
pub struct CompositedStamp {
    pub grain: Option<StampPrimitive>,
    pub base: StampPrimitive,
}

impl CompositedStamp {
    /// Primitives in draw order: grain first, base stamp on top
    pub fn into_primitives(self) -> impl Iterator<Item = StampPrimitive> {
        self.grain.into_iter().chain(std::iter::once(self.base))
    }
}

#[derive(Debug, Clone)]
pub struct StampCompositor<J = RandomJitter> {
    jitter: J,
}

impl Default for StampCompositor<RandomJitter> {
    fn default() -> Self {
        Self::new(RandomJitter::default())
    }
}

impl<J: JitterSource> StampCompositor<J> {
    pub fn new(jitter: J) -> Self {
        Self { jitter }
    }

    pub fn jitter_mut(&mut self) -> &mut J {
        &mut self.jitter
    }

    /// Build the primitives for one stamp
    pub fn composite(&mut self, request: &StampRequest, brush: &Brush) -> CompositedStamp {
        let pressure = effective_pressure(request.pressure);
        let stamp_size = brush.size_for_pressure(pressure);

        let position = self.jittered(request.position, stamp_size * brush.stroke.jitter_fraction);
        let alpha = (pressure * brush.alpha).max(MIN_STAMP_ALPHA);

        let grain = brush.shape.grain_texture.texture().map(|texture| StampPrimitive {
            texture: texture.clone(),
            position,
            size: stamp_size * brush.grain.scale,
            rotation: brush.grain.rotation,
            alpha: brush.grain.intensity,
            blend_mode: BlendMode::Multiply,
            color_matrix: ColorMatrix::IDENTITY,
        });

        let base = StampPrimitive {
            texture: brush.shape.base_texture.clone(),
            position,
            size: stamp_size,
            rotation: 0.0,
            alpha,
            blend_mode: BlendMode::Normal,
            color_matrix: ColorMatrix::tint(brush.color),
        };

        CompositedStamp { grain, base }
    }

    fn jittered(&mut self, position: Point2D, displacement: f64) -> Point2D {
        if displacement <= 0.0 {
            return position;
        }
        let dx = self.jitter.sample() * displacement;
        let dy = self.jitter.sample() * displacement;
        position + Point2D::new(dx, dy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::CpuSurface;
    use crate::texture::{GrainTexture, Texture};
    use crate::types::Rgb;
    use std::sync::Arc;

    fn request(x: f64, y: f64, pressure: f64) -> StampRequest {
        StampRequest {
            position: Point2D::new(x, y),
            pressure,
        }
    }

    fn grain_brush() -> Brush {
        let mut brush = Brush::default();
        brush.shape.grain_texture = GrainTexture::Texture(Arc::new(Texture::from_surface(CpuSurface::new(4, 4))));
        brush.grain.scale = 2.0;
        brush.grain.rotation = 0.75;
        brush.grain.intensity = 0.3;
        brush
    }

    #[test]
    fn test_size_and_alpha_follow_pressure() {
        let mut compositor = StampCompositor::new(FixedJitter(0.0));
        let mut brush = Brush::default();
        brush.size = 40.0;
        brush.alpha = 0.8;

        let stamp = compositor.composite(&request(10.0, 10.0, 0.5), &brush);
        assert!((stamp.base.size - 20.0).abs() < 1e-9);
        assert!((stamp.base.alpha - 0.4).abs() < 1e-9);
        assert_eq!(stamp.base.position, Point2D::new(10.0, 10.0));
        assert_eq!(stamp.base.blend_mode, BlendMode::Normal);
    }

    #[test]
    fn test_zero_pressure_treated_as_half() {
        let mut compositor = StampCompositor::new(FixedJitter(0.0));
        let brush = Brush::default();
        let stamp = compositor.composite(&request(0.0, 0.0, 0.0), &brush);
        assert!((stamp.base.size - brush.size * 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_floor() {
        let mut compositor = StampCompositor::new(FixedJitter(0.0));
        let mut brush = Brush::default();
        brush.alpha = 0.1;
        let stamp = compositor.composite(&request(0.0, 0.0, 0.05), &brush);
        assert_eq!(stamp.base.alpha, MIN_STAMP_ALPHA);
    }

    #[test]
    fn test_tint_uses_brush_color() {
        let mut compositor = StampCompositor::new(FixedJitter(0.0));
        let mut brush = Brush::default();
        brush.set_color(Rgb::new(0, 255, 0));
        let stamp = compositor.composite(&request(0.0, 0.0, 1.0), &brush);
        assert_eq!(stamp.base.color_matrix, ColorMatrix::tint(Rgb::new(0, 255, 0)));
    }

    #[test]
    fn test_jitter_bounds() {
        let mut compositor = StampCompositor::new(RandomJitter::from_seed(7));
        let mut brush = Brush::default();
        brush.size = 20.0;
        brush.stroke.jitter_fraction = 0.5;
        // displacement 10 => offsets within +/-5 on each axis
        for _ in 0..500 {
            let stamp = compositor.composite(&request(100.0, 100.0, 1.0), &brush);
            assert!((stamp.base.position.x - 100.0).abs() <= 5.0 + 1e-9);
            assert!((stamp.base.position.y - 100.0).abs() <= 5.0 + 1e-9);
        }
    }

    #[test]
    fn test_fixed_jitter_offsets_both_axes() {
        let mut compositor = StampCompositor::new(FixedJitter(0.5));
        let mut brush = Brush::default();
        brush.size = 20.0;
        brush.stroke.jitter_fraction = 0.5;
        let stamp = compositor.composite(&request(0.0, 0.0, 1.0), &brush);
        assert_eq!(stamp.base.position, Point2D::new(5.0, 5.0));
    }

    #[test]
    fn test_no_grain_yields_single_primitive() {
        let mut compositor = StampCompositor::new(FixedJitter(0.0));
        let stamp = compositor.composite(&request(0.0, 0.0, 1.0), &Brush::default());
        assert!(stamp.grain.is_none());
        assert_eq!(stamp.into_primitives().count(), 1);
    }

    #[test]
    fn test_grain_overlay_below_base() {
        let mut compositor = StampCompositor::new(FixedJitter(0.25));
        let mut brush = grain_brush();
        brush.stroke.jitter_fraction = 1.0;

        let stamp = compositor.composite(&request(50.0, 50.0, 1.0), &brush);
        let grain = stamp.grain.as_ref().unwrap();
        assert_eq!(grain.position, stamp.base.position);
        assert!((grain.size - brush.size * 2.0).abs() < 1e-9);
        assert_eq!(grain.rotation, 0.75);
        assert_eq!(grain.alpha, 0.3);
        assert_eq!(grain.blend_mode, BlendMode::Multiply);
        assert!(grain.color_matrix.is_identity());

        let order: Vec<BlendMode> = stamp.into_primitives().map(|p| p.blend_mode).collect();
        assert_eq!(order, vec![BlendMode::Multiply, BlendMode::Normal]);
    }
}
