//! Brush model
//!
//! A [`Brush`] is the single set of visual parameters the segmenter and the
//! compositor read while a stroke is processed. The serializable part lives
//! in [`BrushSettings`]; textures are attached separately through
//! [`BrushShape`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::texture::BrushShape;
use crate::types::Rgb;

#[derive(Debug, Error, PartialEq)]
pub enum BrushError {
    #[error("Invalid brush size: {0}")]
    InvalidSize(f64),
    #[error("Invalid brush alpha: {0} (expected 0..=1)")]
    InvalidAlpha(f64),
    #[error("Invalid spacing fraction: {0} (must be > 0)")]
    InvalidSpacing(f64),
    #[error("Invalid jitter fraction: {0}")]
    InvalidJitter(f64),
}

/// Stamp placement parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeDynamics {
    /// Spacing between stamps as a fraction of the stamp diameter
    pub spacing_fraction: f64,
    /// Random displacement as a fraction of the stamp diameter
    pub jitter_fraction: f64,
    /// Edge softness of the generated shape, 0 = hard, 1 = soft
    pub falloff: f32,
}

impl Default for StrokeDynamics {
    fn default() -> Self {
        Self {
            spacing_fraction: 0.05,
            jitter_fraction: 0.0,
            falloff: 0.0,
        }
    }
}

/// Grain overlay parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrainSettings {
    /// Grain size relative to the stamp size
    pub scale: f64,
    /// Grain opacity
    pub intensity: f64,
    /// Grain rotation in radians
    pub rotation: f64,
}

impl Default for GrainSettings {
    fn default() -> Self {
        Self {
            scale: 1.0,
            intensity: 0.5,
            rotation: 0.0,
        }
    }
}

/// Serializable brush parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrushSettings {
    /// Stamp diameter at full pressure, in pixels
    pub size: f64,
    pub color: Rgb,
    /// Base opacity 0.0-1.0
    pub alpha: f64,
    pub stroke: StrokeDynamics,
    pub grain: GrainSettings,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            size: 20.0,
            color: Rgb::BLACK,
            alpha: 1.0,
            stroke: StrokeDynamics::default(),
            grain: GrainSettings::default(),
        }
    }
}

impl BrushSettings {
    pub fn validate(&self) -> Result<(), BrushError> {
        if !self.size.is_finite() || self.size < 0.0 {
            return Err(BrushError::InvalidSize(self.size));
        }
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(BrushError::InvalidAlpha(self.alpha));
        }
        let spacing = self.stroke.spacing_fraction;
        if !spacing.is_finite() || spacing <= 0.0 {
            return Err(BrushError::InvalidSpacing(spacing));
        }
        let jitter = self.stroke.jitter_fraction;
        if !jitter.is_finite() || jitter < 0.0 {
            return Err(BrushError::InvalidJitter(jitter));
        }
        Ok(())
    }
}

/// The session's brush: parameters plus textures
#[derive(Debug, Clone)]
pub struct Brush {
    pub shape: BrushShape,
    pub stroke: StrokeDynamics,
    pub grain: GrainSettings,
    pub size: f64,
    pub color: Rgb,
    pub alpha: f64,
}

impl Default for Brush {
    fn default() -> Self {
        let settings = BrushSettings::default();
        let shape = BrushShape::fallback(settings.stroke.falloff);
        Self::from_parts(settings, shape)
    }
}

impl Brush {
    /// Create a brush from validated settings and resolved textures
    pub fn new(settings: BrushSettings, shape: BrushShape) -> Result<Self, BrushError> {
        settings.validate()?;
        Ok(Self::from_parts(settings, shape))
    }

    fn from_parts(settings: BrushSettings, shape: BrushShape) -> Self {
        Self {
            shape,
            stroke: settings.stroke,
            grain: settings.grain,
            size: settings.size,
            color: settings.color,
            alpha: settings.alpha,
        }
    }

    /// Current parameters without textures
    pub fn settings(&self) -> BrushSettings {
        BrushSettings {
            size: self.size,
            color: self.color,
            alpha: self.alpha,
            stroke: self.stroke.clone(),
            grain: self.grain.clone(),
        }
    }

    /// Bound to the size slider. Negative or non-finite sizes are ignored.
    pub fn set_size(&mut self, size: f64) {
        if size.is_finite() && size >= 0.0 {
            debug!("Brush::set_size: {:.1} -> {:.1}", self.size, size);
            self.size = size;
        }
    }

    /// Bound to the color picker
    pub fn set_color(&mut self, color: Rgb) {
        debug!("Brush::set_color: {:?}", color);
        self.color = color;
    }

    /// Stamp diameter for an already-substituted pressure
    #[inline]
    pub fn size_for_pressure(&self, effective_pressure: f64) -> f64 {
        self.size * effective_pressure
    }
}
