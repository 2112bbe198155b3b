use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PRESSURE;

/// A position in render-surface coordinates
pub type Point2D = DVec2;

/// Substitute the default pressure for an unreported (zero) sample
#[inline]
pub fn effective_pressure(pressure: f64) -> f64 {
    if pressure > 0.0 { pressure } else { DEFAULT_PRESSURE }
}

/// One accepted pointer sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub position: Point2D,
    /// Raw pressure in [0, 1]; 0 means "not reported"
    pub pressure: f64,
}

impl PathPoint {
    pub fn new(position: Point2D, pressure: f64) -> Self {
        Self {
            position,
            pressure: pressure.clamp(0.0, 1.0),
        }
    }
}

/// A request to place one stamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StampRequest {
    pub position: Point2D,
    pub pressure: f64,
}

/// 8-bit RGB color supplied by the color picker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels normalized to [0, 1]
    pub fn normalized(&self) -> [f32; 3] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        ]
    }
}

/// Compositing mode of a render primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum BlendMode {
    /// Source-over
    #[default]
    Normal = 0,
    /// Multiplies the destination color; never adds color
    Multiply = 1,
}
