//! Shared configuration for stipple
//!
//! This crate provides the single source of truth for canvas dimensions
//! and the tuning knobs of the stroke pipeline (input denoising, curve
//! sampling and flatten debouncing).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default canvas width in pixels
pub const DEFAULT_WIDTH: u32 = 1920;

/// Default canvas height in pixels
pub const DEFAULT_HEIGHT: u32 = 1080;

/// Default scale factor (1.0 = no scaling)
pub const DEFAULT_SCALE: f32 = 1.0;

/// Pointer samples closer than this to the last accepted one are dropped.
pub const DEFAULT_MIN_POINT_DISTANCE: f64 = 4.0;

/// Number of chords used to estimate a segment's arc length.
pub const DEFAULT_CURVE_SAMPLES: u32 = 20;

/// Quiescence delay between a stroke ending and the trail being flattened.
pub const DEFAULT_FLATTEN_DELAY_MS: u64 = 500;

/// Display configuration for the painting surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Canvas width in logical pixels
    pub width: u32,
    /// Canvas height in logical pixels
    pub height: u32,
    /// Scale factor for DPI scaling
    pub scale: f32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            scale: DEFAULT_SCALE,
        }
    }
}

impl DisplayConfig {
    /// Create a new display config with the given dimensions
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            scale: DEFAULT_SCALE,
        }
    }

    /// Get scaled width (for physical pixel calculations)
    pub fn scaled_width(&self) -> u32 {
        (self.width as f32 * self.scale) as u32
    }

    /// Get scaled height (for physical pixel calculations)
    pub fn scaled_height(&self) -> u32 {
        (self.height as f32 * self.scale) as u32
    }
}

/// Tuning for the stroke-to-stamp pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrokeConfig {
    /// Minimum distance in device pixels between accepted path points
    pub min_point_distance: f64,
    /// Chord count for arc-length estimation
    pub curve_samples: u32,
    /// Debounce delay before the live trail is flattened, in milliseconds
    pub flatten_delay_ms: u64,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            min_point_distance: DEFAULT_MIN_POINT_DISTANCE,
            curve_samples: DEFAULT_CURVE_SAMPLES,
            flatten_delay_ms: DEFAULT_FLATTEN_DELAY_MS,
        }
    }
}

impl StrokeConfig {
    /// Flatten delay as a [`Duration`]
    pub fn flatten_delay(&self) -> Duration {
        Duration::from_millis(self.flatten_delay_ms)
    }

    /// Curve sample count, never zero
    pub fn curve_samples(&self) -> u32 {
        self.curve_samples.max(1)
    }
}

/// Complete session configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub display: DisplayConfig,
    pub stroke: StrokeConfig,
}
