/// Pressure substituted for a reported pressure of exactly zero ("unknown").
pub const DEFAULT_PRESSURE: f64 = 0.5;

/// Floor on stamp spacing in pixels. Keeps stamp counts finite.
pub const MIN_STAMP_SPACING: f64 = 1.0;

/// Upper bound on spacing intervals per segment, so one pointer move has
/// bounded cost however far the pointer jumped.
pub const MAX_STAMPS_PER_SEGMENT: u32 = 10_000;

/// Floor on stamp alpha so light touches stay visible.
pub const MIN_STAMP_ALPHA: f64 = 0.2;

/// Diameter of the generated fallback shape texture.
pub const FALLBACK_TEXTURE_SIZE: u32 = 64;

pub use stipple_config::{DEFAULT_CURVE_SAMPLES, DEFAULT_FLATTEN_DELAY_MS, DEFAULT_MIN_POINT_DISTANCE};
