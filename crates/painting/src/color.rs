//! Per-texel color transforms

use crate::types::Rgb;

/// A 4x5 color matrix: each output channel is a weighted sum of the input
/// RGBA channels plus a constant offset (last column).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix {
    pub rows: [[f32; 5]; 4],
}

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorMatrix {
    pub const IDENTITY: ColorMatrix = ColorMatrix {
        rows: [
            [1.0, 0.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0, 0.0],
        ],
    };

    /// Recolor a white-based texture to `color`. RGB take the target color
    /// with no dependence on the source RGB; alpha passes through untouched.
    pub fn tint(color: Rgb) -> Self {
        let [r, g, b] = color.normalized();
        Self {
            rows: [
                [0.0, 0.0, 0.0, 0.0, r],
                [0.0, 0.0, 0.0, 0.0, g],
                [0.0, 0.0, 0.0, 0.0, b],
                [0.0, 0.0, 0.0, 1.0, 0.0],
            ],
        }
    }

    #[inline]
    pub fn apply(&self, texel: [f32; 4]) -> [f32; 4] {
        let mut out = [0.0; 4];
        for (channel, row) in out.iter_mut().zip(self.rows.iter()) {
            let sum = row[0] * texel[0] + row[1] * texel[1] + row[2] * texel[2] + row[3] * texel[3] + row[4];
            *channel = sum.clamp(0.0, 1.0);
        }
        out
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}
