//! Stroke segmentation
//!
//! Turns the growing list of accepted path points into stamp requests, one
//! Catmull-Rom segment at a time.
//!
//! Segment `k` spans point `k` to point `k + 1`. It is emitted exactly once:
//! - `k == 0` as soon as the second point arrives, with duplicated end
//!   control points (a straight line), so the stroke shows up immediately;
//! - `k >= 1` once point `k + 2` exists and can serve as the outgoing
//!   tangent, so rendering lags the cursor by one point;
//! - the last segment when the stroke ends, with `p3 = p2`.

use tracing::{debug, warn};

use crate::brush::Brush;
use crate::constants::{DEFAULT_CURVE_SAMPLES, MAX_STAMPS_PER_SEGMENT, MIN_STAMP_SPACING};
use crate::curve::{estimate_length, point_on_curve};
use crate::types::{PathPoint, StampRequest, effective_pressure};

/// How a segment will be stamped
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPlan {
    /// Estimated arc length in pixels
    pub length: f64,
    /// Distance between stamps in pixels
    pub spacing: f64,
    /// Number of spacing intervals; `stamp_count + 1` requests are emitted
    pub stamp_count: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct StrokeSegmenter {
    curve_samples: u32,
}

impl Default for StrokeSegmenter {
    fn default() -> Self {
        Self::new(DEFAULT_CURVE_SAMPLES)
    }
}

impl StrokeSegmenter {
    pub fn new(curve_samples: u32) -> Self {
        Self {
            curve_samples: curve_samples.max(1),
        }
    }

    /// Stamps owed after a point was appended to `points`
    pub fn on_point_added(&self, points: &[PathPoint], brush: &Brush) -> Vec<StampRequest> {
        match points.len() {
            2 => self.segment(points, 0, brush),
            n if n >= 4 => self.segment(points, n - 3, brush),
            _ => Vec::new(),
        }
    }

    /// Stamps owed when the stroke ends with `points` accepted
    pub fn on_stroke_end(&self, points: &[PathPoint], brush: &Brush) -> Vec<StampRequest> {
        match points.len() {
            0 => Vec::new(),
            1 => {
                debug!("StrokeSegmenter: single-point stroke, one stamp");
                vec![StampRequest {
                    position: points[0].position,
                    pressure: points[0].pressure,
                }]
            }
            // The only segment already went out when the second point arrived
            2 => Vec::new(),
            n => self.segment(points, n - 2, brush),
        }
    }

    /// Stamp segment `k` of `points`, clamping missing neighbours
    pub fn segment(&self, points: &[PathPoint], k: usize, brush: &Brush) -> Vec<StampRequest> {
        if k + 1 >= points.len() {
            return Vec::new();
        }
        let p1 = points[k];
        let p2 = points[k + 1];
        let p0 = if k == 0 { p1 } else { points[k - 1] };
        let p3 = points.get(k + 2).copied().unwrap_or(p2);

        self.stamp_segment([p0, p1, p2, p3], brush)
    }

    /// Plan spacing and count for a segment through four control points
    pub fn plan(&self, controls: &[PathPoint; 4], brush: &Brush) -> SegmentPlan {
        let [p0, p1, p2, p3] = controls;
        let mut length = estimate_length(p0.position, p1.position, p2.position, p3.position, self.curve_samples);
        if !length.is_finite() {
            warn!("StrokeSegmenter::plan: non-finite segment length, stamping as degenerate");
            length = 0.0;
        }

        let pressure = effective_pressure((p1.pressure + p2.pressure) / 2.0);
        let diameter = brush.size_for_pressure(pressure);
        let spacing = (diameter * brush.stroke.spacing_fraction).max(MIN_STAMP_SPACING);
        let intervals = (length / spacing).ceil();
        let stamp_count = if intervals > MAX_STAMPS_PER_SEGMENT as f64 {
            warn!(
                "StrokeSegmenter::plan: {:.0} stamps over {:.1}px, capped at {}",
                intervals, length, MAX_STAMPS_PER_SEGMENT
            );
            MAX_STAMPS_PER_SEGMENT
        } else {
            (intervals as u32).max(1)
        };

        SegmentPlan {
            length,
            spacing,
            stamp_count,
        }
    }

    /// Emit stamp requests at `t = i / count` for `i` in `0..=count`
    pub fn stamp_segment(&self, controls: [PathPoint; 4], brush: &Brush) -> Vec<StampRequest> {
        let plan = self.plan(&controls, brush);
        let [p0, p1, p2, p3] = controls;

        let requests: Vec<StampRequest> = (0..=plan.stamp_count)
            .map(|i| {
                let t = i as f64 / plan.stamp_count as f64;
                StampRequest {
                    position: point_on_curve(t, p0.position, p1.position, p2.position, p3.position),
                    pressure: p1.pressure + (p2.pressure - p1.pressure) * t,
                }
            })
            .collect();

        debug!(
            "StrokeSegmenter: segment ({:.1}, {:.1}) -> ({:.1}, {:.1}), length={:.2}, spacing={:.2}, {} stamps",
            p1.position.x,
            p1.position.y,
            p2.position.x,
            p2.position.y,
            plan.length,
            plan.spacing,
            requests.len()
        );

        requests
    }
}
