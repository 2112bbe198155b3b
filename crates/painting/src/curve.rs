//! Catmull-Rom curve evaluation
//!
//! Stateless helpers used by the segmenter to turn four control points into
//! stamp positions and a length estimate.

use crate::types::Point2D;

/// Evaluate the uniform Catmull-Rom spline through `p1`..`p2` at `t` in [0, 1].
///
/// `p0` and `p3` only shape the tangents. With `p0 == p1` and `p2 == p3`
/// the curve traces the straight segment from `p1` to `p2` (eased, not
/// uniform in `t`).
pub fn point_on_curve(t: f64, p0: Point2D, p1: Point2D, p2: Point2D, p3: Point2D) -> Point2D {
    let t2 = t * t;
    let t3 = t2 * t;

    let a = 2.0 * p1;
    let b = (p2 - p0) * t;
    let c = (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2;
    let d = (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * t3;

    0.5 * (a + b + c + d)
}

/// Estimate the arc length from `p1` to `p2` as the length of a polyline
/// with `samples` equal parameter steps. A zero sample count is treated as one.
pub fn estimate_length(p0: Point2D, p1: Point2D, p2: Point2D, p3: Point2D, samples: u32) -> f64 {
    let samples = samples.max(1);
    let mut length = 0.0;
    let mut previous = p1;

    for i in 1..=samples {
        let t = i as f64 / samples as f64;
        let point = point_on_curve(t, p0, p1, p2, p3);
        length += previous.distance(point);
        previous = point;
    }

    length
}
