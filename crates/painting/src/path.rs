//! Pointer sample accumulation for the active stroke

use tracing::trace;

use crate::constants::DEFAULT_MIN_POINT_DISTANCE;
use crate::types::{PathPoint, Point2D};

/// Accepted samples of the stroke in progress.
///
/// Successive points are always at least `min_distance` apart; closer
/// samples are pointer jitter and get dropped.
#[derive(Debug, Clone)]
pub struct PathTracker {
    points: Vec<PathPoint>,
    active: bool,
    min_distance: f64,
}

impl Default for PathTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_POINT_DISTANCE)
    }
}

impl PathTracker {
    pub fn new(min_distance: f64) -> Self {
        Self {
            points: Vec::new(),
            active: false,
            min_distance: min_distance.max(0.0),
        }
    }

    /// Reset the path to the single starting sample and mark the stroke
    /// active. Returns false, leaving the tracker untouched, for a
    /// non-finite position.
    pub fn start(&mut self, position: Point2D, pressure: f64) -> bool {
        if !position.is_finite() {
            trace!("PathTracker::start: rejected non-finite sample {:?}", position);
            return false;
        }
        self.points.clear();
        self.points.push(PathPoint::new(position, pressure));
        self.active = true;
        true
    }

    /// Offer a new sample. Returns the accepted point count, or `None` when
    /// the stroke is inactive or the sample was too close to the last one.
    pub fn push(&mut self, position: Point2D, pressure: f64) -> Option<usize> {
        if !self.active {
            return None;
        }
        if !position.is_finite() {
            trace!("PathTracker::push: rejected non-finite sample {:?}", position);
            return None;
        }
        if let Some(last) = self.points.last() {
            let distance = last.position.distance(position);
            if distance < self.min_distance {
                trace!("PathTracker::push: dropped sample {:.2}px from last", distance);
                return None;
            }
        }
        self.points.push(PathPoint::new(position, pressure));
        Some(self.points.len())
    }

    /// Mark the stroke inactive and drop all points
    pub fn finish(&mut self) {
        self.points.clear();
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn min_distance(&self) -> f64 {
        self.min_distance
    }
}
