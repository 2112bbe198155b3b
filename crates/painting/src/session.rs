//! Painting session
//!
//! This module provides the explicit context object that connects:
//! - Pointer input (via [`PointerEvent`] or the `on_*` methods)
//! - Path tracking and stroke segmentation
//! - Stamp compositing onto the render surface
//! - Live trail flattening
//!
//! All calls are synchronous and in order; the host drives the flatten
//! timer by calling [`PaintSession::tick`] from its event loop.

use std::time::Instant;

use stipple_config::StrokeConfig;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::brush::Brush;
use crate::compositor::{JitterSource, RandomJitter, StampCompositor};
use crate::path::PathTracker;
use crate::render::{CpuCanvas, RenderSurface};
use crate::segmenter::StrokeSegmenter;
use crate::trail::{FlattenError, TrailManager, TrailState};
use crate::types::{Point2D, Rgb, StampRequest};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("A stroke is already active")]
    StrokeAlreadyActive,
    #[error(transparent)]
    Flatten(#[from] FlattenError),
}

/// Discrete pointer input
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Start { position: Point2D, pressure: f64 },
    Move { position: Point2D, pressure: f64 },
    End,
    /// End without the trailing segment
    Cancel,
}

/// One painting surface with its brush, active stroke and live trail
pub struct PaintSession<S = CpuCanvas, J = RandomJitter> {
    brush: Brush,
    tracker: PathTracker,
    segmenter: StrokeSegmenter,
    compositor: StampCompositor<J>,
    trail: TrailManager,
    surface: S,
}

impl PaintSession<CpuCanvas, RandomJitter> {
    /// CPU-backed session with OS-seeded jitter
    pub fn with_cpu_canvas(width: u32, height: u32, config: &StrokeConfig, brush: Brush) -> Self {
        Self::new(CpuCanvas::new(width, height), RandomJitter::from_entropy(), config, brush)
    }
}

impl<S: RenderSurface, J: JitterSource> PaintSession<S, J> {
    pub fn new(surface: S, jitter: J, config: &StrokeConfig, brush: Brush) -> Self {
        Self {
            brush,
            tracker: PathTracker::new(config.min_point_distance),
            segmenter: StrokeSegmenter::new(config.curve_samples()),
            compositor: StampCompositor::new(jitter),
            trail: TrailManager::new(config.flatten_delay()),
            surface,
        }
    }

    /// Dispatch one pointer event. Returns the number of stamps placed.
    pub fn handle(&mut self, event: PointerEvent, now: Instant) -> Result<usize, SessionError> {
        match event {
            PointerEvent::Start { position, pressure } => self.on_start(position, pressure).map(|()| 0),
            PointerEvent::Move { position, pressure } => Ok(self.on_move(position, pressure)),
            PointerEvent::End => Ok(self.on_end(now)),
            PointerEvent::Cancel => {
                self.on_cancel(now);
                Ok(0)
            }
        }
    }

    /// Begin a stroke. Starting while another stroke is active is rejected
    /// and leaves the active stroke untouched.
    pub fn on_start(&mut self, position: Point2D, pressure: f64) -> Result<(), SessionError> {
        if self.tracker.is_active() {
            warn!(
                "Ignoring stroke start at ({:.1}, {:.1}): a stroke is already active",
                position.x, position.y
            );
            return Err(SessionError::StrokeAlreadyActive);
        }
        debug!("PaintSession::on_start({:.1}, {:.1}, {:.2})", position.x, position.y, pressure);
        if !self.tracker.start(position, pressure) {
            debug!("PaintSession::on_start: non-finite position, no stroke started");
        }
        Ok(())
    }

    /// Continue the stroke. Returns the number of stamps placed.
    pub fn on_move(&mut self, position: Point2D, pressure: f64) -> usize {
        if self.tracker.push(position, pressure).is_none() {
            return 0;
        }
        let requests = self.segmenter.on_point_added(self.tracker.points(), &self.brush);
        self.place(&requests)
    }

    /// Finish the stroke: stamp the trailing segment, clear the path and
    /// schedule a flatten. A no-op when no stroke is active.
    pub fn on_end(&mut self, now: Instant) -> usize {
        if !self.tracker.is_active() {
            return 0;
        }
        let requests = self.segmenter.on_stroke_end(self.tracker.points(), &self.brush);
        let placed = self.place(&requests);
        self.finish_stroke(now);
        placed
    }

    /// Abandon the stroke without its trailing segment. Stamps already
    /// placed stay and are flattened as usual.
    pub fn on_cancel(&mut self, now: Instant) {
        if !self.tracker.is_active() {
            return;
        }
        debug!("PaintSession::on_cancel");
        self.finish_stroke(now);
    }

    fn finish_stroke(&mut self, now: Instant) {
        self.tracker.finish();
        self.trail.schedule_flatten(now);
    }

    /// Drive the flatten timer. Returns whether a flatten ran.
    pub fn tick(&mut self, now: Instant) -> Result<bool, SessionError> {
        Ok(self.trail.poll(now, &mut self.surface)?)
    }

    /// Flatten right away, bypassing the timer
    pub fn flatten_now(&mut self) -> Result<(), SessionError> {
        Ok(self.trail.flatten(&mut self.surface)?)
    }

    /// Wipe the canvas. The active stroke, if any, keeps going from its
    /// current path.
    pub fn clear(&mut self) {
        self.trail.clear(&mut self.surface);
        info!("PaintSession::clear");
    }

    fn place(&mut self, requests: &[StampRequest]) -> usize {
        for request in requests {
            let stamp = self.compositor.composite(request, &self.brush);
            for primitive in stamp.into_primitives() {
                let handle = self.surface.add_primitive(primitive);
                self.trail.push(handle);
            }
        }
        requests.len()
    }

    pub fn brush(&self) -> &Brush {
        &self.brush
    }

    /// Replace the brush between strokes. Rejected while a stroke is
    /// active; size and color stay adjustable through their bindings.
    pub fn set_brush(&mut self, brush: Brush) -> Result<(), SessionError> {
        if self.tracker.is_active() {
            warn!("Ignoring brush replacement: a stroke is active");
            return Err(SessionError::StrokeAlreadyActive);
        }
        self.brush = brush;
        Ok(())
    }

    pub fn set_brush_size(&mut self, size: f64) {
        self.brush.set_size(size);
    }

    pub fn set_brush_color(&mut self, color: Rgb) {
        self.brush.set_color(color);
    }

    pub fn is_stroking(&self) -> bool {
        self.tracker.is_active()
    }

    pub fn path(&self) -> &PathTracker {
        &self.tracker
    }

    pub fn trail(&self) -> &TrailManager {
        &self.trail
    }

    pub fn trail_state(&self) -> TrailState {
        self.trail.state()
    }

    pub fn live_primitive_count(&self) -> usize {
        self.trail.len()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn compositor_mut(&mut self) -> &mut StampCompositor<J> {
        &mut self.compositor
    }
}
