//! Live trail bookkeeping and debounced flattening
//!
//! Every stamp primitive lives on the render surface until the next flatten,
//! which bakes the whole visible composition into the persistent bitmap and
//! destroys the primitives. Flattens are debounced so a burst of short
//! strokes costs one re-rasterization.
//!
//! ```text
//! Idle --push--> Accumulating --schedule--> FlattenScheduled
//!   ^                                             |
//!   +------------- Flattening <----poll(due)------+
//! ```

use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::constants::DEFAULT_FLATTEN_DELAY_MS;
use crate::render::{PrimitiveHandle, RasterError, RenderSurface};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FlattenError {
    #[error("Flatten failed, live trail kept ({live} primitives): {source}")]
    Raster {
        live: usize,
        #[source]
        source: RasterError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailState {
    /// No live primitives
    Idle,
    /// Live primitives exist, no flatten pending
    Accumulating,
    /// A flatten deadline is pending
    FlattenScheduled,
    /// Rasterization in progress
    Flattening,
}

/// Owns the handles of all primitives added since the last flatten
#[derive(Debug)]
pub struct TrailManager {
    live: Vec<PrimitiveHandle>,
    state: TrailState,
    delay: Duration,
    deadline: Option<Instant>,
    flatten_count: u64,
}

impl Default for TrailManager {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_FLATTEN_DELAY_MS))
    }
}

impl TrailManager {
    pub fn new(delay: Duration) -> Self {
        Self {
            live: Vec::new(),
            state: TrailState::Idle,
            delay,
            deadline: None,
            flatten_count: 0,
        }
    }

    /// Record a freshly added primitive
    pub fn push(&mut self, handle: PrimitiveHandle) {
        self.live.push(handle);
        if self.state == TrailState::Idle {
            self.state = TrailState::Accumulating;
        }
    }

    /// (Re)start the debounce timer. A pending deadline is superseded.
    pub fn schedule_flatten(&mut self, now: Instant) {
        let deadline = now + self.delay;
        if self.deadline.replace(deadline).is_some() {
            debug!("TrailManager: superseding pending flatten");
        }
        self.state = TrailState::FlattenScheduled;
    }

    /// Run the flatten if its deadline has passed. Returns whether it ran.
    pub fn poll<S: RenderSurface + ?Sized>(&mut self, now: Instant, surface: &mut S) -> Result<bool, FlattenError> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.flatten(surface)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Bake persistent bitmap plus live trail into a new persistent bitmap,
    /// then destroy the live primitives. On failure nothing is replaced or
    /// destroyed.
    pub fn flatten<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> Result<(), FlattenError> {
        self.deadline = None;
        self.state = TrailState::Flattening;

        let bitmap = match surface.rasterize() {
            Ok(bitmap) => bitmap,
            Err(source) => {
                warn!("Flatten failed with {} live primitives: {}", self.live.len(), source);
                self.state = self.resting_state();
                return Err(FlattenError::Raster {
                    live: self.live.len(),
                    source,
                });
            }
        };

        surface.set_persistent(bitmap);
        let drained = self.live.len();
        for handle in self.live.drain(..) {
            surface.destroy_primitive(handle);
        }
        self.state = TrailState::Idle;
        self.flatten_count += 1;
        info!("Flattened {} primitives into persistent surface", drained);
        Ok(())
    }

    /// Cancel any pending flatten, reset the persistent bitmap and destroy
    /// every live primitive. Valid from any state.
    pub fn clear<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) {
        self.deadline = None;
        surface.clear_persistent();
        let drained = self.live.len();
        for handle in self.live.drain(..) {
            surface.destroy_primitive(handle);
        }
        self.state = TrailState::Idle;
        info!("Cleared canvas ({} live primitives destroyed)", drained);
    }

    fn resting_state(&self) -> TrailState {
        if self.live.is_empty() {
            TrailState::Idle
        } else {
            TrailState::Accumulating
        }
    }

    pub fn state(&self) -> TrailState {
        self.state
    }

    pub fn live(&self) -> &[PrimitiveHandle] {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of successful flattens so far
    pub fn flatten_count(&self) -> u64 {
        self.flatten_count
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::render::StampPrimitive;
    use crate::surface::CpuSurface;

    /// Render surface double that records calls and can be told to fail
    #[derive(Debug, Default)]
    pub(crate) struct RecordingSurface {
        pub next: u64,
        pub live: Vec<PrimitiveHandle>,
        pub destroyed: Vec<PrimitiveHandle>,
        pub rasterize_calls: std::cell::Cell<usize>,
        pub persistent_sets: usize,
        pub persistent_clears: usize,
        pub fail: bool,
    }

    impl RenderSurface for RecordingSurface {
        fn add_primitive(&mut self, _primitive: StampPrimitive) -> PrimitiveHandle {
            let handle = PrimitiveHandle(self.next);
            self.next += 1;
            self.live.push(handle);
            handle
        }

        fn destroy_primitive(&mut self, handle: PrimitiveHandle) {
            self.live.retain(|h| *h != handle);
            self.destroyed.push(handle);
        }

        fn rasterize(&self) -> Result<CpuSurface, RasterError> {
            self.rasterize_calls.set(self.rasterize_calls.get() + 1);
            if self.fail {
                Err(RasterError::Backend("out of memory".into()))
            } else {
                Ok(CpuSurface::new(1, 1))
            }
        }

        fn set_persistent(&mut self, _bitmap: CpuSurface) {
            self.persistent_sets += 1;
        }

        fn clear_persistent(&mut self) {
            self.persistent_clears += 1;
        }

        fn primitive_count(&self) -> usize {
            self.live.len()
        }
    }

    fn handles(n: u64) -> Vec<PrimitiveHandle> {
        (0..n).map(PrimitiveHandle).collect()
    }

    #[test]
    fn test_push_moves_to_accumulating() {
        let mut trail = TrailManager::default();
        assert_eq!(trail.state(), TrailState::Idle);
        trail.push(PrimitiveHandle(0));
        assert_eq!(trail.state(), TrailState::Accumulating);
        assert_eq!(trail.len(), 1);
    }

    #[test]
    fn test_flatten_drains_trail() {
        let mut surface = RecordingSurface::default();
        let mut trail = TrailManager::default();
        for h in handles(3) {
            trail.push(h);
        }

        trail.flatten(&mut surface).unwrap();
        assert!(trail.is_empty());
        assert_eq!(trail.state(), TrailState::Idle);
        assert_eq!(surface.destroyed, handles(3));
        assert_eq!(surface.persistent_sets, 1);
        assert_eq!(trail.flatten_count(), 1);
    }

    #[test]
    fn test_debounce_coalesces() {
        let mut surface = RecordingSurface::default();
        let mut trail = TrailManager::new(Duration::from_millis(500));
        let t0 = Instant::now();
        trail.push(PrimitiveHandle(0));

        trail.schedule_flatten(t0);
        trail.schedule_flatten(t0 + Duration::from_millis(300));
        assert_eq!(trail.state(), TrailState::FlattenScheduled);

        // The first deadline was superseded
        assert!(!trail.poll(t0 + Duration::from_millis(600), &mut surface).unwrap());
        assert!(trail.poll(t0 + Duration::from_millis(800), &mut surface).unwrap());
        assert!(!trail.poll(t0 + Duration::from_millis(2000), &mut surface).unwrap());

        assert_eq!(surface.rasterize_calls.get(), 1);
        assert_eq!(trail.flatten_count(), 1);
    }

    #[test]
    fn test_failed_flatten_keeps_state() {
        let mut surface = RecordingSurface {
            fail: true,
            ..Default::default()
        };
        let mut trail = TrailManager::default();
        let t0 = Instant::now();
        trail.push(PrimitiveHandle(0));
        trail.push(PrimitiveHandle(1));
        trail.schedule_flatten(t0);

        let err = trail.poll(t0 + trail.delay(), &mut surface).unwrap_err();
        assert!(matches!(err, FlattenError::Raster { live: 2, .. }));
        assert_eq!(trail.len(), 2);
        assert_eq!(trail.state(), TrailState::Accumulating);
        assert_eq!(surface.persistent_sets, 0);
        assert!(surface.destroyed.is_empty());
        // No retry on the next tick
        assert!(!trail.poll(t0 + Duration::from_secs(5), &mut surface).unwrap());
        assert_eq!(surface.rasterize_calls.get(), 1);
    }

    #[test]
    fn test_clear_from_scheduled() {
        let mut surface = RecordingSurface::default();
        let mut trail = TrailManager::default();
        let t0 = Instant::now();
        trail.push(PrimitiveHandle(4));
        trail.schedule_flatten(t0);

        trail.clear(&mut surface);
        assert!(trail.is_empty());
        assert_eq!(trail.state(), TrailState::Idle);
        assert_eq!(trail.deadline(), None);
        assert_eq!(surface.persistent_clears, 1);
        assert_eq!(surface.destroyed, vec![PrimitiveHandle(4)]);
        // Cancelled timer never fires
        assert!(!trail.poll(t0 + Duration::from_secs(1), &mut surface).unwrap());
        assert_eq!(surface.rasterize_calls.get(), 0);
    }

    #[test]
    fn test_clear_when_idle() {
        let mut surface = RecordingSurface::default();
        let mut trail = TrailManager::default();
        trail.clear(&mut surface);
        assert_eq!(trail.state(), TrailState::Idle);
    }
}
