//! Per-frame coalescing of recompute work.
//!
//! Work that would otherwise run on every keystroke (mention re-query,
//! overlay repositioning) is scheduled through a [`FrameSlot`]: scheduling
//! again before the frame fires cancels the pending frame and replaces it.

/// Identifier of a scheduled frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(pub u64);

/// Platform animation-frame scheduling.
///
/// The browser implementation wraps `requestAnimationFrame`; when a frame
/// fires, the host routes its id back to the module that requested it.
pub trait FrameScheduler {
    fn request(&mut self) -> FrameId;

    fn cancel(&mut self, id: FrameId);
}

/// A single "latest wins" frame slot.
#[derive(Debug, Default)]
pub struct FrameSlot {
    pending: Option<FrameId>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a frame, cancelling any frame still pending in this slot.
    pub fn schedule<F: FrameScheduler + ?Sized>(&mut self, frames: &mut F) -> FrameId {
        if let Some(stale) = self.pending.take() {
            frames.cancel(stale);
        }
        let id = frames.request();
        self.pending = Some(id);
        id
    }

    /// Consume the slot if `id` is the frame it is waiting for.
    ///
    /// Returns false for cancelled or unknown frames, which must be ignored.
    pub fn fire(&mut self, id: FrameId) -> bool {
        if self.pending == Some(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    pub fn cancel<F: FrameScheduler + ?Sized>(&mut self, frames: &mut F) {
        if let Some(id) = self.pending.take() {
            frames.cancel(id);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Frame scheduler driven by hand: for native hosts and deterministic tests.
#[derive(Debug, Default)]
pub struct ManualFrames {
    next: u64,
    queued: Vec<FrameId>,
    cancelled: Vec<FrameId>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames requested and not cancelled, in request order. Clears the queue.
    pub fn take_queued(&mut self) -> Vec<FrameId> {
        std::mem::take(&mut self.queued)
    }

    pub fn queued(&self) -> &[FrameId] {
        &self.queued
    }

    pub fn cancelled(&self) -> &[FrameId] {
        &self.cancelled
    }
}

impl FrameScheduler for ManualFrames {
    fn request(&mut self) -> FrameId {
        self.next += 1;
        let id = FrameId(self.next);
        self.queued.push(id);
        id
    }

    fn cancel(&mut self, id: FrameId) {
        self.queued.retain(|queued| *queued != id);
        self.cancelled.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_schedule_cancels_first() {
        let mut frames = ManualFrames::new();
        let mut slot = FrameSlot::new();

        let first = slot.schedule(&mut frames);
        let second = slot.schedule(&mut frames);

        assert_eq!(frames.queued(), &[second]);
        assert_eq!(frames.cancelled(), &[first]);
        assert!(!slot.fire(first));
        assert!(slot.fire(second));
        assert!(!slot.is_pending());
    }

    #[test]
    fn test_fire_is_single_shot() {
        let mut frames = ManualFrames::new();
        let mut slot = FrameSlot::new();

        let id = slot.schedule(&mut frames);
        assert!(slot.fire(id));
        assert!(!slot.fire(id));
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut frames = ManualFrames::new();
        let mut slot = FrameSlot::new();

        let id = slot.schedule(&mut frames);
        slot.cancel(&mut frames);

        assert!(frames.queued().is_empty());
        assert!(!slot.fire(id));
    }
}
