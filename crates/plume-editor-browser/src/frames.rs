//! `requestAnimationFrame`-backed [`FrameScheduler`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use plume_editor_core::{FrameId, FrameScheduler};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

#[derive(Default)]
struct Pending {
    next: u64,
    // Requested, not yet fired or cancelled: (id, browser handle).
    queue: VecDeque<(FrameId, i32)>,
}

/// Animation frames for one module.
///
/// A single persistent callback serves every request; frames fire in request
/// order, so the callback pops the oldest pending id and hands it to the
/// dispatcher given at construction.
pub struct AnimationFrames {
    window: web_sys::Window,
    pending: Rc<RefCell<Pending>>,
    callback: Closure<dyn FnMut(f64)>,
}

impl AnimationFrames {
    pub fn new(dispatch: impl Fn(FrameId) + 'static) -> Self {
        let pending: Rc<RefCell<Pending>> = Rc::default();
        let queue = pending.clone();
        let callback = Closure::<dyn FnMut(f64)>::new(move |_timestamp: f64| {
            let fired = queue.borrow_mut().queue.pop_front();
            if let Some((id, _)) = fired {
                dispatch(id);
            }
        });

        Self {
            window: gloo_utils::window(),
            pending,
            callback,
        }
    }

    /// Number of frames requested and not yet fired or cancelled.
    pub fn pending(&self) -> usize {
        self.pending.borrow().queue.len()
    }
}

impl FrameScheduler for AnimationFrames {
    fn request(&mut self) -> FrameId {
        let mut pending = self.pending.borrow_mut();
        pending.next += 1;
        let id = FrameId(pending.next);
        match self
            .window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
        {
            Ok(handle) => pending.queue.push_back((id, handle)),
            Err(e) => tracing::warn!("requestAnimationFrame failed: {:?}", e),
        }
        id
    }

    fn cancel(&mut self, id: FrameId) {
        let mut pending = self.pending.borrow_mut();
        if let Some(pos) = pending.queue.iter().position(|(queued, _)| *queued == id) {
            if let Some((_, handle)) = pending.queue.remove(pos) {
                if let Err(e) = self.window.cancel_animation_frame(handle) {
                    tracing::warn!("cancelAnimationFrame failed: {:?}", e);
                }
            }
        }
    }
}

impl Drop for AnimationFrames {
    fn drop(&mut self) {
        for (_, handle) in self.pending.borrow_mut().queue.drain(..) {
            if let Err(e) = self.window.cancel_animation_frame(handle) {
                tracing::warn!("cancelAnimationFrame failed on drop: {:?}", e);
            }
        }
    }
}
