//! Serialised, non-reentrant reactions over a module's state.
//!
//! Document writes emit change notifications synchronously, so a module that
//! writes to the document is called back while it is still reacting. The
//! [`Reactor`] queues such calls and runs them after the current reaction
//! returns, in arrival order.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

type Job<T> = Box<dyn FnOnce(&mut T)>;

pub struct Reactor<T> {
    state: RefCell<T>,
    queue: RefCell<VecDeque<Job<T>>>,
    busy: Cell<bool>,
}

impl<T: 'static> Reactor<T> {
    pub fn new(state: T) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(state),
            queue: RefCell::new(VecDeque::new()),
            busy: Cell::new(false),
        })
    }

    /// Build a reactor whose state keeps a weak handle to the reactor itself,
    /// for listeners and futures created from inside reactions.
    pub fn new_cyclic(build: impl FnOnce(&Weak<Self>) -> T) -> Rc<Self> {
        Rc::new_cyclic(|weak| Self {
            state: RefCell::new(build(weak)),
            queue: RefCell::new(VecDeque::new()),
            busy: Cell::new(false),
        })
    }

    /// Run `job` now, or after the current reaction if one is in progress.
    pub fn dispatch(&self, job: impl FnOnce(&mut T) + 'static) {
        self.queue.borrow_mut().push_back(Box::new(job));
        if !self.busy.get() {
            self.drain();
        }
    }

    /// Run `job` immediately and return its result. Returns `None` without
    /// running it if a reaction is already in progress.
    ///
    /// For DOM handlers that must decide synchronously (e.g. whether to
    /// prevent a key's default action).
    pub fn try_run<R>(&self, job: impl FnOnce(&mut T) -> R) -> Option<R> {
        if self.busy.get() {
            return None;
        }
        self.busy.set(true);
        let result = {
            let mut state = self.state.borrow_mut();
            job(&mut state)
        };
        self.busy.set(false);
        self.drain();
        Some(result)
    }

    /// Whether a reaction is running right now.
    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    fn drain(&self) {
        self.busy.set(true);
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(job) = next else {
                break;
            };
            let mut state = self.state.borrow_mut();
            job(&mut state);
        }
        self.busy.set(false);
    }
}

/// Dispatch through a weak handle; a no-op once the module is gone.
pub fn dispatch_weak<T: 'static>(reactor: &Weak<Reactor<T>>, job: impl FnOnce(&mut T) + 'static) {
    if let Some(reactor) = reactor.upgrade() {
        reactor.dispatch(job);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_dispatch_is_queued() {
        let reactor = Reactor::new(Vec::<&'static str>::new());
        let inner = Rc::downgrade(&reactor);

        reactor.dispatch(move |log| {
            log.push("outer start");
            dispatch_weak(&inner, |log| log.push("nested"));
            log.push("outer end");
        });

        let log = reactor.try_run(|log| log.clone()).unwrap();
        assert_eq!(log, ["outer start", "outer end", "nested"]);
    }

    #[test]
    fn test_try_run_refuses_while_busy() {
        let reactor = Reactor::new(0u32);
        let inner = Rc::downgrade(&reactor);

        reactor.dispatch(move |_| {
            let reactor = inner.upgrade().unwrap();
            assert!(reactor.is_busy());
            assert!(reactor.try_run(|n| *n += 1).is_none());
        });

        assert_eq!(reactor.try_run(|n| *n), Some(0));
    }

    #[test]
    fn test_dispatch_after_drop_is_noop() {
        let reactor = Reactor::new(0u32);
        let weak = Rc::downgrade(&reactor);
        drop(reactor);
        dispatch_weak(&weak, |n| *n += 1);
    }
}
