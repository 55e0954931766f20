//! Per-frame scheduling.
//!
//! A [`FrameScheduler`] is the "next display refresh" notification of the
//! host: it calls a registered callback once per refresh until the
//! registration is cancelled.

use std::sync::Arc;

use parking_lot::Mutex;

pub type FrameCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

pub trait FrameScheduler: Send + Sync {
    /// Registers `callback` to run once per display refresh.
    fn schedule(&self, callback: FrameCallback) -> FrameHandle;

    /// Cancels a registration. Unknown or already cancelled handles are ignored.
    fn cancel(&self, handle: FrameHandle);
}

#[derive(Default)]
struct ClockState {
    next_id: u64,
    callbacks: Vec<(FrameHandle, FrameCallback)>,
    refresh_count: u64,
}

/// A scheduler driven by a host that owns its own refresh loop: the host
/// calls [`FrameClock::refresh`] once per repaint.
///
/// Clones share the same registrations.
#[derive(Clone, Default)]
pub struct FrameClock {
    state: Arc<Mutex<ClockState>>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every registered callback once and returns how many ran.
    ///
    /// Callbacks registered during the refresh first run on the next one. A
    /// callback cancelled during the refresh does not run afterwards.
    pub fn refresh(&self) -> usize {
        let pending = {
            let mut state = self.state.lock();
            state.refresh_count += 1;
            state.callbacks.clone()
        };

        let mut invoked = 0;
        for (handle, callback) in pending {
            if self.is_scheduled(handle) {
                callback();
                invoked += 1;
            }
        }
        invoked
    }

    pub fn is_scheduled(&self, handle: FrameHandle) -> bool {
        self.state.lock().callbacks.iter().any(|(h, _)| *h == handle)
    }

    /// Number of live registrations.
    pub fn pending(&self) -> usize {
        self.state.lock().callbacks.len()
    }

    pub fn refresh_count(&self) -> u64 {
        self.state.lock().refresh_count
    }
}

impl FrameScheduler for FrameClock {
    fn schedule(&self, callback: FrameCallback) -> FrameHandle {
        let mut state = self.state.lock();
        let handle = FrameHandle(state.next_id);
        state.next_id += 1;
        state.callbacks.push((handle, callback));
        handle
    }

    fn cancel(&self, handle: FrameHandle) {
        self.state.lock().callbacks.retain(|(h, _)| *h != handle);
    }
}
