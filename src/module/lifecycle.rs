//! Start/stop state of a module.

use std::sync::atomic::{AtomicU8, Ordering};

const STOPPED: u8 = 0;
const STARTING: u8 = 1;
const STARTED: u8 = 2;
const STOPPING: u8 = 3;

/// Lifecycle state of one node.
///
/// `Stopped → Starting → Started → Stopping → Stopped`. Cloning yields a
/// fresh, stopped cell: a cloned node is a different node.
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: AtomicU8,
}

impl Clone for Lifecycle {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(STOPPED),
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.load(Ordering::Acquire) == STARTED
    }

    /// Claim the `Stopped → Starting` transition.
    pub(crate) fn begin_start(&self) -> bool {
        self.transition(STOPPED, STARTING)
    }

    pub(crate) fn finish_start(&self, ok: bool) {
        self.state
            .store(if ok { STARTED } else { STOPPED }, Ordering::Release);
    }

    /// Claim the `Started → Stopping` transition.
    pub(crate) fn begin_stop(&self) -> bool {
        self.transition(STARTED, STOPPING)
    }

    pub(crate) fn finish_stop(&self, ok: bool) {
        self.state
            .store(if ok { STOPPED } else { STARTED }, Ordering::Release);
    }

    fn transition(&self, from: u8, to: u8) -> bool {
        self.state
            .compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
