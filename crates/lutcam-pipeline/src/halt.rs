//! Teardown signal shared by the session owner and the delivery context.
//!
//! Every renderer call on the delivery context runs under a [`HaltSignal`]
//! permit. Halting flips the flag first and then waits for the permit in
//! flight, so once [`HaltSignal::halt`] returns no renderer call can start.

use parking_lot::{RwLock, RwLockReadGuard};
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Default)]
pub struct HaltSignal {
    requested: AtomicBool,
    calls: RwLock<()>,
}

/// Proof that no halt was requested when the call started.
pub struct CallPermit<'a> {
    _guard: RwLockReadGuard<'a, ()>,
}

impl HaltSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Permit for one renderer call, or `None` once teardown began.
    /// Drop the permit before asking for the next one.
    pub fn permit(&self) -> Option<CallPermit<'_>> {
        let guard = self.calls.read();
        if self.requested.load(Ordering::Acquire) {
            return None;
        }
        Some(CallPermit { _guard: guard })
    }

    /// Begin teardown and wait for the call in flight, if any.
    pub fn halt(&self) {
        self.requested.store(true, Ordering::Release);
        drop(self.calls.write());
    }

    pub fn is_halted(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }
}
