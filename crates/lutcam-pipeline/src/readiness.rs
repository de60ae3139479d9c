//! Readiness gate for a capture session.
//!
//! Three conditions arrive independently and in any order: camera permission,
//! the preview surface, and the measured LUT strip layout. The gate keeps them
//! as a bitmask and derives two answers from it:
//!
//! - [`ReadinessGate::may_process_frames`]: surface and layout are both set.
//! - [`ReadinessGate::should_start_capture`]: a latch that answers `true` to
//!   exactly one query, the first one after permission and surface are both
//!   satisfied.
//!
//! Permission does not take part in `may_process_frames`. Frames cannot arrive
//! before capture starts, and capture cannot start without permission.

use serde::{Deserialize, Serialize};

/// One readiness condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    Permission,
    Surface,
    Layout,
}

impl Condition {
    const fn bit(self) -> u8 {
        match self {
            Self::Permission => 0b001,
            Self::Surface => 0b010,
            Self::Layout => 0b100,
        }
    }
}

const CAPTURE_MASK: u8 = Condition::Permission.bit() | Condition::Surface.bit();
const PROCESS_MASK: u8 = Condition::Surface.bit() | Condition::Layout.bit();

/// Snapshot of the three readiness flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadinessState {
    pub permission_granted: bool,
    pub surface_ready: bool,
    pub layout_ready: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum CaptureLatch {
    #[default]
    Waiting,
    /// Both conditions met; the next query fires.
    Armed,
    Fired,
}

/// Conjunction of independently arriving readiness events.
#[derive(Debug, Clone, Default)]
pub struct ReadinessGate {
    satisfied: u8,
    latch: CaptureLatch,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_permission(&mut self, granted: bool) {
        self.set(Condition::Permission, granted);
    }

    pub fn set_surface_ready(&mut self, ready: bool) {
        self.set(Condition::Surface, ready);
    }

    pub fn set_layout_ready(&mut self, ready: bool) {
        self.set(Condition::Layout, ready);
    }

    /// Set or clear one condition.
    pub fn set(&mut self, condition: Condition, value: bool) {
        if value {
            self.satisfied |= condition.bit();
        } else {
            self.satisfied &= !condition.bit();
        }
        let capture_ready = self.satisfied & CAPTURE_MASK == CAPTURE_MASK;
        self.latch = match self.latch {
            CaptureLatch::Waiting if capture_ready => CaptureLatch::Armed,
            // Cleared again before anyone asked
            CaptureLatch::Armed if !capture_ready => CaptureLatch::Waiting,
            latch => latch,
        };
    }

    pub fn is_set(&self, condition: Condition) -> bool {
        self.satisfied & condition.bit() != 0
    }

    /// Frames may be forwarded to the renderer.
    pub fn may_process_frames(&self) -> bool {
        self.satisfied & PROCESS_MASK == PROCESS_MASK
    }

    /// `true` exactly once per gate: on the first query after permission and
    /// surface have both become true. The caller owns acting on it.
    pub fn should_start_capture(&mut self) -> bool {
        if self.latch == CaptureLatch::Armed {
            self.latch = CaptureLatch::Fired;
            true
        } else {
            false
        }
    }

    /// Whether the capture trigger has already fired.
    pub fn capture_triggered(&self) -> bool {
        self.latch == CaptureLatch::Fired
    }

    /// Number of conditions still outstanding.
    pub fn pending(&self) -> u32 {
        3 - self.satisfied.count_ones()
    }

    pub fn state(&self) -> ReadinessState {
        ReadinessState {
            permission_granted: self.is_set(Condition::Permission),
            surface_ready: self.is_set(Condition::Surface),
            layout_ready: self.is_set(Condition::Layout),
        }
    }

    /// Back to all-false, latch re-armed for a new session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
