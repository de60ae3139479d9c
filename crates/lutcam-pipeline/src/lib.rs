//! Camera capture to renderer synchronization.
//!
//! Frames from a [`FrameSource`] are gated by a [`ReadinessGate`], paired with
//! the LUT strip window computed by the [`ScrollWindowMapper`], and handed to
//! a [`Renderer`]. UI gestures reach the renderer through the same delivery
//! context as frames, so renderer calls never race.

pub mod config;
mod delivery;
pub mod forwarder;
pub mod halt;
pub mod readiness;
pub mod renderer;
pub mod scroll_window;
pub mod selection;
mod session;
pub mod source;
mod state;

pub use config::{SessionConfig, CURRENT_VERSION};
pub use forwarder::{DropReason, ForwardContext, ForwarderStats, FrameForwarder, FrameOutcome};
pub use halt::HaltSignal;
pub use readiness::{Condition, ReadinessGate, ReadinessState};
pub use renderer::{FrameUpdate, LoopGuard, PlaneView, Renderer};
pub use scroll_window::{compute_window, ScrollWindow, ScrollWindowMapper, StripGeometry};
pub use selection::{to_renderer_index, SelectionTracker, FIRST_LUT_ID};
pub use session::CaptureSession;
pub use source::{choose_preview_size, FrameNotifier, FrameSource, IdentityLuts, LutProvider};
pub use state::{Phase, SessionEvent};
