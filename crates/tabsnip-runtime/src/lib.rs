//! Capture runtime: the three contexts of a region-capture flow.
//!
//! - [`coordinator`]: the long-lived background context owning the capture
//!   primitive, the screenshot slot, and the live session
//! - [`overlay`]: the per-page drawing overlay with its drag state machine
//! - [`launcher`]: the short-lived popup context that starts sessions
//!
//! Contexts are isolated tasks. They never share state; commands,
//! acknowledgements, and notifications over channels are the only traffic
//! between them, and every wait on another context is either bounded or
//! fails fast when the peer is gone.

pub mod coordinator;
pub mod launcher;
pub mod overlay;

pub use coordinator::{Coordinator, CoordinatorHandle, SessionGrant};
pub use launcher::{Launcher, StartOutcome};
pub use overlay::{InjectOutcome, OverlayController, OverlayHandle, OverlayOptions};
