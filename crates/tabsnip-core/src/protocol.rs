//! Cross-context message vocabulary.
//!
//! Commands flow from the launcher through the coordinator to a page
//! overlay; acknowledgements flow back; capture notifications are broadcast
//! to every subscriber. Contexts never share state, these messages are the
//! only traffic between them.

use serde::{Deserialize, Serialize};

use crate::frame::Artifact;

/// Commands a page overlay accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum OverlayCommand {
    /// Show the overlay and wait for a drag
    StartDrawing,
    /// Remove the overlay without capturing
    CancelDrawing,
}

/// Synchronous acknowledgement to an [`OverlayCommand`].
///
/// Acks report the command was accepted, not that any capture finished.
/// A `start-drawing` to an already armed overlay still acks `started`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum OverlayAck {
    Started,
    Cancelled,
}

/// Result of forwarding a command to a tab.
///
/// A missing listener is an expected outcome on first visit (the overlay
/// script is not injected yet), not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    /// The overlay acknowledged the command
    Acked(OverlayAck),
    /// No listener answered within the bounded wait
    NoListener,
}

/// Notifications broadcast by the coordinator after state changes land.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum CaptureEvent {
    /// A new artifact was written to the screenshot slot. The write is
    /// complete before this event is sent, so subscribers can read the
    /// slot immediately.
    ScreenshotCaptured { artifact: Artifact },
}
