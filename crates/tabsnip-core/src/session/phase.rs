//! Overlay lifecycle phases.

use serde::{Deserialize, Serialize};

/// Lifecycle of the drawing overlay on a page, as reported to the
/// coordinator.
///
/// Within one session phases only move forward; `TornDown` is terminal.
/// After teardown the page itself drops back to `Idle`, ready for the next
/// session, while the listener stays registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayPhase {
    /// No overlay element on the page
    Idle,
    /// Overlay shown, waiting for the drag to start
    Armed,
    /// Pointer is down, rectangle follows the pointer
    Dragging,
    /// Pointer released, rectangle frozen
    Finalized,
    /// Overlay removed (capture handed off, cancelled, or drag too small)
    TornDown,
}

impl std::fmt::Display for OverlayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Armed => "armed",
            Self::Dragging => "dragging",
            Self::Finalized => "finalized",
            Self::TornDown => "torn_down",
        };
        write!(f, "{name}")
    }
}
