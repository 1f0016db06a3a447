//! Capture session domain model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::phase::OverlayPhase;
use crate::frame::TabId;
use crate::geometry::SelectionRect;

/// One region-capture attempt on one tab.
///
/// Created when the launcher starts a capture, updated from overlay phase
/// reports, destroyed when the overlay tears down (capture handed off,
/// cancelled, or the tab going away). At most one session is live at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// The tab the overlay runs on
    pub tab: TabId,
    /// Overlay phase as last reported
    pub phase: OverlayPhase,
    /// Final selection, set once the overlay finalizes
    pub selection: Option<SelectionRect>,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp when the session was last updated (ISO 8601 format)
    pub updated_at: String,
}

impl Session {
    /// Creates a session for `tab` in the initial phase.
    pub fn new(tab: TabId) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: Uuid::new_v4().to_string(),
            tab,
            phase: OverlayPhase::Idle,
            selection: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Applies a phase report and bumps `updated_at`.
    ///
    /// The selection only ever moves from `None` to `Some`; a teardown
    /// report does not erase the finalized rectangle.
    pub fn apply_phase(&mut self, phase: OverlayPhase, selection: Option<SelectionRect>) {
        self.phase = phase;
        if selection.is_some() {
            self.selection = selection;
        }
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// True while the overlay can still accept drawing input.
    pub fn is_live(&self) -> bool {
        !matches!(self.phase, OverlayPhase::TornDown)
    }
}
