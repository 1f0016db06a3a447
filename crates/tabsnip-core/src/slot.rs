//! The persisted screenshot slot.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::frame::Artifact;

/// Slot content: the latest artifact plus an optional identifier assigned
/// by an external service after upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredScreenshot {
    pub artifact: Artifact,
    /// Remote identifier, if the artifact was shipped somewhere
    #[serde(default)]
    pub remote_id: Option<String>,
}

impl StoredScreenshot {
    pub fn new(artifact: Artifact) -> Self {
        Self {
            artifact,
            remote_id: None,
        }
    }
}

/// Single-slot persistence for the most recent capture.
///
/// Last writer wins: `put` replaces whatever is there, and a replaced value
/// leaves no residue. Readers see either the previous complete value or the
/// new complete value, never a mix.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Replaces the slot content with a fresh capture. Any previously
    /// attached remote id is discarded along with the old artifact.
    async fn put(&self, artifact: Artifact) -> Result<()>;

    /// Returns the current slot content, if any.
    async fn get(&self) -> Result<Option<StoredScreenshot>>;

    /// Attaches a remote identifier to the stored screenshot.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SnipError::Storage`] when the slot is empty.
    async fn set_remote_id(&self, remote_id: String) -> Result<()>;

    /// Empties the slot. Clearing an already empty slot is a no-op, and
    /// clearing never notifies subscribers.
    async fn clear(&self) -> Result<()>;
}
