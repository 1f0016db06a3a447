//! Captured frames, cropped artifacts, and the capture primitive seam.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Identifier for a tab surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TabId(pub u32);

impl std::fmt::Display for TabId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tab:{}", self.0)
    }
}

/// A full capture of a visible tab surface, as delivered by the native
/// capture primitive.
///
/// Holds the encoded PNG; decoding happens in the codec. A frame is either
/// complete or the capture failed, there is no partially valid state.
#[derive(Debug, Clone, PartialEq)]
pub struct FullFrame {
    /// The tab this frame was captured from
    pub tab: TabId,
    /// Encoded PNG bytes at device resolution
    pub png: Vec<u8>,
    /// Timestamp when the frame was captured (ISO 8601 format)
    pub captured_at: String,
}

impl FullFrame {
    pub fn new(tab: TabId, png: Vec<u8>) -> Self {
        Self {
            tab,
            png,
            captured_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A cropped capture, ready for persistence or display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    /// Encoded PNG bytes of the cropped region
    pub png: Vec<u8>,
    /// Width in device pixels
    pub width: u32,
    /// Height in device pixels
    pub height: u32,
    /// Timestamp when the crop was produced (ISO 8601 format)
    pub captured_at: String,
}

impl Artifact {
    pub fn new(png: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            png,
            width,
            height,
            captured_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Access to the native frame capture primitive.
///
/// Implementations capture whatever is currently visible for the given tab,
/// at device resolution.
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Captures the visible surface of `tab`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SnipError::Capture`] when no frame can be produced
    /// (no visible surface, permission refused, source gone).
    async fn capture_visible(&self, tab: TabId) -> Result<FullFrame>;
}
