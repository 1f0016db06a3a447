//! Frame sources standing in for the native capture primitive.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use tabsnip_core::error::{Result, SnipError};
use tabsnip_core::frame::{FrameSource, FullFrame, TabId};

/// Serves one fixed PNG for every capture and counts the requests.
///
/// Used wherever no real surface exists: harness runs and tests.
#[derive(Debug)]
pub struct StaticFrameSource {
    png: Vec<u8>,
    captures: AtomicUsize,
}

impl StaticFrameSource {
    /// Validates `png` up front so captures can never hand out an
    /// undecodable frame.
    pub fn new(png: Vec<u8>) -> Result<Self> {
        image::load_from_memory(&png).map_err(|e| {
            SnipError::capture(format!("frame bytes are not a decodable image: {e}"))
        })?;
        Ok(Self {
            png,
            captures: AtomicUsize::new(0),
        })
    }

    /// Number of captures served so far.
    pub fn capture_count(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn capture_visible(&self, tab: TabId) -> Result<FullFrame> {
        self.captures.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("[StaticFrameSource] serving frame for {tab}");
        Ok(FullFrame::new(tab, self.png.clone()))
    }
}

/// Captures by reading a PNG file from disk each time.
///
/// Lets a harness swap the file between captures to mimic a changing
/// surface.
pub struct PngFileFrameSource {
    path: PathBuf,
}

impl PngFileFrameSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FrameSource for PngFileFrameSource {
    async fn capture_visible(&self, tab: TabId) -> Result<FullFrame> {
        let png = tokio::fs::read(&self.path).await.map_err(|e| {
            SnipError::capture(format!(
                "cannot read frame file {}: {e}",
                self.path.display()
            ))
        })?;
        image::load_from_memory(&png).map_err(|e| {
            SnipError::capture(format!(
                "frame file {} is not a decodable image: {e}",
                self.path.display()
            ))
        })?;
        Ok(FullFrame::new(tab, png))
    }
}
