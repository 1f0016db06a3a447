//! Capture session domain module.
//!
//! A session tracks one region-capture attempt from launch to overlay
//! teardown.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`)
//! - `phase`: Overlay lifecycle phases (`OverlayPhase`)

mod model;
mod phase;

// Re-export public API
pub use model::Session;
pub use phase::OverlayPhase;
