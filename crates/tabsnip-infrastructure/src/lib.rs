pub mod config_loader;
pub mod dir_slot_store;
pub mod frame_sources;
pub mod memory_slot_store;
pub mod paths;

pub use crate::dir_slot_store::DirSlotStore;
pub use crate::frame_sources::{PngFileFrameSource, StaticFrameSource};
pub use crate::memory_slot_store::MemorySlotStore;
