pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod protocol;
pub mod session;
pub mod slot;

// Re-export common error type
pub use error::SnipError;
