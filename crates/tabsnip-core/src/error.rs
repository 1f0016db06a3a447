//! Error types for the tabsnip crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire capture pipeline.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum SnipError {
    /// The native capture primitive failed to produce a frame
    #[error("Capture failed: {0}")]
    Capture(String),

    /// Bytes that should be an image did not decode as one
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The selection rectangle left no pixels after clamping to the frame
    #[error("Crop failed: {0}")]
    Crop(String),

    /// Screenshot slot error (persistence layer)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SnipError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Capture error
    pub fn capture(message: impl Into<String>) -> Self {
        Self::Capture(message.into())
    }

    /// Creates a Decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Creates a Crop error
    pub fn crop(message: impl Into<String>) -> Self {
        Self::Crop(message.into())
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Capture error
    pub fn is_capture(&self) -> bool {
        matches!(self, Self::Capture(_))
    }

    /// Check if this is a Decode error
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Check if this is a Crop error
    pub fn is_crop(&self) -> bool {
        matches!(self, Self::Crop(_))
    }

    /// Check if this is a Storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for SnipError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for SnipError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SnipError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for SnipError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<image::ImageError> for SnipError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Decoding(_) => Self::Decode(err.to_string()),
            image::ImageError::IoError(io_err) => Self::Io {
                message: io_err.to_string(),
            },
            _ => Self::Internal(err.to_string()),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for SnipError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, SnipError>`.
pub type Result<T> = std::result::Result<T, SnipError>;
