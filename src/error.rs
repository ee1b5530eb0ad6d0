//! Error types for the dxfdoc library

use std::io;
use thiserror::Error;

use crate::types::{DxfVersion, Handle};

/// Main error type for dxfdoc operations
#[derive(Debug, Error)]
pub enum DxfError {
    /// IO error occurred during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Malformed tag stream
    #[error("Decode error at line {line}: {message}")]
    Decode { line: usize, message: String },

    /// Unrecognized revision string
    #[error("Unsupported DXF version: {0:?}")]
    UnsupportedVersion(String),

    /// Operation not available for the document's revision
    #[error("{feature} requires a newer DXF version than {version}")]
    UnsupportedRevision {
        feature: String,
        version: DxfVersion,
    },

    /// Name already taken in a name-keyed collection
    #[error("{kind} '{name}' already exists")]
    Duplicate { kind: &'static str, name: String },

    /// Name lookup failed
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// Handle lookup failed
    #[error("Handle not found: {0:#X}")]
    HandleNotFound(Handle),

    /// Section or group layout violates the format's structure
    #[error("Structural error: {0}")]
    Structural(String),

    /// Entity already belongs to a block
    #[error("Entity {handle:#X} is already owned by {owner:#X}")]
    Ownership { handle: Handle, owner: Handle },

    /// Operation refused (e.g. deleting model space)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Encoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Error during compression/decompression
    #[error("Compression error: {0}")]
    Compression(String),

    /// Bad configuration file
    #[error("Configuration error: {0}")]
    Config(String),
}

impl DxfError {
    /// Shorthand for a [`DxfError::Decode`] error.
    pub fn decode(line: usize, message: impl Into<String>) -> Self {
        DxfError::Decode {
            line,
            message: message.into(),
        }
    }

    /// Shorthand for a [`DxfError::UnsupportedRevision`] error.
    pub fn revision(feature: impl Into<String>, version: DxfVersion) -> Self {
        DxfError::UnsupportedRevision {
            feature: feature.into(),
            version,
        }
    }

    /// Shorthand for a [`DxfError::NotFound`] error.
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        DxfError::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for a [`DxfError::Duplicate`] error.
    pub fn duplicate(kind: &'static str, name: impl Into<String>) -> Self {
        DxfError::Duplicate {
            kind,
            name: name.into(),
        }
    }
}

/// Result type alias for dxfdoc operations
pub type Result<T> = std::result::Result<T, DxfError>;
