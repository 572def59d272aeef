//! Error types for inventory, selection and deletion.

use std::path::PathBuf;

/// Errors produced while scanning or cleaning workshop content.
#[derive(Debug, thiserror::Error)]
pub enum WorkshopError {
    #[error("failed to read descriptor {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode descriptor {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to walk {}: {source}", .path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("input out of bounds: {index} (expected 0..{len})")]
    OutOfRange { index: i64, len: usize },

    #[error("refusing to delete {}: {reason}", .path.display())]
    SafetyCheck { path: PathBuf, reason: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl WorkshopError {
    pub(crate) fn traversal(path: &std::path::Path, source: walkdir::Error) -> Self {
        WorkshopError::Traversal {
            path: path.to_path_buf(),
            source,
        }
    }
}
