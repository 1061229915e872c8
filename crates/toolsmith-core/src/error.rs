//! Error types for Toolsmith operations.
//!
//! This module provides a common `Error` type and `Result<T>` alias used across
//! all Toolsmith crates. Uses `thiserror` for derive macros.
//!
//! The variants form a small closed set. Every failure a tool call can hit
//! maps onto exactly one [`ErrorKind`], which is what the MCP layer uses to
//! choose a protocol error code.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in Toolsmith operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error without path context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a specific path.
    #[error("I/O error on {path}: {source}")]
    IoPath {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A required argument was missing or malformed.
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// A server, tool, or file could not be found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was being looked up ("server", "tool", "file").
        kind: String,
        /// The identifier that failed to match.
        id: String,
    },

    /// The request conflicts with existing state (duplicate names,
    /// ambiguous or missing edit targets).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// An external process exited unsuccessfully.
    #[error("Process failed: {0}")]
    Process(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad caller input.
    Validation,
    /// Missing server, tool, or file.
    NotFound,
    /// Duplicate or ambiguous target.
    Conflict,
    /// Filesystem or subprocess failure.
    Io,
    /// Configuration, parse, or serialization failure.
    Internal,
}

impl Error {
    /// Wrap an I/O error.
    pub fn io(err: std::io::Error) -> Self {
        Self::Io(err)
    }

    /// Wrap an I/O error together with the path that caused it.
    pub fn io_with_path(err: std::io::Error, path: impl AsRef<Path>) -> Self {
        Self::IoPath {
            path: path.as_ref().to_path_buf(),
            source: err,
        }
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error for an entity kind and identifier.
    pub fn not_found(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Create a conflict error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a process failure error.
    pub fn process(msg: impl Into<String>) -> Self {
        Self::Process(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Io(_) | Self::IoPath { .. } | Self::Process(_) => ErrorKind::Io,
            Self::Config(_) | Self::Parse(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using Toolsmith's Error type.
pub type Result<T> = std::result::Result<T, Error>;
