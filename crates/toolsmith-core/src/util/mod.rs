//! Utility modules for file operations, path handling, and naming helpers.
//!
//! # Modules
//!
//! - [`files`]: Async read/write/edit helpers used by the file tools
//! - [`ids`]: Server and tool name validation, client keys
//! - [`paths`]: Path resolution helpers (tilde expansion, base-relative paths)

pub mod files;
pub mod ids;
pub mod paths;
