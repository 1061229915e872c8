//! Toolsmith Core: shared types, traits, errors, and utilities.
//!
//! This crate provides the foundational types used across all Toolsmith crates.
//! It has no internal Toolsmith dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`state`]: Generic application state container
//! - [`traits`]: Configuration trait
//! - [`util`]: File, path, and naming utilities

#![doc = include_str!("../README.md")]

pub mod error;
pub mod state;
pub mod traits;
pub mod util;

// Re-export key types at crate root for convenience
pub use error::{Error, ErrorKind, Result};
pub use state::AppState;
pub use traits::{ClientTarget, ConfigProvider};
