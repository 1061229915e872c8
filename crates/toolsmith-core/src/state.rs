//! Application state management.
//!
//! Provides [`AppState<C>`], a thread-safe container for shared application
//! state that is generic over the configuration provider.
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use toolsmith_core::{AppState, ConfigProvider, Result};
//!
//! #[derive(Clone)]
//! struct MyConfig {
//!     base: PathBuf,
//! }
//!
//! impl ConfigProvider for MyConfig {
//!     fn project_name(&self) -> &str { "my-project" }
//!     fn base_path(&self) -> Result<PathBuf> { Ok(self.base.clone()) }
//!     fn registry_path(&self) -> Result<PathBuf> { Ok(self.base.join("db.json")) }
//!     fn servers_dir(&self) -> Result<PathBuf> { Ok(self.base.join("servers")) }
//! }
//!
//! let state = AppState::new(MyConfig { base: PathBuf::from("/data") });
//! assert_eq!(state.project_name(), "my-project");
//! ```

use std::sync::Arc;

use crate::traits::ConfigProvider;

/// Thread-safe shared application state.
///
/// Cloning is cheap (Arc clone); request handlers share the same state.
#[derive(Debug)]
pub struct AppState<C: ConfigProvider> {
    config: Arc<C>,
}

impl<C: ConfigProvider> AppState<C> {
    /// Create a new AppState wrapping the given configuration.
    pub fn new(config: C) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Create AppState from an existing Arc-wrapped configuration.
    pub fn from_arc(config: Arc<C>) -> Self {
        Self { config }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Get a cloneable handle to the configuration.
    pub fn config_arc(&self) -> Arc<C> {
        Arc::clone(&self.config)
    }

    /// Get the project name from the configuration.
    pub fn project_name(&self) -> &str {
        self.config.project_name()
    }
}

impl<C: ConfigProvider> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}
