//! Core traits for Toolsmith configuration.
//!
//! The primary trait is [`ConfigProvider`], which abstracts where the
//! registry lives, where generated servers are scaffolded, and which desktop
//! client configuration (if any) should be kept in sync.

use std::path::PathBuf;

use crate::Result;

/// A desktop MCP client whose configuration file lists launchable servers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientTarget {
    /// Path to the client's JSON configuration file.
    pub config_path: PathBuf,
    /// Launcher command written into each server entry (e.g. `uv`).
    pub command: String,
}

/// Trait for application configuration.
///
/// Every Toolsmith front end (the CLI, tests, embedders) implements this
/// trait to tell the library crates where their data lives.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use toolsmith_core::traits::ConfigProvider;
/// use toolsmith_core::Result;
///
/// #[derive(Clone)]
/// struct LocalConfig {
///     data_dir: PathBuf,
/// }
///
/// impl ConfigProvider for LocalConfig {
///     fn project_name(&self) -> &str {
///         "local"
///     }
///
///     fn base_path(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.clone())
///     }
///
///     fn registry_path(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.join("servers_db.json"))
///     }
///
///     fn servers_dir(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.join("mcp-servers"))
///     }
/// }
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and the MCP server name.
    fn project_name(&self) -> &str;

    /// Base path for all project data.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined.
    fn base_path(&self) -> Result<PathBuf>;

    /// Location of the JSON registry file.
    fn registry_path(&self) -> Result<PathBuf>;

    /// Directory under which each generated server gets its own folder.
    fn servers_dir(&self) -> Result<PathBuf>;

    /// File name of the generated entry point inside a server folder.
    fn entry_file(&self) -> &str {
        "server.py"
    }

    /// Command run inside a freshly created server folder to install its
    /// dependencies. Empty means no installation step.
    fn install_command(&self) -> &[String] {
        &[]
    }

    /// Desktop client whose configuration should list generated servers.
    fn client_target(&self) -> Option<ClientTarget> {
        None
    }
}
