//! Configuration for the Toolsmith CLI.
//!
//! Provides the [`ToolsmithConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `TOOLSMITH_CONFIG` environment variable
//! 3. XDG default: `~/.config/toolsmith/config.toml`
//! 4. Built-in defaults
//!
//! `TOOLSMITH_*` environment variables are layered on top of the file,
//! e.g. `TOOLSMITH_SERVERS_DIR=/srv/mcp`.

use std::path::PathBuf;

use confyg::{Confygery, env};
use serde::{Deserialize, Serialize};
use toolsmith_core::traits::{ClientTarget, ConfigProvider};
use toolsmith_core::util::paths::{expand_tilde, resolve_against};
use toolsmith_core::{Error, Result};

const ENV_PREFIX: &str = "TOOLSMITH";
const CONFIG_ENV_VAR: &str = "TOOLSMITH_CONFIG";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the Toolsmith CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsmithConfig {
    /// Project name, used as the MCP server name.
    pub project_name: String,

    /// Base path that relative registry and server paths resolve against.
    /// Defaults to the current directory.
    pub base_path: Option<String>,

    pub registry: RegistryConfig,

    pub servers: ServersConfig,

    pub client: ClientConfig,
}

/// Where the JSON registry lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    pub path: String,
}

/// How generated servers are laid out on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServersConfig {
    /// Parent directory of every generated server folder.
    pub dir: String,

    /// Entry-point file name inside each server folder.
    pub entry_file: String,

    /// Dependency installation command run in each new server folder.
    pub install_command: Vec<String>,
}

/// Desktop client whose configuration lists the generated servers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub enabled: bool,

    /// Client config file. Defaults to the platform's Claude Desktop path.
    pub config_path: Option<String>,

    /// Launcher command written into each entry.
    pub command: String,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for ToolsmithConfig {
    fn default() -> Self {
        Self {
            project_name: "toolsmith".to_string(),
            base_path: None,
            registry: RegistryConfig::default(),
            servers: ServersConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: "servers_db.json".to_string(),
        }
    }
}

impl Default for ServersConfig {
    fn default() -> Self {
        Self {
            dir: "mcp-servers".to_string(),
            entry_file: "server.py".to_string(),
            install_command: Vec::new(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            config_path: None,
            command: "uv".to_string(),
        }
    }
}

impl ClientConfig {
    /// The configured client file, or the platform default.
    pub fn resolved_config_path(&self) -> Option<PathBuf> {
        match &self.config_path {
            Some(p) => Some(expand_tilde(p)),
            None => default_client_config_path(),
        }
    }
}

/// Claude Desktop's configuration file for this platform.
pub fn default_client_config_path() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| {
            h.join("Library")
                .join("Application Support")
                .join("Claude")
                .join("claude_desktop_config.json")
        })
    } else {
        dirs::config_dir().map(|d| d.join("Claude").join("claude_desktop_config.json"))
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl ToolsmithConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                log::debug!("loading config from {}", path.display());
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        env_opts.add_section("registry");
        env_opts.add_section("servers");
        env_opts.add_section("client");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("toolsmith").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Flatten this config into environment variable pairs with `TOOLSMITH_` prefix.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, ENV_PREFIX, &mut vars);
        Ok(vars)
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for ToolsmithConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn base_path(&self) -> Result<PathBuf> {
        match &self.base_path {
            Some(p) => Ok(expand_tilde(p)),
            None => std::env::current_dir()
                .map_err(|e| Error::config(format!("Could not determine base path: {e}"))),
        }
    }

    fn registry_path(&self) -> Result<PathBuf> {
        Ok(resolve_against(&self.base_path()?, &self.registry.path))
    }

    fn servers_dir(&self) -> Result<PathBuf> {
        Ok(resolve_against(&self.base_path()?, &self.servers.dir))
    }

    fn entry_file(&self) -> &str {
        &self.servers.entry_file
    }

    fn install_command(&self) -> &[String] {
        &self.servers.install_command
    }

    fn client_target(&self) -> Option<ClientTarget> {
        if !self.client.enabled {
            return None;
        }
        let Some(config_path) = self.client.resolved_config_path() else {
            log::warn!("client sync enabled but no client config path could be determined");
            return None;
        };
        Some(ClientTarget {
            config_path,
            command: self.client.command.clone(),
        })
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================
