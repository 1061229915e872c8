//! ToolsmithCli application.
//!
//! Wires a [`ConfigProvider`] into the registry manager and the MCP server,
//! and dispatches parsed commands to their handlers.

use std::path::Path;
use std::sync::Arc;

use toolsmith_core::traits::ConfigProvider;
use toolsmith_core::util::files;
use toolsmith_core::{AppState, Result};
use toolsmith_mcp::{ToolRegistry, ToolsmithServer, ToolsmithTools};
use toolsmith_registry::ServerManager;
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command};
use crate::config::ToolsmithConfig;
use crate::{config_handlers, patch_handlers, server_handlers};

// ============================================================================
// ToolsmithCli
// ============================================================================

/// CLI application parameterized over a config provider.
pub struct ToolsmithCli<C: ConfigProvider> {
    name: String,
    state: AppState<C>,
    version: String,
}

impl ToolsmithCli<ToolsmithConfig> {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = ToolsmithConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }
}

impl<C: ConfigProvider> ToolsmithCli<C> {
    pub fn new(name: impl Into<String>, config: C) -> Self {
        Self {
            name: name.into(),
            state: AppState::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn config(&self) -> &C {
        self.state.config()
    }

    /// Initialise tracing-based logging on stderr.
    ///
    /// Uses `RUST_LOG` if set, otherwise defaults based on verbosity flags.
    /// Stdout is reserved for command output and the MCP transport.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Build the registry manager described by the configuration.
    pub fn manager(&self) -> Result<ServerManager> {
        ServerManager::from_config(self.config())
    }

    /// Build the MCP server exposing the Toolsmith tools.
    pub fn mcp_server(&self) -> Result<ToolsmithServer<ToolsmithTools>> {
        let tools = ToolsmithTools::new(Arc::new(self.manager()?))
            .with_files_root(self.config().base_path()?);
        Ok(ToolsmithServer::new(self.state.project_name(), tools).with_version(&self.version))
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        let Some(command) = args.command else {
            println!("{} {}, use --help for usage", self.name, self.version);
            return Ok(());
        };
        tracing::debug!(?command, "dispatching");

        match command {
            Command::Version => println!("{} {}", self.name, self.version),
            Command::Health => println!("{}", self.health().await?),
            Command::Serve => {
                let server = self.mcp_server()?;
                tracing::info!(
                    tools = server.registry().tool_count(),
                    "starting {} MCP server",
                    server.name()
                );
                server.serve_stdio().await?;
            }
            Command::Config(cmd) => {
                config_handlers::handle_config_command(args.config.as_deref(), cmd.command)?
            }
            Command::Server(cmd) => {
                let out = server_handlers::handle_server_command(&self.manager()?, cmd.command)
                    .await?;
                println!("{out}");
            }
            Command::Tool(cmd) => {
                let out =
                    server_handlers::handle_tool_command(&self.manager()?, cmd.command).await?;
                println!("{out}");
            }
            Command::Patch {
                existing,
                fragment,
                in_place,
            } => {
                let merged = patch_handlers::handle_patch(
                    Path::new(&existing),
                    Path::new(&fragment),
                    in_place,
                )
                .await?;
                if !in_place {
                    print!("{merged}");
                }
            }
        }
        Ok(())
    }

    /// Check that the registry is readable and report where things live.
    pub async fn health(&self) -> Result<String> {
        let manager = self.manager()?;
        let servers = manager.list_servers().await?;
        let servers_dir = manager.servers_dir();
        let dir_state = if files::exists(servers_dir).await {
            "present"
        } else {
            "not yet created"
        };
        Ok(format!(
            "{}: healthy\n  registry: {} ({} server(s))\n  servers dir: {} ({dir_state})",
            self.name,
            manager.store().path().display(),
            servers.len(),
            servers_dir.display(),
        ))
    }
}

// ============================================================================
// Tests
// ============================================================================
