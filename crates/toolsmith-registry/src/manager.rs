//! Server and tool lifecycle.
//!
//! [`ServerManager`] owns the registry store and the optional client
//! configuration file. Each mutating operation runs inside one registry
//! transaction, so the registry is only rewritten once the file system work
//! for that operation has succeeded.

use std::path::{Path, PathBuf};

use serde::Serialize;
use toolsmith_core::util::{files, ids};
use toolsmith_core::{ConfigProvider, Error, Result};
use toolsmith_source::{
    DeclaredTool, ParamSpec, SourcePatcher, ToolSpec, find_tool, find_tools, render_server,
    render_server_skeleton, render_tool,
};

use crate::client::ClientConfigFile;
use crate::model::{ServerEntry, ServerSummary};
use crate::store::RegistryStore;

/// Outcome of adding or removing a tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolChange {
    pub server_name: String,
    pub tool_name: String,
    pub description: String,
    pub parameters: Vec<ParamSpec>,
    pub file_path: PathBuf,
}

/// A server entry file regenerated from the registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenderedServer {
    pub server_name: String,
    pub file_path: PathBuf,
    pub source: String,
    /// Whether `source` was written to `file_path`.
    pub written: bool,
}

// ============================================================================
// ServerManager
// ============================================================================

/// Creates, lists and removes generated servers and their tools.
#[derive(Debug)]
pub struct ServerManager {
    servers_dir: PathBuf,
    entry_file: String,
    install_command: Vec<String>,
    store: RegistryStore,
    client: Option<ClientConfigFile>,
    patcher: SourcePatcher,
}

impl ServerManager {
    /// Manager with the default entry file and no client sync.
    pub fn new(registry_path: impl Into<PathBuf>, servers_dir: impl Into<PathBuf>) -> Self {
        Self {
            servers_dir: servers_dir.into(),
            entry_file: "server.py".to_string(),
            install_command: Vec::new(),
            store: RegistryStore::new(registry_path),
            client: None,
            patcher: SourcePatcher::python(),
        }
    }

    /// Manager configured from a [`ConfigProvider`].
    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let mut manager = Self::new(config.registry_path()?, config.servers_dir()?)
            .with_entry_file(config.entry_file())
            .with_install_command(config.install_command().to_vec());
        if let Some(target) = config.client_target() {
            manager = manager.with_client(ClientConfigFile::new(target));
        }
        Ok(manager)
    }

    pub fn with_entry_file(mut self, entry_file: impl Into<String>) -> Self {
        self.entry_file = entry_file.into();
        self
    }

    /// Command run in each new server directory, program first.
    pub fn with_install_command(mut self, command: Vec<String>) -> Self {
        self.install_command = command;
        self
    }

    pub fn with_client(mut self, client: ClientConfigFile) -> Self {
        self.client = Some(client);
        self
    }

    pub fn store(&self) -> &RegistryStore {
        &self.store
    }

    pub fn servers_dir(&self) -> &Path {
        &self.servers_dir
    }

    /// Path of a server's entry file.
    pub fn entry_path(&self, entry: &ServerEntry) -> PathBuf {
        entry.location.join(&self.entry_file)
    }

    // ------------------------------------------------------------------------
    // Servers
    // ------------------------------------------------------------------------

    /// Scaffold a new server directory and register it.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if `name` cannot be used as a directory name
    /// - [`Error::Conflict`] if the name is registered or the directory exists
    /// - [`Error::Process`] if the install command fails
    pub async fn create_server(&self, name: &str, description: &str) -> Result<ServerEntry> {
        ids::validate_server_name(name)?;

        let mut txn = self.store.begin().await?;
        if txn.find_by_name(name).is_some() {
            return Err(Error::conflict(format!("A server named '{name}' already exists")));
        }
        let location = self.servers_dir.join(name);
        if files::exists(&location).await {
            return Err(Error::conflict(format!(
                "Directory {} already exists",
                location.display()
            )));
        }

        if let Err(e) = self.scaffold(name, &location).await {
            if let Err(cleanup) = files::remove_dir_if_exists(&location).await {
                log::warn!("could not clean up {}: {cleanup}", location.display());
            }
            return Err(e);
        }

        let entry = ServerEntry::new(name, description, location);
        txn.insert(entry.clone());
        txn.commit().await?;
        log::info!("created server '{}' at {}", entry.name, entry.location.display());

        if let Some(client) = &self.client {
            let key = ids::client_key(name);
            if let Err(e) = client.register(&key, &entry.location, &self.entry_file).await {
                log::warn!("server '{name}' created but client config not updated: {e}");
            }
        }
        Ok(entry)
    }

    async fn scaffold(&self, name: &str, location: &Path) -> Result<()> {
        let entry_path = location.join(&self.entry_file);
        files::write_file(&entry_path, &render_server_skeleton(name)).await?;
        files::make_executable(&entry_path).await?;
        self.run_install(location).await
    }

    async fn run_install(&self, dir: &Path) -> Result<()> {
        let Some((program, args)) = self.install_command.split_first() else {
            return Ok(());
        };
        let display = self.install_command.join(" ");
        log::info!("running `{display}` in {}", dir.display());

        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .map_err(|e| Error::process(format!("could not run `{display}`: {e}")))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::process(format!(
                "`{display}` exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// All registered servers, ordered by name.
    pub async fn list_servers(&self) -> Result<Vec<ServerSummary>> {
        Ok(self.store.load().await?.summaries())
    }

    /// Look up a server by name.
    pub async fn get_server(&self, name: &str) -> Result<ServerEntry> {
        self.store
            .load()
            .await?
            .find_by_name(name)
            .cloned()
            .ok_or_else(|| server_not_found(name))
    }

    /// Delete a server's directory, registry entry and client entry.
    ///
    /// An unknown name fails with [`Error::NotFound`] without touching
    /// anything on disk.
    pub async fn remove_server(&self, name: &str) -> Result<ServerEntry> {
        let mut txn = self.store.begin().await?;
        let entry = txn.remove_by_name(name).ok_or_else(|| server_not_found(name))?;

        if !files::remove_dir_if_exists(&entry.location).await? {
            log::warn!(
                "directory {} of server '{name}' was already gone",
                entry.location.display()
            );
        }
        txn.commit().await?;
        log::info!("removed server '{name}'");

        if let Some(client) = &self.client {
            if let Err(e) = client.unregister(&entry.location).await {
                log::warn!("server '{name}' removed but client config not updated: {e}");
            }
        }
        Ok(entry)
    }

    /// Regenerate a server's entry file from its registered tool specs.
    ///
    /// Hand edits are discarded when `write` is true.
    pub async fn render_server(&self, name: &str, write: bool) -> Result<RenderedServer> {
        let entry = self.get_server(name).await?;
        let tools: Vec<ToolSpec> = entry.tools.values().cloned().collect();
        let source = render_server(&entry.name, &tools);
        let file_path = self.entry_path(&entry);
        if write {
            files::write_file(&file_path, &source).await?;
            log::info!("regenerated {}", file_path.display());
        }
        Ok(RenderedServer {
            server_name: entry.name,
            file_path,
            source,
            written: write,
        })
    }

    // ------------------------------------------------------------------------
    // Tools
    // ------------------------------------------------------------------------

    /// Tools declared in a server's entry file.
    pub async fn list_tools(&self, server_name: &str) -> Result<Vec<DeclaredTool>> {
        let entry = self.get_server(server_name).await?;
        let source = self.read_entry(&entry).await?;
        Ok(find_tools(&source))
    }

    /// Render `spec` into a server's entry file and record it.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the spec is invalid
    /// - [`Error::NotFound`] if the server or its entry file is missing
    /// - [`Error::Conflict`] if a tool of that name already exists
    pub async fn add_tool(&self, server_name: &str, spec: ToolSpec) -> Result<ToolChange> {
        spec.validate()?;

        let mut txn = self.store.begin().await?;
        let entry = txn
            .find_by_name_mut(server_name)
            .ok_or_else(|| server_not_found(server_name))?;
        let file_path = entry.location.join(&self.entry_file);
        let source = read_entry_file(&file_path).await?;

        if entry.has_tool(&spec.name) || find_tool(&source, &spec.name).is_some() {
            return Err(Error::conflict(format!(
                "Tool '{}' already exists in server '{server_name}'",
                spec.name
            )));
        }

        let merged = self.patcher.merge(&source, &render_tool(&spec));
        files::write_file(&file_path, &merged).await?;

        let change = ToolChange {
            server_name: server_name.to_string(),
            tool_name: spec.name.clone(),
            description: spec.description.clone(),
            parameters: spec.parameters.clone(),
            file_path,
        };
        entry.insert_tool(spec);
        txn.commit().await?;
        log::info!("added tool '{}' to '{server_name}'", change.tool_name);
        Ok(change)
    }

    /// Delete a tool's definition from a server's entry file and registry
    /// entry.
    pub async fn remove_tool(&self, server_name: &str, tool_name: &str) -> Result<ToolChange> {
        let mut txn = self.store.begin().await?;
        let entry = txn
            .find_by_name_mut(server_name)
            .ok_or_else(|| server_not_found(server_name))?;
        let file_path = entry.location.join(&self.entry_file);
        let source = read_entry_file(&file_path).await?;

        let declared = find_tool(&source, tool_name);
        let recorded = entry.remove_tool(tool_name);
        let (description, parameters) = match (&recorded, &declared) {
            (Some(spec), _) => (spec.description.clone(), spec.parameters.clone()),
            (None, Some(tool)) => (tool.description.clone(), tool.parameters.clone()),
            (None, None) => {
                return Err(Error::not_found(
                    "tool",
                    format!("{tool_name} in server '{server_name}'"),
                ));
            }
        };

        match self.patcher.remove_definition(&source, tool_name) {
            Some(updated) => files::write_file(&file_path, &updated).await?,
            None => log::warn!(
                "tool '{tool_name}' is registered but not declared in {}",
                file_path.display()
            ),
        }
        txn.commit().await?;
        log::info!("removed tool '{tool_name}' from '{server_name}'");

        Ok(ToolChange {
            server_name: server_name.to_string(),
            tool_name: tool_name.to_string(),
            description,
            parameters,
            file_path,
        })
    }

    async fn read_entry(&self, entry: &ServerEntry) -> Result<String> {
        read_entry_file(&self.entry_path(entry)).await
    }
}

fn server_not_found(name: &str) -> Error {
    Error::not_found("server", name)
}

async fn read_entry_file(path: &Path) -> Result<String> {
    if !files::exists(path).await {
        return Err(Error::not_found("server file", path.display().to_string()));
    }
    files::read_file(path).await
}
