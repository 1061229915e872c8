//! Toolsmith's MCP tools.
//!
//! `ToolsmithTools` implements [`ToolRegistry`] by parsing each call into a
//! [`ToolCommand`] and executing it against a [`ServerManager`] and the
//! local file system.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Content, Tool};
use serde_json::{Value, json};
use toolsmith_core::util::files::{self, LineWindow};
use toolsmith_core::util::paths::resolve_against;
use toolsmith_core::{Error, Result};
use toolsmith_registry::ServerManager;

use crate::command::{self, ToolCommand};
use crate::error::McpErrorExt;
use crate::registry::{ToolRegistry, ToolResult};

/// What a command produces before it is wrapped for the protocol.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Plain text, returned verbatim.
    Text(String),
    /// Structured data, returned as pretty-printed JSON text.
    Json(Value),
}

impl Reply {
    fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        Ok(Self::Json(serde_json::to_value(value)?))
    }

    fn into_call_result(self) -> std::result::Result<CallToolResult, ErrorData> {
        match self {
            Self::Text(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
            Self::Json(value) => serialize_response(&value),
        }
    }
}

/// Serialize a value to a successful `CallToolResult`.
fn serialize_response<T: serde::Serialize>(
    value: &T,
) -> std::result::Result<CallToolResult, ErrorData> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

// ============================================================================
// ToolsmithTools
// ============================================================================

/// The built-in tool set.
#[derive(Clone)]
pub struct ToolsmithTools {
    manager: Arc<ServerManager>,
    files_root: PathBuf,
}

impl ToolsmithTools {
    /// Tools backed by `manager`. Relative file paths resolve against the
    /// current directory.
    pub fn new(manager: Arc<ServerManager>) -> Self {
        Self {
            manager,
            files_root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Resolve relative `file_path` arguments against `root`.
    pub fn with_files_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.files_root = root.into();
        self
    }

    pub fn manager(&self) -> &ServerManager {
        &self.manager
    }

    fn resolve(&self, file_path: &str) -> PathBuf {
        resolve_against(&self.files_root, file_path)
    }

    /// Run a parsed command.
    pub async fn execute(&self, command: ToolCommand) -> Result<Reply> {
        log::debug!("executing {}", command.name());
        match command {
            ToolCommand::Echo(args) => Ok(Reply::Text(format!("You said: {}", args.message))),

            ToolCommand::CreateServer(args) => {
                let entry = self
                    .manager
                    .create_server(&args.project_name, &args.description)
                    .await?;
                Reply::json(&entry)
            }

            ToolCommand::ListServers => {
                let servers = self.manager.list_servers().await?;
                Ok(Reply::Json(json!({ "servers": servers })))
            }

            ToolCommand::RemoveServer(args) => {
                let removed = self.manager.remove_server(&args.server_name).await?;
                Ok(Reply::Json(json!({ "removed": removed })))
            }

            ToolCommand::ReadFile(args) => {
                let path = self.resolve(&args.file_path);
                let window = LineWindow {
                    offset: args.offset,
                    limit: args.limit,
                };
                Ok(Reply::Text(files::read_numbered(&path, window).await?))
            }

            ToolCommand::WriteFile(args) => {
                let path = self.resolve(&args.file_path);
                let content = content_to_string(args.content)?;
                log::info!("write_file {}: {}", path.display(), args.description);
                files::write_file(&path, &content).await?;
                Ok(Reply::Text(format!("Successfully wrote to {}", path.display())))
            }

            ToolCommand::EditFile(args) => {
                let path = self.resolve(&args.file_path);
                log::info!("edit_file {}: {}", path.display(), args.description);
                let outcome = files::replace_unique(
                    &path,
                    &args.old_string,
                    args.new_string.as_deref().unwrap_or_default(),
                )
                .await?;
                Ok(Reply::Text(edit_message(&path, &outcome.snippet)))
            }

            ToolCommand::ListTools(args) => {
                let tools = self.manager.list_tools(&args.server_name).await?;
                Ok(Reply::Json(json!({
                    "server_name": args.server_name,
                    "tools": tools,
                })))
            }

            ToolCommand::CreateTool(args) => {
                let change = self
                    .manager
                    .add_tool(&args.server_name, args.to_spec())
                    .await?;
                Reply::json(&change)
            }

            ToolCommand::RemoveTool(args) => {
                let change = self
                    .manager
                    .remove_tool(&args.server_name, &args.tool_name)
                    .await?;
                Ok(Reply::Json(json!({ "removed": change })))
            }
        }
    }
}

impl ToolRegistry for ToolsmithTools {
    fn tools(&self) -> Vec<Tool> {
        command::catalog()
    }

    fn call(&self, name: &str, args: Value) -> Option<ToolResult> {
        if !command::COMMAND_NAMES.contains(&name) {
            return None;
        }
        let this = self.clone();
        let name = name.to_string();
        Some(Box::pin(async move {
            let command = ToolCommand::parse(&name, args).map_err(|e| e.to_mcp_error())?;
            let reply = this.execute(command).await.map_err(|e| {
                log::warn!("{name} failed: {e}");
                e.to_mcp_error()
            })?;
            reply.into_call_result()
        }))
    }

    fn has_tool(&self, name: &str) -> bool {
        command::COMMAND_NAMES.contains(&name)
    }
}

fn content_to_string(content: Option<Value>) -> Result<String> {
    match content {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(text)) => Ok(text),
        Some(other) => serde_json::to_string(&other)
            .map_err(|e| Error::serialization(format!("Failed to serialize content: {e}"))),
    }
}

fn edit_message(path: &Path, snippet: &str) -> String {
    format!(
        "Successfully edited {}\n\nHere's a snippet of the edited file:\n{snippet}",
        path.display()
    )
}
