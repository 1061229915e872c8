//! Handler functions for `toolsmith server ...` and `toolsmith tool ...`.
//!
//! Each handler returns the text to print so the dispatch in
//! [`crate::app`] stays the only place that writes to stdout.

use toolsmith_core::{Error, Result};
use toolsmith_registry::{ServerManager, ServerSummary};
use toolsmith_source::{DeclaredTool, ParamSpec, ToolSpec};

use crate::cli::{ServerAction, ToolAction};

// ============================================================================
// Dispatch
// ============================================================================

pub async fn handle_server_command(manager: &ServerManager, action: ServerAction) -> Result<String> {
    match action {
        ServerAction::Create { name, description } => {
            let entry = manager.create_server(&name, &description).await?;
            Ok(format!(
                "Created server '{}' ({}) at {}",
                entry.name,
                entry.id,
                entry.location.display()
            ))
        }
        ServerAction::List { json } => {
            let servers = manager.list_servers().await?;
            if json {
                to_json(&servers)
            } else {
                Ok(format_servers(&servers))
            }
        }
        ServerAction::Remove { name } => {
            let entry = manager.remove_server(&name).await?;
            Ok(format!(
                "Removed server '{}' and {}",
                entry.name,
                entry.location.display()
            ))
        }
        ServerAction::Render { name, write } => {
            let rendered = manager.render_server(&name, write).await?;
            if rendered.written {
                Ok(format!("Wrote {}", rendered.file_path.display()))
            } else {
                Ok(rendered.source)
            }
        }
    }
}

pub async fn handle_tool_command(manager: &ServerManager, action: ToolAction) -> Result<String> {
    match action {
        ToolAction::List { server, json } => {
            let tools = manager.list_tools(&server).await?;
            if json {
                to_json(&tools)
            } else {
                Ok(format_tools(&server, &tools))
            }
        }
        ToolAction::Add {
            server,
            name,
            description,
            params,
            body,
        } => {
            let mut spec = ToolSpec::new(name, description);
            for raw in &params {
                spec = spec.with_param(parse_param(raw)?);
            }
            if let Some(body) = body {
                spec = spec.with_body(body);
            }
            let change = manager.add_tool(&server, spec).await?;
            Ok(format!(
                "Added tool '{}' to '{}' ({})",
                change.tool_name,
                change.server_name,
                change.file_path.display()
            ))
        }
        ToolAction::Remove { server, name } => {
            let change = manager.remove_tool(&server, &name).await?;
            Ok(format!(
                "Removed tool '{}' from '{}'",
                change.tool_name, change.server_name
            ))
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse `name:type[:description]`. The description may itself contain
/// colons.
pub fn parse_param(raw: &str) -> Result<ParamSpec> {
    let mut parts = raw.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    let param_type = parts.next().map(str::trim).unwrap_or_default();
    if name.is_empty() || param_type.is_empty() {
        return Err(Error::validation(format!(
            "parameter '{raw}' must look like name:type[:description]"
        )));
    }
    let description = parts.next().map(str::trim).unwrap_or_default();
    Ok(ParamSpec::new(name, param_type, description))
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn format_servers(servers: &[ServerSummary]) -> String {
    if servers.is_empty() {
        return "No servers registered.".to_string();
    }
    let width = servers.iter().map(|s| s.name.len()).max().unwrap_or(0);
    servers
        .iter()
        .map(|s| {
            format!(
                "{:<width$}  {:>2} tool(s)  {}",
                s.name,
                s.tool_count,
                s.location.display()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_tools(server: &str, tools: &[DeclaredTool]) -> String {
    if tools.is_empty() {
        return format!("Server '{server}' declares no tools.");
    }
    let mut out = Vec::with_capacity(tools.len());
    for tool in tools {
        let params = tool
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, p.param_type))
            .collect::<Vec<_>>()
            .join(", ");
        let prefix = if tool.is_async { "async " } else { "" };
        out.push(format!("{prefix}{}({params})  {}", tool.name, tool.description));
    }
    out.join("\n")
}

// ============================================================================
// Tests
// ============================================================================
