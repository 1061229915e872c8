//! The closed set of Toolsmith tool calls.
//!
//! Every remote call is parsed into a [`ToolCommand`] before anything runs,
//! so argument errors surface as validation failures and execution can
//! match exhaustively.

use std::sync::Arc;

use rmcp::model::Tool;
use schemars::JsonSchema;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use toolsmith_core::{Error, Result};
use toolsmith_source::{ParamSpec, ToolSpec};

// ============================================================================
// Argument types
// ============================================================================

/// Arguments for `echo`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct EchoArgs {
    /// Message to echo back.
    pub message: String,
}

/// Arguments for `create_server`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct CreateServerArgs {
    /// Name of the new server; also its directory name.
    pub project_name: String,
    /// What the server is for.
    pub description: String,
}

/// Arguments for operations addressing one server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct ServerNameArgs {
    /// Name of the server.
    pub server_name: String,
}

/// Arguments for `read_file`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct ReadFileArgs {
    /// Path of the file to read.
    pub file_path: String,
    /// 1-based line to start reading from.
    pub offset: Option<usize>,
    /// Maximum number of lines to return (default 1000).
    pub limit: Option<usize>,
}

/// Arguments for `write_file`.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
pub struct WriteFileArgs {
    /// Path of the file to write.
    pub file_path: String,
    /// Why the file is being written.
    pub description: String,
    /// New contents. Non-string JSON is written serialized.
    pub content: Option<Value>,
}

/// Arguments for `edit_file`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct EditFileArgs {
    /// Path of the file to edit.
    pub file_path: String,
    /// Why the file is being edited.
    pub description: String,
    /// Text to replace; must occur exactly once.
    pub old_string: String,
    /// Replacement text (default empty).
    pub new_string: Option<String>,
}

/// Arguments for `create_tool`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct CreateToolArgs {
    /// Server to add the tool to.
    pub server_name: String,
    /// snake_case name of the tool.
    pub tool_name: String,
    /// What the tool does.
    pub tool_description: String,
    /// Parameters, each with `name`, `type` and `description`.
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,
    /// Optional Python function body; a stub is generated when omitted.
    pub body: Option<String>,
}

impl CreateToolArgs {
    /// The tool spec these arguments describe.
    pub fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.tool_name.clone(),
            description: self.tool_description.clone(),
            parameters: self.parameters.clone(),
            body: self.body.clone(),
        }
    }
}

/// Arguments for `remove_tool`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct RemoveToolArgs {
    /// Server the tool belongs to.
    pub server_name: String,
    /// Name of the tool to remove.
    pub tool_name: String,
}

// ============================================================================
// ToolCommand
// ============================================================================

/// A parsed tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCommand {
    Echo(EchoArgs),
    CreateServer(CreateServerArgs),
    ListServers,
    RemoveServer(ServerNameArgs),
    ReadFile(ReadFileArgs),
    WriteFile(WriteFileArgs),
    EditFile(EditFileArgs),
    ListTools(ServerNameArgs),
    CreateTool(CreateToolArgs),
    RemoveTool(RemoveToolArgs),
}

/// Every command name, in catalog order.
pub const COMMAND_NAMES: [&str; 10] = [
    "echo",
    "create_server",
    "list_servers",
    "remove_server",
    "read_file",
    "write_file",
    "edit_file",
    "list_tools",
    "create_tool",
    "remove_tool",
];

impl ToolCommand {
    /// Parse a call by tool name. `Null` arguments count as `{}`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] for an unknown tool name
    /// - [`Error::Validation`] for missing, mistyped or empty arguments
    pub fn parse(name: &str, args: Value) -> Result<Self> {
        let command = match name {
            "echo" => Self::Echo(decode(name, args)?),
            "create_server" => Self::CreateServer(decode(name, args)?),
            "list_servers" => Self::ListServers,
            "remove_server" => Self::RemoveServer(decode(name, args)?),
            "read_file" => Self::ReadFile(decode(name, args)?),
            "write_file" => Self::WriteFile(decode(name, args)?),
            "edit_file" => Self::EditFile(decode(name, args)?),
            "list_tools" => Self::ListTools(decode(name, args)?),
            "create_tool" => Self::CreateTool(decode(name, args)?),
            "remove_tool" => Self::RemoveTool(decode(name, args)?),
            other => return Err(Error::not_found("tool", other)),
        };
        command.validate()?;
        Ok(command)
    }

    /// The tool name this command was parsed from.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Echo(_) => "echo",
            Self::CreateServer(_) => "create_server",
            Self::ListServers => "list_servers",
            Self::RemoveServer(_) => "remove_server",
            Self::ReadFile(_) => "read_file",
            Self::WriteFile(_) => "write_file",
            Self::EditFile(_) => "edit_file",
            Self::ListTools(_) => "list_tools",
            Self::CreateTool(_) => "create_tool",
            Self::RemoveTool(_) => "remove_tool",
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::WriteFile(args) => {
                require("file_path", &args.file_path)?;
                require("description", &args.description)
            }
            Self::EditFile(args) => {
                require("file_path", &args.file_path)?;
                require("description", &args.description)?;
                require("old_string", &args.old_string)
            }
            Self::ReadFile(args) => require("file_path", &args.file_path),
            Self::CreateServer(args) => require("project_name", &args.project_name),
            Self::CreateTool(args) => args.to_spec().validate(),
            Self::RemoveServer(_)
            | Self::ListTools(_)
            | Self::RemoveTool(_)
            | Self::Echo(_)
            | Self::ListServers => Ok(()),
        }
    }
}

fn decode<T: DeserializeOwned>(name: &str, args: Value) -> Result<T> {
    let args = if args.is_null() {
        Value::Object(Map::new())
    } else {
        args
    };
    serde_json::from_value(args).map_err(|e| Error::validation(format!("{name}: {e}")))
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

/// Convert a JSON value to the object map a [`Tool`] expects.
fn json_schema(value: Value) -> Arc<Map<String, Value>> {
    match value {
        Value::Object(map) => Arc::new(map),
        _ => Arc::new(Map::new()),
    }
}

fn schema_of<T: JsonSchema>() -> Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or_else(|_| json!({"type": "object"}))
}

fn make_tool(name: &'static str, description: &'static str, schema: Value) -> Tool {
    Tool::new(name, description, json_schema(schema))
}

/// Descriptors for every command.
pub fn catalog() -> Vec<Tool> {
    vec![
        make_tool("echo", "Echo a message back", schema_of::<EchoArgs>()),
        make_tool(
            "create_server",
            "Create a new MCP server project with a runnable entry file",
            schema_of::<CreateServerArgs>(),
        ),
        make_tool(
            "list_servers",
            "List all managed MCP servers",
            json!({"type": "object", "properties": {}}),
        ),
        make_tool(
            "remove_server",
            "Remove a managed MCP server and delete its directory",
            schema_of::<ServerNameArgs>(),
        ),
        make_tool(
            "read_file",
            "Read a file with numbered lines",
            schema_of::<ReadFileArgs>(),
        ),
        make_tool(
            "write_file",
            "Write content to a file, creating parent directories",
            schema_of::<WriteFileArgs>(),
        ),
        make_tool(
            "edit_file",
            "Replace a unique string in a file and show the edited region",
            schema_of::<EditFileArgs>(),
        ),
        make_tool(
            "list_tools",
            "List the tools declared in a server's entry file",
            schema_of::<ServerNameArgs>(),
        ),
        make_tool(
            "create_tool",
            "Add a new tool to an existing MCP server",
            schema_of::<CreateToolArgs>(),
        ),
        make_tool(
            "remove_tool",
            "Remove a tool from an existing MCP server",
            schema_of::<RemoveToolArgs>(),
        ),
    ]
}
