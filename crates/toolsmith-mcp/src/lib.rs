//! MCP server for Toolsmith.
#![doc = include_str!("../README.md")]

pub mod command;
pub mod error;
pub mod registry;
pub mod server;
pub mod tools;

pub use command::ToolCommand;
pub use error::McpErrorExt;
pub use registry::{ToolRegistry, ToolResult};
pub use server::ToolsmithServer;
pub use tools::{Reply, ToolsmithTools};
