//! Tool registration.
//!
//! A [`ToolRegistry`] advertises a set of tools and produces a future for a
//! call by name. `call` returns `None` for names the registry does not own.

use std::future::Future;
use std::pin::Pin;

use rmcp::ErrorData;
use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;

/// The future returned for a tool call.
pub type ToolResult = Pin<Box<dyn Future<Output = Result<CallToolResult, ErrorData>> + Send>>;

/// A set of callable tools.
pub trait ToolRegistry: Send + Sync {
    /// Descriptors of every tool in this registry.
    fn tools(&self) -> Vec<Tool>;

    /// Start a call, or return `None` if `name` is not ours.
    fn call(&self, name: &str, args: Value) -> Option<ToolResult>;

    fn tool_count(&self) -> usize {
        self.tools().len()
    }

    fn has_tool(&self, name: &str) -> bool {
        self.tools().iter().any(|t| t.name == name)
    }
}
