//! The MCP server handler.
//!
//! `ToolsmithServer` advertises the tools of a [`ToolRegistry`] and forwards
//! calls to it. The help text describing the available tools is sent as the
//! server's instructions and is also served as the `help_prompt` prompt.

use std::sync::Arc;

use rmcp::model::{
    CallToolRequestParams, CallToolResult, GetPromptRequestParams, GetPromptResult,
    Implementation, ListPromptsResult, ListToolsResult, PaginatedRequestParams, Prompt,
    PromptMessage, PromptMessageRole, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData, RoleServer, ServerHandler, ServiceExt};
use serde_json::Value;
use toolsmith_core::{Error, Result};

use crate::registry::ToolRegistry;

/// Name of the prompt carrying the help text.
pub const HELP_PROMPT: &str = "help_prompt";
const HELP_PROMPT_DESCRIPTION: &str = "Provide help information about this MCP server";

/// MCP server over a tool registry.
pub struct ToolsmithServer<R: ToolRegistry> {
    name: String,
    version: String,
    registry: Arc<R>,
}

impl<R: ToolRegistry> Clone for ToolsmithServer<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            version: self.version.clone(),
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<R: ToolRegistry + 'static> ToolsmithServer<R> {
    pub fn new(name: impl Into<String>, registry: R) -> Self {
        Self {
            name: name.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            registry: Arc::new(registry),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Help text listing every tool.
    pub fn instructions(&self) -> String {
        let mut text = format!(
            "This is {}, a Model Context Protocol server that builds other MCP servers.\n\nAvailable tools:\n",
            self.name
        );
        for tool in self.registry.tools() {
            let description = tool.description.as_deref().unwrap_or_default();
            text.push_str(&format!("- {} - {}\n", tool.name, description));
        }
        text
    }

    /// Resolve a prompt by name.
    pub fn prompt(&self, name: &str) -> std::result::Result<GetPromptResult, ErrorData> {
        if name != HELP_PROMPT {
            return Err(ErrorData::invalid_params(
                format!("Unknown prompt: {name}"),
                None,
            ));
        }
        Ok(GetPromptResult::new(vec![PromptMessage::new_text(
            PromptMessageRole::User,
            self.instructions(),
        )])
        .with_description(HELP_PROMPT_DESCRIPTION))
    }

    /// Serve on stdin/stdout until the client disconnects.
    pub async fn serve_stdio(self) -> Result<()> {
        log::info!("serving '{}' on stdio", self.name);
        let service = self
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| Error::process(format!("MCP initialization failed: {e}")))?;
        service
            .waiting()
            .await
            .map_err(|e| Error::process(format!("MCP service stopped abnormally: {e}")))?;
        log::info!("client disconnected");
        Ok(())
    }
}

impl<R: ToolRegistry + 'static> ServerHandler for ToolsmithServer<R> {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder()
            .enable_tools()
            .enable_prompts()
            .build();
        let mut implementation = Implementation::from_build_env();
        implementation.name = self.name.clone();
        implementation.version = self.version.clone();
        info.server_info = implementation;
        info.instructions = Some(self.instructions());
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _ctx: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.registry.tools()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _ctx: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let args = request.arguments.map(Value::Object).unwrap_or(Value::Null);
        match self.registry.call(&request.name, args) {
            Some(future) => future.await,
            None => Err(ErrorData::invalid_params(
                format!("Unknown tool: {}", request.name),
                None,
            )),
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParams>,
        _ctx: RequestContext<RoleServer>,
    ) -> std::result::Result<ListPromptsResult, ErrorData> {
        Ok(ListPromptsResult::with_all_items(vec![Prompt::new(
            HELP_PROMPT,
            Some(HELP_PROMPT_DESCRIPTION),
            None,
        )]))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParams,
        _ctx: RequestContext<RoleServer>,
    ) -> std::result::Result<GetPromptResult, ErrorData> {
        self.prompt(&request.name)
    }
}
