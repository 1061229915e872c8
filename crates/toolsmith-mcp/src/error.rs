//! Mapping Toolsmith errors onto MCP protocol errors.

use rmcp::ErrorData;
use serde_json::json;
use toolsmith_core::{Error, ErrorKind};

/// Conversion into an MCP [`ErrorData`].
pub trait McpErrorExt {
    fn to_mcp_error(&self) -> ErrorData;
}

impl McpErrorExt for Error {
    fn to_mcp_error(&self) -> ErrorData {
        let message = self.to_string();
        match self {
            Error::NotFound { kind, id } => {
                ErrorData::resource_not_found(message, Some(json!({"kind": kind, "id": id})))
            }
            Error::Parse(_) => ErrorData::invalid_params(message, None),
            _ => match self.kind() {
                ErrorKind::Validation | ErrorKind::Conflict => {
                    ErrorData::invalid_params(message, None)
                }
                ErrorKind::NotFound | ErrorKind::Io | ErrorKind::Internal => {
                    ErrorData::internal_error(message, None)
                }
            },
        }
    }
}
