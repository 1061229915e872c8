//! End-to-end scenario driven through the tool registry: create a server,
//! add a tool, list it, and remove the server again.

use std::sync::Arc;

use rmcp::model::{CallToolResult, RawContent};
use serde_json::{Value, json};
use tempfile::TempDir;
use toolsmith_mcp::{ToolRegistry, ToolsmithTools};
use toolsmith_registry::ServerManager;

fn json_of(result: &CallToolResult) -> Value {
    match &result.content[0].raw {
        RawContent::Text(text) => serde_json::from_str(&text.text).unwrap(),
        other => panic!("expected text content, got {other:?}"),
    }
}

async fn call(tools: &ToolsmithTools, name: &str, args: Value) -> Value {
    let result = tools.call(name, args).unwrap().await.unwrap();
    assert_eq!(result.is_error, Some(false));
    json_of(&result)
}

#[tokio::test]
async fn test_demo_server_with_add_tool() {
    let dir = TempDir::new().unwrap();
    let registry_path = dir.path().join("servers_db.json");
    let manager = ServerManager::new(&registry_path, dir.path().join("mcp-servers"));
    let tools = ToolsmithTools::new(Arc::new(manager)).with_files_root(dir.path());

    let entry = call(
        &tools,
        "create_server",
        json!({"project_name": "Demo", "description": "Scenario server"}),
    )
    .await;
    let location = std::path::PathBuf::from(entry["location"].as_str().unwrap());
    assert!(location.join("server.py").exists());

    let created = call(
        &tools,
        "create_tool",
        json!({
            "server_name": "Demo",
            "tool_name": "add",
            "tool_description": "Add two numbers",
            "parameters": [
                {"name": "a", "type": "number", "description": "First number"},
                {"name": "b", "type": "number", "description": "Second number"}
            ]
        }),
    )
    .await;
    assert_eq!(created["tool_name"], "add");

    let listed = call(&tools, "list_tools", json!({"server_name": "Demo"})).await;
    let declared = listed["tools"].as_array().unwrap();
    assert_eq!(declared.len(), 1);
    assert_eq!(declared[0]["name"], "add");
    assert_eq!(declared[0]["parameters"][0]["type"], "float");

    let source = std::fs::read_to_string(location.join("server.py")).unwrap();
    let tool_at = source.find("def add(a: float, b: float)").unwrap();
    let main_at = source.find("if __name__ == \"__main__\":").unwrap();
    assert!(tool_at < main_at);
    assert_eq!(source.matches("from typing import Any, Dict").count(), 1);

    let servers = call(&tools, "list_servers", json!({})).await;
    assert_eq!(servers["servers"][0]["tool_count"], 1);

    call(&tools, "remove_server", json!({"server_name": "Demo"})).await;

    let registry: Value =
        serde_json::from_str(&std::fs::read_to_string(&registry_path).unwrap()).unwrap();
    assert_eq!(registry, json!({"servers": {}}));
    assert!(!location.exists());
}

#[tokio::test]
async fn test_tool_removal_round_trip() {
    let dir = TempDir::new().unwrap();
    let manager = ServerManager::new(
        dir.path().join("servers_db.json"),
        dir.path().join("mcp-servers"),
    );
    let tools = ToolsmithTools::new(Arc::new(manager)).with_files_root(dir.path());

    call(
        &tools,
        "create_server",
        json!({"project_name": "Demo", "description": ""}),
    )
    .await;
    call(
        &tools,
        "create_tool",
        json!({"server_name": "Demo", "tool_name": "ping", "tool_description": "Ping", "body": "return {\"pong\": True}"}),
    )
    .await;

    let removed = call(
        &tools,
        "remove_tool",
        json!({"server_name": "Demo", "tool_name": "ping"}),
    )
    .await;
    assert_eq!(removed["removed"]["tool_name"], "ping");

    let listed = call(&tools, "list_tools", json!({"server_name": "Demo"})).await;
    assert!(listed["tools"].as_array().unwrap().is_empty());
}
