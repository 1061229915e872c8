//! Rendering generated server sources from data.
//!
//! [`render_tool`] turns a [`ToolSpec`] into a source fragment that the
//! [`SourcePatcher`](crate::patcher::SourcePatcher) can merge;
//! [`render_server`] produces a complete entry file, optionally with tools.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use crate::patcher::SourcePatcher;
use crate::spec::ToolSpec;

const TYPING_NAMES: [&str; 8] = [
    "Any", "Dict", "List", "Literal", "Optional", "Set", "Tuple", "Union",
];

const STUB_BODY: &str = r#"# Replace with the tool's logic
result = {
    "status": "success",
    "message": "Tool executed successfully"
}
return result"#;

/// Render the skeleton of a generated server named `name`.
pub fn render_server_skeleton(name: &str) -> String {
    format!(
        r#"#!/usr/bin/env python3
from mcp.server.fastmcp import FastMCP, Context

# Create an MCP server
mcp = FastMCP({name})

if __name__ == "__main__":
    try:
        # Run the MCP server
        mcp.run()
    except KeyboardInterrupt:
        print("Server stopped by user")
"#,
        name = python_string(name)
    )
}

/// Render a full server file: the skeleton plus every tool in order.
pub fn render_server(name: &str, tools: &[ToolSpec]) -> String {
    let patcher = SourcePatcher::python();
    tools
        .iter()
        .fold(render_server_skeleton(name), |source, tool| {
            patcher.merge(&source, &render_tool(tool))
        })
}

/// Render one tool definition, preceded by the imports it needs.
///
/// The spec is expected to have passed [`ToolSpec::validate`].
pub fn render_tool(spec: &ToolSpec) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "from typing import {}", typing_imports(spec).join(", "));
    out.push('\n');
    let _ = writeln!(out, "# {} tool", spec.name);
    out.push_str("@mcp.tool()\n");

    let params: Vec<String> = spec
        .parameters
        .iter()
        .map(|p| format!("{}: {}", p.name, p.python_type()))
        .collect();
    let _ = writeln!(
        out,
        "def {}({}) -> Dict[str, Any]:",
        spec.name,
        params.join(", ")
    );

    out.push_str("    \"\"\"\n");
    let description = if spec.description.trim().is_empty() {
        format!("{} tool", spec.name)
    } else {
        spec.description.trim().to_string()
    };
    for line in description.lines() {
        let _ = writeln!(out, "    {}", line.trim_end());
    }
    out.push('\n');
    out.push_str("    Args:\n");
    if spec.parameters.is_empty() {
        out.push_str("        None\n");
    }
    for param in &spec.parameters {
        if param.description.is_empty() {
            let _ = writeln!(out, "        {}: {}", param.name, param.python_type());
        } else {
            let _ = writeln!(out, "        {}: {}", param.name, param.description);
        }
    }
    out.push('\n');
    out.push_str("    Returns:\n");
    out.push_str("        A dictionary containing the result\n");
    out.push_str("    \"\"\"\n");

    let body = spec.body.as_deref().unwrap_or(STUB_BODY);
    out.push_str(&indent(body, "    "));
    out
}

/// Quote `value` as a Python string literal.
///
/// JSON string syntax is a subset of Python's, so escaping follows JSON.
pub fn python_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
}

fn typing_imports(spec: &ToolSpec) -> Vec<&'static str> {
    let mut names: BTreeSet<&'static str> = ["Any", "Dict"].into_iter().collect();
    for param in &spec.parameters {
        let ty = param.python_type();
        for name in TYPING_NAMES {
            if ty
                .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .any(|word| word == name)
            {
                names.insert(name);
            }
        }
    }
    names.into_iter().collect()
}

fn indent(text: &str, prefix: &str) -> String {
    let mut out = String::new();
    for line in dedent_block(text).lines() {
        if !line.trim().is_empty() {
            out.push_str(prefix);
            out.push_str(line.trim_end());
        }
        out.push('\n');
    }
    out
}

/// Strip the indentation shared by every non-blank line. Only ASCII spaces
/// and tabs count as indentation.
fn dedent_block(text: &str) -> String {
    let common = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(ascii_indent)
        .min()
        .unwrap_or(0);
    text.lines()
        .map(|l| &l[common.min(ascii_indent(l))..])
        .collect::<Vec<_>>()
        .join("\n")
}

fn ascii_indent(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}
