//! Best-effort recovery of declared tools from server source text.
//!
//! A tool is a `@<app>.tool(...)` decorator followed by a `def` or
//! `async def` and an optional docstring. Parameter types come from
//! annotations; descriptions come from the docstring's `Args:` section.
//! Hand-written code in other shapes may be skipped or misread.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::patcher::PYTHON_ENTRY_MARKERS;
use crate::spec::ParamSpec;

static DECORATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^@\w+\.tool\(\s*(?:(?:name\s*=\s*)?["']([^"']+)["'])?[^)]*\)\s*$"#)
        .expect("decorator regex is valid")
});

static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(async\s+)?def\s+([A-Za-z_]\w*)\s*\(").expect("def regex is valid")
});

static ARG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\*{0,2}([A-Za-z_]\w*)\s*(?:\(([^)]*)\))?\s*:\s*(.*)$")
        .expect("args regex is valid")
});

/// A tool found in source text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DeclaredTool {
    /// Registered name: the decorator's explicit name or the function name.
    pub name: String,
    /// First paragraph line of the docstring.
    pub description: String,
    /// Parameters, excluding framework context parameters.
    pub parameters: Vec<ParamSpec>,
    /// Whether the function is `async def`.
    pub is_async: bool,
    /// Byte range of the whole block: leading comment lines, decorator,
    /// signature and body.
    #[serde(skip)]
    pub span: Range<usize>,
}

/// Find every declared tool in `source`, in file order.
pub fn find_tools(source: &str) -> Vec<DeclaredTool> {
    let lines = index_lines(source);
    let mut tools = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(caps) = DECORATOR_RE.captures(lines[i].text) else {
            i += 1;
            continue;
        };
        let explicit_name = caps.get(1).map(|m| m.as_str().to_string());

        match parse_tool(source, &lines, i, explicit_name) {
            Some((tool, next)) => {
                log::debug!("found tool '{}' at line {}", tool.name, i + 1);
                tools.push(tool);
                i = next;
            }
            None => i += 1,
        }
    }
    tools
}

/// Look up a single tool by registered name.
pub fn find_tool(source: &str, name: &str) -> Option<DeclaredTool> {
    find_tools(source).into_iter().find(|t| t.name == name)
}

// ============================================================================
// Parsing
// ============================================================================

#[derive(Clone, Copy)]
struct Line<'a> {
    start: usize,
    text: &'a str,
}

fn index_lines(source: &str) -> Vec<Line<'_>> {
    let mut start = 0;
    source
        .split_inclusive('\n')
        .map(|raw| {
            let line = Line {
                start,
                text: raw.trim_end_matches(['\n', '\r']),
            };
            start += raw.len();
            line
        })
        .collect()
}

fn parse_tool(
    source: &str,
    lines: &[Line<'_>],
    decorator: usize,
    explicit_name: Option<String>,
) -> Option<(DeclaredTool, usize)> {
    // Stacked decorators may sit between ours and the def.
    let mut def_idx = decorator + 1;
    while def_idx < lines.len() && lines[def_idx].text.starts_with('@') {
        def_idx += 1;
    }
    let def_caps = DEF_RE.captures(lines.get(def_idx)?.text)?;
    let is_async = def_caps.get(1).is_some();
    let fn_name = def_caps.get(2)?.as_str().to_string();

    let (params_text, sig_end) = signature(lines, def_idx)?;
    let body_start = sig_end + 1;
    let body_end = lines[body_start.min(lines.len())..]
        .iter()
        .position(|l| {
            is_entry_guard(l.text) || (!l.text.trim().is_empty() && !l.text.starts_with([' ', '\t']))
        })
        .map_or(lines.len(), |p| body_start + p);

    let docstring = docstring(&lines[body_start.min(body_end)..body_end]);
    let arg_docs = docstring.as_deref().map(args_section).unwrap_or_default();

    let parameters = split_params(&params_text)
        .into_iter()
        .filter_map(|raw| parse_param(&raw, &arg_docs))
        .collect();

    let description = docstring
        .as_deref()
        .and_then(|d| d.lines().map(str::trim).find(|l| !l.is_empty()))
        .unwrap_or_default()
        .to_string();

    let mut block_start = decorator;
    while block_start > 0 && is_comment(lines[block_start - 1].text) {
        block_start -= 1;
    }
    let span_start = lines[block_start].start;
    let span_end = lines.get(body_end).map_or(source.len(), |l| l.start);

    let tool = DeclaredTool {
        name: explicit_name.unwrap_or(fn_name),
        description,
        parameters,
        is_async,
        span: span_start..span_end,
    };
    Some((tool, body_end))
}

fn is_comment(line: &str) -> bool {
    line.starts_with('#') && !line.starts_with("#!")
}

/// Collect the text between the signature's outer parentheses and the index
/// of the line holding the closing `:`.
fn signature(lines: &[Line<'_>], def_idx: usize) -> Option<(String, usize)> {
    let mut depth = 0usize;
    let mut params = String::new();
    let mut opened = false;

    for (idx, line) in lines.iter().enumerate().skip(def_idx) {
        for (pos, c) in line.text.char_indices() {
            if !opened {
                opened = c == '(';
                continue;
            }
            match c {
                '(' | '[' | '{' => depth += 1,
                ')' if depth == 0 => return finish_signature(lines, idx, pos + 1, params),
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            params.push(c);
        }
        if opened {
            params.push(' ');
        }
    }
    None
}

/// Find the `:` ending the signature, starting just after the parameter
/// list's closing paren at `lines[line_idx]`, byte `col`.
///
/// The colon must sit on the same logical line; a return annotation may
/// only continue onto following lines inside open brackets. Trailing
/// `# ...` comments are ignored.
fn finish_signature(
    lines: &[Line<'_>],
    line_idx: usize,
    col: usize,
    params: String,
) -> Option<(String, usize)> {
    let mut depth = 0usize;
    for (idx, line) in lines.iter().enumerate().skip(line_idx) {
        let text = if idx == line_idx {
            line.text.get(col..)?
        } else if is_entry_guard(line.text) {
            return None;
        } else {
            line.text
        };
        for c in text.chars() {
            match c {
                '#' => break,
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth = depth.saturating_sub(1),
                ':' if depth == 0 => return Some((params, idx)),
                _ => {}
            }
        }
        if depth == 0 {
            return None;
        }
    }
    None
}

fn is_entry_guard(line: &str) -> bool {
    PYTHON_ENTRY_MARKERS.iter().any(|m| line.starts_with(m))
}

fn split_params(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => parts.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_param(raw: &str, arg_docs: &[(String, String)]) -> Option<ParamSpec> {
    let without_default = raw.split_once('=').map_or(raw, |(head, _)| head).trim();
    let (name, annotation) = match without_default.split_once(':') {
        Some((n, t)) => (n.trim(), t.trim()),
        None => (without_default, "Any"),
    };
    if name.is_empty() || name == "self" || name == "*" || name == "/" || name.starts_with('*') {
        return None;
    }
    if annotation == "Context" || annotation.ends_with(".Context") {
        return None;
    }
    let description = arg_docs
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, d)| d.clone())
        .unwrap_or_default();
    Some(ParamSpec::new(name, annotation, description))
}

/// Extract the docstring at the top of a function body.
fn docstring(body: &[Line<'_>]) -> Option<String> {
    let first = body.iter().position(|l| !l.text.trim().is_empty())?;
    let opening = body[first].text.trim_start();
    let quote = ["\"\"\"", "'''"]
        .into_iter()
        .find(|q| opening.starts_with(q))?;

    let after_open = &opening[quote.len()..];
    if let Some(end) = after_open.find(quote) {
        return Some(after_open[..end].to_string());
    }

    let mut text = String::from(after_open);
    for line in &body[first + 1..] {
        text.push('\n');
        if let Some(end) = line.text.find(quote) {
            text.push_str(&line.text[..end]);
            return Some(dedent(&text));
        }
        text.push_str(line.text);
    }
    None
}

fn dedent(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse `name: description` or `name (type): description` entries from an
/// `Args:` section.
fn args_section(doc: &str) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    let mut in_args = false;
    for line in doc.lines() {
        let trimmed = line.trim();
        if matches!(trimmed, "Args:" | "Arguments:" | "Parameters:") {
            in_args = true;
            continue;
        }
        if !in_args {
            continue;
        }
        if trimmed.is_empty() || (trimmed.ends_with(':') && !trimmed.contains(' ')) {
            // Blank line or next section header (e.g. `Returns:`).
            break;
        }
        if let Some(caps) = ARG_RE.captures(trimmed) {
            entries.push((caps[1].to_string(), caps[3].trim().to_string()));
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"#!/usr/bin/env python3
from mcp.server.fastmcp import FastMCP, Context

# Create an MCP server
mcp = FastMCP("Demo")

# add tool
@mcp.tool()
def add(a: float, b: float = 1.0) -> Dict[str, Any]:
    """
    Add two numbers

    Args:
        a: First number
        b: Second number

    Returns:
        A dictionary containing the result
    """
    return {"status": "success"}

@mcp.tool("fetch")
async def fetch_url(
    url: str,
    headers: Dict[str, str],
    ctx: Context,
) -> str:
    """Fetch a URL."""
    return url

def helper():
    pass

if __name__ == "__main__":
    mcp.run()
"#;

    #[test]
    fn test_find_tools() {
        let tools = find_tools(SOURCE);
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["add", "fetch"]);
    }

    #[test]
    fn test_parameters_and_docs() {
        let add = find_tool(SOURCE, "add").unwrap();
        assert_eq!(add.description, "Add two numbers");
        assert!(!add.is_async);
        assert_eq!(
            add.parameters,
            vec![
                ParamSpec::new("a", "float", "First number"),
                ParamSpec::new("b", "float", "Second number"),
            ]
        );
    }

    #[test]
    fn test_multiline_async_signature_skips_context() {
        let fetch = find_tool(SOURCE, "fetch").unwrap();
        assert!(fetch.is_async);
        assert_eq!(fetch.description, "Fetch a URL.");
        assert_eq!(
            fetch.parameters,
            vec![
                ParamSpec::new("url", "str", ""),
                ParamSpec::new("headers", "Dict[str, str]", ""),
            ]
        );
    }

    #[test]
    fn test_span_covers_header_comment_and_body() {
        let add = find_tool(SOURCE, "add").unwrap();
        let block = &SOURCE[add.span.clone()];
        assert!(block.starts_with("# add tool\n@mcp.tool()"));
        assert!(block.trim_end().ends_with("return {\"status\": \"success\"}"));

        let fetch = find_tool(SOURCE, "fetch").unwrap();
        let block = &SOURCE[fetch.span.clone()];
        assert!(block.starts_with("@mcp.tool(\"fetch\")"));
        assert!(!block.contains("def helper"));
    }

    #[test]
    fn test_no_tools() {
        assert!(find_tools("x = 1\n").is_empty());
        assert!(find_tools("").is_empty());
        assert!(find_tool(SOURCE, "helper").is_none());
    }

    #[test]
    fn test_decorator_without_def_is_ignored() {
        assert!(find_tools("@mcp.tool()\nx = 1\n").is_empty());
    }

    #[test]
    fn test_untyped_parameter_defaults_to_any() {
        let tools = find_tools("@mcp.tool()\ndef f(x, *args, **kwargs):\n    pass\n");
        assert_eq!(tools[0].parameters, vec![ParamSpec::new("x", "Any", "")]);
        assert_eq!(tools[0].description, "");
    }

    #[test]
    fn test_trailing_comment_on_def_line() {
        let source = "@mcp.tool()\ndef ping() -> str:  # liveness\n    return \"pong\"\n\nif __name__ == \"__main__\":\n    mcp.run()\n";
        let ping = find_tool(source, "ping").unwrap();
        let block = &source[ping.span.clone()];
        assert!(block.ends_with("return \"pong\"\n\n"));
        assert!(!block.contains("__main__"));
    }

    #[test]
    fn test_signature_without_colon_stops_before_guard() {
        let source = "@mcp.tool()\ndef broken()\n    return 1\n\nif __name__ == \"__main__\":\n    mcp.run()\n";
        assert!(find_tools(source).is_empty());
    }

    #[test]
    fn test_return_annotation_across_lines() {
        let source = "@mcp.tool()\ndef pair() -> Tuple[\n    int, int]:\n    return (1, 2)\n";
        let pair = find_tool(source, "pair").unwrap();
        assert_eq!(&source[pair.span.clone()], source);
    }

    #[test]
    fn test_split_params_respects_brackets() {
        assert_eq!(
            split_params("a: Dict[str, int], b: Tuple[int, int] = (1, 2)"),
            vec!["a: Dict[str, int]", "b: Tuple[int, int] = (1, 2)"]
        );
    }
}
