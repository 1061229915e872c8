//! Merging rendered tool definitions into existing server sources.
//!
//! The patcher works on lines, not syntax trees. A top-level line starting
//! with `import ` or `from ... import` is an import-like statement; a
//! parenthesised `from x import (` continues until the closing `)`.
//!
//! [`SourcePatcher::merge`] guarantees:
//!
//! - every import-like statement appears once, ordered lexicographically;
//! - imports precede all other code, after an optional `#!` line;
//! - the fragment lands right before the entry-point guard when the file
//!   has one, or at the end otherwise.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::lookup;

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:import\s+[A-Za-z_][\w.]*|from\s+\.*[\w.]*\s+import\s*[\w(*])")
        .expect("import regex is valid")
});

/// Entry-point guards recognised by [`SourcePatcher::python`].
pub const PYTHON_ENTRY_MARKERS: [&str; 2] =
    [r#"if __name__ == "__main__":"#, "if __name__ == '__main__':"];

// ============================================================================
// SourcePatcher
// ============================================================================

/// Line-level merger for generated server files.
#[derive(Clone, Debug)]
pub struct SourcePatcher {
    entry_markers: Vec<String>,
}

impl Default for SourcePatcher {
    fn default() -> Self {
        Self::python()
    }
}

impl SourcePatcher {
    /// Patcher for Python sources guarded by `if __name__ == "__main__":`.
    pub fn python() -> Self {
        Self::with_markers(PYTHON_ENTRY_MARKERS)
    }

    /// Patcher with custom entry-point markers. A line matches when it
    /// starts with one of them.
    pub fn with_markers<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entry_markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    /// Merge `fragment` into `existing`.
    pub fn merge(&self, existing: &str, fragment: &str) -> String {
        let base = split_source(existing);
        let addition = split_source(fragment);

        let imports: BTreeSet<String> = base
            .imports
            .into_iter()
            .chain(addition.imports)
            .collect();

        let body = trim_blank_lines(&base.body);
        let insert = trim_blank_lines(&addition.body);
        let merged = self.place(&body, &insert);

        // A fragment's shebang is dropped; only the existing file's survives.
        assemble(base.shebang, &imports, &merged)
    }

    /// Remove the declared tool `tool_name` from `source`.
    ///
    /// The removed block spans the comment lines directly above the
    /// decorator through the end of the function body. Returns `None` when
    /// no such tool is declared.
    pub fn remove_definition(&self, source: &str, tool_name: &str) -> Option<String> {
        let tool = lookup::find_tools(source)
            .into_iter()
            .find(|t| t.name == tool_name)?;

        let end = self.block_end(source, tool.span.clone());
        let before = source[..tool.span.start].trim_end();
        let after = source[end..].trim_start_matches(['\n', '\r']);

        let mut out = String::with_capacity(source.len());
        out.push_str(before);
        if !after.is_empty() {
            if !before.is_empty() {
                out.push_str("\n\n");
            }
            out.push_str(after);
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
        Some(out)
    }

    /// End of a tool block, cut short at any entry-point guard inside it.
    fn block_end(&self, source: &str, span: std::ops::Range<usize>) -> usize {
        let mut offset = span.start;
        for line in source[span.clone()].split_inclusive('\n') {
            if offset > span.start && self.is_entry_marker(line) {
                return offset;
            }
            offset += line.len();
        }
        span.end
    }

    /// Returns true if `line` is an entry-point guard.
    pub fn is_entry_marker(&self, line: &str) -> bool {
        self.entry_markers.iter().any(|m| line.starts_with(m.as_str()))
    }

    fn place(&self, body: &[&str], insert: &[&str]) -> Vec<String> {
        if insert.is_empty() {
            return body.iter().map(|l| (*l).to_string()).collect();
        }
        let mut out: Vec<String> = Vec::with_capacity(body.len() + insert.len() + 2);
        match body.iter().position(|line| self.is_entry_marker(line)) {
            Some(idx) => {
                let head = trim_blank_lines(&body[..idx]);
                out.extend(head.iter().map(|l| (*l).to_string()));
                if !head.is_empty() {
                    out.push(String::new());
                }
                out.extend(insert.iter().map(|l| (*l).to_string()));
                out.push(String::new());
                out.extend(body[idx..].iter().map(|l| (*l).to_string()));
            }
            None => {
                out.extend(body.iter().map(|l| (*l).to_string()));
                if !body.is_empty() {
                    out.push(String::new());
                }
                out.extend(insert.iter().map(|l| (*l).to_string()));
            }
        }
        out
    }
}

/// Merge with the default Python patcher.
pub fn merge(existing: &str, fragment: &str) -> String {
    SourcePatcher::python().merge(existing, fragment)
}

/// Returns true if `line` is a top-level import-like statement.
pub fn is_import_line(line: &str) -> bool {
    IMPORT_RE.is_match(line)
}

// ============================================================================
// Internals
// ============================================================================

struct SplitSource<'a> {
    shebang: Option<&'a str>,
    imports: Vec<String>,
    body: Vec<&'a str>,
}

fn split_source(text: &str) -> SplitSource<'_> {
    let mut lines = text.lines().peekable();
    let shebang = lines.next_if(|l| l.starts_with("#!"));

    let mut imports = Vec::new();
    let mut body = Vec::new();

    while let Some(line) = lines.next() {
        if !is_import_line(line) {
            body.push(line);
            continue;
        }
        let mut statement = line.trim_end().to_string();
        if opens_group(line) {
            for cont in lines.by_ref() {
                statement.push('\n');
                statement.push_str(cont.trim_end());
                if cont.contains(')') {
                    break;
                }
            }
        }
        imports.push(statement);
    }

    SplitSource {
        shebang,
        imports,
        body,
    }
}

fn opens_group(line: &str) -> bool {
    line.starts_with("from ") && line.contains('(') && !line.contains(')')
}

fn trim_blank_lines<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].to_vec(),
        _ => Vec::new(),
    }
}

fn assemble(shebang: Option<&str>, imports: &BTreeSet<String>, body: &[String]) -> String {
    let mut out = String::new();
    if let Some(line) = shebang {
        out.push_str(line);
        out.push('\n');
    }
    for import in imports {
        out.push_str(import);
        out.push('\n');
    }
    if !body.is_empty() {
        if !imports.is_empty() {
            out.push('\n');
        }
        out.push_str(&body.join("\n"));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SERVER: &str = r#"#!/usr/bin/env python3
from mcp.server.fastmcp import FastMCP, Context

# Create an MCP server
mcp = FastMCP("Demo")

if __name__ == "__main__":
    mcp.run()
"#;

    const ADD_TOOL: &str = r#"from typing import Any, Dict

# add tool
@mcp.tool()
def add(a: float, b: float) -> Dict[str, Any]:
    """Add two numbers"""
    return {"status": "success"}
"#;

    #[test]
    fn test_is_import_line() {
        assert!(is_import_line("import os"));
        assert!(is_import_line("import os, sys"));
        assert!(is_import_line("from typing import Any, Dict"));
        assert!(is_import_line("from . import helpers"));
        assert!(is_import_line("from x.y import (a,"));
        assert!(is_import_line("from x import *"));
        assert!(!is_import_line("    import os"));
        assert!(!is_import_line("important = 1"));
        assert!(!is_import_line("from_here = 2"));
        assert!(!is_import_line("# import os"));
    }

    #[test]
    fn test_merge_inserts_before_entry_point() {
        let merged = merge(SERVER, ADD_TOOL);
        let expected = r#"#!/usr/bin/env python3
from mcp.server.fastmcp import FastMCP, Context
from typing import Any, Dict

# Create an MCP server
mcp = FastMCP("Demo")

# add tool
@mcp.tool()
def add(a: float, b: float) -> Dict[str, Any]:
    """Add two numbers"""
    return {"status": "success"}

if __name__ == "__main__":
    mcp.run()
"#;
        assert_eq!(merged, expected);
    }

    #[test]
    fn test_merge_single_quote_marker() {
        let existing = "x = 1\n\nif __name__ == '__main__':\n    main()\n";
        let merged = merge(existing, "def f():\n    pass\n");
        assert_eq!(
            merged,
            "x = 1\n\ndef f():\n    pass\n\nif __name__ == '__main__':\n    main()\n"
        );
    }

    #[test]
    fn test_merge_appends_without_marker() {
        let merged = merge("import os\n\nx = 1\n\n\n", "def f():\n    pass");
        assert_eq!(merged, "import os\n\nx = 1\n\ndef f():\n    pass\n");
    }

    #[test]
    fn test_merge_deduplicates_imports() {
        let merged = merge(
            "import os\nfrom typing import Any\n\nx = 1\n",
            "import os\nimport sys\n\ny = 2\n",
        );
        assert_eq!(
            merged,
            "from typing import Any\nimport os\nimport sys\n\nx = 1\n\ny = 2\n"
        );
    }

    #[test]
    fn test_merge_hoists_late_imports() {
        let merged = merge("x = 1\nimport json\ny = 2\n", "");
        assert_eq!(merged, "import json\n\nx = 1\ny = 2\n");
    }

    #[test]
    fn test_merge_parenthesized_import_is_one_statement() {
        let existing = "from typing import (\n    Any,\n    Dict,\n)\n\nx = 1\n";
        let merged = merge(existing, existing);
        assert_eq!(merged.matches("from typing import (").count(), 1);
        assert!(merged.starts_with("from typing import (\n    Any,\n    Dict,\n)\n"));
    }

    #[test]
    fn test_merge_drops_fragment_shebang() {
        let merged = merge("#!/bin/python\nx = 1\n", "#!/other\ny = 2\n");
        assert_eq!(merged, "#!/bin/python\nx = 1\n\ny = 2\n");
    }

    #[test]
    fn test_merge_empty_inputs() {
        assert_eq!(merge("", ""), "");
        assert_eq!(merge("", "x = 1"), "x = 1\n");
    }

    #[test]
    fn test_custom_markers() {
        let patcher = SourcePatcher::with_markers(["main()"]);
        let merged = patcher.merge("def main():\n    pass\n\nmain()\n", "def f():\n    pass\n");
        assert_eq!(
            merged,
            "def main():\n    pass\n\ndef f():\n    pass\n\nmain()\n"
        );
    }

    #[test]
    fn test_remove_definition() {
        let merged = merge(SERVER, ADD_TOOL);
        let removed = SourcePatcher::python()
            .remove_definition(&merged, "add")
            .unwrap();
        assert!(!removed.contains("def add"));
        assert!(!removed.contains("# add tool"));
        assert!(removed.contains("mcp = FastMCP(\"Demo\")\n\nif __name__"));
    }

    #[test]
    fn test_remove_definition_unknown_tool() {
        assert!(SourcePatcher::python()
            .remove_definition(SERVER, "missing")
            .is_none());
    }

    #[test]
    fn test_remove_definition_at_end_of_file() {
        let source = "x = 1\n\n@mcp.tool()\ndef ping() -> str:\n    return \"pong\"\n";
        let removed = SourcePatcher::python()
            .remove_definition(source, "ping")
            .unwrap();
        assert_eq!(removed, "x = 1\n");
    }

    #[test]
    fn test_remove_definition_keeps_guard_after_commented_def() {
        let source = "x = 1\n\n@mcp.tool()\ndef ping() -> str:  # liveness\n    return \"pong\"\n\nif __name__ == \"__main__\":\n    mcp.run()\n";
        let removed = SourcePatcher::python()
            .remove_definition(source, "ping")
            .unwrap();
        assert_eq!(
            removed,
            "x = 1\n\nif __name__ == \"__main__\":\n    mcp.run()\n"
        );
    }

    #[test]
    fn test_remove_definition_stops_at_custom_marker() {
        let patcher = SourcePatcher::with_markers(["    # --- entry ---"]);
        let source = "@mcp.tool()\ndef ping():\n    return 1\n    # --- entry ---\n    mcp.run()\n";
        let removed = patcher.remove_definition(source, "ping").unwrap();
        assert_eq!(removed, "    # --- entry ---\n    mcp.run()\n");
    }

    fn body_line() -> impl Strategy<Value = String> {
        "[a-z]{1,8} = [0-9]{1,4}"
    }

    fn import_line() -> impl Strategy<Value = String> {
        prop_oneof!["import [a-z]{1,6}", "from [a-z]{1,6} import [a-z]{1,6}"]
    }

    proptest! {
        #[test]
        fn prop_fragment_without_imports_is_preserved(
            body in prop::collection::vec(body_line(), 0..6),
            frag in prop::collection::vec(body_line(), 1..6),
        ) {
            let existing = body.join("\n");
            let fragment = frag.join("\n");
            let merged = merge(&existing, &fragment);
            prop_assert!(merged.contains(&fragment));
        }

        #[test]
        fn prop_imports_appear_once(
            shared in prop::collection::vec(import_line(), 1..4),
            body in prop::collection::vec(body_line(), 0..4),
        ) {
            let existing = format!("{}\n\n{}", shared.join("\n"), body.join("\n"));
            let fragment = format!("{}\n\ndef f():\n    pass", shared.join("\n"));
            let merged = merge(&existing, &fragment);
            for import in &shared {
                let count = merged.lines().filter(|l| *l == import).count();
                prop_assert_eq!(count, 1);
            }
        }

        #[test]
        fn prop_imports_precede_code(
            imports in prop::collection::vec(import_line(), 0..4),
            body in prop::collection::vec(body_line(), 0..4),
            frag_imports in prop::collection::vec(import_line(), 0..4),
        ) {
            let existing = body.iter().zip(imports.iter())
                .flat_map(|(b, i)| [b.clone(), i.clone()])
                .collect::<Vec<_>>()
                .join("\n");
            let fragment = format!("{}\nz = 0", frag_imports.join("\n"));
            let merged = merge(&existing, &fragment);
            let lines: Vec<&str> = merged.lines().collect();
            if let Some(first_code) = lines.iter().position(|l| !l.is_empty() && !is_import_line(l)) {
                prop_assert!(lines[first_code..].iter().all(|l| !is_import_line(l)));
            }
        }

        #[test]
        fn prop_fragment_placed_before_marker(
            body in prop::collection::vec(body_line(), 0..4),
            frag in prop::collection::vec(body_line(), 1..4),
            with_marker in any::<bool>(),
        ) {
            let mut existing = body.join("\n");
            if with_marker {
                existing.push_str("\n\nif __name__ == \"__main__\":\n    mcp.run()\n");
            }
            let fragment = frag.join("\n");
            let merged = merge(&existing, &fragment);
            let frag_at = merged.find(&fragment).unwrap();
            match merged.find("if __name__") {
                Some(marker_at) => prop_assert!(frag_at < marker_at),
                None => prop_assert!(merged.trim_end().ends_with(&fragment)),
            }
        }

        #[test]
        fn prop_shebang_stays_first(
            body in prop::collection::vec(body_line(), 0..4),
            frag in prop::collection::vec(import_line(), 0..4),
        ) {
            let existing = format!("#!/usr/bin/env python3\n{}", body.join("\n"));
            let merged = merge(&existing, &frag.join("\n"));
            prop_assert!(merged.starts_with("#!/usr/bin/env python3\n"));
        }
    }
}
