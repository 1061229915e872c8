//! Declarative descriptions of generated tools.
//!
//! A [`ToolSpec`] is what the registry stores for each tool and what the
//! template renders into source. Validation happens here so that nothing
//! that reaches the renderer can break out of the generated function.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use toolsmith_core::util::ids::is_snake_case;
use toolsmith_core::{Error, Result};

// ============================================================================
// ParamSpec
// ============================================================================

/// One parameter of a generated tool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParamSpec {
    /// Parameter name; must be a Python identifier.
    pub name: String,

    /// Type name, either generic (`number`, `string`, ...) or a Python
    /// annotation such as `List[str]`.
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description, rendered into the `Args:` section.
    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    /// Creates a parameter spec.
    pub fn new(
        name: impl Into<String>,
        param_type: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: description.into(),
        }
    }

    /// The Python annotation for this parameter's type.
    ///
    /// Generic JSON-ish names map onto Python builtins; anything else is
    /// assumed to already be an annotation and passes through.
    pub fn python_type(&self) -> &str {
        python_type_for(&self.param_type)
    }

    /// Check the name, type and description can be rendered safely.
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.name) {
            return Err(Error::validation(format!(
                "parameter name '{}' is not a valid identifier",
                self.name
            )));
        }
        let ty = self.param_type.trim();
        if ty.is_empty() {
            return Err(Error::validation(format!(
                "parameter '{}' has an empty type",
                self.name
            )));
        }
        if !ty
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']' | ',' | ' ' | '|'))
        {
            return Err(Error::validation(format!(
                "parameter '{}' has an unsupported type '{}'",
                self.name, self.param_type
            )));
        }
        if self.description.contains('\n') || self.description.contains("\"\"\"") {
            return Err(Error::validation(format!(
                "description of parameter '{}' must be a single line without triple quotes",
                self.name
            )));
        }
        Ok(())
    }
}

/// Map a generic type name onto a Python annotation.
pub fn python_type_for(name: &str) -> &str {
    match name.trim() {
        "number" | "float" => "float",
        "integer" | "int" => "int",
        "string" | "str" => "str",
        "boolean" | "bool" => "bool",
        "array" | "list" => "list",
        "object" | "dict" => "dict",
        "any" | "Any" => "Any",
        other => other,
    }
}

// ============================================================================
// ToolSpec
// ============================================================================

/// A tool to be rendered into a generated server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolSpec {
    /// Function name; snake_case.
    pub name: String,

    /// Docstring summary.
    #[serde(default)]
    pub description: String,

    /// Ordered parameters.
    #[serde(default)]
    pub parameters: Vec<ParamSpec>,

    /// Optional function body. Rendered indented inside the function; when
    /// absent a stub returning a success dictionary is generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl ToolSpec {
    /// Creates a tool spec without parameters or body.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            body: None,
        }
    }

    /// Adds a parameter.
    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.parameters.push(param);
        self
    }

    /// Sets the function body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Validate the spec before rendering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the tool name is not snake_case,
    /// the description contains a triple quote, a parameter is invalid, or
    /// two parameters share a name.
    pub fn validate(&self) -> Result<()> {
        if !is_snake_case(&self.name) {
            return Err(Error::validation(format!(
                "tool name '{}' must be snake_case (lowercase letters, digits and underscores)",
                self.name
            )));
        }
        if self.description.contains("\"\"\"") {
            return Err(Error::validation(
                "tool description must not contain triple quotes",
            ));
        }
        if let Some(body) = &self.body {
            let odd_indent = body.lines().any(|l| {
                l.chars()
                    .take_while(|c| c.is_whitespace())
                    .any(|c| c != ' ' && c != '\t')
            });
            if odd_indent {
                return Err(Error::validation(
                    "tool body must be indented with spaces or tabs only",
                ));
            }
        }
        let mut seen = std::collections::HashSet::new();
        for param in &self.parameters {
            param.validate()?;
            if !seen.insert(param.name.as_str()) {
                return Err(Error::validation(format!(
                    "duplicate parameter '{}'",
                    param.name
                )));
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
