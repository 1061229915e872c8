//! Name and identifier helpers.

use crate::{Error, Result};

/// Derive the key a desktop client uses for a server: lowercase, spaces
/// replaced by underscores.
///
/// ```
/// use toolsmith_core::util::ids::client_key;
///
/// assert_eq!(client_key("News Finder"), "news_finder");
/// ```
pub fn client_key(name: &str) -> String {
    name.to_lowercase().replace(' ', "_")
}

/// Returns true if `name` is a snake_case identifier usable as a Python
/// function name.
pub fn is_snake_case(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Check that a server name can double as a directory name.
pub fn validate_server_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation("server name must not be empty"));
    }
    if trimmed != name {
        return Err(Error::validation(
            "server name must not start or end with whitespace",
        ));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(Error::validation(format!(
            "server name '{name}' cannot be used as a directory name"
        )));
    }
    Ok(())
}
