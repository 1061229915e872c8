//! Async file utilities for Toolsmith.
//!
//! These back the `read_file`, `write_file` and `edit_file` MCP tools and the
//! server scaffolder. Reads are lossy UTF-8: invalid sequences are replaced
//! rather than rejected.

use std::path::Path;
use tokio::fs;

use crate::{Error, Result};

/// Default number of lines returned by [`read_numbered`] when no limit is given.
pub const DEFAULT_READ_LIMIT: usize = 1000;

/// Lines of context shown on each side of an edit in [`EditOutcome::snippet`].
pub const SNIPPET_CONTEXT_LINES: usize = 4;

/// Line window for [`read_numbered`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineWindow {
    /// 1-based first line to return. `None` or `0` start at the top.
    pub offset: Option<usize>,
    /// Maximum number of lines. `None` means [`DEFAULT_READ_LIMIT`].
    pub limit: Option<usize>,
}

impl LineWindow {
    /// Window starting at a 1-based line.
    pub fn from_line(offset: usize) -> Self {
        Self {
            offset: Some(offset),
            limit: None,
        }
    }

    /// Limit the number of returned lines.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Result of a successful unique replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOutcome {
    /// 1-based line where the replaced text started.
    pub line: usize,
    /// Numbered excerpt of the edited file around the replacement.
    pub snippet: String,
}

/// Read a file's contents as a string.
pub async fn read_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Check if a path exists.
pub async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

/// Read a window of a text file, prefixing each line with its number.
///
/// Lines are formatted as `"{number:>6}\t{line}"` with trailing whitespace
/// stripped, joined with `\n`.
///
/// # Errors
///
/// - [`Error::NotFound`] if the file does not exist
/// - [`Error::Validation`] if the path is a directory
pub async fn read_numbered(path: &Path, window: LineWindow) -> Result<String> {
    ensure_regular_file(path).await?;
    let content = read_file(path).await?;

    let start = window.offset.unwrap_or(1).saturating_sub(1);
    let limit = window.limit.unwrap_or(DEFAULT_READ_LIMIT);

    let numbered: Vec<String> = content
        .lines()
        .enumerate()
        .skip(start)
        .take(limit)
        .map(|(idx, line)| format!("{:>6}\t{}", idx + 1, line.trim_end()))
        .collect();

    log::debug!(
        "read {} lines from {} starting at line {}",
        numbered.len(),
        path.display(),
        start + 1
    );
    Ok(numbered.join("\n"))
}

/// Write text to a file, creating parent directories as needed.
pub async fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| Error::io_with_path(e, parent))?;
    }
    fs::write(path, content)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    log::debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Replace the single occurrence of `old` in a file with `new`.
///
/// # Errors
///
/// - [`Error::Validation`] if `old` is empty
/// - [`Error::NotFound`] if the file does not exist
/// - [`Error::Conflict`] if `old` occurs zero or more than one time
pub async fn replace_unique(path: &Path, old: &str, new: &str) -> Result<EditOutcome> {
    if old.is_empty() {
        return Err(Error::validation("old_string must not be empty"));
    }
    ensure_regular_file(path).await?;
    let content = read_file(path).await?;

    let (updated, outcome) = replace_unique_in(&content, old, new)?;
    write_file(path, &updated).await?;
    Ok(outcome)
}

/// Pure form of [`replace_unique`] operating on text.
pub fn replace_unique_in(content: &str, old: &str, new: &str) -> Result<(String, EditOutcome)> {
    let position = match content.matches(old).count() {
        0 => return Err(Error::conflict("String to replace not found in file.")),
        1 => content.find(old).unwrap_or_default(),
        _ => {
            return Err(Error::conflict(
                "Multiple matches found. Please provide more context.",
            ));
        }
    };

    let updated = format!("{}{}{}", &content[..position], new, &content[position + old.len()..]);

    let line = content[..position].split('\n').count();
    let edited: Vec<&str> = updated.split('\n').collect();
    let new_lines = if new.is_empty() {
        0
    } else {
        new.split('\n').count()
    };
    let start = line.saturating_sub(SNIPPET_CONTEXT_LINES);
    let end = edited.len().min(line + SNIPPET_CONTEXT_LINES + new_lines);

    let snippet = edited[start..end]
        .iter()
        .enumerate()
        .map(|(i, text)| format!("{:>4} | {}", start + i + 1, text))
        .collect::<Vec<_>>()
        .join("\n");

    Ok((updated, EditOutcome { line, snippet }))
}

/// Mark a file as executable (`0o755`). No-op on non-unix platforms.
pub async fn make_executable(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(|e| Error::io_with_path(e, path))?;
    }
    #[cfg(not(unix))]
    let _ = path;
    Ok(())
}

/// Recursively delete a directory if it exists.
///
/// Returns whether anything was removed.
pub async fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    if !exists(path).await {
        return Ok(false);
    }
    fs::remove_dir_all(path)
        .await
        .map_err(|e| Error::io_with_path(e, path))?;
    Ok(true)
}

async fn ensure_regular_file(path: &Path) -> Result<()> {
    let metadata = match fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::not_found("file", path.display().to_string()));
        }
        Err(e) => return Err(Error::io_with_path(e, path)),
    };
    if metadata.is_dir() {
        return Err(Error::validation(format!(
            "Path is a directory, not a file: {}",
            path.display()
        )));
    }
    Ok(())
}
