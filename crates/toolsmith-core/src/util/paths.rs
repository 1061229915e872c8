//! Path resolution utilities.
//!
//! Configuration values are plain strings; these helpers turn them into
//! absolute paths (tilde expansion, resolution against a base directory).

use std::path::{Path, PathBuf};

/// Expands `~` to the user's home directory.
///
/// If the path starts with `~`, replaces it with the user's home directory.
/// Otherwise returns the path unchanged.
///
/// # Example
///
/// ```
/// use toolsmith_core::util::paths::expand_tilde;
///
/// let expanded = expand_tilde("~/documents");
/// assert!(!expanded.starts_with("~"));
/// ```
pub fn expand_tilde<P: AsRef<Path>>(path: P) -> PathBuf {
    let path = path.as_ref();
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

/// Resolves a configured path against `base`.
///
/// Tilde-prefixed and absolute paths are returned as-is (after expansion);
/// relative paths are joined onto `base`.
pub fn resolve_against<P: AsRef<Path>>(base: &Path, path: P) -> PathBuf {
    let expanded = expand_tilde(path);
    if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_tilde_with_tilde() {
        let path = expand_tilde("~/test/path");
        assert!(!path.starts_with("~"), "Tilde should be expanded");
        if let Some(home) = dirs::home_dir() {
            assert!(path.starts_with(&home), "Path should start with home dir");
            assert!(path.ends_with("test/path"), "Path should preserve suffix");
        }
    }

    #[test]
    fn test_expand_tilde_without_tilde() {
        let original = PathBuf::from("/absolute/path");
        assert_eq!(expand_tilde(&original), original);
    }

    #[test]
    fn test_expand_tilde_tilde_only() {
        let path = expand_tilde("~");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(path, home, "~ should expand to home directory");
        }
    }

    #[test]
    fn test_resolve_against_relative() {
        let resolved = resolve_against(Path::new("/data"), "servers_db.json");
        assert_eq!(resolved, PathBuf::from("/data/servers_db.json"));
    }

    #[test]
    fn test_resolve_against_absolute() {
        let resolved = resolve_against(Path::new("/data"), "/etc/registry.json");
        assert_eq!(resolved, PathBuf::from("/etc/registry.json"));
    }

    #[test]
    fn test_resolve_against_tilde() {
        let resolved = resolve_against(Path::new("/data"), "~/servers");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(resolved, home.join("servers"));
        }
    }
}
