//! Handler functions for `toolsmith config {path,get,set,init,export}`
//! and the TOML dotted-key helpers they share.

use std::path::{Path, PathBuf};

use toolsmith_core::{Error, Result};

use crate::cli::ConfigAction;
use crate::config::ToolsmithConfig;

// ============================================================================
// Command dispatch
// ============================================================================

/// Handle a config subcommand.
///
/// Receives the raw `--config` path rather than a loaded config because
/// `path` and `init` must work before a config file exists.
pub fn handle_config_command(config_path: Option<&str>, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => {
            let path = resolved_path(config_path)?;
            println!("{}", path.display());
            if !path.exists() {
                eprintln!("(file does not exist, run `toolsmith config init` to create it)");
            }
        }
        ConfigAction::Get { key } => println!("{}", config_get(config_path, &key)?),
        ConfigAction::Set { key, value } => {
            let path = config_set(config_path, &key, &value)?;
            println!("Set {key} = {value} in {}", path.display());
        }
        ConfigAction::Init { file, force } => {
            let path = config_init(file.as_deref(), force)?;
            println!("Config file created at {}", path.display());
        }
        ConfigAction::Export { docker_env } => {
            let config = ToolsmithConfig::load(config_path)?;
            for line in export_lines(&config, docker_env)? {
                println!("{line}");
            }
        }
    }
    Ok(())
}

// ============================================================================
// Command handlers
// ============================================================================

fn resolved_path(config_path: Option<&str>) -> Result<PathBuf> {
    ToolsmithConfig::resolve_config_path(config_path)
        .ok_or_else(|| Error::config("Could not determine config directory for this platform"))
}

/// Look up a dotted key in the effective configuration.
fn config_get(config_path: Option<&str>, key: &str) -> Result<String> {
    let config = ToolsmithConfig::load(config_path)?;
    let value = toml::Value::try_from(&config).map_err(|e| Error::config(e.to_string()))?;
    get_nested_value(&value, key)
        .map(format_toml_value)
        .ok_or_else(|| Error::config(format!("Key '{key}' not found in configuration")))
}

/// Set a dotted key in the config file and return the file's path.
fn config_set(config_path: Option<&str>, key: &str, value: &str) -> Result<PathBuf> {
    let path = resolved_path(config_path)?;
    if !path.exists() {
        return Err(Error::config(format!(
            "Config file does not exist at {}. Run `toolsmith config init` first.",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
    let mut doc: toml::Value = toml::from_str(&content)
        .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;

    set_nested_value(&mut doc, key, parse_value(value))?;

    // Reject edits that would make the file unloadable.
    doc.clone()
        .try_into::<ToolsmithConfig>()
        .map_err(|e| Error::config(format!("Invalid value for '{key}': {e}")))?;

    let toml_str = toml::to_string_pretty(&doc).map_err(|e| Error::config(e.to_string()))?;
    std::fs::write(&path, toml_str).map_err(|e| Error::io_with_path(e, &path))?;
    Ok(path)
}

/// Write a default config file and return its path.
fn config_init(file: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => ToolsmithConfig::default_config_path()
            .ok_or_else(|| Error::config("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        return Err(Error::config(format!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        )));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io_with_path(e, parent))?;
    }

    write_default(&path)?;
    Ok(path)
}

fn write_default(path: &Path) -> Result<()> {
    let toml_str = ToolsmithConfig::default().to_toml_string()?;
    std::fs::write(path, toml_str).map_err(|e| Error::io_with_path(e, path))
}

fn export_lines(config: &ToolsmithConfig, docker_env: bool) -> Result<Vec<String>> {
    Ok(config
        .to_env_vars()?
        .into_iter()
        .map(|(key, value)| {
            if docker_env {
                format!("--env {key}={value}")
            } else {
                format!("{key}={value}")
            }
        })
        .collect())
}

// ============================================================================
// TOML dotted-key helpers
// ============================================================================

/// Navigate a dotted key path in a TOML value tree.
fn get_nested_value<'a>(value: &'a toml::Value, key: &str) -> Option<&'a toml::Value> {
    key.split('.')
        .try_fold(value, |current, part| current.as_table()?.get(part))
}

/// Set a value at a dotted key path, creating intermediate tables as needed.
fn set_nested_value(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let parts: Vec<&str> = key.split('.').collect();
    let Some((last, parents)) = parts.split_last() else {
        return Err(Error::config("Empty key path"));
    };
    if parts.iter().any(|p| p.is_empty()) {
        return Err(Error::config(format!("Malformed key '{key}'")));
    }

    let mut current = root;
    for part in parents {
        let table = current
            .as_table_mut()
            .ok_or_else(|| Error::config("Cannot navigate into a non-table value"))?;
        current = table
            .entry(part.to_string())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .ok_or_else(|| Error::config("Cannot set key on a non-table value"))?
        .insert(last.to_string(), value);
    Ok(())
}

/// Parse a string value into a TOML value, auto-detecting the type.
///
/// Priority: bool, integer, float, JSON string array, string. The array
/// form is how `servers.install_command` is set from the command line.
fn parse_value(s: &str) -> toml::Value {
    match s {
        "true" => return toml::Value::Boolean(true),
        "false" => return toml::Value::Boolean(false),
        _ => {}
    }
    if let Ok(i) = s.parse::<i64>() {
        return toml::Value::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return toml::Value::Float(f);
    }
    if s.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(s) {
            return toml::Value::Array(items.into_iter().map(toml::Value::String).collect());
        }
    }
    toml::Value::String(s.to_string())
}

/// Format a TOML value for display on stdout.
fn format_toml_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        toml::Value::Integer(i) => i.to_string(),
        toml::Value::Float(f) => f.to_string(),
        toml::Value::Boolean(b) => b.to_string(),
        toml::Value::Datetime(dt) => dt.to_string(),
        toml::Value::Array(items) => {
            serde_json::to_string(items).unwrap_or_else(|_| format!("{items:?}"))
        }
        toml::Value::Table(_) => {
            toml::to_string_pretty(value).unwrap_or_else(|_| format!("{value:?}"))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
