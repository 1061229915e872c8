//! Desktop client configuration sync.
//!
//! The client's JSON file has an `mcpServers` object mapping a key to a
//! launch description:
//!
//! ```json
//! {"mcpServers": {"demo": {"command": "uv", "args": ["run", "--directory", "/srv/Demo", "server.py"]}}}
//! ```
//!
//! Only `mcpServers` is touched; every other key in the file is preserved.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use toolsmith_core::util::files;
use toolsmith_core::{ClientTarget, Error, Result};

const SERVERS_KEY: &str = "mcpServers";

/// Insert or replace the launch entry for a server.
///
/// A non-object document or `mcpServers` value is replaced by an empty
/// object first.
pub fn add_entry(config: &mut Value, key: &str, command: &str, location: &Path, entry_file: &str) {
    if !config.is_object() {
        *config = Value::Object(Map::new());
    }
    if !config[SERVERS_KEY].is_object() {
        config[SERVERS_KEY] = Value::Object(Map::new());
    }
    config[SERVERS_KEY][key] = json!({
        "command": command,
        "args": ["run", "--directory", location.to_string_lossy(), entry_file],
    });
}

/// Remove every entry whose directory argument (second-to-last arg) is
/// `location`. Returns the removed keys.
pub fn remove_entries(config: &mut Value, location: &Path) -> Vec<String> {
    let Some(servers) = config.get_mut(SERVERS_KEY).and_then(Value::as_object_mut) else {
        return Vec::new();
    };
    let location = location.to_string_lossy();
    let matching: Vec<String> = servers
        .iter()
        .filter(|(_, entry)| directory_arg(entry) == Some(&*location))
        .map(|(key, _)| key.clone())
        .collect();
    for key in &matching {
        servers.remove(key);
    }
    matching
}

fn directory_arg(entry: &Value) -> Option<&str> {
    let args = entry.get("args")?.as_array()?;
    let idx = args.len().checked_sub(2)?;
    args.get(idx)?.as_str()
}

// ============================================================================
// ClientConfigFile
// ============================================================================

/// A client configuration file guarded by an in-process lock.
#[derive(Debug)]
pub struct ClientConfigFile {
    path: PathBuf,
    command: String,
    lock: Mutex<()>,
}

impl ClientConfigFile {
    pub fn new(target: ClientTarget) -> Self {
        Self {
            path: target.config_path,
            command: target.command,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Add a launch entry for the server at `location`.
    pub async fn register(&self, key: &str, location: &Path, entry_file: &str) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut config = self.read().await?;
        add_entry(&mut config, key, &self.command, location, entry_file);
        self.write(&config).await?;
        log::info!("registered '{key}' in {}", self.path.display());
        Ok(())
    }

    /// Remove launch entries pointing at `location`.
    pub async fn unregister(&self, location: &Path) -> Result<Vec<String>> {
        let _guard = self.lock.lock().await;
        if !files::exists(&self.path).await {
            return Ok(Vec::new());
        }
        let mut config = self.read().await?;
        let removed = remove_entries(&mut config, location);
        if !removed.is_empty() {
            self.write(&config).await?;
            log::info!("removed {:?} from {}", removed, self.path.display());
        }
        Ok(removed)
    }

    async fn read(&self) -> Result<Value> {
        if !files::exists(&self.path).await {
            return Ok(Value::Object(Map::new()));
        }
        let text = files::read_file(&self.path).await?;
        match serde_json::from_str::<Value>(&text) {
            Ok(value) if value.is_object() => Ok(value),
            Ok(_) | Err(_) => {
                log::warn!(
                    "client config {} is not a JSON object, starting from an empty one",
                    self.path.display()
                );
                Ok(Value::Object(Map::new()))
            }
        }
    }

    async fn write(&self, config: &Value) -> Result<()> {
        let text = serde_json::to_string_pretty(config)
            .map_err(|e| Error::serialization(format!("Failed to serialize client config: {e}")))?;
        files::write_file(&self.path, &text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn client_in(dir: &TempDir) -> ClientConfigFile {
        ClientConfigFile::new(ClientTarget {
            config_path: dir.path().join("claude_desktop_config.json"),
            command: "/usr/local/bin/uv".into(),
        })
    }

    #[test]
    fn test_add_entry_shape() {
        let mut config = json!({"theme": "dark"});
        add_entry(&mut config, "demo", "uv", Path::new("/srv/Demo"), "server.py");
        assert_eq!(
            config,
            json!({
                "theme": "dark",
                "mcpServers": {
                    "demo": {"command": "uv", "args": ["run", "--directory", "/srv/Demo", "server.py"]}
                }
            })
        );
    }

    #[test]
    fn test_add_entry_to_non_object() {
        let mut config = json!([1, 2]);
        add_entry(&mut config, "demo", "uv", Path::new("/srv/Demo"), "server.py");
        assert!(config["mcpServers"]["demo"].is_object());

        let mut config = json!({"mcpServers": "broken"});
        add_entry(&mut config, "demo", "uv", Path::new("/srv/Demo"), "server.py");
        assert!(config["mcpServers"]["demo"].is_object());
    }

    #[test]
    fn test_remove_entries_matches_directory_arg() {
        let mut config = json!({
            "mcpServers": {
                "demo": {"command": "uv", "args": ["run", "--directory", "/srv/Demo", "server.py"]},
                "other": {"command": "uv", "args": ["run", "--directory", "/srv/Other", "server.py"]},
                "short": {"command": "node", "args": ["x"]},
                "noargs": {"command": "python"}
            }
        });
        let removed = remove_entries(&mut config, Path::new("/srv/Demo"));
        assert_eq!(removed, vec!["demo"]);
        let servers = config["mcpServers"].as_object().unwrap();
        assert_eq!(servers.len(), 3);
        assert!(servers.contains_key("other"));
    }

    #[test]
    fn test_remove_entries_without_servers() {
        let mut config = json!({"theme": "dark"});
        assert!(remove_entries(&mut config, Path::new("/srv/Demo")).is_empty());
        assert_eq!(config, json!({"theme": "dark"}));
    }

    #[tokio::test]
    async fn test_register_and_unregister() {
        let dir = TempDir::new().unwrap();
        let client = client_in(&dir);
        std::fs::write(client.path(), r#"{"globalShortcut": "Ctrl+Space"}"#).unwrap();

        client
            .register("demo", Path::new("/srv/Demo"), "server.py")
            .await
            .unwrap();
        let config: Value =
            serde_json::from_str(&std::fs::read_to_string(client.path()).unwrap()).unwrap();
        assert_eq!(config["globalShortcut"], "Ctrl+Space");
        assert_eq!(config["mcpServers"]["demo"]["command"], "/usr/local/bin/uv");

        let removed = client.unregister(Path::new("/srv/Demo")).await.unwrap();
        assert_eq!(removed, vec!["demo"]);
        let config: Value =
            serde_json::from_str(&std::fs::read_to_string(client.path()).unwrap()).unwrap();
        assert_eq!(config["globalShortcut"], "Ctrl+Space");
        assert!(config["mcpServers"].as_object().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_register_creates_missing_file() {
        let dir = TempDir::new().unwrap();
        let client = ClientConfigFile::new(ClientTarget {
            config_path: dir.path().join("nested/config.json"),
            command: "uv".into(),
        });
        client
            .register("demo", Path::new("/srv/Demo"), "server.py")
            .await
            .unwrap();
        assert!(client.path().exists());
    }

    #[tokio::test]
    async fn test_register_recovers_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let client = client_in(&dir);
        std::fs::write(client.path(), "not json").unwrap();
        client
            .register("demo", Path::new("/srv/Demo"), "server.py")
            .await
            .unwrap();
        let config: Value =
            serde_json::from_str(&std::fs::read_to_string(client.path()).unwrap()).unwrap();
        assert!(config["mcpServers"]["demo"].is_object());
    }

    #[tokio::test]
    async fn test_unregister_missing_file_is_noop() {
        let dir = TempDir::new().unwrap();
        let client = client_in(&dir);
        assert!(client.unregister(Path::new("/srv/Demo")).await.unwrap().is_empty());
        assert!(!client.path().exists());
    }
}
