//! Registry persistence.
//!
//! Every read-modify-write goes through [`RegistryStore::begin`], which
//! holds an in-process lock until the returned [`RegistryTxn`] is committed
//! or dropped. Dropping without committing leaves the file untouched.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, MutexGuard};
use toolsmith_core::util::files;
use toolsmith_core::{Error, Result};

use crate::model::Registry;

// ============================================================================
// Encoding
// ============================================================================

/// Parse registry JSON, treating undecodable input as an empty registry.
///
/// Each entry's `tool_count` is recomputed from its `tools` map.
pub fn load_registry_from_str(json: &str) -> Registry {
    match serde_json::from_str::<Registry>(json) {
        Ok(mut registry) => {
            for entry in registry.servers.values_mut() {
                entry.tool_count = entry.tools.len();
            }
            registry
        }
        Err(e) => {
            log::warn!("registry is not valid JSON, starting empty: {e}");
            Registry::default()
        }
    }
}

/// Serialize a registry with 2-space indentation.
pub fn registry_to_string(registry: &Registry) -> Result<String> {
    serde_json::to_string_pretty(registry)
        .map_err(|e| Error::serialization(format!("Failed to serialize registry: {e}")))
}

// ============================================================================
// RegistryStore
// ============================================================================

/// The registry file plus its single-writer lock.
#[derive(Debug)]
pub struct RegistryStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RegistryStore {
    /// Create a store for the file at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the registry file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current registry.
    ///
    /// A missing file yields an empty registry.
    pub async fn load(&self) -> Result<Registry> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Replace the registry file's contents.
    pub async fn save(&self, registry: &Registry) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write(registry).await
    }

    /// Lock the registry and read it for modification.
    pub async fn begin(&self) -> Result<RegistryTxn<'_>> {
        let guard = self.lock.lock().await;
        let registry = self.read().await?;
        Ok(RegistryTxn {
            _guard: guard,
            store: self,
            registry,
        })
    }

    /// Apply `f` to the registry and save the result if it succeeds.
    pub async fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Registry) -> Result<T>,
    {
        let mut txn = self.begin().await?;
        let value = f(&mut txn.registry)?;
        txn.commit().await?;
        Ok(value)
    }

    async fn read(&self) -> Result<Registry> {
        if !files::exists(&self.path).await {
            log::debug!("no registry at {}, starting empty", self.path.display());
            return Ok(Registry::default());
        }
        let json = files::read_file(&self.path).await?;
        Ok(load_registry_from_str(&json))
    }

    async fn write(&self, registry: &Registry) -> Result<()> {
        let json = registry_to_string(registry)?;
        files::write_file(&self.path, &json).await
    }
}

/// A locked, in-memory copy of the registry.
///
/// Dereferences to [`Registry`].
pub struct RegistryTxn<'a> {
    _guard: MutexGuard<'a, ()>,
    store: &'a RegistryStore,
    registry: Registry,
}

impl RegistryTxn<'_> {
    /// Write the modified registry back and release the lock.
    pub async fn commit(self) -> Result<()> {
        self.store.write(&self.registry).await
    }
}

impl Deref for RegistryTxn<'_> {
    type Target = Registry;

    fn deref(&self) -> &Registry {
        &self.registry
    }
}

impl DerefMut for RegistryTxn<'_> {
    fn deref_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ServerEntry;
    use std::sync::Arc;
    use tempfile::TempDir;
    use toolsmith_source::ToolSpec;

    fn store_in(dir: &TempDir) -> RegistryStore {
        RegistryStore::new(dir.path().join("servers_db.json"))
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let registry = store_in(&dir).load().await.unwrap();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_load_corrupt_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        std::fs::write(store.path(), "{not json").unwrap();

        let registry = store.load().await.unwrap();
        assert_eq!(registry, Registry::default());
        assert_eq!(registry_to_string(&registry).unwrap(), "{\n  \"servers\": {}\n}");
    }

    #[test]
    fn test_load_recomputes_stale_tool_count() {
        let json = r#"{
          "servers": {
            "a": {"id": "a", "name": "A", "location": "/tmp/a", "tool_count": 7,
                  "tools": {"ping": {"name": "ping", "description": "Ping"}}},
            "b": {"id": "b", "name": "B", "location": "/tmp/b", "tool_count": 3}
          }
        }"#;
        let registry = load_registry_from_str(json);
        assert_eq!(registry.servers["a"].tool_count, 1);
        assert_eq!(registry.servers["b"].tool_count, 0);
    }

    #[tokio::test]
    async fn test_save_then_load_is_identity() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut entry = ServerEntry::new("Demo", "demo", dir.path().join("Demo"));
        entry.insert_tool(ToolSpec::new("add", "Add"));
        let mut registry = Registry::default();
        registry.insert(entry);
        registry.insert(ServerEntry::new("Other", "", dir.path().join("Other")));

        store.save(&registry).await.unwrap();
        assert_eq!(store.load().await.unwrap(), registry);
    }

    #[tokio::test]
    async fn test_saved_file_uses_two_space_indent() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Registry::default()).await.unwrap();
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(text, "{\n  \"servers\": {}\n}");
    }

    #[tokio::test]
    async fn test_dropped_txn_does_not_write() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&Registry::default()).await.unwrap();
        let before = std::fs::read(store.path()).unwrap();

        {
            let mut txn = store.begin().await.unwrap();
            txn.insert(ServerEntry::new("Demo", "", "/tmp/demo"));
        }

        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_error_does_not_write() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let result: Result<()> = store
            .update(|registry| {
                registry.insert(ServerEntry::new("Demo", "", "/tmp/demo"));
                Err(Error::validation("nope"))
            })
            .await;
        assert!(result.is_err());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .update(|registry| {
                        registry.insert(ServerEntry::new(format!("s{i}"), "", format!("/tmp/s{i}")));
                        Ok(())
                    })
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.load().await.unwrap().len(), 16);
    }
}
