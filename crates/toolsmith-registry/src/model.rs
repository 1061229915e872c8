//! The registry document.
//!
//! On disk the registry is `{"servers": {<id>: <entry>}}`. Entries are
//! identified by a UUID v4 `id`; operations look them up by `name`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use toolsmith_source::ToolSpec;

/// All servers created by Toolsmith.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    /// Entries keyed by id.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerEntry>,
}

impl Registry {
    /// Find an entry by server name.
    pub fn find_by_name(&self, name: &str) -> Option<&ServerEntry> {
        self.servers.values().find(|s| s.name == name)
    }

    /// Find an entry by server name, mutably.
    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut ServerEntry> {
        self.servers.values_mut().find(|s| s.name == name)
    }

    /// Insert an entry under its id.
    pub fn insert(&mut self, entry: ServerEntry) {
        self.servers.insert(entry.id.clone(), entry);
    }

    /// Remove the entry with the given name.
    pub fn remove_by_name(&mut self, name: &str) -> Option<ServerEntry> {
        let id = self.find_by_name(name)?.id.clone();
        self.servers.remove(&id)
    }

    /// Summaries of every server, ordered by name.
    pub fn summaries(&self) -> Vec<ServerSummary> {
        let mut summaries: Vec<ServerSummary> =
            self.servers.values().map(ServerSummary::from).collect();
        summaries.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    /// Number of registered servers.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Returns true if no servers are registered.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

/// One generated server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Directory holding the server's files.
    pub location: PathBuf,
    /// Always equal to `tools.len()`.
    #[serde(default)]
    pub tool_count: usize,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolSpec>,
}

impl ServerEntry {
    /// Create an entry with a fresh UUID v4 id and no tools.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        location: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            location: location.into(),
            tool_count: 0,
            tools: BTreeMap::new(),
        }
    }

    /// Record a tool, replacing any previous spec of the same name.
    pub fn insert_tool(&mut self, spec: ToolSpec) {
        self.tools.insert(spec.name.clone(), spec);
        self.tool_count = self.tools.len();
    }

    /// Forget a tool.
    pub fn remove_tool(&mut self, name: &str) -> Option<ToolSpec> {
        let removed = self.tools.remove(name);
        self.tool_count = self.tools.len();
        removed
    }

    /// Returns true if a tool with this name is recorded.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }
}

/// A server entry without its tool specs, as returned by listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub location: PathBuf,
    pub tool_count: usize,
}

impl From<&ServerEntry> for ServerSummary {
    fn from(entry: &ServerEntry) -> Self {
        Self {
            id: entry.id.clone(),
            name: entry.name.clone(),
            description: entry.description.clone(),
            location: entry.location.clone(),
            tool_count: entry.tool_count,
        }
    }
}
