//! Change-set value types.
//!
//! A [`ChangeSet`] describes one committed, atomic set of mutations to a
//! workspace. It is built once by the commit path, wrapped in an `Arc` and
//! handed to the change bus; nothing mutates it after publication.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a node in the content repository.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    /// Create a node key from its string form.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Get the string form of the key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for NodeKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// A single atomic change recorded in a change-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Change {
    /// A node was added under a parent.
    NodeAdded {
        key: NodeKey,
        parent: NodeKey,
        path: String,
    },
    /// A node was removed from a parent.
    NodeRemoved {
        key: NodeKey,
        parent: NodeKey,
        path: String,
    },
    /// A node was moved to a new path.
    NodeMoved {
        key: NodeKey,
        old_path: String,
        new_path: String,
    },
    /// A property was added to a node.
    PropertyAdded { key: NodeKey, name: String },
    /// A property value on a node was changed.
    PropertyChanged { key: NodeKey, name: String },
    /// A property was removed from a node.
    PropertyRemoved { key: NodeKey, name: String },
    /// A workspace was created.
    WorkspaceAdded { name: String },
    /// A workspace was destroyed.
    WorkspaceRemoved { name: String },
}

impl Change {
    /// Get the key of the node this change touches, if any.
    pub fn node_key(&self) -> Option<&NodeKey> {
        match self {
            Change::NodeAdded { key, .. }
            | Change::NodeRemoved { key, .. }
            | Change::NodeMoved { key, .. }
            | Change::PropertyAdded { key, .. }
            | Change::PropertyChanged { key, .. }
            | Change::PropertyRemoved { key, .. } => Some(key),
            Change::WorkspaceAdded { .. } | Change::WorkspaceRemoved { .. } => None,
        }
    }
}

/// An immutable record of one atomic set of mutations to a workspace.
///
/// Equality and hashing consider only the workspace name and the timestamp.
/// `changed_nodes` is always derived from `changes`, including on
/// deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ChangeSetRecord")]
pub struct ChangeSet {
    workspace_name: Option<String>,
    timestamp: DateTime<Utc>,
    changed_nodes: BTreeSet<NodeKey>,
    changes: Vec<Change>,
    user_id: Option<String>,
    user_data: BTreeMap<String, String>,
    process_key: Option<String>,
    repository_key: Option<String>,
    journal_id: Option<String>,
    uuid: Option<String>,
}

/// Wire form of a [`ChangeSet`]. Any serialized `changed_nodes` is ignored.
#[derive(Deserialize)]
struct ChangeSetRecord {
    workspace_name: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    changes: Vec<Change>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    user_data: BTreeMap<String, String>,
    #[serde(default)]
    process_key: Option<String>,
    #[serde(default)]
    repository_key: Option<String>,
    #[serde(default)]
    journal_id: Option<String>,
    #[serde(default)]
    uuid: Option<String>,
}

impl From<ChangeSetRecord> for ChangeSet {
    fn from(record: ChangeSetRecord) -> Self {
        let change_set = ChangeSet {
            workspace_name: record.workspace_name,
            timestamp: record.timestamp,
            changed_nodes: BTreeSet::new(),
            changes: Vec::new(),
            user_id: record.user_id,
            user_data: record.user_data,
            process_key: record.process_key,
            repository_key: record.repository_key,
            journal_id: record.journal_id,
            uuid: record.uuid,
        };
        change_set.with_changes(record.changes)
    }
}

impl ChangeSet {
    /// Create an empty change-set for a workspace, stamped with the current time.
    ///
    /// The timestamp is truncated to millisecond precision.
    pub fn new<S: Into<String>>(workspace_name: Option<S>) -> Self {
        Self {
            workspace_name: workspace_name.map(Into::into),
            timestamp: Utc::now().trunc_subsecs(3),
            changed_nodes: BTreeSet::new(),
            changes: Vec::new(),
            user_id: None,
            user_data: BTreeMap::new(),
            process_key: None,
            repository_key: None,
            journal_id: None,
            uuid: None,
        }
    }

    /// Create an empty change-set for a named workspace.
    pub fn for_workspace(workspace_name: impl Into<String>) -> Self {
        Self::new(Some(workspace_name))
    }

    /// Create an empty change-set with no workspace name.
    pub fn without_workspace() -> Self {
        Self::new(None::<String>)
    }

    /// Override the construction timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp.trunc_subsecs(3);
        self
    }

    /// Append an atomic change, recording its node as changed.
    pub fn with_change(mut self, change: Change) -> Self {
        if let Some(key) = change.node_key() {
            self.changed_nodes.insert(key.clone());
        }
        self.changes.push(change);
        self
    }

    /// Append several atomic changes.
    pub fn with_changes(self, changes: impl IntoIterator<Item = Change>) -> Self {
        changes.into_iter().fold(self, Self::with_change)
    }

    /// Set the id of the user who made the changes.
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Attach a piece of user data.
    pub fn with_user_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.user_data.insert(key.into(), value.into());
        self
    }

    /// Set the key of the process that made the changes.
    pub fn with_process_key(mut self, process_key: impl Into<String>) -> Self {
        self.process_key = Some(process_key.into());
        self
    }

    /// Set the key of the repository the changes belong to.
    pub fn with_repository_key(mut self, repository_key: impl Into<String>) -> Self {
        self.repository_key = Some(repository_key.into());
        self
    }

    /// Set the id of the journal that recorded the changes.
    pub fn with_journal_id(mut self, journal_id: impl Into<String>) -> Self {
        self.journal_id = Some(journal_id.into());
        self
    }

    /// Set the unique id of this change-set.
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Get the workspace name, if present.
    pub fn workspace_name(&self) -> Option<&str> {
        self.workspace_name.as_deref()
    }

    /// Get the construction timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Get the construction timestamp in milliseconds since the epoch.
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Get the keys of all nodes touched by this change-set.
    pub fn changed_nodes(&self) -> &BTreeSet<NodeKey> {
        &self.changed_nodes
    }

    /// Get the number of atomic changes.
    pub fn size(&self) -> usize {
        self.changes.len()
    }

    /// Check whether this change-set contains no atomic changes.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Iterate over the atomic changes in commit order.
    pub fn iter(&self) -> std::slice::Iter<'_, Change> {
        self.changes.iter()
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn user_data(&self) -> &BTreeMap<String, String> {
        &self.user_data
    }

    pub fn process_key(&self) -> Option<&str> {
        self.process_key.as_deref()
    }

    pub fn repository_key(&self) -> Option<&str> {
        self.repository_key.as_deref()
    }

    pub fn journal_id(&self) -> Option<&str> {
        self.journal_id.as_deref()
    }

    pub fn uuid(&self) -> Option<&str> {
        self.uuid.as_deref()
    }
}

impl PartialEq for ChangeSet {
    fn eq(&self, other: &Self) -> bool {
        self.workspace_name == other.workspace_name && self.timestamp == other.timestamp
    }
}

impl Eq for ChangeSet {}

impl Hash for ChangeSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.workspace_name.hash(state);
        self.timestamp.hash(state);
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn added(key: &str, path: &str) -> Change {
        Change::NodeAdded {
            key: NodeKey::new(key),
            parent: NodeKey::new("root"),
            path: path.to_string(),
        }
    }

    #[test]
    fn test_new_change_set_is_empty() {
        let changes = ChangeSet::for_workspace("ws1");

        assert_eq!(changes.workspace_name(), Some("ws1"));
        assert!(changes.is_empty());
        assert_eq!(changes.size(), 0);
        assert!(changes.changed_nodes().is_empty());
        assert!(changes.user_id().is_none());
        assert!(changes.uuid().is_none());
        assert_eq!(changes.iter().count(), 0);
    }

    #[test]
    fn test_timestamp_has_millisecond_precision() {
        let precise = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let changes = ChangeSet::without_workspace().with_timestamp(precise);

        assert_eq!(changes.timestamp().timestamp_subsec_nanos(), 123_000_000);
        assert_eq!(changes.timestamp_millis(), 1_700_000_000_123);
        assert!(changes.workspace_name().is_none());
    }

    #[test]
    fn test_changes_record_changed_nodes() {
        let changes = ChangeSet::for_workspace("ws1")
            .with_change(added("a", "/a"))
            .with_change(Change::PropertyChanged {
                key: NodeKey::new("a"),
                name: "title".to_string(),
            })
            .with_change(added("b", "/b"))
            .with_change(Change::WorkspaceAdded {
                name: "ws2".to_string(),
            });

        assert_eq!(changes.size(), 4);
        assert!(!changes.is_empty());
        let nodes: Vec<&str> = changes.changed_nodes().iter().map(NodeKey::as_str).collect();
        assert_eq!(nodes, vec!["a", "b"]);

        let kinds: Vec<Option<&NodeKey>> = (&changes).into_iter().map(Change::node_key).collect();
        assert_eq!(kinds.len(), 4);
        assert!(kinds[3].is_none());
    }

    #[test]
    fn test_equality_uses_workspace_and_timestamp_only() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let left = ChangeSet::for_workspace("ws1")
            .with_timestamp(at)
            .with_user_id("alice");
        let right = ChangeSet::for_workspace("ws1")
            .with_timestamp(at)
            .with_change(added("x", "/x"));
        let other_ws = ChangeSet::for_workspace("ws2").with_timestamp(at);
        let no_ws = ChangeSet::without_workspace().with_timestamp(at);

        assert_eq!(left, right);
        assert_ne!(left, other_ws);
        assert_ne!(left, no_ws);
        assert_eq!(no_ws, ChangeSet::without_workspace().with_timestamp(at));
    }

    #[test]
    fn test_metadata_builders() {
        let changes = ChangeSet::for_workspace("ws1")
            .with_user_id("alice")
            .with_user_data("reason", "import")
            .with_process_key("proc-1")
            .with_repository_key("repo-1")
            .with_journal_id("journal-1")
            .with_uuid("0f5a3c2e");

        assert_eq!(changes.user_id(), Some("alice"));
        assert_eq!(changes.user_data().get("reason").map(String::as_str), Some("import"));
        assert_eq!(changes.process_key(), Some("proc-1"));
        assert_eq!(changes.repository_key(), Some("repo-1"));
        assert_eq!(changes.journal_id(), Some("journal-1"));
        assert_eq!(changes.uuid(), Some("0f5a3c2e"));
    }

    #[test]
    fn test_serde_shape() {
        let changes = ChangeSet::for_workspace("ws1").with_change(Change::PropertyRemoved {
            key: NodeKey::new("n1"),
            name: "title".to_string(),
        });

        let json = serde_json::to_value(&changes).unwrap();
        assert_eq!(json["workspace_name"], "ws1");
        assert_eq!(json["changes"][0]["type"], "property_removed");
        assert_eq!(json["changed_nodes"][0], "n1");
    }

    #[test]
    fn test_deserialize_rebuilds_changed_nodes() {
        let json = serde_json::json!({
            "workspace_name": "ws1",
            "timestamp": "2024-05-01T10:00:00.123Z",
            "changed_nodes": ["stale", "other"],
            "changes": [
                { "type": "property_added", "key": "n1", "name": "title" },
                { "type": "workspace_added", "name": "drafts" }
            ],
            "user_data": { "seq": "7" }
        });

        let changes: ChangeSet = serde_json::from_value(json).unwrap();

        assert_eq!(changes.size(), 2);
        assert_eq!(
            changes.changed_nodes().iter().collect::<Vec<_>>(),
            vec![&NodeKey::new("n1")]
        );
        assert_eq!(changes.user_data()["seq"], "7");
        assert_eq!(changes.timestamp_millis() % 1000, 123);
        assert!(changes.user_id().is_none());
    }
}
