//! Permission action literals.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const REGISTER_NAMESPACE: &str = "register_namespace";
pub const REGISTER_TYPE: &str = "register_type";
pub const UNLOCK_ANY: &str = "unlock_any";
pub const ADD_NODE: &str = "add_node";
pub const SET_PROPERTY: &str = "set_property";
pub const REMOVE: &str = "remove";
/// Removing the children of a node, checked on the parent.
pub const REMOVE_CHILD_NODES: &str = "remove_child_nodes";
pub const READ: &str = "read";
pub const CREATE_WORKSPACE: &str = "create_workspace";
pub const DELETE_WORKSPACE: &str = "delete_workspace";
pub const INDEX_WORKSPACE: &str = "index_workspace";
pub const MONITOR: &str = "monitor";
pub const BACKUP: &str = "backup";
pub const RESTORE: &str = "restore";
pub const READ_ACCESS_CONTROL: &str = "read_access_control";
pub const MODIFY_ACCESS_CONTROL: &str = "modify_access_control";

/// Actions that modify content or structure.
pub const ALL_CHANGE_PERMISSIONS: &[&str] = &[
    REGISTER_NAMESPACE,
    REGISTER_TYPE,
    UNLOCK_ANY,
    ADD_NODE,
    SET_PROPERTY,
    REMOVE,
    CREATE_WORKSPACE,
    DELETE_WORKSPACE,
    INDEX_WORKSPACE,
    BACKUP,
    RESTORE,
];

/// The general actions. Child-node removal and access control are checked
/// separately and are not part of this list.
pub const ALL_PERMISSIONS: &[&str] = &[
    REGISTER_NAMESPACE,
    REGISTER_TYPE,
    UNLOCK_ANY,
    ADD_NODE,
    SET_PROPERTY,
    REMOVE,
    READ,
    CREATE_WORKSPACE,
    DELETE_WORKSPACE,
    INDEX_WORKSPACE,
    MONITOR,
    BACKUP,
    RESTORE,
];

/// Actions allowed on paths backed by a read-only external source.
pub const READONLY_EXTERNAL_PATH_PERMISSIONS: &[&str] = &[READ, INDEX_WORKSPACE];

/// A permission action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Permission {
    RegisterNamespace,
    RegisterType,
    UnlockAny,
    AddNode,
    SetProperty,
    Remove,
    RemoveChildNodes,
    Read,
    CreateWorkspace,
    DeleteWorkspace,
    IndexWorkspace,
    Monitor,
    Backup,
    Restore,
    ReadAccessControl,
    ModifyAccessControl,
}

impl Permission {
    /// Get the action literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::RegisterNamespace => REGISTER_NAMESPACE,
            Permission::RegisterType => REGISTER_TYPE,
            Permission::UnlockAny => UNLOCK_ANY,
            Permission::AddNode => ADD_NODE,
            Permission::SetProperty => SET_PROPERTY,
            Permission::Remove => REMOVE,
            Permission::RemoveChildNodes => REMOVE_CHILD_NODES,
            Permission::Read => READ,
            Permission::CreateWorkspace => CREATE_WORKSPACE,
            Permission::DeleteWorkspace => DELETE_WORKSPACE,
            Permission::IndexWorkspace => INDEX_WORKSPACE,
            Permission::Monitor => MONITOR,
            Permission::Backup => BACKUP,
            Permission::Restore => RESTORE,
            Permission::ReadAccessControl => READ_ACCESS_CONTROL,
            Permission::ModifyAccessControl => MODIFY_ACCESS_CONTROL,
        }
    }

    /// Check whether the action is one of [`ALL_CHANGE_PERMISSIONS`].
    pub fn is_change(&self) -> bool {
        ALL_CHANGE_PERMISSIONS.contains(&self.as_str())
    }

    /// Check whether the action is allowed on read-only external paths.
    pub fn is_allowed_on_readonly_external_path(&self) -> bool {
        READONLY_EXTERNAL_PATH_PERMISSIONS.contains(&self.as_str())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let permission = match s {
            REGISTER_NAMESPACE => Permission::RegisterNamespace,
            REGISTER_TYPE => Permission::RegisterType,
            UNLOCK_ANY => Permission::UnlockAny,
            ADD_NODE => Permission::AddNode,
            SET_PROPERTY => Permission::SetProperty,
            REMOVE => Permission::Remove,
            REMOVE_CHILD_NODES => Permission::RemoveChildNodes,
            READ => Permission::Read,
            CREATE_WORKSPACE => Permission::CreateWorkspace,
            DELETE_WORKSPACE => Permission::DeleteWorkspace,
            INDEX_WORKSPACE => Permission::IndexWorkspace,
            MONITOR => Permission::Monitor,
            BACKUP => Permission::Backup,
            RESTORE => Permission::Restore,
            READ_ACCESS_CONTROL => Permission::ReadAccessControl,
            MODIFY_ACCESS_CONTROL => Permission::ModifyAccessControl,
            other => return Err(Error::UnknownPermission(other.to_string())),
        };
        Ok(permission)
    }
}

/// Parse a comma-separated action list such as `"read,add_node"`.
///
/// Whitespace around each action is ignored, as are empty entries.
pub fn parse_actions(actions: &str) -> Result<Vec<Permission>> {
    actions
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(Permission::from_str)
        .collect()
}
