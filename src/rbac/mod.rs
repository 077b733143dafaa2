//! Role and permission catalog
//!
//! Read-only toward the evaluator; administrators manage custom roles
//! through [`RbacDirectory`], which refuses to touch system roles.

mod directory;

pub use directory::RbacDirectory;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Scope a permission applies to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionScope {
    Global,
    /// Scoped to a namespace or project
    Scoped(String),
}

impl Default for PermissionScope {
    fn default() -> Self {
        PermissionScope::Global
    }
}

/// Read-only catalog entry naming one grantable action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub id: String,
    /// `resource:action` convention, e.g. `secret-reference:read`
    pub name: String,
    pub resource_type: String,
    pub action: String,
    #[serde(default)]
    pub scope: PermissionScope,
}

impl Permission {
    pub fn new(
        id: impl Into<String>,
        resource_type: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        let resource_type = resource_type.into();
        let action = action.into();
        Permission {
            id: id.into(),
            name: format!("{resource_type}:{action}"),
            resource_type,
            action,
            scope: PermissionScope::Global,
        }
    }
}

/// Classification metadata on a role
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub priority: i64,
    pub tags: Vec<String>,
    pub labels: HashMap<String, String>,
}

/// A named permission bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: String,
    /// Unique name
    pub name: String,
    pub display_name: String,
    /// Ordered permission ids
    pub permissions: Vec<String>,
    /// Seeded at startup, never deleted
    #[serde(default)]
    pub is_system: bool,
    /// Held implicitly by every user
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub metadata: RoleMetadata,
}

impl Role {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Role {
            id: id.into(),
            display_name: name.clone(),
            name,
            permissions: Vec::new(),
            is_system: false,
            is_default: false,
            metadata: RoleMetadata::default(),
        }
    }

    pub fn system(id: impl Into<String>, name: impl Into<String>) -> Self {
        let mut role = Self::new(id, name);
        role.is_system = true;
        role
    }

    pub fn with_permissions(mut self, permissions: &[&str]) -> Self {
        self.permissions = permissions.iter().map(|p| p.to_string()).collect();
        self
    }
}
