//! Role directory with system-role protection

use crate::context::UserContext;
use crate::error::{PolicyError, Result};
use crate::rbac::{Permission, Role};
use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::{debug, info};

/// Catalog of roles and permissions.
///
/// System roles and the permission catalog are seeded at construction.
/// Custom roles can be created, updated, and deleted; system roles can only
/// be read.
pub struct RbacDirectory {
    roles: RwLock<AHashMap<String, Role>>,
    permissions: AHashMap<String, Permission>,
}

impl RbacDirectory {
    /// Seed the directory with system roles and the permission catalog
    pub fn new(system_roles: Vec<Role>, permissions: Vec<Permission>) -> Self {
        let mut role_map = AHashMap::new();
        for mut role in system_roles {
            role.is_system = true;
            role_map.insert(role.id.clone(), role);
        }
        let permissions = permissions
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        RbacDirectory {
            roles: RwLock::new(role_map),
            permissions,
        }
    }

    pub fn role(&self, id: &str) -> Option<Role> {
        self.roles.read().get(id).cloned()
    }

    /// All roles, ordered by id
    pub fn roles(&self) -> Vec<Role> {
        let mut out: Vec<Role> = self.roles.read().values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    pub fn permission(&self, id: &str) -> Option<Permission> {
        self.permissions.get(id).cloned()
    }

    /// Full permission catalog, ordered by id
    pub fn permissions(&self) -> Vec<Permission> {
        let mut out: Vec<Permission> = self.permissions.values().cloned().collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// Create a custom role. The system flag is stripped: system roles
    /// exist only through seeding.
    pub fn create_role(&self, mut role: Role) -> Result<Role> {
        let mut roles = self.roles.write();
        if roles.contains_key(&role.id) {
            return Err(PolicyError::RoleExists(role.id));
        }
        role.is_system = false;
        roles.insert(role.id.clone(), role.clone());
        info!(role = %role.id, "role created");
        Ok(role)
    }

    /// Replace a custom role's definition
    pub fn update_role(&self, mut role: Role) -> Result<Role> {
        let mut roles = self.roles.write();
        let existing = roles
            .get(&role.id)
            .ok_or_else(|| PolicyError::RoleNotFound(role.id.clone()))?;
        if existing.is_system {
            return Err(PolicyError::SystemRoleImmutable(role.id));
        }
        role.is_system = false;
        roles.insert(role.id.clone(), role.clone());
        info!(role = %role.id, "role updated");
        Ok(role)
    }

    /// Delete a custom role. System roles always refuse; a second delete of
    /// the same custom role is a not-found error.
    pub fn delete_role(&self, id: &str) -> Result<()> {
        let mut roles = self.roles.write();
        let role = roles
            .get(id)
            .ok_or_else(|| PolicyError::RoleNotFound(id.to_string()))?;
        if role.is_system {
            return Err(PolicyError::SystemRoleImmutable(id.to_string()));
        }
        roles.remove(id);
        info!(role = id, "role deleted");
        Ok(())
    }

    /// Whether the user holds the role, by id or name. Default roles are
    /// held by every user.
    pub fn user_has_role(&self, user: &UserContext, role_id: &str) -> bool {
        let roles = self.roles.read();
        if let Some(role) = roles.get(role_id) {
            if role.is_default {
                return true;
            }
            return user
                .roles
                .iter()
                .any(|r| r == &role.id || r == &role.name);
        }
        user.roles.iter().any(|r| r == role_id)
    }

    /// Resolve a role's permission ids to catalog entries. Ids missing
    /// from the catalog are skipped.
    pub fn permissions_for_role(&self, role_id: &str) -> Result<Vec<Permission>> {
        let role = self
            .role(role_id)
            .ok_or_else(|| PolicyError::RoleNotFound(role_id.to_string()))?;
        let mut out = Vec::with_capacity(role.permissions.len());
        for pid in &role.permissions {
            match self.permissions.get(pid) {
                Some(p) => out.push(p.clone()),
                None => debug!(role = role_id, permission = %pid, "unknown permission id skipped"),
            }
        }
        Ok(out)
    }

    /// Roles in a metadata category, ordered by id
    pub fn roles_by_category(&self, category: &str) -> Vec<Role> {
        let mut out: Vec<Role> = self
            .roles
            .read()
            .values()
            .filter(|r| r.metadata.category.as_deref() == Some(category))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }
}
