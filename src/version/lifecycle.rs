//! Policy lifecycle with versioning
//!
//! Every mutation of a live policy records exactly one version. A mutation
//! whose version record cannot be written is rolled back and reported as a
//! consistency failure; the live set and the history are never allowed to
//! drift apart silently.
//!
//! The wrappers are dependency-injected over the two storage seams; nothing
//! here owns ambient global state.

use crate::authz::{Policy, PolicyStatus};
use crate::error::{PolicyError, Result};
use crate::store::PolicyStore;
use crate::version::{ChangeType, PolicyVersion, VersionMetadata, VersionStore};
use std::sync::Arc;
use tracing::{debug, info};

/// Versioned mutation wrappers over the policy and version stores
pub struct PolicyLifecycle {
    policies: Arc<dyn PolicyStore>,
    versions: Arc<dyn VersionStore>,
}

impl PolicyLifecycle {
    pub fn new(policies: Arc<dyn PolicyStore>, versions: Arc<dyn VersionStore>) -> Self {
        PolicyLifecycle { policies, versions }
    }

    /// The underlying version store, for history/audit/compare queries
    pub fn versions(&self) -> &Arc<dyn VersionStore> {
        &self.versions
    }

    /// The underlying policy store
    pub fn policies(&self) -> &Arc<dyn PolicyStore> {
        &self.policies
    }

    /// Create a policy and record its first version.
    ///
    /// Rejects malformed input and duplicate ids before anything is written.
    /// If the id carries deleted history, numbering continues from it.
    pub fn create(&self, policy: Policy, actor: &str) -> Result<Policy> {
        policy.validate()?;
        if self.policies.get(&policy.id)?.is_some() {
            return Err(PolicyError::PolicyExists(policy.id));
        }

        debug!(policy = %policy.id, actor, "creating policy");
        self.policies.put(policy.clone())?;

        match self.versions.create_version(
            &policy.id,
            policy.clone(),
            "Policy created",
            ChangeType::Created,
            actor,
            VersionMetadata::default(),
        ) {
            Ok(record) => {
                let live = self.reconcile(&policy, record)?;
                info!(policy = %live.id, version = live.version, "policy created");
                Ok(live)
            }
            Err(e) => {
                let _ = self.policies.remove(&policy.id);
                Err(PolicyError::Consistency(format!(
                    "policy {} created but no version recorded: {e}",
                    policy.id
                )))
            }
        }
    }

    /// Replace a policy's content and record an `updated` version
    pub fn update(&self, policy: Policy, change_summary: &str, actor: &str) -> Result<Policy> {
        policy.validate()?;
        let current = self
            .policies
            .get(&policy.id)?
            .ok_or_else(|| PolicyError::PolicyNotFound(policy.id.clone()))?;

        let mut next = policy;
        next.version = current.version + 1;

        debug!(policy = %next.id, actor, "updating policy");
        self.policies.put(next.clone())?;

        match self.versions.create_version(
            &next.id,
            next.clone(),
            change_summary,
            ChangeType::Updated,
            actor,
            VersionMetadata::default(),
        ) {
            Ok(record) => {
                let live = self.reconcile(&next, record)?;
                info!(policy = %live.id, version = live.version, "policy updated");
                Ok(live)
            }
            Err(e) => {
                let _ = self.policies.put(current);
                Err(PolicyError::Consistency(format!(
                    "policy {} updated but no version recorded: {e}",
                    next.id
                )))
            }
        }
    }

    /// Remove a policy and record a `deleted` version of its final content
    pub fn delete(&self, id: &str, actor: &str) -> Result<PolicyVersion> {
        let removed = self
            .policies
            .remove(id)?
            .ok_or_else(|| PolicyError::PolicyNotFound(id.to_string()))?;

        debug!(policy = id, actor, "deleting policy");
        match self.versions.create_version(
            id,
            removed.clone(),
            "Policy deleted",
            ChangeType::Deleted,
            actor,
            VersionMetadata::default(),
        ) {
            Ok(record) => {
                info!(policy = id, version = record.version, "policy deleted");
                Ok(record)
            }
            Err(e) => {
                let _ = self.policies.put(removed);
                Err(PolicyError::Consistency(format!(
                    "policy {id} deleted but no version recorded: {e}"
                )))
            }
        }
    }

    /// Restore a policy to the content of an earlier version.
    ///
    /// This appends a new `updated` version whose content equals the
    /// restored snapshot; the restored-from record itself is untouched and
    /// the live version number keeps ascending.
    pub fn restore(
        &self,
        id: &str,
        version: u32,
        reason: &str,
        actor: &str,
        metadata: VersionMetadata,
    ) -> Result<Policy> {
        let current = self
            .policies
            .get(id)?
            .ok_or_else(|| PolicyError::PolicyNotFound(id.to_string()))?;
        let snapshot = self.versions.version(id, version).ok_or_else(|| {
            let max = self.versions.latest(id).map(|v| v.version).unwrap_or(0);
            PolicyError::VersionOutOfRange {
                policy_id: id.to_string(),
                version,
                max,
            }
        })?;

        let mut content = snapshot.content;
        content.version = current.version + 1;
        let summary = format!("Restored from version {version}: {reason}");

        debug!(policy = id, from_version = version, actor, "restoring policy");
        self.policies.put(content.clone())?;

        match self.versions.create_version(
            id,
            content.clone(),
            &summary,
            ChangeType::Updated,
            actor,
            metadata,
        ) {
            Ok(record) => {
                let live = self.reconcile(&content, record)?;
                info!(policy = id, version = live.version, "policy restored");
                Ok(live)
            }
            Err(e) => {
                let _ = self.policies.put(current);
                Err(PolicyError::Consistency(format!(
                    "policy {id} restored but no version recorded: {e}"
                )))
            }
        }
    }

    /// Change a policy's status, recording `activated` or `deactivated`.
    ///
    /// A no-op status change returns the current policy without recording
    /// anything.
    pub fn set_status(&self, id: &str, status: PolicyStatus, actor: &str) -> Result<Policy> {
        let current = self
            .policies
            .get(id)?
            .ok_or_else(|| PolicyError::PolicyNotFound(id.to_string()))?;
        if current.status == status {
            debug!(policy = id, ?status, "status unchanged, nothing recorded");
            return Ok(current);
        }

        let (change_type, summary) = match status {
            PolicyStatus::Active => (ChangeType::Activated, "Policy activated"),
            PolicyStatus::Inactive => (ChangeType::Deactivated, "Policy deactivated"),
            PolicyStatus::Draft => (ChangeType::Updated, "Policy moved to draft"),
        };

        let mut next = current.clone();
        next.status = status;
        next.version = current.version + 1;

        self.policies.put(next.clone())?;
        match self.versions.create_version(
            id,
            next.clone(),
            summary,
            change_type,
            actor,
            VersionMetadata::default(),
        ) {
            Ok(record) => {
                let live = self.reconcile(&next, record)?;
                info!(policy = id, ?status, version = live.version, "policy status changed");
                Ok(live)
            }
            Err(e) => {
                let _ = self.policies.put(current);
                Err(PolicyError::Consistency(format!(
                    "policy {id} status changed but no version recorded: {e}"
                )))
            }
        }
    }

    /// Re-put the live policy when the store assigned a different number
    /// than the provisional one (an id with deleted history, or a racing
    /// writer). The store-assigned record is authoritative.
    fn reconcile(&self, provisional: &Policy, record: PolicyVersion) -> Result<Policy> {
        if record.version != provisional.version {
            self.policies.put(record.content.clone())?;
        }
        Ok(record.content)
    }
}
