//! Policy version store and audit trail
//!
//! Every change to a policy is captured as an immutable [`PolicyVersion`]
//! in a per-policy, append-only, gap-free chain starting at version 1.
//! The [`VersionStore`] trait is the persistence seam: the in-memory
//! implementation here is the default, and a durable backend keyed by
//! `(policy_id, version)` with a uniqueness constraint satisfies the same
//! contract without touching the evaluator.

mod diff;
mod lifecycle;
mod memory;

pub use diff::{FieldChange, FieldChangeType, VersionDiff};
pub use lifecycle::PolicyLifecycle;
pub use memory::InMemoryVersionStore;

use crate::authz::Policy;
use crate::error::{PolicyError, Result};
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of change a version records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
    Activated,
    Deactivated,
}

/// Review metadata attached to a version record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VersionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    pub requires_review: bool,
    pub approvers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Immutable snapshot of a policy at one point in its history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVersion {
    pub id: String,
    pub policy_id: String,
    /// Per-policy version number; gap-free ascending from 1
    pub version: u32,
    /// Full policy content at this version
    pub content: Policy,
    pub change_summary: String,
    pub change_type: ChangeType,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: VersionMetadata,
}

/// Ordering for history queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOrder {
    /// Presentation default
    NewestFirst,
    /// For diff and restore logic
    OldestFirst,
}

/// Audit trail filter: date range plus change-type set
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Empty means all change types
    pub change_types: Vec<ChangeType>,
}

impl AuditFilter {
    pub fn accepts(&self, version: &PolicyVersion) -> bool {
        if let Some(from) = self.from {
            if version.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if version.created_at > to {
                return false;
            }
        }
        self.change_types.is_empty() || self.change_types.contains(&version.change_type)
    }
}

/// Aggregate change statistics for one policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStats {
    pub total_versions: usize,
    pub by_change_type: HashMap<ChangeType, usize>,
    /// Changes per calendar month across the stored span; 0 with fewer
    /// than two versions
    pub avg_changes_per_month: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Most frequent author, ties resolved by first appearance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_contributor: Option<String>,
}

/// Append-only version storage
pub trait VersionStore: Send + Sync {
    /// Append a new version for the policy.
    ///
    /// Assigns the next version number (`count + 1`), stamps it into the
    /// snapshot's `version` field, and appends, all atomically with respect
    /// to other writers of the same policy id. Writers of different ids do
    /// not contend.
    fn create_version(
        &self,
        policy_id: &str,
        snapshot: Policy,
        change_summary: &str,
        change_type: ChangeType,
        created_by: &str,
        metadata: VersionMetadata,
    ) -> Result<PolicyVersion>;

    /// All versions for a policy in the requested order
    fn history(&self, policy_id: &str, order: HistoryOrder) -> Vec<PolicyVersion>;

    /// A specific version, if stored
    fn version(&self, policy_id: &str, version: u32) -> Option<PolicyVersion>;

    /// Newest version, if any
    fn latest(&self, policy_id: &str) -> Option<PolicyVersion> {
        self.history(policy_id, HistoryOrder::NewestFirst)
            .into_iter()
            .next()
    }

    /// Versions passing the filter, newest first
    fn audit_trail(&self, policy_id: &str, filter: &AuditFilter) -> Vec<PolicyVersion> {
        self.history(policy_id, HistoryOrder::NewestFirst)
            .into_iter()
            .filter(|v| filter.accepts(v))
            .collect()
    }

    /// Change statistics across the stored history
    fn stats(&self, policy_id: &str) -> ChangeStats {
        let history = self.history(policy_id, HistoryOrder::OldestFirst);
        let total_versions = history.len();

        let mut by_change_type = HashMap::new();
        for v in &history {
            *by_change_type.entry(v.change_type).or_insert(0) += 1;
        }

        let avg_changes_per_month = match (history.first(), history.last()) {
            (Some(first), Some(last)) if total_versions >= 2 => {
                let months = (last.created_at.year() - first.created_at.year()) * 12
                    + (last.created_at.month() as i32 - first.created_at.month() as i32)
                    + 1;
                total_versions as f64 / months.max(1) as f64
            }
            _ => 0.0,
        };

        let mut contributors: Vec<(String, usize)> = Vec::new();
        for v in &history {
            match contributors.iter_mut().find(|(name, _)| name == &v.created_by) {
                Some((_, count)) => *count += 1,
                None => contributors.push((v.created_by.clone(), 1)),
            }
        }
        // Strict comparison keeps the first-seen contributor on ties
        let mut top_contributor: Option<(String, usize)> = None;
        for (name, count) in contributors {
            if top_contributor.as_ref().map_or(true, |(_, c)| count > *c) {
                top_contributor = Some((name, count));
            }
        }

        ChangeStats {
            total_versions,
            by_change_type,
            avg_changes_per_month,
            last_modified: history.last().map(|v| v.created_at),
            top_contributor: top_contributor.map(|(name, _)| name),
        }
    }

    /// Field-level diff between two stored versions
    fn compare(&self, policy_id: &str, v1: u32, v2: u32) -> Result<VersionDiff> {
        let max = self.latest(policy_id).map(|v| v.version).unwrap_or(0);
        let older = self
            .version(policy_id, v1)
            .ok_or_else(|| PolicyError::VersionOutOfRange {
                policy_id: policy_id.to_string(),
                version: v1,
                max,
            })?;
        let newer = self
            .version(policy_id, v2)
            .ok_or_else(|| PolicyError::VersionOutOfRange {
                policy_id: policy_id.to_string(),
                version: v2,
                max,
            })?;
        diff::diff_versions(&older, &newer)
    }
}
