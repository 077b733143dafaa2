//! Field-level diff between policy snapshots
//!
//! Snapshots are flattened to their top-level JSON attributes and compared
//! key by key. The `version` field is excluded: it differs between any two
//! versions by construction and would only add noise.

use crate::error::Result;
use crate::version::PolicyVersion;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a field differs between two versions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldChangeType {
    Added,
    Removed,
    Modified,
}

/// One changed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub field: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<Value>,
    #[serde(rename = "type")]
    pub change_type: FieldChangeType,
}

/// Complete diff between two versions of one policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionDiff {
    pub policy_id: String,
    pub from_version: u32,
    pub to_version: u32,
    pub changes: Vec<FieldChange>,
    pub summary: String,
}

pub(crate) fn diff_versions(older: &PolicyVersion, newer: &PolicyVersion) -> Result<VersionDiff> {
    let old_fields = flatten(&older.content)?;
    let new_fields = flatten(&newer.content)?;

    let mut keys: Vec<&String> = old_fields.keys().chain(new_fields.keys()).collect();
    keys.sort();
    keys.dedup();

    let mut changes = Vec::new();
    for key in keys {
        if key == "version" {
            continue;
        }
        let old_value = old_fields.get(key).filter(|v| !v.is_null());
        let new_value = new_fields.get(key).filter(|v| !v.is_null());
        let change_type = match (old_value, new_value) {
            (None, Some(_)) => FieldChangeType::Added,
            (Some(_), None) => FieldChangeType::Removed,
            (Some(old), Some(new)) if old != new => FieldChangeType::Modified,
            _ => continue,
        };
        changes.push(FieldChange {
            field: key.clone(),
            old_value: old_value.cloned(),
            new_value: new_value.cloned(),
            change_type,
        });
    }

    let summary = if changes.is_empty() {
        format!(
            "no changes between versions {} and {}",
            older.version, newer.version
        )
    } else {
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        format!(
            "{} field(s) changed between versions {} and {}: {}",
            changes.len(),
            older.version,
            newer.version,
            fields.join(", ")
        )
    };

    Ok(VersionDiff {
        policy_id: older.policy_id.clone(),
        from_version: older.version,
        to_version: newer.version,
        changes,
        summary,
    })
}

fn flatten(content: &crate::authz::Policy) -> Result<Map<String, Value>> {
    match serde_json::to_value(content)? {
        Value::Object(map) => Ok(map),
        // A Policy always serializes to an object
        _ => Ok(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::{Effect, Policy};
    use crate::version::{ChangeType, VersionMetadata};
    use chrono::Utc;

    fn version_of(policy: Policy, n: u32) -> PolicyVersion {
        PolicyVersion {
            id: format!("{}-v{}", policy.id, n),
            policy_id: policy.id.clone(),
            version: n,
            content: policy,
            change_summary: String::new(),
            change_type: ChangeType::Updated,
            created_by: "tester".to_string(),
            created_at: Utc::now(),
            metadata: VersionMetadata::default(),
        }
    }

    #[test]
    fn test_modified_fields() {
        let p1 = Policy::new("p1", "Original", Effect::Allow).with_priority(10);
        let p2 = Policy::new("p1", "Renamed", Effect::Deny).with_priority(10);

        let diff = diff_versions(&version_of(p1, 1), &version_of(p2, 2)).unwrap();
        let fields: Vec<&str> = diff.changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["effect", "name"]);
        assert!(diff
            .changes
            .iter()
            .all(|c| c.change_type == FieldChangeType::Modified));
        assert!(diff.summary.contains("2 field(s) changed"));
    }

    #[test]
    fn test_added_and_removed_fields() {
        let p1 = Policy::new("p1", "Policy", Effect::Allow);
        let mut p2 = p1.clone();
        p2.description = Some("now documented".to_string());

        let diff = diff_versions(&version_of(p1.clone(), 1), &version_of(p2.clone(), 2)).unwrap();
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].field, "description");
        assert_eq!(diff.changes[0].change_type, FieldChangeType::Added);

        let diff = diff_versions(&version_of(p2, 2), &version_of(p1, 3)).unwrap();
        assert_eq!(diff.changes[0].change_type, FieldChangeType::Removed);
    }

    #[test]
    fn test_version_field_excluded() {
        let p = Policy::new("p1", "Policy", Effect::Allow);
        let mut later = p.clone();
        later.version = 5;

        let diff = diff_versions(&version_of(p, 1), &version_of(later, 5)).unwrap();
        assert!(diff.changes.is_empty());
        assert!(diff.summary.contains("no changes"));
    }

    #[test]
    fn test_rule_changes_surface_as_modified() {
        use crate::authz::{Rule, RuleKind, RuleOperator, RuleValue};

        let p1 = Policy::new("p1", "Policy", Effect::Deny);
        let mut p2 = p1.clone();
        p2.add_rule(Rule::new(
            "r1",
            RuleKind::Role,
            RuleOperator::In,
            RuleValue::many(&["developer"]),
        ));

        let diff = diff_versions(&version_of(p1, 1), &version_of(p2, 2)).unwrap();
        assert_eq!(diff.changes.len(), 1);
        assert_eq!(diff.changes[0].field, "rules");
        assert_eq!(diff.changes[0].change_type, FieldChangeType::Modified);
    }
}
