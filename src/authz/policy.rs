//! Policy document structure
//!
//! A policy is a named allow/deny rule bundle with targets, priority, and an
//! ordered rule list. Policies are plain serializable values: every mutation
//! goes through the lifecycle wrappers and produces a fresh value plus a
//! version record, so a `Policy` handed to a caller is never shared state.

use crate::authz::condition::PolicyCondition;
use crate::error::{PolicyError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Effect a policy asserts when it matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    /// Takes precedence over Allow
    Deny,
}

/// Lifecycle status of a policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyStatus {
    /// Considered during evaluation
    Active,
    Inactive,
    Draft,
}

/// Request field a rule selects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Role,
    Group,
    Namespace,
    Resource,
    Action,
    Provider,
    Environment,
    /// Unrecognized kind; never matches
    #[serde(other)]
    Unknown,
}

/// Comparison a rule applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleOperator {
    Equals,
    In,
    /// Unrecognized operator; never matches
    #[serde(other)]
    Unknown,
}

/// Scalar or set rule value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    One(String),
    Many(Vec<String>),
}

impl RuleValue {
    pub fn one(value: impl Into<String>) -> Self {
        RuleValue::One(value.into())
    }

    pub fn many(values: &[&str]) -> Self {
        RuleValue::Many(values.iter().map(|v| v.to_string()).collect())
    }

    /// Members of the value, treating a scalar as a one-element set
    pub fn members(&self) -> &[String] {
        match self {
            RuleValue::One(v) => std::slice::from_ref(v),
            RuleValue::Many(vs) => vs,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            RuleValue::One(v) => v.is_empty(),
            RuleValue::Many(vs) => vs.is_empty(),
        }
    }
}

/// Atomic predicate evaluated against a request context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub operator: RuleOperator,
    pub value: RuleValue,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        kind: RuleKind,
        operator: RuleOperator,
        value: RuleValue,
    ) -> Self {
        Rule {
            id: id.into(),
            kind,
            operator,
            value,
        }
    }
}

/// Scope a policy applies to.
///
/// Every present (non-empty) dimension must match the request; empty
/// dimensions are unconstrained. `"*"` is accepted as a wildcard member in
/// the membership dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyTargets {
    /// Resource ids or names, or `"*"` for all
    pub resources: Vec<String>,
    pub actions: Vec<String>,
    /// Path prefixes, e.g. `kv/data/prod/`
    pub path_prefixes: Vec<String>,
    /// Resource type names
    pub target_types: Vec<String>,
    pub providers: Vec<String>,
    pub namespaces: Vec<String>,
    pub projects: Vec<String>,
}

impl PolicyTargets {
    /// Targets every resource
    pub fn any() -> Self {
        PolicyTargets {
            resources: vec!["*".to_string()],
            ..Default::default()
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.resources.iter().all(|r| r == "*")
            && self.actions.is_empty()
            && self.path_prefixes.is_empty()
            && self.target_types.is_empty()
            && self.providers.is_empty()
            && self.namespaces.is_empty()
            && self.projects.is_empty()
    }
}

/// Classification metadata attached to a policy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub compliance: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
}

/// Complete policy document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub effect: Effect,
    /// Higher priority wins when reporting the primary reason
    #[serde(default)]
    pub priority: i64,
    pub status: PolicyStatus,
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub targets: PolicyTargets,
    #[serde(default)]
    pub conditions: Vec<PolicyCondition>,
    #[serde(default)]
    pub metadata: PolicyMetadata,
    /// Monotonic content version; always equals the newest version record
    #[serde(default = "initial_version")]
    pub version: u32,
}

fn initial_version() -> u32 {
    1
}

impl Policy {
    /// Pattern for valid kebab-case policy ids
    const ID_PATTERN: &'static str = r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$";

    /// Maximum id length
    const MAX_ID_LENGTH: usize = 128;

    /// Create a new active policy targeting everything
    pub fn new(id: impl Into<String>, name: impl Into<String>, effect: Effect) -> Self {
        Policy {
            id: id.into(),
            name: name.into(),
            description: None,
            effect,
            priority: 0,
            status: PolicyStatus::Active,
            rules: Vec::new(),
            targets: PolicyTargets::any(),
            conditions: Vec::new(),
            metadata: PolicyMetadata::default(),
            version: 1,
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_status(mut self, status: PolicyStatus) -> Self {
        self.status = status;
        self
    }

    /// Add a rule to this policy
    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Parse policy from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize policy to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate lifecycle input before any version is recorded.
    ///
    /// # Rules
    /// - id must be kebab-case: lowercase letters, numbers, hyphens
    /// - name must be non-empty
    /// - `targets.resources` must name at least one resource (`"*"` for all)
    /// - every rule must carry a non-empty value
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(PolicyError::Validation("policy id cannot be empty".into()));
        }
        if self.id.len() > Self::MAX_ID_LENGTH {
            return Err(PolicyError::Validation(format!(
                "policy id too long (max {} characters)",
                Self::MAX_ID_LENGTH
            )));
        }
        let re = Regex::new(Self::ID_PATTERN).unwrap();
        if !re.is_match(&self.id) {
            return Err(PolicyError::Validation(format!(
                "policy id '{}' must be kebab-case: lowercase letters, numbers, and hyphens only",
                self.id
            )));
        }
        if self.name.trim().is_empty() {
            return Err(PolicyError::Validation(
                "policy name cannot be empty".into(),
            ));
        }
        if self.targets.resources.is_empty() {
            return Err(PolicyError::Validation(format!(
                "policy '{}' must target at least one resource (use \"*\" for all)",
                self.id
            )));
        }
        for rule in &self.rules {
            if rule.value.is_empty() {
                return Err(PolicyError::Validation(format!(
                    "rule '{}' in policy '{}' has an empty value",
                    rule.id, self.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_creation() {
        let policy = Policy::new("allow-admins", "Admin access", Effect::Allow);
        assert_eq!(policy.version, 1);
        assert_eq!(policy.status, PolicyStatus::Active);
        assert!(policy.rules.is_empty());
        assert!(policy.targets.is_unbounded());
    }

    #[test]
    fn test_policy_json_roundtrip() {
        let mut policy = Policy::new("deny-prod", "Deny prod paths", Effect::Deny)
            .with_priority(200);
        policy.targets.path_prefixes = vec!["kv/data/prod/".to_string()];
        policy.add_rule(Rule::new(
            "r1",
            RuleKind::Role,
            RuleOperator::In,
            RuleValue::many(&["developer", "data-scientist"]),
        ));

        let json = policy.to_json().unwrap();
        let parsed = Policy::from_json(&json).unwrap();
        assert_eq!(parsed, policy);
        assert!(json.contains("\"pathPrefixes\""));
    }

    #[test]
    fn test_unknown_rule_kind_deserializes() {
        let json = r#"{"id":"r1","type":"moon-phase","operator":"equals","value":"full"}"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.kind, RuleKind::Unknown);

        let json = r#"{"id":"r2","type":"role","operator":"fuzzy","value":"dev"}"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.operator, RuleOperator::Unknown);
    }

    #[test]
    fn test_rule_value_members() {
        assert_eq!(RuleValue::one("a").members(), &["a".to_string()]);
        assert_eq!(
            RuleValue::many(&["a", "b"]).members(),
            &["a".to_string(), "b".to_string()]
        );
        assert!(RuleValue::Many(vec![]).is_empty());
    }

    #[test]
    fn test_policy_validation() {
        let policy = Policy::new("valid-id", "Valid", Effect::Allow);
        assert!(policy.validate().is_ok());

        let policy = Policy::new("Bad_Id", "Bad id", Effect::Allow);
        assert!(policy.validate().is_err());

        let mut policy = Policy::new("no-resources", "No resources", Effect::Allow);
        policy.targets.resources.clear();
        assert!(policy.validate().is_err());

        let mut policy = Policy::new("empty-rule", "Empty rule", Effect::Allow);
        policy.add_rule(Rule::new(
            "r1",
            RuleKind::Role,
            RuleOperator::In,
            RuleValue::Many(vec![]),
        ));
        assert!(policy.validate().is_err());
    }
}
