//! Request contexts for policy evaluation
//!
//! A caller assembles a [`PolicyEvaluationRequest`] from three context
//! blocks: who is asking ([`UserContext`]), what they are touching
//! ([`ResourceContext`]), and where ([`EnvironmentContext`]). All three are
//! plain serializable values; the engine never mutates them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Loosely typed attribute value carried in request contexts.
///
/// Attributes feed condition evaluation; anything that is not a string,
/// number, or boolean has no condition operator and is not representable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<f64> for AttrValue {
    fn from(n: f64) -> Self {
        AttrValue::Number(n)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// Identity making the request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserContext {
    pub id: String,
    pub username: String,
    /// Role names held by the user
    pub roles: Vec<String>,
    /// Group memberships
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, AttrValue>,
}

impl UserContext {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        UserContext {
            id: id.into(),
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn with_roles(mut self, roles: &[&str]) -> Self {
        self.roles = roles.iter().map(|r| r.to_string()).collect();
        self
    }
}

/// Resource the request targets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceContext {
    /// Resource type, e.g. `secret-reference` or `provider`
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Storage path, e.g. `kv/data/prod/database`
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, AttrValue>,
}

impl ResourceContext {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        ResourceContext {
            resource_type: resource_type.into(),
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

/// Where and when the request happens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvironmentContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub attributes: HashMap<String, AttrValue>,
}

/// Complete evaluation request: user + action + resource + environment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PolicyEvaluationRequest {
    pub user: UserContext,
    /// Action being performed, e.g. `read` or `rotate`
    pub action: String,
    pub resource: ResourceContext,
    pub environment: EnvironmentContext,
    /// Correlation id echoed back on the decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl PolicyEvaluationRequest {
    pub fn new(user: UserContext, action: impl Into<String>, resource: ResourceContext) -> Self {
        PolicyEvaluationRequest {
            user,
            action: action.into(),
            resource,
            environment: EnvironmentContext::default(),
            request_id: None,
        }
    }

    /// All namespaces the request touches (user, resource, environment)
    pub fn namespaces(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for ns in [
            self.user.namespace.as_deref(),
            self.resource.namespace.as_deref(),
            self.environment.namespace.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if !out.contains(&ns) {
                out.push(ns);
            }
        }
        out
    }

    /// Look up a context attribute by key.
    ///
    /// Keys may be qualified (`user.team`, `resource.owner`, `environment.region`);
    /// bare keys search environment, user, then resource attributes in order.
    pub fn attribute(&self, key: &str) -> Option<&AttrValue> {
        if let Some(k) = key.strip_prefix("user.") {
            return self.user.attributes.get(k);
        }
        if let Some(k) = key.strip_prefix("resource.") {
            return self.resource.attributes.get(k);
        }
        if let Some(k) = key.strip_prefix("environment.") {
            return self.environment.attributes.get(k);
        }
        self.environment
            .attributes
            .get(key)
            .or_else(|| self.user.attributes.get(key))
            .or_else(|| self.resource.attributes.get(key))
    }
}
