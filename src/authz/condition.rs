//! Condition evaluation for policies
//!
//! Conditions gate a policy on request context attributes:
//! - String operations (Equals, NotEquals, Like with `*` wildcard)
//! - Numeric operations (Equals, LessThan, GreaterThan and friends)
//! - Boolean equality

use crate::context::{AttrValue, PolicyEvaluationRequest};
use serde::{Deserialize, Serialize};

/// Condition operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionOperator {
    /// String equals (case-sensitive)
    StringEquals,
    /// String not equals
    StringNotEquals,
    /// String matches pattern (supports * wildcard)
    StringLike,
    /// Numeric equals
    NumericEquals,
    /// Numeric less than
    NumericLessThan,
    /// Numeric less than or equals
    NumericLessThanEquals,
    /// Numeric greater than
    NumericGreaterThan,
    /// Numeric greater than or equals
    NumericGreaterThanEquals,
    /// Boolean equals
    BoolEquals,
    /// Unrecognized operator; never matches
    #[serde(other)]
    Unknown,
}

/// A single condition on a request attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyCondition {
    /// Attribute key, optionally qualified (`user.team`, `environment.region`)
    pub key: String,
    pub operator: ConditionOperator,
    pub value: AttrValue,
}

impl PolicyCondition {
    pub fn new(key: impl Into<String>, operator: ConditionOperator, value: AttrValue) -> Self {
        PolicyCondition {
            key: key.into(),
            operator,
            value,
        }
    }

    /// Evaluate this condition against a request.
    ///
    /// A missing attribute, a type mismatch, or an unrecognized operator all
    /// evaluate to false; a condition can only ever narrow a policy.
    pub fn evaluate(&self, request: &PolicyEvaluationRequest) -> bool {
        let actual = match request.attribute(&self.key) {
            Some(v) => v,
            None => return false,
        };

        match self.operator {
            ConditionOperator::StringEquals => match (self.value.as_str(), actual.as_str()) {
                (Some(expected), Some(actual)) => expected == actual,
                _ => false,
            },
            ConditionOperator::StringNotEquals => match (self.value.as_str(), actual.as_str()) {
                (Some(expected), Some(actual)) => expected != actual,
                _ => false,
            },
            ConditionOperator::StringLike => match (self.value.as_str(), actual.as_str()) {
                (Some(pattern), Some(actual)) => string_like(pattern, actual),
                _ => false,
            },
            ConditionOperator::NumericEquals => match (self.value.as_number(), actual.as_number())
            {
                (Some(expected), Some(actual)) => (expected - actual).abs() < f64::EPSILON,
                _ => false,
            },
            ConditionOperator::NumericLessThan => {
                match (self.value.as_number(), actual.as_number()) {
                    (Some(expected), Some(actual)) => actual < expected,
                    _ => false,
                }
            }
            ConditionOperator::NumericLessThanEquals => {
                match (self.value.as_number(), actual.as_number()) {
                    (Some(expected), Some(actual)) => actual <= expected,
                    _ => false,
                }
            }
            ConditionOperator::NumericGreaterThan => {
                match (self.value.as_number(), actual.as_number()) {
                    (Some(expected), Some(actual)) => actual > expected,
                    _ => false,
                }
            }
            ConditionOperator::NumericGreaterThanEquals => {
                match (self.value.as_number(), actual.as_number()) {
                    (Some(expected), Some(actual)) => actual >= expected,
                    _ => false,
                }
            }
            ConditionOperator::BoolEquals => match (self.value.as_bool(), actual.as_bool()) {
                (Some(expected), Some(actual)) => expected == actual,
                _ => false,
            },
            ConditionOperator::Unknown => false,
        }
    }
}

/// String pattern matching with * wildcard
fn string_like(pattern: &str, text: &str) -> bool {
    if !pattern.contains('*') {
        return pattern == text;
    }

    let parts: Vec<&str> = pattern.split('*').collect();

    // Must start with first part
    if !parts[0].is_empty() && !text.starts_with(parts[0]) {
        return false;
    }

    // Must end with last part
    if !parts[parts.len() - 1].is_empty() && !text.ends_with(parts[parts.len() - 1]) {
        return false;
    }

    // Check middle parts appear in order
    let mut pos = parts[0].len();
    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        match text[pos..].find(part) {
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    true
}
