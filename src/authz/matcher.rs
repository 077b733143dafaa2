//! Rule and target matching
//!
//! Matching is fail-closed throughout: a rule with an unrecognized kind or
//! operator matches nothing, so a malformed rule can never widen access.
//!
//! Path comparisons are leading-slash insensitive (`/kv/data` and `kv/data`
//! are the same path).

use crate::authz::policy::{Policy, PolicyStatus, PolicyTargets, Rule, RuleKind, RuleOperator};
use crate::context::PolicyEvaluationRequest;

/// Matcher for rules and policy targets
pub struct RuleMatcher;

impl RuleMatcher {
    /// Check whether a single rule matches the request.
    ///
    /// - `equals`: every rule value member must be present in the request's
    ///   type-selected field (membership-aware for set-valued fields such as
    ///   roles; plain equality for scalar fields).
    /// - `in`: at least one field value must be a member of the rule's value
    ///   set; for the path-like `resource` kind a rule value that is a string
    ///   prefix of the resource path also matches.
    pub fn matches(rule: &Rule, request: &PolicyEvaluationRequest) -> bool {
        let (field, path_like) = match Self::field_values(rule.kind, request) {
            Some(v) => v,
            None => return false,
        };
        let members = rule.value.members();
        if members.is_empty() {
            return false;
        }

        match rule.operator {
            RuleOperator::Equals => members.iter().all(|m| field.iter().any(|f| f == m)),
            RuleOperator::In => field.iter().any(|f| {
                members.iter().any(|m| {
                    if f == m {
                        return true;
                    }
                    path_like && normalize(f).starts_with(&normalize(m))
                })
            }),
            RuleOperator::Unknown => false,
        }
    }

    /// Check whether all present target dimensions match the request
    pub fn targets_match(targets: &PolicyTargets, request: &PolicyEvaluationRequest) -> bool {
        let resource = &request.resource;

        if !targets.resources.is_empty() {
            let hit = targets.resources.iter().any(|r| {
                r == "*" || *r == resource.id || (!resource.name.is_empty() && *r == resource.name)
            });
            if !hit {
                return false;
            }
        }

        if !targets.actions.is_empty()
            && !targets
                .actions
                .iter()
                .any(|a| a == "*" || *a == request.action)
        {
            return false;
        }

        if !targets.path_prefixes.is_empty() {
            let path = normalize(&resource.path);
            if !targets
                .path_prefixes
                .iter()
                .any(|p| path.starts_with(&normalize(p)))
            {
                return false;
            }
        }

        if !targets.target_types.is_empty()
            && !targets
                .target_types
                .iter()
                .any(|t| t == "*" || *t == resource.resource_type)
        {
            return false;
        }

        if !targets.providers.is_empty() {
            match resource.provider.as_deref() {
                Some(provider) => {
                    if !targets.providers.iter().any(|p| p == "*" || p == provider) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        if !targets.namespaces.is_empty() {
            let namespaces = request.namespaces();
            if !targets
                .namespaces
                .iter()
                .any(|n| n == "*" || namespaces.contains(&n.as_str()))
            {
                return false;
            }
        }

        if !targets.projects.is_empty() {
            let project = request.attribute("project").and_then(|v| v.as_str());
            match project {
                Some(project) => {
                    if !targets.projects.iter().any(|p| p == "*" || p == project) {
                        return false;
                    }
                }
                None => return false,
            }
        }

        true
    }

    /// Coarse pre-filter on the resource-type and action dimensions only.
    ///
    /// Used to cheaply narrow the candidate set before full matching.
    pub fn could_apply(policy: &Policy, request: &PolicyEvaluationRequest) -> bool {
        let targets = &policy.targets;
        let type_ok = targets.target_types.is_empty()
            || targets
                .target_types
                .iter()
                .any(|t| t == "*" || *t == request.resource.resource_type);
        let action_ok = targets.actions.is_empty()
            || targets
                .actions
                .iter()
                .any(|a| a == "*" || *a == request.action);
        type_ok && action_ok
    }

    /// Full policy match: active status is NOT checked here, only targets,
    /// rules, and conditions. A policy with no rules target-matches only.
    pub fn policy_matches(policy: &Policy, request: &PolicyEvaluationRequest) -> bool {
        Self::targets_match(&policy.targets, request)
            && policy.rules.iter().all(|r| Self::matches(r, request))
            && policy.conditions.iter().all(|c| c.evaluate(request))
    }

    /// Active policies surviving the coarse pre-filter
    pub fn candidates<'a>(
        policies: &'a [Policy],
        request: &PolicyEvaluationRequest,
    ) -> Vec<&'a Policy> {
        policies
            .iter()
            .filter(|p| p.status == PolicyStatus::Active && Self::could_apply(p, request))
            .collect()
    }

    fn field_values(
        kind: RuleKind,
        request: &PolicyEvaluationRequest,
    ) -> Option<(Vec<&str>, bool)> {
        match kind {
            RuleKind::Role => Some((request.user.roles.iter().map(String::as_str).collect(), false)),
            RuleKind::Group => Some((
                request.user.groups.iter().map(String::as_str).collect(),
                false,
            )),
            RuleKind::Namespace => Some((request.namespaces(), false)),
            RuleKind::Resource => {
                let r = &request.resource;
                let mut values = Vec::new();
                for v in [r.id.as_str(), r.name.as_str(), r.path.as_str()] {
                    if !v.is_empty() && !values.contains(&v) {
                        values.push(v);
                    }
                }
                Some((values, true))
            }
            RuleKind::Action => Some((vec![request.action.as_str()], false)),
            RuleKind::Provider => request
                .resource
                .provider
                .as_deref()
                .map(|p| (vec![p], false)),
            RuleKind::Environment => request
                .environment
                .environment
                .as_deref()
                .map(|e| (vec![e], false)),
            RuleKind::Unknown => None,
        }
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}
