//! Policy evaluation engine with deny precedence
//!
//! Evaluates a request against a snapshot of the active policy set.
//! Key properties:
//! - Explicit deny takes precedence over allow
//! - Deterministic: identical request + snapshot always yields an identical
//!   decision (ties between matching policies break on priority, then id)
//! - Side-effect free: no mutation, no I/O, safe from any number of threads
//!
//! The evaluator is constructed explicitly from a policy snapshot supplied
//! by the caller; there is no ambient global policy state.

use crate::authz::cache::DecisionCache;
use crate::authz::matcher::RuleMatcher;
use crate::authz::policy::{Effect, Policy};
use crate::context::PolicyEvaluationRequest;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A policy that participated in a decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedPolicy {
    pub id: String,
    pub name: String,
    pub effect: Effect,
    pub priority: i64,
}

impl From<&Policy> for AppliedPolicy {
    fn from(policy: &Policy) -> Self {
        AppliedPolicy {
            id: policy.id.clone(),
            name: policy.name.clone(),
            effect: policy.effect,
            priority: policy.priority,
        }
    }
}

/// Outcome of evaluating a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDecision {
    pub decision: Effect,
    /// Human-readable justification naming the primary policy
    pub reason: String,
    /// Every matching policy, denies first, then by descending priority,
    /// then ascending id. Empty only when nothing matched.
    pub applied_policies: Vec<AppliedPolicy>,
    /// Correlation id echoed from the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        self.decision == Effect::Allow
    }
}

/// Policy evaluation engine over an immutable snapshot
pub struct PolicyEvaluator {
    policies: Vec<Policy>,
    cache: Option<DecisionCache>,
}

impl PolicyEvaluator {
    /// Create an evaluator over a policy snapshot
    pub fn new(policies: Vec<Policy>) -> Self {
        PolicyEvaluator {
            policies,
            cache: None,
        }
    }

    /// Enable an LRU decision cache.
    ///
    /// Sound because the snapshot never changes under this evaluator: a
    /// cached decision is always identical to recomputation.
    pub fn with_cache(mut self, capacity: usize) -> Self {
        self.cache = Some(DecisionCache::new(capacity));
        self
    }

    /// Policies in this evaluator's snapshot
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    /// Number of cached decisions
    pub fn cache_size(&self) -> usize {
        self.cache.as_ref().map(DecisionCache::len).unwrap_or(0)
    }

    /// Evaluate a request to an allow/deny decision.
    ///
    /// Resolution order is fixed: any matching deny-effect policy denies the
    /// request; otherwise any matching allow-effect policy allows it;
    /// otherwise the request is allowed with no applied policies. The
    /// default-open posture on no match is deliberate and load-bearing for
    /// callers; do not change it without a product decision.
    pub fn evaluate(&self, request: &PolicyEvaluationRequest) -> PolicyDecision {
        let key = self
            .cache
            .as_ref()
            .and_then(|_| serde_json::to_string(request).ok());

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key) {
                return hit;
            }
        }

        let decision = self.evaluate_uncached(request);

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.put(key, decision.clone());
        }

        decision
    }

    fn evaluate_uncached(&self, request: &PolicyEvaluationRequest) -> PolicyDecision {
        let candidates = RuleMatcher::candidates(&self.policies, request);
        let mut matched: Vec<&Policy> = candidates
            .into_iter()
            .filter(|p| RuleMatcher::policy_matches(p, request))
            .collect();

        // Denies first, then highest priority, then lowest id
        matched.sort_by(|a, b| {
            let rank = |p: &Policy| match p.effect {
                Effect::Deny => 0,
                Effect::Allow => 1,
            };
            rank(a)
                .cmp(&rank(b))
                .then(b.priority.cmp(&a.priority))
                .then(a.id.cmp(&b.id))
        });

        debug!(
            action = %request.action,
            path = %request.resource.path,
            matched = matched.len(),
            "policy evaluation"
        );

        let (decision, reason) = match matched.first() {
            Some(primary) => {
                let verb = match primary.effect {
                    Effect::Deny => "denied",
                    Effect::Allow => "allowed",
                };
                (
                    primary.effect,
                    format!("{} by policy '{}' ({})", verb, primary.name, primary.id),
                )
            }
            None => (
                Effect::Allow,
                "no restrictive policies matched".to_string(),
            ),
        };

        PolicyDecision {
            decision,
            reason,
            applied_policies: matched.iter().map(|p| AppliedPolicy::from(*p)).collect(),
            request_id: request.request_id.clone(),
        }
    }
}
