//! # Keyward - Policy Authorization and Versioning Core
//!
//! `keyward` is the policy core behind the Keyward secrets console: a
//! deterministic allow/deny evaluator over role-, path-, and resource-based
//! rules, plus an append-only version store that tracks every policy change
//! as an immutable, ordered history. Features:
//!
//! - **Deny-first evaluation** with fixed precedence ordering and
//!   human-readable justifications
//! - **Fail-closed rule matching**: malformed rules never widen access
//! - **Append-only version chains** per policy, gap-free from version 1,
//!   with diff, restore, audit filtering, and change statistics
//! - **Batch simulation** of policy sets against expected decisions
//! - **RBAC catalog** with protected system roles
//!
//! ## Quick Start
//!
//! ```rust
//! use keyward::{
//!     Effect, Policy, PolicyEvaluationRequest, PolicyEvaluator, ResourceContext, Rule,
//!     RuleKind, RuleOperator, RuleValue, UserContext,
//! };
//!
//! // A deny policy for production paths
//! let mut deny_prod = Policy::new("deny-prod-devs", "Deny developers in prod", Effect::Deny)
//!     .with_priority(200);
//! deny_prod.targets.path_prefixes = vec!["kv/data/prod/".to_string()];
//! deny_prod.add_rule(Rule::new(
//!     "r1",
//!     RuleKind::Role,
//!     RuleOperator::In,
//!     RuleValue::many(&["developer", "data-scientist"]),
//! ));
//!
//! let evaluator = PolicyEvaluator::new(vec![deny_prod]);
//! let request = PolicyEvaluationRequest::new(
//!     UserContext::new("u1", "alice").with_roles(&["developer"]),
//!     "read",
//!     ResourceContext::new("secret-reference", "s1").with_path("kv/data/prod/database"),
//! );
//!
//! let decision = evaluator.evaluate(&request);
//! assert_eq!(decision.decision, Effect::Deny);
//! ```
//!
//! ## Versioned Lifecycle
//!
//! ```rust
//! use keyward::{
//!     Effect, InMemoryPolicyStore, InMemoryVersionStore, Policy, PolicyLifecycle,
//!     VersionMetadata,
//! };
//! use std::sync::Arc;
//!
//! let lifecycle = PolicyLifecycle::new(
//!     Arc::new(InMemoryPolicyStore::new()),
//!     Arc::new(InMemoryVersionStore::new()),
//! );
//!
//! let policy = lifecycle
//!     .create(Policy::new("deny-prod", "Deny prod", Effect::Deny), "alice")
//!     .unwrap();
//! assert_eq!(policy.version, 1);
//!
//! let mut tightened = policy.clone();
//! tightened.priority = 300;
//! lifecycle.update(tightened, "raise priority", "alice").unwrap();
//!
//! let restored = lifecycle
//!     .restore("deny-prod", 1, "rollback", "alice", VersionMetadata::default())
//!     .unwrap();
//! assert_eq!(restored.version, 3);
//! assert_eq!(restored.priority, 0);
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                 Caller (UI/API)              │
//! └──────┬────────────────┬─────────────┬────────┘
//!        │ evaluate       │ simulate    │ mutate
//! ┌──────▼───────┐ ┌──────▼───────┐ ┌───▼──────────────┐
//! │PolicyEvaluator│ │PolicySimulator│ │ PolicyLifecycle │
//! │  RuleMatcher  │ │ (private     │ │  PolicyStore     │
//! │  conditions   │ │  evaluator)  │ │  VersionStore    │
//! └──────────────┘ └──────────────┘ └──────────────────┘
//! ```
//!
//! Evaluation is pure and snapshot-based; all mutation flows through the
//! lifecycle wrappers, which record exactly one immutable version per
//! change. The caller composes the pieces; there are no module-level
//! singletons anywhere in this crate.

pub mod authz;
pub mod context;
pub mod error;
pub mod rbac;
pub mod store;
pub mod version;

// Re-export commonly used types
pub use authz::{
    AppliedPolicy, ConditionOperator, DecisionCache, Effect, Policy, PolicyCondition,
    PolicyDecision, PolicyEvaluator, PolicyMetadata, PolicySimulator, PolicyStatus, PolicyTargets,
    Rule, RuleKind, RuleMatcher, RuleOperator, RuleValue, SimulationCase, SimulationResult,
    SimulationStatus,
};
pub use context::{
    AttrValue, EnvironmentContext, PolicyEvaluationRequest, ResourceContext, UserContext,
};
pub use error::{PolicyError, Result};
pub use rbac::{Permission, PermissionScope, RbacDirectory, Role, RoleMetadata};
pub use store::{InMemoryPolicyStore, PolicyFilter, PolicyStore};
pub use version::{
    AuditFilter, ChangeStats, ChangeType, FieldChange, FieldChangeType, HistoryOrder,
    InMemoryVersionStore, PolicyLifecycle, PolicyVersion, VersionDiff, VersionMetadata,
    VersionStore,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
