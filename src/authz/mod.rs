//! Policy authorization engine
//!
//! Provides deterministic allow/deny evaluation with:
//! - Role-, path-, and resource-based rules with fail-closed matching
//! - Deny-first resolution ordered by priority
//! - Context conditions (string, numeric, boolean operations)
//! - Batch simulation against supplied policy sets
//! - LRU caching of complete decisions

mod cache;
mod condition;
mod engine;
mod matcher;
mod policy;
mod simulator;

pub use cache::DecisionCache;
pub use condition::{ConditionOperator, PolicyCondition};
pub use engine::{AppliedPolicy, PolicyDecision, PolicyEvaluator};
pub use matcher::RuleMatcher;
pub use policy::{
    Effect, Policy, PolicyMetadata, PolicyStatus, PolicyTargets, Rule, RuleKind, RuleOperator,
    RuleValue,
};
pub use simulator::{CaseResult, PolicySimulator, SimulationCase, SimulationResult, SimulationStatus};
