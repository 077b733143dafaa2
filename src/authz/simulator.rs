//! Policy simulation
//!
//! Runs a batch of test cases against a supplied policy set and reports
//! expected-vs-actual per case. Simulation is a pure dry run: it builds a
//! private evaluator over the given set, never consults live policies, and
//! never writes version or audit records.

use crate::authz::engine::{PolicyDecision, PolicyEvaluator};
use crate::authz::policy::{Effect, Policy};
use crate::context::PolicyEvaluationRequest;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Whether the simulation ran to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SimulationStatus {
    Completed,
    FailedToRun,
}

/// One test case: a request plus the decision it should produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationCase {
    pub name: String,
    pub request: PolicyEvaluationRequest,
    pub expected_decision: Effect,
}

impl SimulationCase {
    pub fn new(
        name: impl Into<String>,
        request: PolicyEvaluationRequest,
        expected_decision: Effect,
    ) -> Self {
        SimulationCase {
            name: name.into(),
            request,
            expected_decision,
        }
    }
}

/// Outcome of a single case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseResult {
    pub name: String,
    pub expected_decision: Effect,
    pub actual: PolicyDecision,
    pub passed: bool,
    /// Mismatch description, empty when the case passed
    pub diff: String,
}

/// Aggregate simulation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub status: SimulationStatus,
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub results: Vec<CaseResult>,
}

impl SimulationResult {
    fn failed_to_run() -> Self {
        SimulationResult {
            status: SimulationStatus::FailedToRun,
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            results: Vec::new(),
        }
    }
}

/// Batch dry-run harness over the evaluator
pub struct PolicySimulator;

impl PolicySimulator {
    /// Run every case against the supplied policy set.
    ///
    /// The set is validated up front; an invalid set fails the whole run
    /// (`failed-to-run`) rather than producing misleading per-case results.
    pub fn run(policy_set: Vec<Policy>, cases: &[SimulationCase]) -> SimulationResult {
        for policy in &policy_set {
            if let Err(e) = policy.validate() {
                warn!(policy = %policy.id, error = %e, "simulation aborted: invalid policy set");
                return SimulationResult::failed_to_run();
            }
        }

        let evaluator = PolicyEvaluator::new(policy_set);
        let mut results = Vec::with_capacity(cases.len());
        let mut passed_tests = 0;

        for case in cases {
            let actual = evaluator.evaluate(&case.request);
            let passed = actual.decision == case.expected_decision;
            let diff = if passed {
                String::new()
            } else {
                format!(
                    "expected {:?}, got {:?} ({})",
                    case.expected_decision, actual.decision, actual.reason
                )
            };
            if passed {
                passed_tests += 1;
            }
            results.push(CaseResult {
                name: case.name.clone(),
                expected_decision: case.expected_decision,
                actual,
                passed,
                diff,
            });
        }

        debug!(
            total = cases.len(),
            passed = passed_tests,
            "simulation completed"
        );

        SimulationResult {
            status: SimulationStatus::Completed,
            total_tests: cases.len(),
            passed_tests,
            failed_tests: cases.len() - passed_tests,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::policy::{Rule, RuleKind, RuleOperator, RuleValue};
    use crate::context::{ResourceContext, UserContext};

    fn deny_devs() -> Policy {
        let mut policy = Policy::new("deny-devs", "Deny developers", Effect::Deny);
        policy.add_rule(Rule::new(
            "r1",
            RuleKind::Role,
            RuleOperator::In,
            RuleValue::many(&["developer"]),
        ));
        policy
    }

    fn request(roles: &[&str]) -> PolicyEvaluationRequest {
        PolicyEvaluationRequest::new(
            UserContext::new("u1", "alice").with_roles(roles),
            "read",
            ResourceContext::new("secret-reference", "s1").with_path("kv/x"),
        )
    }

    #[test]
    fn test_simulation_pass_and_fail() {
        let cases = vec![
            SimulationCase::new("dev denied", request(&["developer"]), Effect::Deny),
            SimulationCase::new("admin allowed", request(&["org-admin"]), Effect::Allow),
            SimulationCase::new("wrong expectation", request(&["developer"]), Effect::Allow),
        ];

        let result = PolicySimulator::run(vec![deny_devs()], &cases);
        assert_eq!(result.status, SimulationStatus::Completed);
        assert_eq!(result.total_tests, 3);
        assert_eq!(result.passed_tests, 2);
        assert_eq!(result.failed_tests, 1);

        assert!(result.results[0].passed);
        assert!(result.results[1].passed);
        assert!(!result.results[2].passed);
        assert!(result.results[2].diff.contains("expected"));
    }

    #[test]
    fn test_invalid_policy_set_fails_to_run() {
        let mut broken = deny_devs();
        broken.targets.resources.clear();

        let cases = vec![SimulationCase::new(
            "never runs",
            request(&["developer"]),
            Effect::Deny,
        )];
        let result = PolicySimulator::run(vec![broken], &cases);
        assert_eq!(result.status, SimulationStatus::FailedToRun);
        assert!(result.results.is_empty());
        assert_eq!(result.total_tests, 0);
    }

    #[test]
    fn test_empty_case_list() {
        let result = PolicySimulator::run(vec![deny_devs()], &[]);
        assert_eq!(result.status, SimulationStatus::Completed);
        assert_eq!(result.total_tests, 0);
        assert_eq!(result.failed_tests, 0);
    }
}
