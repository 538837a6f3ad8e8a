//! Budgets and evaluation reports.
//!
//! Materialization over a hostile rule set can run long; instead of a
//! hard sweep cap we use time/fact budgets that can be tuned per
//! workload. A capped run is reported as such, never silently truncated.

use entail_core::Step;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Budget constraints for a materialization run
#[derive(Clone, Debug)]
pub struct EvaluationBudget {
    /// Max wall-clock time before the run is capped
    pub max_duration: Duration,
    /// Max newly derived facts before the run is capped
    pub max_facts: usize,
}

impl Default for EvaluationBudget {
    fn default() -> Self {
        Self {
            max_duration: Duration::from_secs(30),
            max_facts: 1_000_000,
        }
    }
}

impl EvaluationBudget {
    /// Create a budget with custom limits
    pub fn new(max_duration: Duration, max_facts: usize) -> Self {
        Self {
            max_duration,
            max_facts,
        }
    }

    /// Create an unlimited budget (for testing or small datasets)
    pub fn unlimited() -> Self {
        Self {
            max_duration: Duration::from_secs(3600),
            max_facts: usize::MAX,
        }
    }
}

/// Options for a materialization run
#[derive(Clone, Debug, Default)]
pub struct EvaluationOptions {
    /// Budget constraints
    pub budget: EvaluationBudget,
}

impl EvaluationOptions {
    /// Create options with the default budget
    pub fn new() -> Self {
        Self::default()
    }

    /// Create options with a custom budget
    pub fn with_budget(budget: EvaluationBudget) -> Self {
        Self { budget }
    }
}

/// Report from a materialization run
///
/// Always returned alongside success so callers can see what happened:
/// how many sweeps ran, how many facts were derived, whether the run was
/// capped, and how often each rule fired.
#[derive(Clone, Debug, Default, Serialize)]
pub struct EvaluationReport {
    /// Number of full rule sweeps performed (including retried sweeps)
    pub sweeps: usize,
    /// Total facts newly derived across all rules
    pub facts_derived: usize,
    /// Whether evaluation stopped before reaching the fixpoint
    pub capped: bool,
    /// Reason for capping, if applicable
    pub capped_reason: Option<String>,
    /// Wall-clock duration of the run
    pub duration: Duration,
    /// Global step counter value when the run ended
    pub final_step: Step,
    /// Number of sweeps aborted and retried after a stale step
    pub stale_retries: usize,
    /// Facts contributed per rule
    pub rules_fired: HashMap<String, usize>,
}

impl EvaluationReport {
    /// Record that a rule contributed `count` new facts
    pub fn record_rule_fired(&mut self, rule: &str, count: usize) {
        *self.rules_fired.entry(rule.to_string()).or_insert(0) += count;
    }

    /// Mark the report as capped
    pub fn cap(&mut self, reason: impl Into<String>) {
        self.capped = true;
        self.capped_reason = Some(reason.into());
    }

    /// Whether the run reached a true fixpoint
    pub fn saturated(&self) -> bool {
        !self.capped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_defaults() {
        let budget = EvaluationBudget::default();
        assert_eq!(budget.max_duration, Duration::from_secs(30));
        assert_eq!(budget.max_facts, 1_000_000);
    }

    #[test]
    fn test_report_rule_counts() {
        let mut report = EvaluationReport::default();
        report.record_rule_fired("path-step", 3);
        report.record_rule_fired("path-step", 2);
        assert_eq!(report.rules_fired["path-step"], 5);
        assert!(report.saturated());

        report.cap("facts");
        assert!(!report.saturated());
    }

    #[test]
    fn test_report_serializes() {
        let mut report = EvaluationReport::default();
        report.record_rule_fired("path-base", 2);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["facts_derived"], 0);
        assert_eq!(json["rules_fired"]["path-base"], 2);
    }
}
