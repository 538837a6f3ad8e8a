//! # Entail Reasoner
//!
//! Step-stamped semi-naive fixpoint engine over the
//! [`StorageDriver`](entail_core::StorageDriver) contract.
//!
//! This crate provides:
//! - [`materialize`]: register catalogs with a driver and run rule
//!   sweeps to saturation
//! - [`run_fixpoint`]: the sweep loop itself, for callers that manage
//!   registration and loading separately
//! - [`EvaluationBudget`] / [`EvaluationReport`]: time/fact limits and
//!   run diagnostics
//!
//! The engine is single-threaded cooperative: one sweep runs to
//! completion before another begins, rules are evaluated sequentially in
//! registration order, and the only blocking operations are the awaited
//! driver calls. The engine holds no mutable copies of stored facts,
//! only per-predicate step snapshots.
//!
//! ## Example
//!
//! ```ignore
//! use entail_core::{Atom, PredicateCatalog, PredicateDecl, Rule, RuleCatalog, Term};
//! use entail_memory::MemoryDriver;
//! use entail_reasoner::{materialize, EvaluationOptions};
//!
//! let driver = MemoryDriver::new();
//! // ... register predicates/rules into catalogs, load asserted facts ...
//! let report = materialize(&driver, &predicates, &rules, &EvaluationOptions::new()).await?;
//! assert!(report.saturated());
//! ```

pub mod budget;
pub mod fixpoint;

pub use budget::{EvaluationBudget, EvaluationOptions, EvaluationReport};
pub use fixpoint::run_fixpoint;

use entail_core::{PredicateCatalog, Result, RuleCatalog, StorageDriver};

/// Materialize the closure of `rules` over the facts held by `driver`
///
/// Registers every predicate declaration and rule with the driver (both
/// registrations validate and are no-ops when identical), then sweeps
/// rules to fixpoint within the options' budget.
///
/// # Errors
///
/// Catalog errors (`DuplicateDeclaration`, `MalformedRule`) surface
/// immediately; evaluation-time driver failures abort the run. Budget
/// exhaustion is not an error: the returned report is marked capped.
pub async fn materialize(
    driver: &dyn StorageDriver,
    predicates: &PredicateCatalog,
    rules: &RuleCatalog,
    opts: &EvaluationOptions,
) -> Result<EvaluationReport> {
    for decl in predicates.iter() {
        driver.register_predicate(decl.clone()).await?;
    }
    for rule in rules.iter() {
        driver.register_rule(rule.clone()).await?;
    }

    run_fixpoint(driver, rules, &opts.budget).await
}
