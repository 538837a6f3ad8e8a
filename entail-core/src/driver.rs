//! Storage driver contract.
//!
//! This is the boundary the fixpoint engine programs against. A concrete
//! implementation may be an in-memory table store or a relational schema
//! with one table per predicate keyed by its id columns plus a step
//! column; all implementations must honor the same semantics:
//!
//! - Facts have set semantics: no multiplicity, duplicate inserts are
//!   no-ops.
//! - Each predicate carries one monotonically increasing step counter,
//!   the logical generation of its most recent successful write, advanced
//!   only through [`StorageDriver::change_step`] under an optimistic
//!   precondition.
//! - A `run_rule` call's insertions and their step stamps become visible
//!   atomically.
//!
//! The driver exclusively owns persisted tuples and step counters; the
//! engine holds only declarations, identifiers and step snapshots.

use crate::error::Result;
use crate::predicate::PredicateDecl;
use crate::rule::Rule;
use crate::term::Id;
use async_trait::async_trait;
use std::fmt::Debug;

/// Per-predicate logical generation counter
///
/// Used instead of wall-clock time to delimit "new since last evaluation"
/// tuples for semi-naive joins. Initialized to 0 at predicate
/// registration, advanced only by `change_step`, reset to 0 by `clear`.
pub type Step = u64;

/// Abstract protocol for bulk fact storage, existence tests, step
/// counters and rule execution delegation
///
/// Driver calls may be long-running under a relational backend; the
/// engine treats them as synchronous, opaque operations and never
/// parallelizes joins itself.
#[async_trait]
pub trait StorageDriver: Debug + Send + Sync {
    /// Set up backing storage; idempotent
    async fn initialize(&self) -> Result<()>;

    /// Tear down backing storage; idempotent
    ///
    /// After `drop_storage`, a subsequent `initialize` must observe no
    /// residual state.
    async fn drop_storage(&self) -> Result<()>;

    /// Register a predicate declaration
    ///
    /// Identical re-registration is a no-op; a conflicting signature
    /// fails with `DuplicateDeclaration`. The predicate's step counter
    /// starts at 0.
    async fn register_predicate(&self, decl: PredicateDecl) -> Result<()>;

    /// Register an inference rule, validating it against the registered
    /// predicates (fails with `MalformedRule`)
    async fn register_rule(&self, rule: Rule) -> Result<()>;

    /// Remove all facts, or only rule-derived facts when `only_derived`
    ///
    /// Step counters reset to 0 for every predicate actually cleared.
    async fn clear(&self, only_derived: bool) -> Result<()>;

    /// Remove one predicate's facts, or only its rule-derived facts when
    /// `only_derived`; resets that predicate's step counter to 0
    async fn clear_predicate(&self, predicate: &str, only_derived: bool) -> Result<()>;

    /// Begin a bulk-insertion phase
    ///
    /// Implementations may defer index maintenance until `end_loading`.
    /// Nesting is not permitted (`LoadPhase`).
    async fn begin_loading(&self) -> Result<()>;

    /// End a bulk-insertion phase
    ///
    /// After this returns, every inserted fact is visible to existence
    /// checks and rule execution.
    async fn end_loading(&self) -> Result<()>;

    /// Append a tuple; `ids` length must match the declared arity
    ///
    /// Set semantics: inserting an existing tuple is a no-op. Returns
    /// whether the tuple was newly inserted. New tuples are stamped with
    /// the predicate's current step.
    async fn insert_fact(&self, predicate: &str, ids: &[Id]) -> Result<bool>;

    /// Existence probe with the same set semantics as `insert_fact`
    async fn fact_exists(&self, predicate: &str, ids: &[Id]) -> Result<bool>;

    /// Read a predicate's current step counter
    async fn current_step(&self, predicate: &str) -> Result<Step>;

    /// Atomically advance a predicate's step counter from `old` to `new`
    ///
    /// Fails with `StaleStep` if the recorded counter does not equal
    /// `old` at the time of the call (optimistic concurrency guard).
    /// Returns the previous value on success.
    async fn change_step(&self, predicate: &str, old: Step, new: Step) -> Result<Step>;

    /// Evaluate a rule's join against all currently stored facts
    ///
    /// Inserts newly derivable head facts stamped with `new_step` and
    /// returns the count actually newly inserted; 0 means the rule
    /// contributed nothing this round.
    async fn run_rule(&self, rule: &str, new_step: Step) -> Result<usize>;

    /// As `run_rule`, with body variables pre-bound to constant ids
    ///
    /// `params` bind the rule's body variables in order of first
    /// occurrence (see [`Rule::body_variables`]); fewer params than
    /// variables leaves the remainder free, more than variables fails
    /// with `TooManyParameters`. Used for targeted partial evaluation,
    /// e.g. seeding a fixpoint restricted to one entity.
    async fn run_rule_bound(&self, rule: &str, new_step: Step, params: &[Id]) -> Result<usize>;

    /// Semi-naive variant of `run_rule`
    ///
    /// Restricts the join so that at least one matched body atom's
    /// supporting fact carries a step in `[min_step, max_step]`, i.e.
    /// evaluates only joins involving a fact new since the last full
    /// pass. New head facts are stamped with `new_step`.
    async fn run_rule_delta(
        &self,
        rule: &str,
        min_step: Step,
        max_step: Step,
        new_step: Step,
    ) -> Result<usize>;
}
