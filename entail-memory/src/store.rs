//! In-memory implementation of the storage driver contract.
//!
//! Relations are hash tables keyed by tuple with a per-tuple step stamp
//! and a derived flag. The whole store sits behind a single read-write
//! lock, so every `run_rule` call's insertions and their stamps become
//! visible atomically, as the contract requires.

use crate::join::{evaluate_rule, Bindings, StepFilter};
use async_trait::async_trait;
use entail_core::{
    Error, Id, PredicateCatalog, PredicateDecl, Result, Rule, RuleCatalog, Step, StorageDriver,
};
use hashbrown::HashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-tuple bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TupleMeta {
    /// Step stamp at insertion time
    pub(crate) step: Step,
    /// Whether the tuple was contributed by rule application
    pub(crate) derived: bool,
}

/// One predicate's stored tuples plus its step counter
#[derive(Debug, Clone)]
pub(crate) struct Relation {
    pub(crate) decl: PredicateDecl,
    pub(crate) tuples: HashMap<Vec<Id>, TupleMeta>,
    pub(crate) step: Step,
}

impl Relation {
    pub(crate) fn new(decl: PredicateDecl) -> Self {
        Self {
            decl,
            tuples: HashMap::new(),
            step: 0,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    predicates: PredicateCatalog,
    rules: RuleCatalog,
    relations: HashMap<Arc<str>, Relation>,
    loading: bool,
}

/// In-memory storage driver
///
/// Cloning is cheap and shares the underlying store (interior mutability
/// via `Arc<RwLock<...>>`). Suitable for tests and for workloads whose
/// fact base fits in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryDriver {
    /// Create an empty driver
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored tuples across all predicates
    pub fn fact_count(&self) -> usize {
        let inner = self.inner.read();
        inner.relations.values().map(|r| r.tuples.len()).sum()
    }

    /// Number of stored tuples for one predicate
    pub fn predicate_fact_count(&self, predicate: &str) -> Result<usize> {
        let inner = self.inner.read();
        let relation = inner
            .relations
            .get(predicate)
            .ok_or_else(|| Error::unknown_predicate(predicate))?;
        Ok(relation.tuples.len())
    }

    /// Snapshot one predicate's tuples, sorted for stable comparison
    pub fn facts(&self, predicate: &str) -> Result<Vec<Vec<Id>>> {
        let inner = self.inner.read();
        let relation = inner
            .relations
            .get(predicate)
            .ok_or_else(|| Error::unknown_predicate(predicate))?;
        let mut tuples: Vec<Vec<Id>> = relation.tuples.keys().cloned().collect();
        tuples.sort();
        Ok(tuples)
    }

    /// Shared body of the three `run_rule` variants
    fn execute_rule(
        &self,
        rule_name: &str,
        filter: StepFilter,
        params: Option<&[Id]>,
        new_step: Step,
    ) -> Result<usize> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;

        let rule = inner.rules.lookup(rule_name)?.clone();

        let mut seed = Bindings::new();
        if let Some(params) = params {
            let vars = rule.body_variables();
            if params.len() > vars.len() {
                return Err(Error::too_many_parameters(
                    rule_name,
                    vars.len(),
                    params.len(),
                ));
            }
            for (var, id) in vars.iter().zip(params.iter()) {
                seed.insert(var.clone(), *id);
            }
        }

        let heads = evaluate_rule(&rule, &inner.relations, filter, &seed);

        let relation = inner
            .relations
            .get_mut(rule.head.predicate.as_ref())
            .ok_or_else(|| Error::unknown_predicate(rule.head.predicate.as_ref()))?;

        let mut inserted = 0;
        for tuple in heads {
            if !relation.tuples.contains_key(&tuple) {
                trace!(rule = rule_name, ?tuple, step = new_step, "derived fact");
                relation.tuples.insert(
                    tuple,
                    TupleMeta {
                        step: new_step,
                        derived: true,
                    },
                );
                inserted += 1;
            }
        }

        debug!(rule = rule_name, inserted, step = new_step, "rule executed");
        Ok(inserted)
    }

    fn validated_tuple(relation: &Relation, ids: &[Id]) -> Result<Vec<Id>> {
        if ids.len() != relation.decl.arity {
            return Err(Error::arity_mismatch(
                relation.decl.name.as_ref(),
                relation.decl.arity,
                ids.len(),
            ));
        }
        Ok(ids.to_vec())
    }
}

#[async_trait]
impl StorageDriver for MemoryDriver {
    async fn initialize(&self) -> Result<()> {
        // Nothing to set up for hash-table relations; registration and
        // inserts allocate on demand. Idempotent by construction.
        Ok(())
    }

    async fn drop_storage(&self) -> Result<()> {
        let mut inner = self.inner.write();
        *inner = Inner::default();
        Ok(())
    }

    async fn register_predicate(&self, decl: PredicateDecl) -> Result<()> {
        let mut inner = self.inner.write();
        inner.predicates.register(decl.clone())?;
        inner
            .relations
            .entry(decl.name.clone())
            .or_insert_with(|| Relation::new(decl));
        Ok(())
    }

    async fn register_rule(&self, rule: Rule) -> Result<()> {
        let mut inner = self.inner.write();
        let inner = &mut *inner;
        inner.rules.register(rule, &inner.predicates)
    }

    async fn clear(&self, only_derived: bool) -> Result<()> {
        let mut inner = self.inner.write();
        for relation in inner.relations.values_mut() {
            clear_relation(relation, only_derived);
        }
        Ok(())
    }

    async fn clear_predicate(&self, predicate: &str, only_derived: bool) -> Result<()> {
        let mut inner = self.inner.write();
        let relation = inner
            .relations
            .get_mut(predicate)
            .ok_or_else(|| Error::unknown_predicate(predicate))?;
        clear_relation(relation, only_derived);
        Ok(())
    }

    async fn begin_loading(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.loading {
            return Err(Error::load_phase("begin_loading while already loading"));
        }
        inner.loading = true;
        Ok(())
    }

    async fn end_loading(&self) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.loading {
            return Err(Error::load_phase("end_loading without begin_loading"));
        }
        // Hash-table relations are maintained eagerly, so all facts
        // inserted during the bracket are already visible.
        inner.loading = false;
        Ok(())
    }

    async fn insert_fact(&self, predicate: &str, ids: &[Id]) -> Result<bool> {
        let mut inner = self.inner.write();
        let relation = inner
            .relations
            .get_mut(predicate)
            .ok_or_else(|| Error::unknown_predicate(predicate))?;
        let tuple = Self::validated_tuple(relation, ids)?;
        if relation.tuples.contains_key(&tuple) {
            return Ok(false);
        }
        let step = relation.step;
        relation.tuples.insert(
            tuple,
            TupleMeta {
                step,
                derived: false,
            },
        );
        Ok(true)
    }

    async fn fact_exists(&self, predicate: &str, ids: &[Id]) -> Result<bool> {
        let inner = self.inner.read();
        let relation = inner
            .relations
            .get(predicate)
            .ok_or_else(|| Error::unknown_predicate(predicate))?;
        if ids.len() != relation.decl.arity {
            return Err(Error::arity_mismatch(
                relation.decl.name.as_ref(),
                relation.decl.arity,
                ids.len(),
            ));
        }
        Ok(relation.tuples.contains_key(ids))
    }

    async fn current_step(&self, predicate: &str) -> Result<Step> {
        let inner = self.inner.read();
        let relation = inner
            .relations
            .get(predicate)
            .ok_or_else(|| Error::unknown_predicate(predicate))?;
        Ok(relation.step)
    }

    async fn change_step(&self, predicate: &str, old: Step, new: Step) -> Result<Step> {
        let mut inner = self.inner.write();
        let relation = inner
            .relations
            .get_mut(predicate)
            .ok_or_else(|| Error::unknown_predicate(predicate))?;
        if relation.step != old {
            return Err(Error::stale_step(predicate, old, relation.step));
        }
        relation.step = new;
        Ok(old)
    }

    async fn run_rule(&self, rule: &str, new_step: Step) -> Result<usize> {
        self.execute_rule(rule, StepFilter::None, None, new_step)
    }

    async fn run_rule_bound(&self, rule: &str, new_step: Step, params: &[Id]) -> Result<usize> {
        self.execute_rule(rule, StepFilter::None, Some(params), new_step)
    }

    async fn run_rule_delta(
        &self,
        rule: &str,
        min_step: Step,
        max_step: Step,
        new_step: Step,
    ) -> Result<usize> {
        self.execute_rule(
            rule,
            StepFilter::Range {
                min: min_step,
                max: max_step,
            },
            None,
            new_step,
        )
    }
}

/// Remove tuples (all, or only rule-derived) and reset the step counter
/// when the relation ends up empty
fn clear_relation(relation: &mut Relation, only_derived: bool) {
    if only_derived {
        relation.tuples.retain(|_, meta| !meta.derived);
    } else {
        relation.tuples.clear();
    }
    if relation.tuples.is_empty() {
        relation.step = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use entail_core::{Atom, Term};

    async fn edge_path_driver() -> MemoryDriver {
        let driver = MemoryDriver::new();
        driver.initialize().await.unwrap();
        driver
            .register_predicate(PredicateDecl::asserted("edge", 2))
            .await
            .unwrap();
        driver
            .register_predicate(PredicateDecl::derived("path", 2))
            .await
            .unwrap();
        driver
            .register_rule(Rule::new(
                "path-base",
                Atom::new("path", vec![Term::variable("x"), Term::variable("y")]),
                vec![Atom::new(
                    "edge",
                    vec![Term::variable("x"), Term::variable("y")],
                )],
            ))
            .await
            .unwrap();
        driver
            .register_rule(Rule::new(
                "path-step",
                Atom::new("path", vec![Term::variable("x"), Term::variable("z")]),
                vec![
                    Atom::new("path", vec![Term::variable("x"), Term::variable("y")]),
                    Atom::new("edge", vec![Term::variable("y"), Term::variable("z")]),
                ],
            ))
            .await
            .unwrap();

        driver.begin_loading().await.unwrap();
        driver.insert_fact("edge", &[1, 2]).await.unwrap();
        driver.insert_fact("edge", &[2, 3]).await.unwrap();
        driver.end_loading().await.unwrap();
        driver
    }

    #[tokio::test]
    async fn test_set_semantics() {
        let driver = edge_path_driver().await;

        assert!(!driver.insert_fact("edge", &[1, 2]).await.unwrap());
        assert_eq!(driver.predicate_fact_count("edge").unwrap(), 2);
        assert!(driver.fact_exists("edge", &[1, 2]).await.unwrap());
        assert!(!driver.fact_exists("edge", &[3, 1]).await.unwrap());
    }

    #[tokio::test]
    async fn test_arity_validated() {
        let driver = edge_path_driver().await;

        let err = driver.insert_fact("edge", &[1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
        let err = driver.fact_exists("edge", &[1]).await.unwrap_err();
        assert!(matches!(err, Error::ArityMismatch { .. }));
    }

    #[tokio::test]
    async fn test_unknown_predicate() {
        let driver = MemoryDriver::new();
        let err = driver.insert_fact("missing", &[1]).await.unwrap_err();
        assert!(matches!(err, Error::UnknownPredicate(_)));
    }

    #[tokio::test]
    async fn test_step_monotonicity() {
        let driver = edge_path_driver().await;

        assert_eq!(driver.current_step("path").await.unwrap(), 0);
        assert_eq!(driver.change_step("path", 0, 1).await.unwrap(), 0);
        assert_eq!(driver.current_step("path").await.unwrap(), 1);

        // Re-using the consumed precondition must fail
        let err = driver.change_step("path", 0, 2).await.unwrap_err();
        match err {
            Error::StaleStep {
                expected, actual, ..
            } => {
                assert_eq!(expected, 0);
                assert_eq!(actual, 1);
            }
            other => panic!("expected StaleStep, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_rule_inserts_and_stamps() {
        let driver = edge_path_driver().await;

        let n = driver.run_rule("path-base", 1).await.unwrap();
        assert_eq!(n, 2);
        assert!(driver.fact_exists("path", &[1, 2]).await.unwrap());
        assert!(driver.fact_exists("path", &[2, 3]).await.unwrap());

        // Re-running derives nothing new
        assert_eq!(driver.run_rule("path-base", 2).await.unwrap(), 0);

        let n = driver.run_rule("path-step", 2).await.unwrap();
        assert_eq!(n, 1);
        assert!(driver.fact_exists("path", &[1, 3]).await.unwrap());
    }

    #[tokio::test]
    async fn test_run_rule_bound() {
        let driver = edge_path_driver().await;

        // Bind x (first body variable of path-base) to 2
        let n = driver.run_rule_bound("path-base", 1, &[2]).await.unwrap();
        assert_eq!(n, 1);
        assert!(driver.fact_exists("path", &[2, 3]).await.unwrap());
        assert!(!driver.fact_exists("path", &[1, 2]).await.unwrap());

        // Too many parameters is a structured error
        let err = driver
            .run_rule_bound("path-base", 1, &[1, 2, 3])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TooManyParameters {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_run_rule_delta_respects_range() {
        let driver = edge_path_driver().await;

        // Asserted edge facts carry stamp 0; a range excluding 0 finds no
        // supporting delta
        let n = driver.run_rule_delta("path-base", 1, 5, 6).await.unwrap();
        assert_eq!(n, 0);

        let n = driver.run_rule_delta("path-base", 0, 0, 1).await.unwrap();
        assert_eq!(n, 2);

        // The derived path facts carry stamp 1; path-step fires on them
        let n = driver.run_rule_delta("path-step", 1, 1, 2).await.unwrap();
        assert_eq!(n, 1);
    }

    #[tokio::test]
    async fn test_clear_only_derived() {
        let driver = edge_path_driver().await;
        driver.run_rule("path-base", 1).await.unwrap();
        driver.change_step("path", 0, 1).await.unwrap();

        driver.clear(true).await.unwrap();
        assert_eq!(driver.predicate_fact_count("path").unwrap(), 0);
        assert_eq!(driver.predicate_fact_count("edge").unwrap(), 2);
        // Cleared predicate's counter resets; untouched predicate keeps its facts
        assert_eq!(driver.current_step("path").await.unwrap(), 0);

        driver.clear(false).await.unwrap();
        assert_eq!(driver.fact_count(), 0);
        assert_eq!(driver.current_step("edge").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_clear_single_predicate() {
        let driver = edge_path_driver().await;
        driver.run_rule("path-base", 1).await.unwrap();

        driver.clear_predicate("path", false).await.unwrap();
        assert_eq!(driver.predicate_fact_count("path").unwrap(), 0);
        assert_eq!(driver.predicate_fact_count("edge").unwrap(), 2);
    }

    #[tokio::test]
    async fn test_loading_bracket_not_nestable() {
        let driver = MemoryDriver::new();
        driver.begin_loading().await.unwrap();
        let err = driver.begin_loading().await.unwrap_err();
        assert!(matches!(err, Error::LoadPhase(_)));
        driver.end_loading().await.unwrap();
        let err = driver.end_loading().await.unwrap_err();
        assert!(matches!(err, Error::LoadPhase(_)));
    }

    #[tokio::test]
    async fn test_drop_leaves_no_residual_state() {
        let driver = edge_path_driver().await;
        assert!(driver.fact_count() > 0);

        driver.drop_storage().await.unwrap();
        driver.initialize().await.unwrap();
        assert_eq!(driver.fact_count(), 0);
        assert!(matches!(
            driver.fact_exists("edge", &[1, 2]).await.unwrap_err(),
            Error::UnknownPredicate(_)
        ));
    }

    #[tokio::test]
    async fn test_register_conflicting_predicate() {
        let driver = edge_path_driver().await;
        let err = driver
            .register_predicate(PredicateDecl::asserted("edge", 3))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateDeclaration(_)));
    }
}
