//! Step-stamped semi-naive fixpoint iteration.
//!
//! The engine sweeps the registered rules in a fixed order, asking the
//! storage driver to evaluate each rule restricted to joins that involve
//! at least one fact stamped since the last full pass. A sweep where
//! every rule returns 0 means the closure is saturated.
//!
//! Step bookkeeping: the engine keeps a snapshot of the counter of every
//! predicate the rules reference and a global step `s`. A rule that contributes facts stamps
//! them with `s + 1`, advances its head counter via the optimistic
//! `change_step`, and bumps `s`. Later rules in the same sweep therefore
//! already see earlier rules' output in their delta range. The lower
//! bound of the range moves to `sweep_start + 1` after each productive
//! sweep, so facts from sweep N are consumed exactly once by sweep N+1.
//!
//! A `StaleStep` from `change_step` means something else advanced a
//! counter under us; the sweep is aborted, counters are re-snapshotted
//! and the sweep retried from that consistent state. Any other driver
//! error is fatal and surfaced unchanged.

use crate::budget::{EvaluationBudget, EvaluationReport};
use entail_core::{Result, Rule, RuleCatalog, Step, StorageDriver};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, warn};

/// Run rule sweeps to fixpoint (or until the budget is exhausted)
///
/// Assumes predicates and rules are already registered with the driver
/// and asserted facts loaded. Returns a report describing the run; a
/// capped run sets `capped` rather than failing.
pub async fn run_fixpoint(
    driver: &dyn StorageDriver,
    rules: &RuleCatalog,
    budget: &EvaluationBudget,
) -> Result<EvaluationReport> {
    let start = Instant::now();
    let mut report = EvaluationReport::default();

    let rule_list: Vec<Rule> = rules.iter().cloned().collect();
    if rule_list.is_empty() {
        report.duration = start.elapsed();
        return Ok(report);
    }

    // Snapshot the counter of every predicate the rules reference, body
    // atoms included: an asserted predicate resumed from a prior session
    // may carry a counter past anything a head would report, and facts
    // stamped with it must fall inside the first sweep's delta range.
    let mut steps: HashMap<Arc<str>, Step> = HashMap::new();
    for rule in &rule_list {
        for predicate in std::iter::once(&rule.head.predicate)
            .chain(rule.body.iter().map(|atom| &atom.predicate))
        {
            if !steps.contains_key(predicate) {
                let current = driver.current_step(predicate.as_ref()).await?;
                steps.insert(predicate.clone(), current);
            }
        }
    }

    // Global step: at least every known counter, so fresh stamps are
    // strictly newer than anything stored.
    let mut s: Step = steps.values().copied().max().unwrap_or(0);

    // Facts stamped in (last_evaluated - 1, s] are "new" for the next
    // sweep; the first sweep scans everything from step 0.
    let mut last_evaluated: Step = 0;

    'sweep: loop {
        if start.elapsed() > budget.max_duration {
            report.cap("time");
            break;
        }
        if report.facts_derived > budget.max_facts {
            report.cap("facts");
            break;
        }

        report.sweeps += 1;
        let sweep_start = s;
        let mut fired = false;

        for rule in &rule_list {
            let inserted = driver
                .run_rule_delta(rule.name.as_ref(), last_evaluated, s, s + 1)
                .await
                .map_err(|e| {
                    error!(
                        rule = rule.name.as_ref(),
                        min = last_evaluated,
                        max = s,
                        %e,
                        "rule evaluation failed"
                    );
                    e
                })?;

            if inserted == 0 {
                continue;
            }

            let head = rule.head.predicate.clone();
            let known = steps.get(&head).copied().unwrap_or(0);
            match driver.change_step(head.as_ref(), known, s + 1).await {
                Ok(_) => {
                    steps.insert(head, s + 1);
                    s += 1;
                    fired = true;
                    report.facts_derived += inserted;
                    report.record_rule_fired(rule.name.as_ref(), inserted);
                    debug!(
                        rule = rule.name.as_ref(),
                        inserted,
                        step = s,
                        "rule contributed facts"
                    );
                }
                Err(e) if e.is_stale_step() => {
                    warn!(
                        rule = rule.name.as_ref(),
                        predicate = rule.head.predicate.as_ref(),
                        %e,
                        "stale step, retrying sweep from fresh snapshot"
                    );
                    report.stale_retries += 1;
                    for (predicate, known) in steps.iter_mut() {
                        *known = driver.current_step(predicate.as_ref()).await?;
                    }
                    // The aborted rule already stamped facts with s + 1;
                    // keep s ahead of both those stamps and the counters.
                    let snapshot_max = steps.values().copied().max().unwrap_or(0);
                    s = snapshot_max.max(s + 1);
                    continue 'sweep;
                }
                Err(e) => return Err(e),
            }
        }

        if !fired {
            break;
        }
        last_evaluated = sweep_start + 1;
    }

    report.final_step = s;
    report.duration = start.elapsed();
    debug!(
        sweeps = report.sweeps,
        facts = report.facts_derived,
        capped = report.capped,
        "fixpoint finished"
    );
    Ok(report)
}
