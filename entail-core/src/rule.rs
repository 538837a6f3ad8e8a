//! Inference rules and their registry.
//!
//! A rule is a single head atom over a derived predicate and a conjunctive
//! body. Registration validates every atom against the predicate catalog
//! and enforces range restriction (every head variable occurs in some body
//! atom), which guarantees the head is fully ground once the body matches.
//! Rules are immutable after registration; the only update path is
//! clear-and-re-register.

use crate::atom::Atom;
use crate::error::{Error, Result};
use crate::predicate::PredicateCatalog;
use hashbrown::HashMap;
use std::sync::Arc;

/// An inference rule: `head :- body`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Rule name; unique within the catalog
    pub name: Arc<str>,
    /// Head atom, over a derived predicate
    pub head: Atom,
    /// Conjunctive body atoms, joined left to right
    pub body: Vec<Atom>,
}

impl Rule {
    /// Create a rule
    pub fn new(name: &str, head: Atom, body: Vec<Atom>) -> Self {
        Self {
            name: Arc::from(name),
            head,
            body,
        }
    }

    /// Distinct body variable names, in order of first occurrence
    ///
    /// This ordering defines how `run_rule_bound` parameters map onto
    /// variables.
    pub fn body_variables(&self) -> Vec<Arc<str>> {
        let mut vars: Vec<Arc<str>> = Vec::new();
        for atom in &self.body {
            for v in atom.variables() {
                if !vars.contains(v) {
                    vars.push(v.clone());
                }
            }
        }
        vars
    }

    /// Distinct head variable names, in order of first occurrence
    pub fn head_variables(&self) -> Vec<Arc<str>> {
        let mut vars: Vec<Arc<str>> = Vec::new();
        for v in self.head.variables() {
            if !vars.contains(v) {
                vars.push(v.clone());
            }
        }
        vars
    }
}

/// Registry of inference rules, keyed by name
///
/// Iteration order is registration order, fixed so step numbering and
/// diagnostics are reproducible across runs.
#[derive(Debug, Clone, Default)]
pub struct RuleCatalog {
    rules: HashMap<Arc<str>, Rule>,
    order: Vec<Arc<str>>,
}

impl RuleCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, validating it against the predicate catalog
    ///
    /// Fails with `MalformedRule` if any atom references an unknown
    /// predicate or the wrong arity, if the head predicate is not derived,
    /// or if a head variable does not occur in the body. Re-registration
    /// of an identical rule is a no-op.
    pub fn register(&mut self, rule: Rule, predicates: &PredicateCatalog) -> Result<()> {
        if let Some(existing) = self.rules.get(&rule.name) {
            if *existing == rule {
                return Ok(());
            }
            return Err(Error::malformed_rule(
                rule.name.as_ref(),
                "rule name already registered with a different definition",
            ));
        }

        validate_rule(&rule, predicates)?;

        self.order.push(rule.name.clone());
        self.rules.insert(rule.name.clone(), rule);
        Ok(())
    }

    /// Look up a rule by name
    pub fn lookup(&self, name: &str) -> Result<&Rule> {
        self.rules.get(name).ok_or_else(|| Error::unknown_rule(name))
    }

    /// Iterate over rules in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.order.iter().filter_map(|name| self.rules.get(name))
    }

    /// Number of registered rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Remove all rules
    pub fn clear(&mut self) {
        self.rules.clear();
        self.order.clear();
    }
}

/// Validate atom arities, head residency and range restriction
fn validate_rule(rule: &Rule, predicates: &PredicateCatalog) -> Result<()> {
    let check_atom = |atom: &Atom| -> Result<()> {
        let decl = predicates.lookup(atom.predicate.as_ref()).map_err(|_| {
            Error::malformed_rule(
                rule.name.as_ref(),
                format!("unknown predicate '{}'", atom.predicate),
            )
        })?;
        if decl.arity != atom.arity() {
            return Err(Error::malformed_rule(
                rule.name.as_ref(),
                format!(
                    "atom {} has {} terms but '{}' is declared with arity {}",
                    atom,
                    atom.arity(),
                    atom.predicate,
                    decl.arity
                ),
            ));
        }
        Ok(())
    };

    if rule.body.is_empty() {
        return Err(Error::malformed_rule(
            rule.name.as_ref(),
            "rule body is empty; ground facts belong in storage, not the rule catalog",
        ));
    }

    check_atom(&rule.head)?;
    for atom in &rule.body {
        check_atom(atom)?;
    }

    // Asserted predicates must never be rule targets
    let head_decl = predicates.lookup(rule.head.predicate.as_ref())?;
    if !head_decl.derived {
        return Err(Error::malformed_rule(
            rule.name.as_ref(),
            format!("head predicate '{}' is not derived", rule.head.predicate),
        ));
    }

    // Range restriction: every head variable appears in some body atom
    for var in rule.head.variables() {
        if !rule.body.iter().any(|atom| atom.mentions(var.as_ref())) {
            return Err(Error::malformed_rule(
                rule.name.as_ref(),
                format!("head variable '{}' does not occur in the body", var),
            ));
        }
    }

    Ok(())
}
