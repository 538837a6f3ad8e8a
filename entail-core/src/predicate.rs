//! Predicate declarations and their registry.
//!
//! Each predicate name maps to exactly one declaration for the lifetime of
//! a storage session; arity is fixed once registered. Derived predicates
//! hold only facts produced by rule application; asserted predicates hold
//! externally supplied facts and are never rule targets.

use crate::error::{Error, Result};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Where a predicate's facts live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Residency {
    /// Held in an in-memory table
    #[default]
    Memory,
    /// Backed by a persistent (e.g. relational) table
    Persistent,
}

/// A predicate signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateDecl {
    /// Predicate name; unique within a storage session
    pub name: Arc<str>,
    /// Number of id columns, at least 1
    pub arity: usize,
    /// Whether facts are produced by rule application (vs. asserted)
    pub derived: bool,
    /// Storage residency
    pub residency: Residency,
}

impl PredicateDecl {
    /// Declare an asserted predicate (externally supplied facts)
    pub fn asserted(name: &str, arity: usize) -> Self {
        Self {
            name: Arc::from(name),
            arity,
            derived: false,
            residency: Residency::default(),
        }
    }

    /// Declare a derived predicate (rule-produced facts only)
    pub fn derived(name: &str, arity: usize) -> Self {
        Self {
            name: Arc::from(name),
            arity,
            derived: true,
            residency: Residency::default(),
        }
    }

    /// Set the residency
    pub fn with_residency(mut self, residency: Residency) -> Self {
        self.residency = residency;
        self
    }
}

/// Registry of predicate signatures, looked up by name
///
/// Append-mostly: registration validates at insertion time, lookups are
/// read-heavy during rule registration and rule execution.
#[derive(Debug, Clone, Default)]
pub struct PredicateCatalog {
    decls: HashMap<Arc<str>, PredicateDecl>,
}

impl PredicateCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a declaration
    ///
    /// Re-registration with an identical signature is a no-op; the same
    /// name with a different signature fails with `DuplicateDeclaration`.
    pub fn register(&mut self, decl: PredicateDecl) -> Result<()> {
        if decl.arity == 0 {
            return Err(Error::invalid_declaration(format!(
                "predicate '{}' declared with arity 0",
                decl.name
            )));
        }
        if let Some(existing) = self.decls.get(&decl.name) {
            if *existing == decl {
                return Ok(());
            }
            return Err(Error::duplicate_declaration(format!(
                "predicate '{}' already registered with arity {} (derived: {})",
                existing.name, existing.arity, existing.derived
            )));
        }
        self.decls.insert(decl.name.clone(), decl);
        Ok(())
    }

    /// Look up a declaration by name
    pub fn lookup(&self, name: &str) -> Result<&PredicateDecl> {
        self.decls
            .get(name)
            .ok_or_else(|| Error::unknown_predicate(name))
    }

    /// Check whether a name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.decls.contains_key(name)
    }

    /// Iterate over all declarations
    pub fn iter(&self) -> impl Iterator<Item = &PredicateDecl> {
        self.decls.values()
    }

    /// Number of registered predicates
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }

    /// Remove all declarations
    pub fn clear(&mut self) {
        self.decls.clear();
    }
}
