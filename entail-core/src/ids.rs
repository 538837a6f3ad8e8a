//! Identifier resolution contract.
//!
//! Constants inside rule atoms and stored tuples are integer identifiers;
//! how external expressions (IRIs, class expressions, individuals) map to
//! those integers is a collaborator concern. The core only requires that
//! resolution is deterministic and stable for structurally-equal inputs
//! within one session.

use crate::error::{Error, Result};
use crate::term::Id;
use hashbrown::HashMap;
use parking_lot::Mutex;

/// Source of stable integer identifiers for external expressions
pub trait IdResolver {
    /// Resolve an external expression to its identifier
    ///
    /// Deterministic within a session: structurally equal inputs yield
    /// the same id. Fails with `UnresolvedIdentifier` if the expression
    /// cannot be mapped.
    fn get_id(&self, expression: &str) -> Result<Id>;
}

/// Interning resolver, useful for in-memory sessions and tests
///
/// `get_id` is total: unseen expressions are assigned the next fresh id.
/// `resolve_existing` is the strict variant that only reports ids already
/// interned.
#[derive(Debug, Default)]
pub struct IdInterner {
    inner: Mutex<InternerState>,
}

#[derive(Debug, Default)]
struct InternerState {
    ids: HashMap<String, Id>,
    next: Id,
}

impl IdInterner {
    /// Create an empty interner; the first interned expression gets id 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve without interning; fails with `UnresolvedIdentifier` for
    /// expressions never seen by `get_id`
    pub fn resolve_existing(&self, expression: &str) -> Result<Id> {
        let state = self.inner.lock();
        state
            .ids
            .get(expression)
            .copied()
            .ok_or_else(|| Error::unresolved_identifier(expression))
    }

    /// Number of interned expressions
    pub fn len(&self) -> usize {
        self.inner.lock().ids.len()
    }

    /// Check if the interner is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdResolver for IdInterner {
    fn get_id(&self, expression: &str) -> Result<Id> {
        let mut state = self.inner.lock();
        if let Some(id) = state.ids.get(expression) {
            return Ok(*id);
        }
        let id = state.next;
        state.next += 1;
        state.ids.insert(expression.to_string(), id);
        Ok(id)
    }
}
