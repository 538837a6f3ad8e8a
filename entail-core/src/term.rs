//! Terms inside rule atoms: interned constants and named variables.
//!
//! Constants are pre-resolved integer identifiers, never raw literal text;
//! resolution from external expressions happens before a rule executes
//! (see [`crate::ids`]). Within one rule, all occurrences of the same
//! variable name denote the same bound value.

use std::fmt;
use std::sync::Arc;

/// Stable integer identifier for an entity or interned value.
pub type Id = i64;

/// A term in a rule atom
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    /// Pre-resolved constant identifier
    Constant(Id),
    /// Named variable (e.g. "x")
    Variable(Arc<str>),
}

impl Term {
    /// Create a constant term from an integer id
    pub fn constant(id: Id) -> Self {
        Term::Constant(id)
    }

    /// Create a variable term from a name
    pub fn variable(name: &str) -> Self {
        Term::Variable(Arc::from(name))
    }

    /// Check if this term is a variable
    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    /// Get the variable name if this is a variable
    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Term::Variable(name) => Some(name.as_ref()),
            Term::Constant(_) => None,
        }
    }

    /// Get the constant id if this is a constant
    pub fn constant_id(&self) -> Option<Id> {
        match self {
            Term::Constant(id) => Some(*id),
            Term::Variable(_) => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Constant(id) => write!(f, "{}", id),
            Term::Variable(name) => write!(f, "?{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_term() {
        let term = Term::constant(42);
        assert!(!term.is_variable());
        assert_eq!(term.constant_id(), Some(42));
        assert_eq!(term.variable_name(), None);
        assert_eq!(term.to_string(), "42");
    }

    #[test]
    fn test_variable_term() {
        let term = Term::variable("x");
        assert!(term.is_variable());
        assert_eq!(term.variable_name(), Some("x"));
        assert_eq!(term.constant_id(), None);
        assert_eq!(term.to_string(), "?x");
    }

    #[test]
    fn test_same_name_equal() {
        assert_eq!(Term::variable("x"), Term::variable("x"));
        assert_ne!(Term::variable("x"), Term::variable("y"));
        assert_ne!(Term::variable("x"), Term::constant(1));
    }
}
