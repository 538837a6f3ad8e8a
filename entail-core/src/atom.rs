//! Atoms: a predicate name applied to an ordered list of terms.
//!
//! A rule body is a conjunction of atoms (a join); a rule head is a single
//! atom over a derived predicate. Term count must equal the predicate's
//! declared arity, validated at rule registration.

use crate::term::Term;
use std::fmt;
use std::sync::Arc;

/// A predicate applied to terms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    /// Predicate name
    pub predicate: Arc<str>,
    /// Ordered argument terms
    pub terms: Vec<Term>,
}

impl Atom {
    /// Create an atom
    pub fn new(predicate: &str, terms: Vec<Term>) -> Self {
        Self {
            predicate: Arc::from(predicate),
            terms,
        }
    }

    /// Number of argument terms
    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    /// Iterate over the variable names occurring in this atom
    pub fn variables(&self) -> impl Iterator<Item = &Arc<str>> {
        self.terms.iter().filter_map(|t| match t {
            Term::Variable(name) => Some(name),
            Term::Constant(_) => None,
        })
    }

    /// Check whether a variable name occurs in this atom
    pub fn mentions(&self, var: &str) -> bool {
        self.variables().any(|v| v.as_ref() == var)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.predicate)?;
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", term)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atom_variables() {
        let atom = Atom::new(
            "edge",
            vec![Term::variable("x"), Term::constant(7), Term::variable("y")],
        );
        let vars: Vec<&str> = atom.variables().map(|v| v.as_ref()).collect();
        assert_eq!(vars, vec!["x", "y"]);
        assert!(atom.mentions("x"));
        assert!(!atom.mentions("z"));
    }

    #[test]
    fn test_atom_display() {
        let atom = Atom::new("path", vec![Term::variable("x"), Term::constant(3)]);
        assert_eq!(atom.to_string(), "path(?x, 3)");
    }
}
