//! Canonical typed literal values.
//!
//! A literal pairs a canonical lexical form with a datatype URI, for facts
//! that carry literal data rather than entity identifiers. Canonicalization
//! (e.g. numeric normalization) is the producer's responsibility before a
//! literal is stored or interned; two literals are equal iff both fields
//! are equal.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed literal value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    /// Canonical lexical form
    pub lexical: String,
    /// Datatype URI
    pub datatype: String,
}

impl Literal {
    /// Create a literal from a lexical value and a datatype URI
    pub fn new(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self {
            lexical: lexical.into(),
            datatype: datatype.into(),
        }
    }
}

impl fmt::Display for Literal {
    /// Canonical rendering for diagnostics; never re-parsed by the core.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"^^{}", self.lexical, self.datatype)
    }
}
