//! Error types for entail-core

use crate::driver::Step;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// A predicate name is already registered with a different signature
    #[error("Duplicate declaration: {0}")]
    DuplicateDeclaration(String),

    /// Lookup of an unregistered predicate name
    #[error("Unknown predicate: {0}")]
    UnknownPredicate(String),

    /// Lookup of an unregistered rule name
    #[error("Unknown rule: {0}")]
    UnknownRule(String),

    /// A rule failed catalog-time validation and was not registered
    #[error("Malformed rule '{rule}': {reason}")]
    MalformedRule { rule: String, reason: String },

    /// A predicate declaration failed validation (e.g. zero arity)
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),

    /// Tuple width does not match the predicate's declared arity
    #[error("Arity mismatch for '{predicate}': expected {expected}, got {actual}")]
    ArityMismatch {
        predicate: String,
        expected: usize,
        actual: usize,
    },

    /// More bound parameters than the rule body has distinct variables
    #[error("Too many parameters for rule '{rule}': takes at most {expected}, got {actual}")]
    TooManyParameters {
        rule: String,
        expected: usize,
        actual: usize,
    },

    /// Optimistic step advance failed: the recorded step no longer matches
    #[error("Stale step for '{predicate}': expected {expected}, found {actual}")]
    StaleStep {
        predicate: String,
        expected: Step,
        actual: Step,
    },

    /// An external expression could not be mapped to an identifier
    #[error("Unresolved identifier: {0}")]
    UnresolvedIdentifier(String),

    /// Bulk-loading bracket misuse (nested begin, end without begin)
    #[error("Load phase error: {0}")]
    LoadPhase(String),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error from a storage backend
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a duplicate declaration error
    pub fn duplicate_declaration(msg: impl Into<String>) -> Self {
        Error::DuplicateDeclaration(msg.into())
    }

    /// Create an unknown predicate error
    pub fn unknown_predicate(name: impl Into<String>) -> Self {
        Error::UnknownPredicate(name.into())
    }

    /// Create an unknown rule error
    pub fn unknown_rule(name: impl Into<String>) -> Self {
        Error::UnknownRule(name.into())
    }

    /// Create a malformed rule error
    pub fn malformed_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid declaration error
    pub fn invalid_declaration(msg: impl Into<String>) -> Self {
        Error::InvalidDeclaration(msg.into())
    }

    /// Create an arity mismatch error
    pub fn arity_mismatch(predicate: impl Into<String>, expected: usize, actual: usize) -> Self {
        Error::ArityMismatch {
            predicate: predicate.into(),
            expected,
            actual,
        }
    }

    /// Create a too-many-parameters error
    pub fn too_many_parameters(rule: impl Into<String>, expected: usize, actual: usize) -> Self {
        Error::TooManyParameters {
            rule: rule.into(),
            expected,
            actual,
        }
    }

    /// Create a stale step error
    pub fn stale_step(predicate: impl Into<String>, expected: Step, actual: Step) -> Self {
        Error::StaleStep {
            predicate: predicate.into(),
            expected,
            actual,
        }
    }

    /// Create an unresolved identifier error
    pub fn unresolved_identifier(expr: impl Into<String>) -> Self {
        Error::UnresolvedIdentifier(expr.into())
    }

    /// Create a load phase error
    pub fn load_phase(msg: impl Into<String>) -> Self {
        Error::LoadPhase(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Create an I/O error
    pub fn io(msg: impl Into<String>) -> Self {
        Error::Io(msg.into())
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error is recoverable by retrying from a fresh step snapshot
    pub fn is_stale_step(&self) -> bool {
        matches!(self, Error::StaleStep { .. })
    }
}
