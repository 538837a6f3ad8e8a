//! # Entail Core
//!
//! Core types and the storage-driver contract for the entail rule engine.
//!
//! This crate provides:
//! - Term and literal model: integer-id constants, named variables,
//!   canonical typed literals
//! - Predicate and rule catalogs with insertion-time validation
//!   (signatures, arity, range restriction)
//! - The [`StorageDriver`] contract the fixpoint engine programs against
//! - The identifier-resolution contract ([`IdResolver`]) and an interning
//!   implementation for in-memory sessions
//!
//! ## Design Principles
//!
//! 1. **Storage-agnostic**: the same evaluation logic runs against an
//!    in-memory store or a relational backend through one contract
//! 2. **Async at the driver seam only**: catalogs and the term model are
//!    plain synchronous values
//! 3. **No process-wide state**: configuration and connection context are
//!    explicit values passed to driver constructors

pub mod atom;
pub mod driver;
pub mod error;
pub mod ids;
pub mod literal;
pub mod predicate;
pub mod rule;
pub mod term;

// Re-export main types
pub use atom::Atom;
pub use driver::{Step, StorageDriver};
pub use error::{Error, Result};
pub use ids::{IdInterner, IdResolver};
pub use literal::Literal;
pub use predicate::{PredicateCatalog, PredicateDecl, Residency};
pub use rule::{Rule, RuleCatalog};
pub use term::{Id, Term};
