//! # Entail Memory
//!
//! In-memory [`StorageDriver`](entail_core::StorageDriver) implementation
//! for the entail rule engine.
//!
//! Relations live in hash tables keyed by tuple, each tuple carrying a
//! step stamp and a derived flag; rule execution is a nested-loop join
//! with optional step-range restriction for semi-naive evaluation. The
//! store is `Clone` and shares state through `Arc<RwLock<...>>`, so a
//! driver handle can be passed around freely.
//!
//! ## Example
//!
//! ```ignore
//! use entail_core::{PredicateDecl, StorageDriver};
//! use entail_memory::MemoryDriver;
//!
//! let driver = MemoryDriver::new();
//! driver.initialize().await?;
//! driver.register_predicate(PredicateDecl::asserted("edge", 2)).await?;
//! driver.insert_fact("edge", &[1, 2]).await?;
//! assert!(driver.fact_exists("edge", &[1, 2]).await?);
//! ```

mod join;
mod store;

pub use store::MemoryDriver;
