//! Abstract storage for the cohort governance engine.
//!
//! The engine only needs a durable, key-ordered byte store. Every backend
//! (an embedded database, a host chain's state tree, the in-memory
//! `NullStore` used in tests) implements [`KvStore`]; the rest of the
//! codebase depends only on the trait.
//!
//! Atomicity is layered on top with [`CacheStore`]: an operation writes into
//! a cache over the committed store, and the cache's [`WriteBatch`] is applied
//! only when the operation succeeds.

pub mod batch;
pub mod cache;
pub mod error;
pub mod kv;

pub use batch::{BatchOp, WriteBatch};
pub use cache::CacheStore;
pub use error::StoreError;
pub use kv::KvStore;
