//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the key-value persistence contract used by the store.
//! - Isolate SQLite and JSON details from service orchestration.
//!
//! # Invariants
//! - Persistence errors are values (`StorageError`), never panics.

pub mod codec;
pub mod kv_repo;
