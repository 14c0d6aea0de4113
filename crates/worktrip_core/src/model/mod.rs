//! Domain model for the two-list to-do app.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep task identity, owning mode and validation in one place.
//!
//! # Invariants
//! - Every task is identified by a stable, ordered `TaskId`.
//! - A task's mode never changes after creation.

pub mod task;
