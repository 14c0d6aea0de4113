//! Core domain logic for WorkTrip, a two-list (Work / Travel) to-do app.
//! This crate is the single source of truth for task state invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogLevel};
pub use model::task::{
    normalize_task_text, AppMode, Task, TaskId, ValidationError, TASK_TEXT_MAX_CHARS,
};
pub use repo::codec::{MODE_KEY, TODOS_KEY};
pub use repo::kv_repo::{
    MemoryKvRepository, PersistenceGateway, SqliteKvFile, SqliteKvRepository, StorageError,
    StorageResult,
};
pub use service::todo_store::{
    Change, DeleteConfirmation, DeleteOutcome, LoadedStore, ModeCounts, TodoError, TodoStore,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
