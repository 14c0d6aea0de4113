//! Persisted layout for the task collection and the active mode.
//!
//! # Responsibility
//! - Encode/decode the `todos` and `mode` gateway entries as JSON.
//!
//! # Invariants
//! - `todos` is an object keyed by the stringified `TaskId`; values carry
//!   `text`, `mode` and `completed` only.
//! - `mode` is a JSON boolean, `true` meaning Work.
//! - Decoding restores every task with `editing = false`.

use crate::model::task::{AppMode, Task, TaskId};
use crate::repo::kv_repo::{StorageError, StorageResult};
use std::collections::BTreeMap;

/// Gateway key of the serialized task collection.
pub const TODOS_KEY: &str = "todos";
/// Gateway key of the serialized active mode.
pub const MODE_KEY: &str = "mode";

pub fn encode_todos(todos: &BTreeMap<TaskId, Task>) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(todos).map_err(|err| StorageError::Corrupt {
        key: TODOS_KEY.to_string(),
        message: err.to_string(),
    })
}

pub fn decode_todos(bytes: &[u8]) -> StorageResult<BTreeMap<TaskId, Task>> {
    let mut todos: BTreeMap<TaskId, Task> =
        serde_json::from_slice(bytes).map_err(|err| StorageError::Corrupt {
            key: TODOS_KEY.to_string(),
            message: err.to_string(),
        })?;
    for (id, task) in todos.iter_mut() {
        task.id = *id;
    }
    Ok(todos)
}

pub fn encode_mode(mode: AppMode) -> StorageResult<Vec<u8>> {
    serde_json::to_vec(&mode.is_work()).map_err(|err| StorageError::Corrupt {
        key: MODE_KEY.to_string(),
        message: err.to_string(),
    })
}

pub fn decode_mode(bytes: &[u8]) -> StorageResult<AppMode> {
    serde_json::from_slice::<bool>(bytes)
        .map(AppMode::from_is_work)
        .map_err(|err| StorageError::Corrupt {
            key: MODE_KEY.to_string(),
            message: err.to_string(),
        })
}
