//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose the to-do store to Dart via FRB as use-case level functions.
//! - Map store results to flat envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - One store lives for the whole process. It is loaded on the first call
//!   and every later call mutates and writes through under one lock.
//! - Storage failures never turn into `ok = false`; they set
//!   `persisted = false` and a message the UI shows as a dismissible alert.
//! - When the database cannot be opened the store runs from memory for the
//!   rest of the process and every response reports `persisted = false`.
//! - Delete confirmation happens on the Dart side before `todo_delete`.

use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use worktrip_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    AppMode, Change, MemoryKvRepository, PersistenceGateway, SqliteKvFile, StorageError, Task,
    TaskId, TodoError, TodoStore,
};

const DB_FILE_NAME: &str = "worktrip.sqlite3";
static STATE: OnceLock<Mutex<FfiState>> = OnceLock::new();

type FfiStore = TodoStore<Box<dyn PersistenceGateway + Send>>;

/// Process-wide store plus what the first load reported.
struct FfiState {
    store: FfiStore,
    load_warnings: Vec<StorageError>,
    /// `false` once the database could not be opened.
    durable: bool,
}

impl FfiState {
    fn open(db_path: &Path) -> Self {
        match SqliteKvFile::open(db_path) {
            Ok(file) => {
                let gateway: Box<dyn PersistenceGateway + Send> = Box::new(file);
                let loaded = TodoStore::load(gateway);
                info!(
                    "event=ffi_store module=ffi status=ok backend=sqlite tasks={} warnings={}",
                    loaded.store.len(),
                    loaded.warnings.len()
                );
                Self {
                    store: loaded.store,
                    load_warnings: loaded.warnings,
                    durable: true,
                }
            }
            Err(err) => {
                warn!("event=ffi_store module=ffi status=error backend=memory error_code=db_open_failed error={err}");
                let reason = format!("cannot open {}: {err}", db_path.display());
                let gateway: Box<dyn PersistenceGateway + Send> =
                    Box::new(MemoryKvRepository::offline(reason.clone()));
                Self {
                    store: TodoStore::empty(gateway),
                    load_warnings: vec![StorageError::Unavailable(reason)],
                    durable: false,
                }
            }
        }
    }
}

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One task row for the list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoItem {
    /// Stable task ID (creation epoch milliseconds).
    pub id: i64,
    pub text: String,
    /// `work|travel`.
    pub mode: String,
    pub completed: bool,
}

/// Full screen state: active mode, its rows and header hints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoSnapshot {
    /// `work|travel`.
    pub mode: String,
    /// Entry control hint for the active mode.
    pub placeholder: String,
    /// Rows of the active mode in display order.
    pub items: Vec<TodoItem>,
    pub work_total: u32,
    pub travel_total: u32,
    /// Non-fatal load problems to surface as an alert.
    pub warnings: Vec<String>,
}

/// Generic mutation response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoActionResponse {
    /// Whether the state change was applied.
    pub ok: bool,
    /// Affected task ID, when the action targets one.
    pub task_id: Option<i64>,
    /// Whether the change reached durable storage.
    pub persisted: bool,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
}

impl TodoActionResponse {
    fn applied<T>(message: &str, task_id: Option<TaskId>, change: &Change<T>) -> Self {
        let (persisted, message) = match change.storage_warning() {
            None => (true, message.to_string()),
            Some(err) => (false, format!("{message} Not saved: {err}")),
        };
        Self {
            ok: true,
            task_id: task_id.map(TaskId::get),
            persisted,
            message,
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            task_id: None,
            persisted: true,
            message: message.into(),
        }
    }
}

/// Loads the current screen state.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_snapshot() -> TodoSnapshot {
    with_state(|state| {
        let store = &state.store;
        let mode = store.mode();
        TodoSnapshot {
            mode: mode.as_str().to_string(),
            placeholder: mode.input_placeholder().to_string(),
            items: store.active_list().into_iter().map(to_todo_item).collect(),
            work_total: count_u32(store.counts(AppMode::Work).total),
            travel_total: count_u32(store.counts(AppMode::Travel).total),
            warnings: state.load_warnings.iter().map(ToString::to_string).collect(),
        }
    })
}

/// Adds a task to the active mode.
///
/// Empty text returns `ok = false` with no state change.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_add(text: String) -> TodoActionResponse {
    with_store(|store| {
        let mode = store.mode();
        match store.add(text.as_str(), mode) {
            Ok(change) => TodoActionResponse::applied("Task added.", Some(change.value), &change),
            Err(err) => TodoActionResponse::failure(format!("todo_add rejected: {err}")),
        }
    })
}

/// Replaces the text of one task.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_update(task_id: i64, text: String) -> TodoActionResponse {
    let id = TaskId::new(task_id);
    with_store(|store| match store.update(id, text.as_str()) {
        Ok(change) => TodoActionResponse::applied("Task updated.", Some(id), &change),
        Err(err) => todo_failure("todo_update", &err),
    })
}

/// Flips completion of one task.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_toggle_completed(task_id: i64) -> TodoActionResponse {
    let id = TaskId::new(task_id);
    with_store(|store| match store.toggle_completed(id) {
        Ok(change) => {
            let message = if change.value {
                "Task completed."
            } else {
                "Task reopened."
            };
            TodoActionResponse::applied(message, Some(id), &change)
        }
        Err(err) => todo_failure("todo_toggle_completed", &err),
    })
}

/// Deletes a task the user already confirmed.
///
/// A missing ID is a successful no-op.
#[flutter_rust_bridge::frb(sync)]
pub fn todo_delete(task_id: i64) -> TodoActionResponse {
    let id = TaskId::new(task_id);
    with_store(|store| match store.delete(id) {
        Some(change) => TodoActionResponse::applied("Task deleted.", Some(id), &change),
        None => TodoActionResponse {
            ok: true,
            task_id: Some(task_id),
            persisted: true,
            message: "Task already gone.".to_string(),
        },
    })
}

/// Switches the active mode (`work|travel`).
#[flutter_rust_bridge::frb(sync)]
pub fn todo_set_mode(mode: String) -> TodoActionResponse {
    let Some(mode) = AppMode::parse(mode.as_str()) else {
        return TodoActionResponse::failure(format!(
            "todo_set_mode failed: unknown mode `{}`; expected work|travel",
            mode.trim()
        ));
    };
    with_store(|store| {
        let change = store.set_mode(mode);
        TodoActionResponse::applied("Mode switched.", None, &change)
    })
}

fn todo_failure(operation: &str, err: &TodoError) -> TodoActionResponse {
    TodoActionResponse::failure(format!("{operation} failed: {err}"))
}

fn to_todo_item(task: &Task) -> TodoItem {
    TodoItem {
        id: task.id.get(),
        text: task.text.clone(),
        mode: task.mode.as_str().to_string(),
        completed: task.completed,
    }
}

fn count_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn resolve_db_path() -> PathBuf {
    if let Ok(raw) = std::env::var("WORKTRIP_DB_PATH") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(DB_FILE_NAME)
}

/// Runs `f` on the process-wide state, loading it on first use.
fn with_state<T>(f: impl FnOnce(&mut FfiState) -> T) -> T {
    let state = STATE.get_or_init(|| Mutex::new(FfiState::open(&resolve_db_path())));
    let mut guard = state
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&mut *guard)
}

/// Runs one mutation and downgrades `persisted` when running from memory.
fn with_store(f: impl FnOnce(&mut FfiStore) -> TodoActionResponse) -> TodoActionResponse {
    with_state(|state| {
        let mut response = f(&mut state.store);
        if !state.durable {
            response.persisted = false;
        }
        response
    })
}

#[cfg(test)]
mod tests {
    use super::{core_version, init_logging, ping, todo_set_mode};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn todo_set_mode_rejects_unknown_value() {
        let response = todo_set_mode("home".to_string());
        assert!(!response.ok);
        assert!(response.message.contains("work|travel"));
    }
}
