//! Two-list to-do store with write-through persistence.
//!
//! # Responsibility
//! - Own the task collection and the active mode for the process lifetime.
//! - Be the only mutation path for both, persisting after every change.
//!
//! # Invariants
//! - In-memory state is updated before the write is issued and is kept even
//!   when the write fails.
//! - Rejected input (empty text, unknown id) changes nothing and writes
//!   nothing.
//! - Mode switches write only the `mode` entry; task mutations write only the
//!   `todos` entry.
//! - `editing` flags live in memory only.
//! - Issued ids only grow: deleting the newest task never frees its id.

use crate::model::task::{normalize_task_text, AppMode, Task, TaskId, ValidationError};
use crate::repo::codec::{
    decode_mode, decode_todos, encode_mode, encode_todos, MODE_KEY, TODOS_KEY,
};
use crate::repo::kv_repo::{PersistenceGateway, StorageError, StorageResult};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

/// Store error for task mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoError {
    /// Input rejected; nothing changed.
    Validation(ValidationError),
    /// Target task does not exist (for example deleted before an edit commit).
    NotFound(TaskId),
}

impl Display for TodoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "task not found: {id}"),
        }
    }
}

impl Error for TodoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
        }
    }
}

impl From<ValidationError> for TodoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Result of an applied mutation.
///
/// `value` reflects the in-memory change, which always stands. `persisted`
/// reports whether the write-through reached storage.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct Change<T> {
    pub value: T,
    pub persisted: StorageResult<()>,
}

impl<T> Change<T> {
    pub fn is_persisted(&self) -> bool {
        self.persisted.is_ok()
    }

    pub fn storage_warning(&self) -> Option<&StorageError> {
        self.persisted.as_ref().err()
    }
}

/// Presentation-layer confirmation step for deletes.
pub trait DeleteConfirmation {
    /// Returns `true` to proceed, `false` to cancel with no state change.
    fn confirm_delete(&mut self, task: &Task) -> bool;
}

impl<F: FnMut(&Task) -> bool> DeleteConfirmation for F {
    fn confirm_delete(&mut self, task: &Task) -> bool {
        self(task)
    }
}

/// Outcome of a confirmation-gated delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(Change<Task>),
    Cancelled,
    Missing,
}

/// Per-mode header counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeCounts {
    pub total: usize,
    pub completed: usize,
}

/// Store plus anything that went wrong while loading it.
pub struct LoadedStore<G: PersistenceGateway> {
    pub store: TodoStore<G>,
    /// Non-fatal load failures; the affected values fell back to defaults.
    pub warnings: Vec<StorageError>,
}

/// Authoritative in-memory state with an injected persistence gateway.
pub struct TodoStore<G: PersistenceGateway> {
    gateway: G,
    todos: BTreeMap<TaskId, Task>,
    mode: AppMode,
    /// Highest id ever issued or loaded.
    last_issued: Option<TaskId>,
}

impl<G: PersistenceGateway> TodoStore<G> {
    /// Creates a store with defaults and no initial read.
    pub fn empty(gateway: G) -> Self {
        Self {
            gateway,
            todos: BTreeMap::new(),
            mode: AppMode::default(),
            last_issued: None,
        }
    }

    /// Loads `todos` and `mode` from the gateway.
    ///
    /// Missing, unreadable or undecodable entries fall back to an empty
    /// collection and `AppMode::Work`; failures are returned as warnings.
    pub fn load(gateway: G) -> LoadedStore<G> {
        let mut store = Self::empty(gateway);
        let mut warnings = Vec::new();

        match load_entry(&store.gateway, TODOS_KEY, decode_todos) {
            Ok(Some(todos)) => {
                store.last_issued = todos.keys().next_back().copied();
                store.todos = todos;
            }
            Ok(None) => {}
            Err(err) => warnings.push(err),
        }
        match load_entry(&store.gateway, MODE_KEY, decode_mode) {
            Ok(Some(mode)) => store.mode = mode,
            Ok(None) => {}
            Err(err) => warnings.push(err),
        }

        for warning in &warnings {
            warn!("event=store_load module=service status=error error={warning}");
        }
        info!(
            "event=store_load module=service status=ok tasks={} mode={} warnings={}",
            store.todos.len(),
            store.mode,
            warnings.len()
        );

        LoadedStore { store, warnings }
    }

    pub fn mode(&self) -> AppMode {
        self.mode
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.todos.get(&id)
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// All tasks in id (creation) order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.todos.values()
    }

    /// Tasks owned by `mode`, in collection order.
    pub fn list_by_mode(&self, mode: AppMode) -> Vec<&Task> {
        self.todos.values().filter(|task| task.mode == mode).collect()
    }

    /// Tasks of the currently selected mode.
    pub fn active_list(&self) -> Vec<&Task> {
        self.list_by_mode(self.mode)
    }

    pub fn counts(&self, mode: AppMode) -> ModeCounts {
        self.todos
            .values()
            .filter(|task| task.mode == mode)
            .fold(ModeCounts::default(), |mut counts, task| {
                counts.total += 1;
                if task.completed {
                    counts.completed += 1;
                }
                counts
            })
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Adds a task to `mode` and persists the collection.
    ///
    /// Empty text is rejected before anything is written.
    pub fn add(&mut self, text: &str, mode: AppMode) -> Result<Change<TaskId>, TodoError> {
        let text = normalize_task_text(text)?;
        let id = TaskId::next_after(now_epoch_ms(), self.last_issued);
        self.last_issued = Some(id);
        self.todos.insert(id, Task::new(id, text, mode));
        debug!("event=task_add module=service status=ok task_id={id} mode={mode}");
        Ok(self.persist_todos(id))
    }

    /// Removes an already-confirmed task. `None` when `id` is absent.
    pub fn delete(&mut self, id: TaskId) -> Option<Change<Task>> {
        let removed = self.todos.remove(&id)?;
        debug!("event=task_delete module=service status=ok task_id={id}");
        Some(self.persist_todos(removed))
    }

    /// Asks `confirmation` before deleting.
    pub fn delete_with(
        &mut self,
        id: TaskId,
        confirmation: &mut impl DeleteConfirmation,
    ) -> DeleteOutcome {
        let Some(task) = self.todos.get(&id) else {
            return DeleteOutcome::Missing;
        };
        if !confirmation.confirm_delete(task) {
            debug!("event=task_delete module=service status=cancelled task_id={id}");
            return DeleteOutcome::Cancelled;
        }
        match self.delete(id) {
            Some(change) => DeleteOutcome::Deleted(change),
            None => DeleteOutcome::Missing,
        }
    }

    /// Replaces task text, leaves edit mode and persists.
    pub fn update(&mut self, id: TaskId, new_text: &str) -> Result<Change<()>, TodoError> {
        let text = normalize_task_text(new_text)?;
        let task = self.todos.get_mut(&id).ok_or(TodoError::NotFound(id))?;
        task.text = text;
        task.editing = false;
        debug!("event=task_update module=service status=ok task_id={id}");
        Ok(self.persist_todos(()))
    }

    /// Flips the transient edit flag and returns the new value. No write.
    pub fn toggle_editing(&mut self, id: TaskId) -> Result<bool, TodoError> {
        let task = self.todos.get_mut(&id).ok_or(TodoError::NotFound(id))?;
        task.editing = !task.editing;
        Ok(task.editing)
    }

    /// Flips completion, persists, and returns the new value.
    pub fn toggle_completed(&mut self, id: TaskId) -> Result<Change<bool>, TodoError> {
        let task = self.todos.get_mut(&id).ok_or(TodoError::NotFound(id))?;
        task.completed = !task.completed;
        let completed = task.completed;
        debug!("event=task_complete module=service status=ok task_id={id} completed={completed}");
        Ok(self.persist_todos(completed))
    }

    /// Switches the displayed list and persists the mode only.
    pub fn set_mode(&mut self, mode: AppMode) -> Change<()> {
        self.mode = mode;
        let persisted = encode_mode(mode).and_then(|bytes| self.gateway.store(MODE_KEY, &bytes));
        log_write(MODE_KEY, &persisted);
        Change {
            value: (),
            persisted,
        }
    }

    fn persist_todos<T>(&self, value: T) -> Change<T> {
        let persisted =
            encode_todos(&self.todos).and_then(|bytes| self.gateway.store(TODOS_KEY, &bytes));
        log_write(TODOS_KEY, &persisted);
        Change { value, persisted }
    }
}

fn load_entry<G, T>(
    gateway: &G,
    key: &str,
    decode: fn(&[u8]) -> StorageResult<T>,
) -> StorageResult<Option<T>>
where
    G: PersistenceGateway,
{
    match gateway.load(key)? {
        Some(bytes) => decode(&bytes).map(Some),
        None => Ok(None),
    }
}

fn log_write(key: &str, persisted: &StorageResult<()>) {
    match persisted {
        Ok(()) => debug!("event=store_write module=service status=ok key={key}"),
        Err(err) => warn!("event=store_write module=service status=error key={key} error={err}"),
    }
}

fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{DeleteOutcome, TodoStore};
    use crate::model::task::AppMode;
    use crate::repo::kv_repo::MemoryKvRepository;

    #[test]
    fn rapid_adds_get_strictly_increasing_ids() {
        let mut store = TodoStore::empty(MemoryKvRepository::new());
        let ids: Vec<_> = (0..5)
            .map(|index| store.add(&format!("t{index}"), AppMode::Work).unwrap().value)
            .collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn delete_with_closure_confirmation() {
        let mut store = TodoStore::empty(MemoryKvRepository::new());
        let id = store.add("a", AppMode::Work).unwrap().value;

        let mut asked = 0;
        let outcome = store.delete_with(id, &mut |_: &crate::model::task::Task| {
            asked += 1;
            false
        });
        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert_eq!(asked, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn counts_track_completed_per_mode() {
        let mut store = TodoStore::empty(MemoryKvRepository::new());
        let a = store.add("a", AppMode::Travel).unwrap().value;
        let _ = store.add("b", AppMode::Travel).unwrap();
        let _ = store.add("c", AppMode::Work).unwrap();
        let _ = store.toggle_completed(a).unwrap();

        let travel = store.counts(AppMode::Travel);
        assert_eq!((travel.total, travel.completed), (2, 1));
        assert_eq!(store.counts(AppMode::Work).total, 1);
    }
}
