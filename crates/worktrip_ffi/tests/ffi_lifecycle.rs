//! Runs in its own process so `WORKTRIP_DB_PATH` is set before the first call.

use worktrip_core::{AppMode, SqliteKvFile, TaskId, TodoStore};
use worktrip_ffi::api::{
    todo_add, todo_delete, todo_set_mode, todo_snapshot, todo_toggle_completed, todo_update,
};

#[test]
fn todo_calls_share_one_store_and_write_through() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("worktrip.sqlite3");
    std::env::set_var("WORKTRIP_DB_PATH", &db_path);

    let empty = todo_add(String::new());
    assert!(!empty.ok);
    assert!(empty.task_id.is_none());

    let added = todo_add("Buy milk".to_string());
    assert!(added.ok, "{}", added.message);
    assert!(added.persisted, "{}", added.message);
    let milk = added.task_id.unwrap();

    let toggled = todo_toggle_completed(milk);
    assert!(toggled.ok, "{}", toggled.message);
    assert!(toggled.persisted);
    assert_eq!(toggled.message, "Task completed.");

    let updated = todo_update(milk, "Buy oat milk".to_string());
    assert!(updated.ok, "{}", updated.message);

    let scratch = todo_add("scratch".to_string()).task_id.unwrap();
    let deleted = todo_delete(scratch);
    assert!(deleted.ok && deleted.persisted, "{}", deleted.message);
    let again = todo_delete(scratch);
    assert!(again.ok);
    assert_eq!(again.message, "Task already gone.");

    let missing = todo_update(scratch, "ghost".to_string());
    assert!(!missing.ok);
    assert!(missing.message.contains("not found"));

    let switched = todo_set_mode("travel".to_string());
    assert!(switched.ok && switched.persisted, "{}", switched.message);
    let bags = todo_add("Pack bags".to_string()).task_id.unwrap();

    let snapshot = todo_snapshot();
    assert_eq!(snapshot.mode, "travel");
    assert_eq!(snapshot.placeholder, "Where do you want to go?");
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].id, bags);
    assert_eq!(snapshot.items[0].text, "Pack bags");
    assert_eq!(snapshot.items[0].mode, "travel");
    assert!(!snapshot.items[0].completed);
    assert_eq!((snapshot.work_total, snapshot.travel_total), (1, 1));
    assert!(snapshot.warnings.is_empty(), "{:?}", snapshot.warnings);

    let on_disk = TodoStore::load(SqliteKvFile::open(&db_path).unwrap());
    assert!(on_disk.warnings.is_empty());
    assert_eq!(on_disk.store.mode(), AppMode::Travel);
    assert_eq!(on_disk.store.len(), 2);
    let milk_row = on_disk.store.get(TaskId::new(milk)).unwrap();
    assert_eq!(milk_row.text, "Buy oat milk");
    assert!(milk_row.completed);
    assert!(on_disk.store.get(TaskId::new(scratch)).is_none());
}
