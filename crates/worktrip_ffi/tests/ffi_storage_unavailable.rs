//! Runs in its own process so `WORKTRIP_DB_PATH` is set before the first call.

use worktrip_ffi::api::{
    todo_add, todo_delete, todo_set_mode, todo_snapshot, todo_toggle_completed,
};

#[test]
fn unreachable_database_keeps_changes_in_memory_and_reports_unsaved() {
    // A regular file as the parent directory makes the open fail.
    let blocker = tempfile::NamedTempFile::new().unwrap();
    let db_path = blocker.path().join("worktrip.sqlite3");
    std::env::set_var("WORKTRIP_DB_PATH", &db_path);

    let added = todo_add("Buy milk".to_string());
    assert!(added.ok, "{}", added.message);
    assert!(!added.persisted);
    assert!(added.message.contains("Not saved"), "{}", added.message);
    let milk = added.task_id.unwrap();

    let snapshot = todo_snapshot();
    assert_eq!(snapshot.mode, "work");
    assert_eq!(snapshot.items.len(), 1);
    assert_eq!(snapshot.items[0].id, milk);
    assert_eq!(snapshot.items[0].text, "Buy milk");
    assert_eq!(snapshot.warnings.len(), 1);
    assert!(snapshot.warnings[0].contains("storage unavailable"));

    let toggled = todo_toggle_completed(milk);
    assert!(toggled.ok, "{}", toggled.message);
    assert!(!toggled.persisted);
    assert!(todo_snapshot().items[0].completed);

    let switched = todo_set_mode("travel".to_string());
    assert!(switched.ok);
    assert!(!switched.persisted);
    assert_eq!(todo_snapshot().mode, "travel");

    let deleted = todo_delete(milk);
    assert!(deleted.ok);
    assert!(!deleted.persisted);
    let again = todo_delete(milk);
    assert!(again.ok);
    assert!(!again.persisted);

    let snapshot = todo_snapshot();
    assert!(snapshot.items.is_empty());
    assert_eq!((snapshot.work_total, snapshot.travel_total), (0, 0));
    assert!(!db_path.exists());
}
