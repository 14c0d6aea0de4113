use rusqlite::Connection;
use worktrip_core::db::schema::SCHEMA_VERSION;
use worktrip_core::db::{open_db, open_db_in_memory, DbError};
use worktrip_core::{AppMode, PersistenceGateway, SqliteKvRepository, TodoStore};

#[test]
fn open_db_in_memory_applies_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), SCHEMA_VERSION);
    assert_table_exists(&conn, "kv_entries");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("worktrip.sqlite3");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), SCHEMA_VERSION);
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), SCHEMA_VERSION);
    assert_table_exists(&conn_second, "kv_entries");
}

#[test]
fn reopening_keeps_existing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worktrip.sqlite3");

    let conn = open_db(&path).unwrap();
    SqliteKvRepository::new(&conn).store("mode", b"false").unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    let value = SqliteKvRepository::new(&conn).load("mode").unwrap();
    assert_eq!(value.as_deref(), Some(&b"false"[..]));
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.sqlite3");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, SCHEMA_VERSION);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn store_survives_process_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("worktrip.sqlite3");

    let milk = {
        let conn = open_db(&path).unwrap();
        let mut store = TodoStore::load(SqliteKvRepository::new(&conn)).store;
        let milk = store.add("Buy milk", AppMode::Work).unwrap().value;
        let _ = store.add("Pack bags", AppMode::Travel).unwrap();
        let _ = store.toggle_completed(milk).unwrap();
        let _ = store.set_mode(AppMode::Travel);
        milk
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteKvRepository::new(&conn);
    assert!(repo.load("todos").unwrap().is_some());

    let loaded = TodoStore::load(repo);
    assert!(loaded.warnings.is_empty());
    let store = loaded.store;
    assert_eq!(store.mode(), AppMode::Travel);
    assert_eq!(store.len(), 2);
    assert!(store.get(milk).unwrap().completed);
    assert_eq!(store.active_list()[0].text, "Pack bags");
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
