//! Key-value schema bootstrap.
//!
//! # Invariants
//! - `PRAGMA user_version` equals `SCHEMA_VERSION` once `apply_schema` returns.
//! - A database stamped with a newer version is never touched.

use crate::db::{DbError, DbResult};
use log::debug;
use rusqlite::Connection;
use std::cmp::Ordering;

/// Schema version written by this binary.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Creates the `kv_entries` table on a fresh database and stamps its version.
pub fn apply_schema(conn: &mut Connection) -> DbResult<()> {
    let db_version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    match db_version.cmp(&SCHEMA_VERSION) {
        Ordering::Greater => Err(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported: SCHEMA_VERSION,
        }),
        Ordering::Equal => Ok(()),
        Ordering::Less => {
            let tx = conn.transaction()?;
            tx.execute_batch(SCHEMA_SQL)?;
            tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tx.commit()?;
            debug!("event=db_schema module=db status=ok from_version={db_version} to_version={SCHEMA_VERSION}");
            Ok(())
        }
    }
}
