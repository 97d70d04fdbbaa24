pub mod migrations;
pub mod schema;

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::error::StoreError;

/// Open (or create) the clauder database at the given path with WAL journaling,
/// a bounded busy timeout, and the schema initialized and migrated.
///
/// The same file is opened concurrently by every running daemon and CLI command.
/// A writer blocked by another process waits up to `busy_timeout` and then fails
/// with `SQLITE_BUSY`.
pub fn open_database(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Connection, StoreError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| StoreError::Open {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut conn = Connection::open(path)?;

    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    prepare_schema(&mut conn)?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a private in-memory database with the full schema.
pub fn open_memory_database() -> Result<Connection, StoreError> {
    let mut conn = Connection::open_in_memory()?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    prepare_schema(&mut conn)?;
    Ok(conn)
}

fn prepare_schema(conn: &mut Connection) -> Result<(), StoreError> {
    schema::init_schema(conn).map_err(StoreError::Migration)?;
    migrations::run_migrations(conn).map_err(StoreError::Migration)?;
    Ok(())
}
