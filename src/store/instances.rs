//! Instance registry: register, heartbeat, unregister, list, stale cleanup.

use chrono::{TimeDelta, Utc};
use rusqlite::{params, OptionalExtension, Row};
use std::time::Duration;

use super::{format_timestamp, now_timestamp, timestamp_column, Instance, Result, Store};

const INSTANCE_COLUMNS: &str = "id, pid, directory, started_at, last_heartbeat";

impl Store {
    /// Register (or re-register) an instance. Any existing row with the same id
    /// is replaced and both timestamps reset to now.
    pub fn register_instance(&self, id: &str, pid: u32, directory: &str) -> Result<()> {
        let (_, now) = now_timestamp();
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO instances (id, pid, directory, started_at, last_heartbeat) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![id, pid, directory, now],
        )?;
        tracing::debug!(id, pid, directory, "instance registered");
        Ok(())
    }

    /// Refresh an instance's liveness timestamp. Unknown ids are ignored.
    pub fn heartbeat(&self, id: &str) -> Result<()> {
        let (_, now) = now_timestamp();
        let conn = self.conn()?;
        conn.execute(
            "UPDATE instances SET last_heartbeat = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(())
    }

    /// Remove an instance. Removing an unknown id is not an error.
    pub fn unregister_instance(&self, id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM instances WHERE id = ?1", params![id])?;
        tracing::debug!(id, "instance unregistered");
        Ok(())
    }

    /// All registered instances, most recently started first.
    pub fn get_instances(&self) -> Result<Vec<Instance>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {INSTANCE_COLUMNS} FROM instances ORDER BY started_at DESC, id ASC"
        ))?;
        let instances = stmt
            .query_map([], instance_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(instances)
    }

    pub fn get_instance(&self, id: &str) -> Result<Option<Instance>> {
        let conn = self.conn()?;
        let instance = conn
            .query_row(
                &format!("SELECT {INSTANCE_COLUMNS} FROM instances WHERE id = ?1"),
                params![id],
                instance_from_row,
            )
            .optional()?;
        Ok(instance)
    }

    /// Delete every instance whose last heartbeat is older than `now - max_age`.
    /// Returns how many rows were removed.
    pub fn cleanup_stale_instances(&self, max_age: Duration) -> Result<usize> {
        // An age beyond chrono's range cannot make anything stale.
        let Some(cutoff) = TimeDelta::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age))
        else {
            return Ok(0);
        };

        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM instances WHERE last_heartbeat < ?1",
            params![format_timestamp(cutoff)],
        )?;
        if removed > 0 {
            tracing::info!(removed, "cleaned up stale instances");
        }
        Ok(removed)
    }
}

fn instance_from_row(row: &Row<'_>) -> rusqlite::Result<Instance> {
    Ok(Instance {
        id: row.get(0)?,
        pid: row.get(1)?,
        directory: row.get(2)?,
        started_at: timestamp_column(row, 3)?,
        last_heartbeat: timestamp_column(row, 4)?,
    })
}
