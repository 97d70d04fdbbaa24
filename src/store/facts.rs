//! Fact storage: add, filtered query, lookup, delete.

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use super::{
    clamp_limit, now_timestamp, sanitize_fts_query, timestamp_column, Fact, FactFilter, Result,
    Store,
};

const FACT_COLUMNS: &str = "f.id, f.content, f.tags, f.source_dir, f.created_at, f.updated_at";

impl Store {
    /// Insert a fact. Content is stored as given; bounds are checked by callers.
    pub fn add_fact(&self, content: &str, tags: &[String], source_dir: &str) -> Result<Fact> {
        let tags_json = serde_json::to_string(tags)?;
        let (now, now_str) = now_timestamp();

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO facts (content, tags, source_dir, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?4)",
            params![content, tags_json, source_dir, now_str],
        )?;
        let id = conn.last_insert_rowid();

        tracing::debug!(id, source_dir, tags = tags.len(), "fact added");

        Ok(Fact {
            id,
            content: content.to_string(),
            tags: tags.to_vec(),
            source_dir: source_dir.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Query facts, newest update first.
    ///
    /// A non-empty `query` is matched as one literal phrase (see
    /// [`sanitize_fts_query`]). Tags use AND semantics and match whole tags only.
    pub fn get_facts(&self, filter: &FactFilter<'_>) -> Result<Vec<Fact>> {
        let mut sql = format!("SELECT {FACT_COLUMNS} FROM facts f");
        let mut conditions: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        let query = filter.query.trim();
        if !query.is_empty() {
            sql.push_str(" JOIN facts_fts ON f.id = facts_fts.rowid");
            conditions.push("facts_fts MATCH ?");
            args.push(Value::Text(sanitize_fts_query(query)));
        }

        if !filter.source_dir.is_empty() {
            conditions.push("f.source_dir = ?");
            args.push(Value::Text(filter.source_dir.to_string()));
        }

        for tag in filter.tags {
            // Search for the tag's own JSON encoding, quotes included, so `go`
            // never matches `golang` and embedded quotes stay escaped.
            conditions.push("instr(f.tags, ?) > 0");
            args.push(Value::Text(serde_json::to_string(tag)?));
        }

        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        sql.push_str(" ORDER BY f.updated_at DESC, f.id DESC LIMIT ?");
        args.push(Value::Integer(clamp_limit(filter.limit)));

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let facts = stmt
            .query_map(params_from_iter(args), fact_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(facts)
    }

    /// Look up one fact. `Ok(None)` when the id does not exist.
    pub fn get_fact_by_id(&self, id: i64) -> Result<Option<Fact>> {
        let conn = self.conn()?;
        let fact = conn
            .query_row(
                &format!("SELECT {FACT_COLUMNS} FROM facts f WHERE f.id = ?1"),
                params![id],
                fact_from_row,
            )
            .optional()?;
        Ok(fact)
    }

    /// Delete a fact. Deleting an id that does not exist is not an error.
    pub fn delete_fact(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM facts WHERE id = ?1", params![id])?;
        tracing::debug!(id, removed, "fact deleted");
        Ok(())
    }

    /// Count facts, optionally restricted to one source directory (empty = all).
    pub fn count_facts(&self, source_dir: &str) -> Result<i64> {
        let conn = self.conn()?;
        let count = if source_dir.is_empty() {
            conn.query_row("SELECT COUNT(*) FROM facts", [], |row| row.get(0))?
        } else {
            conn.query_row(
                "SELECT COUNT(*) FROM facts WHERE source_dir = ?1",
                params![source_dir],
                |row| row.get(0),
            )?
        };
        Ok(count)
    }
}

fn fact_from_row(row: &Row<'_>) -> rusqlite::Result<Fact> {
    let tags_json: Option<String> = row.get(2)?;
    Ok(Fact {
        id: row.get(0)?,
        content: row.get(1)?,
        tags: decode_tags(tags_json.as_deref()),
        source_dir: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        updated_at: timestamp_column(row, 5)?,
    })
}

/// Corrupted or missing tag data reads as no tags rather than failing the row.
fn decode_tags(raw: Option<&str>) -> Vec<String> {
    match raw {
        Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring malformed tags column");
            Vec::new()
        }),
        None => Vec::new(),
    }
}
