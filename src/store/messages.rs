//! Instance mailboxes.

use rusqlite::{params, Row};

use super::{now_timestamp, optional_timestamp_column, timestamp_column, Message, Result, Store};

impl Store {
    /// Store a message. Does not check that `to` is a registered instance.
    pub fn send_message(&self, from: &str, to: &str, content: &str) -> Result<Message> {
        let (now, now_str) = now_timestamp();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO messages (from_instance, to_instance, content, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![from, to, content, now_str],
        )?;
        let id = conn.last_insert_rowid();

        tracing::debug!(id, from, to, "message stored");

        Ok(Message {
            id,
            from_instance: from.to_string(),
            to_instance: to.to_string(),
            content: content.to_string(),
            created_at: now,
            read_at: None,
        })
    }

    /// Messages addressed to `to_instance`, oldest first.
    pub fn get_messages(&self, to_instance: &str, unread_only: bool) -> Result<Vec<Message>> {
        let mut sql = String::from(
            "SELECT id, from_instance, to_instance, content, created_at, read_at FROM messages WHERE to_instance = ?1",
        );
        if unread_only {
            sql.push_str(" AND read_at IS NULL");
        }
        sql.push_str(" ORDER BY created_at ASC, id ASC");

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let messages = stmt
            .query_map(params![to_instance], message_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// Stamp a message as read now. Calling it again moves the timestamp forward
    /// but never clears it; unknown ids are ignored.
    pub fn mark_message_read(&self, id: i64) -> Result<()> {
        let (_, now) = now_timestamp();
        let conn = self.conn()?;
        conn.execute(
            "UPDATE messages SET read_at = ?1 WHERE id = ?2",
            params![now, id],
        )?;
        Ok(())
    }
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        from_instance: row.get(1)?,
        to_instance: row.get(2)?,
        content: row.get(3)?,
        created_at: timestamp_column(row, 4)?,
        read_at: optional_timestamp_column(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_come_back_in_creation_order() {
        let store = Store::open_in_memory().unwrap();
        let first = store.send_message("a", "b", "one").unwrap();
        let second = store.send_message("c", "b", "two").unwrap();
        store.send_message("a", "someone-else", "three").unwrap();

        let inbox = store.get_messages("b", false).unwrap();
        let ids: Vec<i64> = inbox.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[test]
    fn mark_read_is_idempotent() {
        let store = Store::open_in_memory().unwrap();
        let msg = store.send_message("a", "b", "hello").unwrap();

        store.mark_message_read(msg.id).unwrap();
        store.mark_message_read(msg.id).unwrap();
        store.mark_message_read(9999).unwrap();

        let all = store.get_messages("b", false).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].read_at.is_some());
        assert!(store.get_messages("b", true).unwrap().is_empty());
    }
}
