//! `get_messages`: read this instance's mailbox.
//!
//! Read-on-retrieve: every unread message returned is stamped read before the
//! response is built, so a message is only ever reported unread once.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

use super::{local_time, ToolHandlers};
use crate::error::ToolError;
use crate::store::Message;

pub const NAME: &str = "get_messages";
pub const DESCRIPTION: &str = "Get messages sent to this instance from other clauder instances.";

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetMessagesParams {
    #[schemars(description = "If true, only return unread messages (default: true)")]
    pub unread_only: Option<bool>,
}

impl ToolHandlers {
    pub(crate) fn get_messages(&self, params: GetMessagesParams) -> Result<String, ToolError> {
        let unread_only = params.unread_only.unwrap_or(true);
        let messages = self.store.get_messages(&self.instance_id, unread_only)?;

        for m in messages.iter().filter(|m| m.is_unread()) {
            self.store.mark_message_read(m.id)?;
        }

        Ok(render_messages(&messages, unread_only))
    }
}

/// Render a mailbox listing. Status reflects the state before retrieval.
pub fn render_messages(messages: &[Message], unread_only: bool) -> String {
    if messages.is_empty() {
        return if unread_only {
            "No unread messages.".into()
        } else {
            "No messages.".into()
        };
    }

    let mut out = format!("Found {} message(s):\n\n", messages.len());
    for m in messages {
        let status = match m.read_at {
            Some(read_at) => format!("read at {}", local_time(read_at, "%H:%M")),
            None => "unread".to_string(),
        };
        let _ = writeln!(out, "**#{}** from {} ({})", m.id, m.from_instance, status);
        let _ = writeln!(out, "  Time: {}", local_time(m.created_at, "%Y-%m-%d %H:%M:%S"));
        let _ = writeln!(out, "  {}\n", m.content);
    }
    out
}
