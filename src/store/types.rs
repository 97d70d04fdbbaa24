//! Record types returned by the store.
//!
//! These are plain values; nothing here holds a reference into the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A remembered unit of text, scoped to the directory that created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fact {
    /// Store-assigned, monotonically increasing. Never reused.
    pub id: i64,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Working directory of the session that stored the fact.
    pub source_dir: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A registered daemon session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Opaque short identifier, unique across live instances.
    pub id: String,
    pub pid: u32,
    pub directory: String,
    pub started_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
}

/// A one-way note from one instance to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub from_instance: String,
    pub to_instance: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// `None` while unread. Once set it is never cleared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_unread(&self) -> bool {
        self.read_at.is_none()
    }
}

/// Filter for [`crate::store::Store::get_facts`].
///
/// Empty strings and slices mean "no constraint". `limit` is clamped by the
/// store, see [`crate::store::clamp_limit`].
#[derive(Debug, Clone, Default)]
pub struct FactFilter<'a> {
    /// Free text, matched as a literal phrase against fact content.
    pub query: &'a str,
    /// Every listed tag must be present on the fact.
    pub tags: &'a [String],
    /// Exact source directory match.
    pub source_dir: &'a str,
    pub limit: i64,
}
