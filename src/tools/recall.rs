//! `recall`: search stored facts.

use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Write;

use super::{local_time, ToolHandlers};
use crate::error::ToolError;
use crate::store::{Fact, FactFilter};

pub const NAME: &str = "recall";
pub const DESCRIPTION: &str = "Search and retrieve stored facts. Use this to find previously \
stored context, decisions, or information.";

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct RecallParams {
    #[schemars(description = "Search query to find relevant facts (uses full-text search)")]
    pub query: Option<String>,

    #[schemars(description = "Filter by tags")]
    pub tags: Option<Vec<String>>,

    #[schemars(description = "If true, only return facts from the current directory")]
    pub current_dir_only: Option<bool>,

    #[serde(default, deserialize_with = "whole_number")]
    #[schemars(
        with = "Option<i64>",
        description = "Maximum number of facts to return (default: 20)"
    )]
    pub limit: Option<i64>,
}

/// Accept `5` as well as `5.0`; fractional values are truncated.
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(n) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    n.as_i64()
        .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("limit out of range: {n}")))
}

impl ToolHandlers {
    pub(crate) fn recall(&self, params: RecallParams) -> Result<String, ToolError> {
        let query = params.query.unwrap_or_default();
        let tags = params.tags.unwrap_or_default();
        let source_dir = if params.current_dir_only.unwrap_or(false) {
            self.work_dir.as_str()
        } else {
            ""
        };
        let limit = params.limit.unwrap_or(self.limits.recall_default_limit);

        let facts = self.store.get_facts(&FactFilter {
            query: &query,
            tags: &tags,
            source_dir,
            limit,
        })?;
        tracing::debug!(found = facts.len(), "recall finished");

        Ok(render_facts(&facts))
    }
}

/// Render facts as the listing shared by `recall` and the CLI.
pub fn render_facts(facts: &[Fact]) -> String {
    if facts.is_empty() {
        return "No facts found matching your query.".into();
    }

    let mut out = format!("Found {} fact(s):\n\n", facts.len());
    for f in facts {
        let _ = writeln!(out, "**#{}** [{}]", f.id, local_time(f.created_at, "%Y-%m-%d %H:%M"));
        if !f.tags.is_empty() {
            let _ = writeln!(out, "Tags: {}", f.tags.join(", "));
        }
        let _ = writeln!(out, "Dir: {}", f.source_dir);
        let _ = writeln!(out, "{}\n", f.content);
    }
    out
}
