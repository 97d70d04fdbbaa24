//! `get_context`: session-start context for the caller's directory.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write;

use super::ToolHandlers;
use crate::error::ToolError;
use crate::store::{Fact, FactFilter};

pub const NAME: &str = "get_context";
pub const DESCRIPTION: &str = "Get all relevant context for the current working directory. \
Call this at the start of a session to load persistent context.";

/// Facts from the caller's own directory.
pub const LOCAL_FACT_LIMIT: i64 = 50;
/// Most recent facts across all directories.
pub const GLOBAL_FACT_LIMIT: i64 = 20;

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct GetContextParams {}

impl ToolHandlers {
    pub(crate) fn get_context(&self, _params: GetContextParams) -> Result<String, ToolError> {
        let local = self.store.get_facts(&FactFilter {
            source_dir: &self.work_dir,
            limit: LOCAL_FACT_LIMIT,
            ..Default::default()
        })?;
        let global = self.store.get_facts(&FactFilter {
            limit: GLOBAL_FACT_LIMIT,
            ..Default::default()
        })?;

        let others = exclude_seen(&local, global);
        Ok(render_context(&self.work_dir, &local, &others))
    }
}

/// Drop every fact from `global` that already appears in `local`.
fn exclude_seen(local: &[Fact], global: Vec<Fact>) -> Vec<Fact> {
    let seen: HashSet<i64> = local.iter().map(|f| f.id).collect();
    global.into_iter().filter(|f| !seen.contains(&f.id)).collect()
}

fn tag_suffix(tags: &[String]) -> String {
    if tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", tags.join(", "))
    }
}

fn render_context(work_dir: &str, local: &[Fact], others: &[Fact]) -> String {
    let mut out = format!("# Context for {work_dir}\n\n");

    if !local.is_empty() {
        out.push_str("## Local Facts (this directory)\n\n");
        for f in local {
            let _ = writeln!(out, "- {}{}", f.content, tag_suffix(&f.tags));
        }
        out.push('\n');
    }

    if !others.is_empty() {
        out.push_str("## Recent Facts (other directories)\n\n");
        for f in others {
            let _ = writeln!(out, "- {} ({}){}", f.content, f.source_dir, tag_suffix(&f.tags));
        }
    }

    if local.is_empty() && others.is_empty() {
        out.push_str("No stored context yet. Use the `remember` tool to store facts and decisions.\n");
    }

    out
}
