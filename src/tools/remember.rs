//! `remember`: store a fact scoped to the caller's directory.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{truncate, ToolHandlers};
use crate::config::LimitsConfig;
use crate::error::ToolError;

pub const NAME: &str = "remember";
pub const DESCRIPTION: &str = "Store a fact, decision, or piece of context for future sessions. \
Use this to persist important information that should be available across sessions.";

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RememberParams {
    #[schemars(description = "The fact, decision, or context to remember")]
    pub fact: String,

    #[schemars(
        description = "Optional tags to categorize this fact (e.g., 'architecture', 'decision', 'preference')"
    )]
    pub tags: Option<Vec<String>>,
}

/// Check a fact and its tags against the configured bounds.
///
/// Oversized input is rejected, never truncated.
pub fn validate(limits: &LimitsConfig, fact: &str, tags: &[String]) -> Result<(), ToolError> {
    if fact.trim().is_empty() {
        return Err(ToolError::Missing("fact"));
    }
    if fact.len() > limits.max_fact_size {
        return Err(ToolError::FactTooLarge {
            size: fact.len(),
            max: limits.max_fact_size,
        });
    }
    if tags.len() > limits.max_tag_count {
        return Err(ToolError::TooManyTags {
            count: tags.len(),
            max: limits.max_tag_count,
        });
    }
    if let Some(tag) = tags
        .iter()
        .find(|t| t.chars().count() > limits.max_tag_length)
    {
        return Err(ToolError::TagTooLong {
            tag: truncate(tag, 20),
            max: limits.max_tag_length,
        });
    }
    Ok(())
}

impl ToolHandlers {
    pub(crate) fn remember(&self, params: RememberParams) -> Result<String, ToolError> {
        let tags = params.tags.unwrap_or_default();
        validate(&self.limits, &params.fact, &tags)?;

        let stored = self.store.add_fact(&params.fact, &tags, &self.work_dir)?;
        tracing::info!(id = stored.id, tags = tags.len(), "fact remembered");

        Ok(format!(
            "Stored fact #{}: {}",
            stored.id,
            truncate(&params.fact, 100)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits() -> LimitsConfig {
        LimitsConfig {
            max_fact_size: 16,
            max_tag_count: 2,
            max_tag_length: 5,
            ..LimitsConfig::default()
        }
    }

    #[test]
    fn accepts_input_at_the_limits() {
        let tags = vec!["abcde".to_string(), "x".to_string()];
        validate(&limits(), &"a".repeat(16), &tags).unwrap();
    }

    #[test]
    fn rejects_blank_fact() {
        let err = validate(&limits(), "   ", &[]).unwrap_err();
        assert!(matches!(err, ToolError::Missing("fact")));
    }

    #[test]
    fn rejects_oversized_fact() {
        let err = validate(&limits(), &"a".repeat(17), &[]).unwrap_err();
        assert!(matches!(err, ToolError::FactTooLarge { size: 17, max: 16 }));
    }

    #[test]
    fn fact_size_counts_bytes() {
        // 9 two-byte characters = 18 bytes
        let err = validate(&limits(), &"é".repeat(9), &[]).unwrap_err();
        assert!(matches!(err, ToolError::FactTooLarge { size: 18, .. }));
    }

    #[test]
    fn rejects_too_many_tags() {
        let tags: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let err = validate(&limits(), "fact", &tags).unwrap_err();
        assert!(matches!(err, ToolError::TooManyTags { count: 3, max: 2 }));
    }

    #[test]
    fn rejects_long_tag() {
        let tags = vec!["abcdef".to_string()];
        let err = validate(&limits(), "fact", &tags).unwrap_err();
        assert!(matches!(err, ToolError::TagTooLong { max: 5, .. }));
    }
}
