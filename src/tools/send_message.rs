//! `send_message`: drop a note into another instance's mailbox.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ToolHandlers;
use crate::config::LimitsConfig;
use crate::error::ToolError;

pub const NAME: &str = "send_message";
pub const DESCRIPTION: &str = "Send a message to another running clauder instance. \
Use this to communicate with sessions in other directories.";

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SendMessageParams {
    #[schemars(description = "The instance ID to send the message to")]
    pub to: String,

    #[schemars(description = "The message content")]
    pub content: String,
}

/// Check recipient and content before anything touches the store.
pub fn validate(limits: &LimitsConfig, to: &str, content: &str) -> Result<(), ToolError> {
    if to.trim().is_empty() {
        return Err(ToolError::Missing("'to' instance ID"));
    }
    if content.trim().is_empty() {
        return Err(ToolError::Missing("'content'"));
    }
    if content.len() > limits.max_message_size {
        return Err(ToolError::MessageTooLarge {
            size: content.len(),
            max: limits.max_message_size,
        });
    }
    Ok(())
}

impl ToolHandlers {
    pub(crate) fn send_message(&self, params: SendMessageParams) -> Result<String, ToolError> {
        validate(&self.limits, &params.to, &params.content)?;

        // No orphaned mail: the recipient must be registered right now.
        if self.instances.find(&params.to)?.is_none() {
            return Err(ToolError::InstanceNotFound(params.to));
        }

        let msg = self
            .store
            .send_message(&self.instance_id, &params.to, &params.content)?;
        tracing::info!(id = msg.id, to = %params.to, "message sent");

        Ok(format!("Message #{} sent to {}", msg.id, params.to))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_recipient_and_content() {
        let limits = LimitsConfig::default();
        assert!(matches!(
            validate(&limits, " ", "hi").unwrap_err(),
            ToolError::Missing(_)
        ));
        assert!(matches!(
            validate(&limits, "abc", "").unwrap_err(),
            ToolError::Missing(_)
        ));
    }

    #[test]
    fn rejects_oversized_message() {
        let limits = LimitsConfig {
            max_message_size: 4,
            ..LimitsConfig::default()
        };
        validate(&limits, "abc", "1234").unwrap();
        let err = validate(&limits, "abc", "12345").unwrap_err();
        assert!(matches!(err, ToolError::MessageTooLarge { size: 5, max: 4 }));
    }
}
