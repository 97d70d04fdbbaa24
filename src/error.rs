//! Error types for the store and the tool layer.
//!
//! [`StoreError`] wraps everything that can go wrong talking to SQLite.
//! [`ToolError`] is what a tool call reports back to the client; its `Display`
//! output is the one-line message placed in an `isError` result.

use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by [`crate::store::Store`] operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The data directory could not be created.
    #[error("failed to create data directory {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A query, statement, or connection-level failure (including lock timeouts).
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Schema creation or a forward migration failed.
    #[error("failed to migrate database: {0}")]
    Migration(#[source] rusqlite::Error),

    /// Tag serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another thread panicked while holding the connection.
    #[error("database connection lock poisoned")]
    LockPoisoned,
}

/// Failures reported as tool-level errors (`isError: true`).
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is required")]
    Missing(&'static str),

    #[error("fact is too large: {size} bytes (maximum is {max})")]
    FactTooLarge { size: usize, max: usize },

    #[error("too many tags: {count} (maximum is {max})")]
    TooManyTags { count: usize, max: usize },

    #[error("tag '{tag}' is too long (maximum is {max} characters)")]
    TagTooLong { tag: String, max: usize },

    #[error("message is too large: {size} bytes (maximum is {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("instance '{0}' not found")]
    InstanceNotFound(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    /// The blocking task running the handler panicked or was cancelled.
    #[error("tool task failed: {0}")]
    Task(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_errors_render_one_line() {
        let err = ToolError::FactTooLarge { size: 12, max: 10 };
        assert_eq!(err.to_string(), "fact is too large: 12 bytes (maximum is 10)");

        let err = ToolError::InstanceNotFound("abcd1234".into());
        assert_eq!(err.to_string(), "instance 'abcd1234' not found");

        let err = ToolError::Missing("fact");
        assert_eq!(err.to_string(), "fact is required");
    }

    #[test]
    fn store_error_converts_into_tool_error() {
        let err: ToolError = StoreError::LockPoisoned.into();
        assert!(matches!(err, ToolError::Store(StoreError::LockPoisoned)));
        assert!(err.to_string().contains("lock poisoned"));
    }
}
