//! Tool handlers exposed through `tools/call`.
//!
//! Each tool lives in its own module with a typed parameter struct. Untyped
//! argument maps are decoded once into a [`ToolCall`] at the boundary; the
//! handlers then validate bounds, call the store, and render plain text.

pub mod get_context;
pub mod get_messages;
pub mod list_instances;
pub mod recall;
pub mod remember;
pub mod send_message;

use chrono::{DateTime, Local, Utc};
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use get_context::GetContextParams;
use get_messages::GetMessagesParams;
use list_instances::ListInstancesParams;
use recall::RecallParams;
use remember::RememberParams;
use send_message::SendMessageParams;

use crate::config::LimitsConfig;
use crate::error::ToolError;
use crate::lifecycle::InstanceManager;
use crate::store::Store;

/// A decoded, fully typed tool invocation.
#[derive(Debug)]
pub enum ToolCall {
    Remember(RememberParams),
    Recall(RecallParams),
    GetContext(GetContextParams),
    ListInstances(ListInstancesParams),
    SendMessage(SendMessageParams),
    GetMessages(GetMessagesParams),
}

impl ToolCall {
    /// Decode `arguments` for the tool called `name`. Absent or `null`
    /// arguments are treated as an empty object.
    pub fn decode(name: &str, arguments: Option<Value>) -> Result<Self, ToolError> {
        let args = match arguments {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(v) => v,
        };

        match name {
            remember::NAME => parse(remember::NAME, args).map(Self::Remember),
            recall::NAME => parse(recall::NAME, args).map(Self::Recall),
            get_context::NAME => parse(get_context::NAME, args).map(Self::GetContext),
            list_instances::NAME => parse(list_instances::NAME, args).map(Self::ListInstances),
            send_message::NAME => parse(send_message::NAME, args).map(Self::SendMessage),
            get_messages::NAME => parse(get_messages::NAME, args).map(Self::GetMessages),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Remember(_) => remember::NAME,
            Self::Recall(_) => recall::NAME,
            Self::GetContext(_) => get_context::NAME,
            Self::ListInstances(_) => list_instances::NAME,
            Self::SendMessage(_) => send_message::NAME,
            Self::GetMessages(_) => get_messages::NAME,
        }
    }
}

fn parse<T: DeserializeOwned>(tool: &'static str, args: Value) -> Result<T, ToolError> {
    serde_json::from_value(args).map_err(|source| ToolError::InvalidArguments { tool, source })
}

/// One `{type: "text", text}` block of a tool result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// The `result` payload of a `tools/call` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub content: Vec<ContentBlock>,
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock {
                kind: "text",
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(message)
        }
    }

    /// First text block, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.first().map(|block| block.text.as_str())
    }
}

impl From<Result<String, ToolError>> for ToolResult {
    fn from(result: Result<String, ToolError>) -> Self {
        match result {
            Ok(text) => Self::text(text),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

/// Static catalog entry returned by `tools/list`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// The full tool catalog, in a stable order.
pub fn catalog() -> Vec<ToolDescriptor> {
    vec![
        descriptor::<RememberParams>(remember::NAME, remember::DESCRIPTION),
        descriptor::<RecallParams>(recall::NAME, recall::DESCRIPTION),
        descriptor::<GetContextParams>(get_context::NAME, get_context::DESCRIPTION),
        descriptor::<ListInstancesParams>(list_instances::NAME, list_instances::DESCRIPTION),
        descriptor::<SendMessageParams>(send_message::NAME, send_message::DESCRIPTION),
        descriptor::<GetMessagesParams>(get_messages::NAME, get_messages::DESCRIPTION),
    ]
}

fn descriptor<T: JsonSchema>(name: &'static str, description: &'static str) -> ToolDescriptor {
    ToolDescriptor {
        name,
        description,
        input_schema: input_schema::<T>(),
    }
}

/// JSON schema for a parameter struct, trimmed to what MCP clients expect.
fn input_schema<T: JsonSchema>() -> Value {
    let mut schema = schemars::schema_for!(T).to_value();
    if let Value::Object(map) = &mut schema {
        map.remove("$schema");
        map.remove("title");
        map.insert("type".into(), Value::String("object".into()));
        map.entry("properties")
            .or_insert_with(|| Value::Object(Map::new()));
    }
    schema
}

/// Executes tool calls on behalf of one daemon instance.
pub struct ToolHandlers {
    store: Arc<Store>,
    instances: InstanceManager,
    instance_id: String,
    work_dir: String,
    limits: LimitsConfig,
}

impl ToolHandlers {
    pub fn new(
        store: Arc<Store>,
        instances: InstanceManager,
        instance_id: impl Into<String>,
        work_dir: impl Into<String>,
        limits: LimitsConfig,
    ) -> Self {
        Self {
            store,
            instances,
            instance_id: instance_id.into(),
            work_dir: work_dir.into(),
            limits,
        }
    }

    /// Decode and run one tool call. Never fails: every problem becomes an
    /// `isError` result.
    pub fn call(&self, name: &str, arguments: Option<Value>) -> ToolResult {
        let outcome = ToolCall::decode(name, arguments).and_then(|call| {
            let tool = call.name();
            tracing::info!(tool, instance = %self.instance_id, "tool called");
            self.execute(call).inspect_err(|e| {
                tracing::warn!(tool, error = %e, "tool call failed");
            })
        });
        outcome.into()
    }

    /// Run an already decoded call.
    pub fn execute(&self, call: ToolCall) -> Result<String, ToolError> {
        match call {
            ToolCall::Remember(p) => self.remember(p),
            ToolCall::Recall(p) => self.recall(p),
            ToolCall::GetContext(p) => self.get_context(p),
            ToolCall::ListInstances(p) => self.list_instances(p),
            ToolCall::SendMessage(p) => self.send_message(p),
            ToolCall::GetMessages(p) => self.get_messages(p),
        }
    }
}

/// Shorten `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Format a stored UTC timestamp in the local timezone.
pub fn local_time(ts: DateTime<Utc>, fmt: &str) -> String {
    ts.with_timezone(&Local).format(fmt).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn catalog_lists_all_tools_in_order() {
        let names: Vec<&str> = catalog().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                "remember",
                "recall",
                "get_context",
                "list_instances",
                "send_message",
                "get_messages"
            ]
        );
    }

    #[test]
    fn catalog_schemas_declare_required_fields() {
        let tools = catalog();
        let schema_of = |name: &str| {
            tools
                .iter()
                .find(|t| t.name == name)
                .map(|t| t.input_schema.clone())
                .unwrap()
        };

        let remember = schema_of("remember");
        assert_eq!(remember["type"], "object");
        assert_eq!(remember["required"], json!(["fact"]));
        assert!(remember["properties"]["tags"].is_object());

        let send = schema_of("send_message");
        let required: Vec<&str> = send["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert!(required.contains(&"to"));
        assert!(required.contains(&"content"));

        let context = schema_of("get_context");
        assert_eq!(context["type"], "object");
        assert!(context["properties"].is_object());
        assert!(context.get("$schema").is_none());
        assert!(context.get("required").is_none());
    }

    #[test]
    fn decode_routes_by_name() {
        let call = ToolCall::decode("remember", Some(json!({"fact": "x"}))).unwrap();
        assert!(matches!(call, ToolCall::Remember(ref p) if p.fact == "x"));
        assert_eq!(call.name(), "remember");

        let call = ToolCall::decode("get_context", None).unwrap();
        assert!(matches!(call, ToolCall::GetContext(_)));

        let call = ToolCall::decode("list_instances", Some(Value::Null)).unwrap();
        assert!(matches!(call, ToolCall::ListInstances(_)));
    }

    #[test]
    fn decode_rejects_unknown_tool_and_bad_arguments() {
        let err = ToolCall::decode("teleport", None).unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: teleport");

        let err = ToolCall::decode("remember", Some(json!({"tags": ["a"]}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { tool: "remember", .. }));

        let err = ToolCall::decode("recall", Some(json!({"limit": "ten"}))).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { tool: "recall", .. }));
    }

    #[test]
    fn tool_result_serializes_is_error_only_when_set() {
        let ok = serde_json::to_value(ToolResult::text("fine")).unwrap();
        assert_eq!(ok, json!({"content": [{"type": "text", "text": "fine"}]}));

        let err = serde_json::to_value(ToolResult::error("bad")).unwrap();
        assert_eq!(
            err,
            json!({"content": [{"type": "text", "text": "bad"}], "isError": true})
        );
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("ééééééééé", 5), "éé...");
    }
}
