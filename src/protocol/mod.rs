//! Line-delimited JSON-RPC engine.
//!
//! The engine reads one envelope per line, dispatches it, and writes at most
//! one response line through the shared [`Output`] handle. Malformed input is
//! answered with a parse error and never stops the loop; end of input is a
//! clean shutdown.

pub mod envelope;
pub mod output;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::ToolError;
use crate::tools::{self, ToolHandlers, ToolResult};
use envelope::{Request, Response, RpcError, ToolCallParams};
pub use output::Output;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "clauder";

pub struct Engine {
    handlers: Arc<ToolHandlers>,
    output: Output,
}

impl Engine {
    pub fn new(handlers: Arc<ToolHandlers>, output: Output) -> Self {
        Self { handlers, output }
    }

    /// Serve requests from `reader` until end of input. Only I/O failures end
    /// the loop early; bytes that are not valid UTF-8 get a parse error.
    pub async fn run<R>(&self, mut reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut line = Vec::new();
        loop {
            line.clear();
            let read = reader
                .read_until(b'\n', &mut line)
                .await
                .context("failed to read request")?;
            if read == 0 {
                tracing::debug!("end of input");
                return Ok(());
            }

            if let Some(response) = self.handle_bytes(&line).await {
                self.output
                    .send(&response)
                    .await
                    .context("failed to write response")?;
            }
        }
    }

    /// Handle one raw input line. Returns `None` when nothing should be sent.
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        self.handle_bytes(line.as_bytes()).await
    }

    async fn handle_bytes(&self, line: &[u8]) -> Option<Response> {
        let line = line.trim_ascii();
        if line.is_empty() {
            return None;
        }

        match serde_json::from_slice::<Request>(line) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable request");
                Some(Response::failure(None, RpcError::parse_error()))
            }
        }
    }

    async fn dispatch(&self, request: Request) -> Option<Response> {
        tracing::debug!(method = %request.method, "request received");

        match request.method.as_str() {
            "initialize" => Some(Response::success(request.id, initialize_result())),
            "initialized" => None,
            m if m.starts_with("notifications/") && request.is_notification() => None,
            "tools/list" => Some(Response::success(
                request.id,
                json!({ "tools": tools::catalog() }),
            )),
            "tools/call" => Some(self.tools_call(request).await),
            "ping" => Some(Response::success(request.id, json!({}))),
            other => {
                tracing::debug!(method = other, "method not found");
                Some(Response::failure(request.id, RpcError::method_not_found()))
            }
        }
    }

    async fn tools_call(&self, request: Request) -> Response {
        let params = request
            .params
            .and_then(|p| serde_json::from_value::<ToolCallParams>(p).ok());
        let Some(ToolCallParams { name, arguments }) = params else {
            return Response::failure(request.id, RpcError::invalid_params());
        };

        let handlers = Arc::clone(&self.handlers);
        let result = tokio::task::spawn_blocking(move || handlers.call(&name, arguments))
            .await
            .unwrap_or_else(|e| ToolResult::from(Err(ToolError::Task(e.to_string()))));

        match serde_json::to_value(&result) {
            Ok(value) => Response::success(request.id, value),
            Err(e) => {
                tracing::error!(error = %e, "failed to encode tool result");
                Response::failure(request.id, RpcError::internal_error())
            }
        }
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {} },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LimitsConfig;
    use crate::lifecycle::InstanceManager;
    use crate::store::Store;
    use std::time::Duration;

    fn engine() -> Engine {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let instances = InstanceManager::new(Arc::clone(&store), Duration::from_secs(300));
        let handlers = ToolHandlers::new(store, instances, "abcd1234", "/proj", LimitsConfig::default());
        Engine::new(Arc::new(handlers), Output::new(tokio::io::sink()))
    }

    #[tokio::test]
    async fn blank_lines_produce_nothing() {
        let engine = engine();
        assert!(engine.handle_line("   \n").await.is_none());
    }

    #[tokio::test]
    async fn invalid_utf8_is_a_parse_error() {
        let resp = engine()
            .handle_bytes(b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"\xff\xfe\"}\n")
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, envelope::PARSE_ERROR);
    }

    #[tokio::test]
    async fn garbage_yields_parse_error_without_id() {
        let resp = engine().handle_line("{not json").await.unwrap();
        assert_eq!(resp.error.unwrap().code, envelope::PARSE_ERROR);
        assert!(resp.id.is_none());
    }

    #[tokio::test]
    async fn initialized_notifications_are_silent() {
        let engine = engine();
        assert!(engine
            .handle_line(r#"{"jsonrpc":"2.0","method":"initialized"}"#)
            .await
            .is_none());
        assert!(engine
            .handle_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn unknown_method_is_reported() {
        let resp = engine()
            .handle_line(r#"{"jsonrpc":"2.0","id":3,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(resp.id, Some(json!(3)));
        assert_eq!(resp.error.unwrap().code, envelope::METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn tools_call_without_params_is_invalid() {
        let resp = engine()
            .handle_line(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call"}"#)
            .await
            .unwrap();
        assert_eq!(resp.error.unwrap().code, envelope::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn initialize_reports_server_info() {
        let resp = engine()
            .handle_line(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "clauder");
        assert!(result["capabilities"]["tools"].is_object());
    }
}
