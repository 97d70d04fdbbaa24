use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::envelope::Response;

type Sink = Box<dyn AsyncWrite + Send + Unpin>;

/// Shared, line-oriented response writer.
///
/// Each response is written as one JSON line and flushed while the lock is
/// held, so concurrent writers never interleave bytes.
#[derive(Clone)]
pub struct Output {
    sink: Arc<Mutex<Sink>>,
}

impl Output {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            sink: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }

    pub async fn send(&self, response: &Response) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(response)?;
        line.push(b'\n');

        let mut sink = self.sink.lock().await;
        sink.write_all(&line).await?;
        sink.flush().await
    }
}
