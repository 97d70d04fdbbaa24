//! Daemon wiring for the `serve` command.
//!
//! [`serve_stdio`] opens the store, registers this process as an instance,
//! keeps it alive with a heartbeat, and runs the protocol engine on
//! stdin/stdout until end of input or a termination signal. The instance row
//! is removed on the way out either way.

use anyhow::{Context, Result};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncBufRead;

use crate::config::ClauderConfig;
use crate::lifecycle::{generate_instance_id, InstanceManager};
use crate::protocol::{Engine, Output};
use crate::store::Store;
use crate::tools::ToolHandlers;

/// Why the serve loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfInput,
    Signal(&'static str),
}

#[derive(Debug)]
pub struct ServeOutcome {
    pub instance_id: String,
    pub reason: StopReason,
}

/// Open the shared store. Failure here is fatal for every entry point.
pub fn open_store(config: &ClauderConfig) -> Result<Arc<Store>> {
    let db_path = config.resolved_db_path();
    let store = Store::open(&db_path, config.storage.busy_timeout())
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    tracing::info!(db = %db_path.display(), "database ready");
    Ok(Arc::new(store))
}

/// Serve on stdin/stdout, stopping on end of input, SIGINT or SIGTERM.
pub async fn serve_stdio(config: ClauderConfig) -> Result<ServeOutcome> {
    tracing::info!("starting clauder on stdio");

    let work_dir = std::env::current_dir().context("failed to determine working directory")?;
    let input = tokio::io::BufReader::new(tokio::io::stdin());

    serve(config, &work_dir, input, Output::stdout(), shutdown_signal()).await
}

/// Run one daemon session over the given streams.
///
/// `shutdown` resolving ends the session early; the heartbeat is stopped and
/// awaited before the instance is unregistered.
pub async fn serve<R, F>(
    config: ClauderConfig,
    work_dir: &Path,
    input: R,
    output: Output,
    shutdown: F,
) -> Result<ServeOutcome>
where
    R: AsyncBufRead + Unpin,
    F: Future<Output = &'static str>,
{
    let store = open_store(&config)?;
    let work_dir = work_dir.to_string_lossy().into_owned();
    let instance_id = generate_instance_id();

    let manager = InstanceManager::new(Arc::clone(&store), config.instances.stale_after());
    {
        let manager = manager.clone();
        let id = instance_id.clone();
        let dir = work_dir.clone();
        tokio::task::spawn_blocking(move || manager.register(&id, std::process::id(), &dir))
            .await
            .context("registration task failed")?
            .context("failed to register instance")?;
    }
    let heartbeat =
        manager.spawn_heartbeat(instance_id.clone(), config.instances.heartbeat_interval());

    let handlers = ToolHandlers::new(
        store,
        manager.clone(),
        instance_id.clone(),
        work_dir,
        config.limits.clone(),
    );
    let engine = Engine::new(Arc::new(handlers), output);
    tracing::info!(instance = %instance_id, "waiting for client");

    let result = tokio::select! {
        res = engine.run(input) => res.map(|()| StopReason::EndOfInput),
        signal = shutdown => {
            tracing::info!(signal, "shutdown requested");
            Ok(StopReason::Signal(signal))
        }
    };

    let beats = heartbeat.stop().await;
    tracing::debug!(beats, "heartbeat stopped");
    let unregister = {
        let id = instance_id.clone();
        tokio::task::spawn_blocking(move || manager.unregister(&id)).await
    };
    match unregister {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(instance = %instance_id, error = %e, "failed to unregister instance")
        }
        Err(e) => tracing::warn!(instance = %instance_id, error = %e, "unregister task failed"),
    }

    let reason = result?;
    tracing::info!(instance = %instance_id, ?reason, "clauder shut down");
    Ok(ServeOutcome {
        instance_id,
        reason,
    })
}

/// Resolves when the process receives SIGINT or SIGTERM.
pub async fn shutdown_signal() -> &'static str {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => "SIGINT",
        _ = terminate => "SIGTERM",
    }
}
