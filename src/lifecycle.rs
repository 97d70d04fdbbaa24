//! Instance lifecycle: registration, liveness, and stale-instance reclamation.
//!
//! Every policy decision about instances lives here. The staleness threshold is
//! one value shared by listing and by the cleanup a daemon runs before it
//! registers itself, and registration always overwrites.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::store::{Instance, Result, Store};

/// Instance ids are this many hex characters of a random UUID.
const INSTANCE_ID_LEN: usize = 8;

/// Generate a short opaque instance id.
pub fn generate_instance_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(INSTANCE_ID_LEN);
    id
}

/// Coordinates instance records in the store.
#[derive(Clone)]
pub struct InstanceManager {
    store: Arc<Store>,
    stale_after: Duration,
}

impl InstanceManager {
    pub fn new(store: Arc<Store>, stale_after: Duration) -> Self {
        Self { store, stale_after }
    }

    /// Reclaim stale rows, then register `id`. A previous row with the same id
    /// is silently replaced.
    pub fn register(&self, id: &str, pid: u32, directory: &str) -> Result<()> {
        self.store.cleanup_stale_instances(self.stale_after)?;
        self.store.register_instance(id, pid, directory)?;
        tracing::info!(instance = id, pid, directory, "instance registered");
        Ok(())
    }

    /// List instances, most recently started first. Stale rows are reclaimed
    /// first when possible; a failed cleanup is logged and the listing goes on.
    pub fn live_instances(&self) -> Result<Vec<Instance>> {
        if let Err(e) = self.store.cleanup_stale_instances(self.stale_after) {
            tracing::warn!(error = %e, "stale instance cleanup failed");
        }
        self.store.get_instances()
    }

    pub fn find(&self, id: &str) -> Result<Option<Instance>> {
        self.store.get_instance(id)
    }

    pub fn heartbeat(&self, id: &str) -> Result<()> {
        self.store.heartbeat(id)
    }

    pub fn unregister(&self, id: &str) -> Result<()> {
        self.store.unregister_instance(id)?;
        tracing::info!(instance = id, "instance unregistered");
        Ok(())
    }

    /// Start the periodic heartbeat for `id`.
    pub fn spawn_heartbeat(&self, id: String, interval: Duration) -> HeartbeatTask {
        HeartbeatTask::spawn(self.clone(), id, interval)
    }
}

/// Handle to a running heartbeat loop.
///
/// [`HeartbeatTask::stop`] resolves only once the loop has exited, so a caller
/// that stops the task before unregistering never races an in-flight beat.
/// Dropping the handle also ends the loop at its next wake-up.
pub struct HeartbeatTask {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<u64>,
}

impl HeartbeatTask {
    fn spawn(manager: InstanceManager, id: String, interval: Duration) -> Self {
        let (stop, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut beats = 0u64;

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        let manager = manager.clone();
                        let id = id.clone();
                        match tokio::task::spawn_blocking(move || manager.heartbeat(&id)).await {
                            Ok(Ok(())) => beats += 1,
                            Ok(Err(e)) => tracing::warn!(error = %e, "heartbeat failed"),
                            Err(e) => tracing::warn!(error = %e, "heartbeat task failed"),
                        }
                    }
                }
            }

            tracing::debug!(instance = %id, beats, "heartbeat stopped");
            beats
        });

        Self { stop, handle }
    }

    /// Stop the loop and wait for it to finish. Returns the number of
    /// successful heartbeats written.
    pub async fn stop(self) -> u64 {
        // The loop may already have exited; a closed channel is fine.
        let _ = self.stop.send(());
        match self.handle.await {
            Ok(beats) => beats,
            Err(e) => {
                tracing::warn!(error = %e, "heartbeat task did not shut down cleanly");
                0
            }
        }
    }
}
