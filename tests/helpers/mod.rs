#![allow(dead_code)]

use clauder::config::LimitsConfig;
use clauder::lifecycle::InstanceManager;
use clauder::store::Store;
use clauder::tools::ToolHandlers;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const STALE_AFTER: Duration = Duration::from_secs(300);

/// An on-disk store in a private temp directory. The directory lives as long
/// as this value.
pub struct TestStore {
    pub dir: TempDir,
    pub path: PathBuf,
    pub store: Arc<Store>,
}

pub fn test_store() -> TestStore {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clauder.db");
    let store = Arc::new(Store::open(&path, Duration::from_secs(5)).unwrap());
    TestStore { dir, path, store }
}

impl TestStore {
    pub fn manager(&self) -> InstanceManager {
        InstanceManager::new(Arc::clone(&self.store), STALE_AFTER)
    }

    /// Tool handlers acting as instance `id` in directory `work_dir`.
    pub fn handlers(&self, id: &str, work_dir: &str) -> ToolHandlers {
        self.handlers_with_limits(id, work_dir, LimitsConfig::default())
    }

    pub fn handlers_with_limits(&self, id: &str, work_dir: &str, limits: LimitsConfig) -> ToolHandlers {
        ToolHandlers::new(Arc::clone(&self.store), self.manager(), id, work_dir, limits)
    }

    /// A second, independent connection to the same file.
    pub fn raw(&self) -> Connection {
        raw_connection(&self.path)
    }

    /// Push an instance's heartbeat `secs` seconds into the past.
    pub fn backdate_heartbeat(&self, id: &str, secs: i64) {
        let past = chrono::Utc::now() - chrono::TimeDelta::seconds(secs);
        let ts = past.to_rfc3339_opts(chrono::SecondsFormat::Micros, true);
        self.raw()
            .execute(
                "UPDATE instances SET last_heartbeat = ?1 WHERE id = ?2",
                params![ts, id],
            )
            .unwrap();
    }

    pub fn count_rows(&self, table: &str) -> i64 {
        self.raw()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }
}

pub fn raw_connection(path: &Path) -> Connection {
    let conn = Connection::open(path).unwrap();
    conn.busy_timeout(Duration::from_secs(5)).unwrap();
    conn
}

pub fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
