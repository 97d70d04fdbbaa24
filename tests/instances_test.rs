mod helpers;

use clauder::lifecycle::InstanceManager;
use clauder::store::Store;
use helpers::{test_store, STALE_AFTER};
use std::sync::Arc;
use std::time::Duration;

#[test]
fn register_then_get() {
    let ts = test_store();
    ts.store.register_instance("aaaa1111", 4242, "/proj").unwrap();

    let inst = ts.store.get_instance("aaaa1111").unwrap().unwrap();
    assert_eq!(inst.pid, 4242);
    assert_eq!(inst.directory, "/proj");
    assert_eq!(inst.started_at, inst.last_heartbeat);
}

#[test]
fn heartbeat_moves_forward() {
    let ts = test_store();
    ts.store.register_instance("aaaa1111", 1, "/proj").unwrap();
    let before = ts.store.get_instance("aaaa1111").unwrap().unwrap();

    std::thread::sleep(Duration::from_millis(5));
    ts.store.heartbeat("aaaa1111").unwrap();

    let after = ts.store.get_instance("aaaa1111").unwrap().unwrap();
    assert!(after.last_heartbeat > before.last_heartbeat);
    assert_eq!(after.started_at, before.started_at);
}

#[test]
fn live_listing_reclaims_stale_instances() {
    let ts = test_store();
    let manager = ts.manager();
    manager.register("fresh001", 1, "/a").unwrap();
    manager.register("stale001", 2, "/b").unwrap();
    ts.backdate_heartbeat("stale001", 10 * 60);

    let live: Vec<String> = manager
        .live_instances()
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(live, vec!["fresh001".to_string()]);
    assert_eq!(ts.count_rows("instances"), 1);
}

#[test]
fn live_listing_survives_a_failed_cleanup() {
    let ts = test_store();
    // Short timeout so the blocked cleanup gives up quickly.
    let store = Arc::new(Store::open(&ts.path, Duration::from_millis(50)).unwrap());
    let manager = InstanceManager::new(Arc::clone(&store), STALE_AFTER);
    manager.register("aaaa1111", 1, "/a").unwrap();
    manager.register("bbbb2222", 2, "/b").unwrap();

    // Another writer holds the write lock; readers still get through in WAL mode.
    let writer = ts.raw();
    writer.execute_batch("BEGIN IMMEDIATE").unwrap();
    assert!(store.cleanup_stale_instances(STALE_AFTER).is_err());

    let live = manager.live_instances().unwrap();
    assert_eq!(live.len(), 2);

    writer.execute_batch("ROLLBACK").unwrap();
}

#[test]
fn instance_just_inside_the_window_survives() {
    let ts = test_store();
    ts.store.register_instance("edge0001", 1, "/a").unwrap();
    ts.backdate_heartbeat("edge0001", 4 * 60);

    let removed = ts
        .store
        .cleanup_stale_instances(Duration::from_secs(300))
        .unwrap();
    assert_eq!(removed, 0);
    assert!(ts.store.get_instance("edge0001").unwrap().is_some());
}

#[test]
fn registering_cleans_up_before_insert() {
    let ts = test_store();
    let manager = ts.manager();
    manager.register("old00001", 1, "/a").unwrap();
    ts.backdate_heartbeat("old00001", 3600);

    manager.register("new00001", 2, "/b").unwrap();
    assert!(ts.store.get_instance("old00001").unwrap().is_none());
    assert!(ts.store.get_instance("new00001").unwrap().is_some());
}

#[test]
fn listing_is_most_recent_start_first() {
    let ts = test_store();
    ts.store.register_instance("first001", 1, "/a").unwrap();
    std::thread::sleep(Duration::from_millis(5));
    ts.store.register_instance("second01", 2, "/b").unwrap();

    let ids: Vec<String> = ts
        .store
        .get_instances()
        .unwrap()
        .into_iter()
        .map(|i| i.id)
        .collect();
    assert_eq!(ids, vec!["second01".to_string(), "first001".to_string()]);
}

#[tokio::test]
async fn heartbeat_task_keeps_instance_alive_then_stops() {
    let ts = test_store();
    let manager = ts.manager();
    manager.register("beat0001", 1, "/a").unwrap();
    ts.backdate_heartbeat("beat0001", 120);
    let stale = ts.store.get_instance("beat0001").unwrap().unwrap();

    let task = manager.spawn_heartbeat("beat0001".into(), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(120)).await;
    let beats = task.stop().await;
    assert!(beats >= 1);

    let refreshed = ts.store.get_instance("beat0001").unwrap().unwrap();
    assert!(refreshed.last_heartbeat > stale.last_heartbeat);

    // Nothing writes after stop returns.
    manager.unregister("beat0001").unwrap();
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(ts.store.get_instance("beat0001").unwrap().is_none());
}
