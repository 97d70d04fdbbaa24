use anyhow::{bail, Result};

use super::CLI_SENDER;
use crate::config::ClauderConfig;
use crate::lifecycle::InstanceManager;
use crate::server::open_store;
use crate::tools::get_messages::render_messages;
use crate::tools::{local_time, send_message};

/// List live instances after reclaiming stale ones.
pub fn instances(config: &ClauderConfig) -> Result<()> {
    let store = open_store(config)?;
    let manager = InstanceManager::new(store, config.instances.stale_after());
    let instances = manager.live_instances()?;

    if instances.is_empty() {
        println!("No running instances found.");
        return Ok(());
    }

    println!("Found {} running instance(s):\n", instances.len());
    for inst in &instances {
        println!("{}", inst.id);
        println!("  PID: {}", inst.pid);
        println!("  Directory: {}", inst.directory);
        println!("  Started: {}", local_time(inst.started_at, "%Y-%m-%d %H:%M:%S"));
        println!("  Last heartbeat: {}\n", local_time(inst.last_heartbeat, "%H:%M:%S"));
    }
    Ok(())
}

/// Send a message from the terminal to a registered instance.
pub fn send(config: &ClauderConfig, to: &str, content: &str) -> Result<()> {
    send_message::validate(&config.limits, to, content)?;

    let store = open_store(config)?;
    let manager = InstanceManager::new(store.clone(), config.instances.stale_after());
    if manager.find(to)?.is_none() {
        bail!("instance '{to}' not found");
    }

    let msg = store.send_message(CLI_SENDER, to, content)?;
    println!("Message #{} sent to {}", msg.id, to);
    Ok(())
}

/// Show an instance's mailbox without marking anything read.
pub fn messages(config: &ClauderConfig, instance_id: &str, all: bool) -> Result<()> {
    let store = open_store(config)?;
    let messages = store.get_messages(instance_id, !all)?;
    println!("{}", render_messages(&messages, !all).trim_end());
    Ok(())
}
