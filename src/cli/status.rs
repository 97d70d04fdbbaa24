use anyhow::Result;

use super::current_dir;
use crate::config::ClauderConfig;
use crate::lifecycle::InstanceManager;
use crate::server::open_store;

/// Print fact counts and live instances.
pub fn status(config: &ClauderConfig) -> Result<()> {
    let db_path = config.resolved_db_path();
    let work_dir = current_dir()?;
    let store = open_store(config)?;

    let total = store.count_facts("")?;
    let local = store.count_facts(&work_dir)?;
    let manager = InstanceManager::new(store, config.instances.stale_after());
    let instances = manager.live_instances()?;

    println!("Clauder Status");
    println!("{}", "=".repeat(40));
    println!("Database:          {}", db_path.display());
    println!("Working directory: {work_dir}");
    println!();

    println!("Facts");
    println!("  Total:                  {total}");
    println!("  Local (this directory): {local}");
    println!();

    println!("Instances");
    println!("  Running: {}", instances.len());
    for inst in &instances {
        println!("  {} - {}", inst.id, inst.directory);
    }

    Ok(())
}
