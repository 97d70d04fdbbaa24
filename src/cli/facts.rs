use anyhow::Result;

use super::current_dir;
use crate::config::ClauderConfig;
use crate::server::open_store;
use crate::store::FactFilter;
use crate::tools::recall::render_facts;
use crate::tools::remember::validate as validate_fact;

/// Store a fact scoped to the current directory.
pub fn remember(config: &ClauderConfig, fact: &str, tags: &[String]) -> Result<()> {
    validate_fact(&config.limits, fact, tags)?;

    let store = open_store(config)?;
    let stored = store.add_fact(fact, tags, &current_dir()?)?;
    println!("Stored fact #{}", stored.id);
    Ok(())
}

/// Search stored facts and print them.
pub fn recall(
    config: &ClauderConfig,
    query: &str,
    tags: &[String],
    limit: i64,
    local_only: bool,
) -> Result<()> {
    let store = open_store(config)?;
    let dir = if local_only { current_dir()? } else { String::new() };

    let facts = store.get_facts(&FactFilter {
        query,
        tags,
        source_dir: &dir,
        limit,
    })?;
    println!("{}", render_facts(&facts).trim_end());
    Ok(())
}

/// Delete a fact. Deleting a missing fact is not an error.
pub fn forget(config: &ClauderConfig, id: i64) -> Result<()> {
    let store = open_store(config)?;
    if store.get_fact_by_id(id)?.is_none() {
        println!("Fact #{id} does not exist.");
        return Ok(());
    }
    store.delete_fact(id)?;
    println!("Deleted fact #{id}");
    Ok(())
}
