//! Shared memory and messaging for concurrent agent sessions.
//!
//! Each session runs a `clauder serve` daemon that speaks line-delimited
//! JSON-RPC on stdio. All daemons, and the one-shot CLI commands, share one
//! SQLite database holding:
//!
//! - **facts**: tagged text scoped to the directory it was stored from, with
//!   an FTS5 index for literal full-text search
//! - **instances**: live daemons, kept fresh by a heartbeat and reclaimed once
//!   stale
//! - **messages**: per-instance mailboxes, marked read on retrieval
//!
//! # Modules
//!
//! - [`config`]: TOML configuration and environment overrides
//! - [`db`]: connection setup, schema and migrations
//! - [`store`]: the persistent store shared by every entry point
//! - [`lifecycle`]: instance registration, staleness and heartbeat
//! - [`tools`]: the six tools exposed to clients
//! - [`protocol`]: the JSON-RPC engine
//! - [`server`]: daemon wiring for `serve`

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod protocol;
pub mod server;
pub mod store;
pub mod tools;
