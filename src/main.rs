use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clauder::cli;
use clauder::config::ClauderConfig;
use clauder::server::{self, StopReason};

#[derive(Parser)]
#[command(
    name = "clauder",
    version,
    about = "Shared memory and messaging for concurrent agent sessions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the JSON-RPC daemon on stdin/stdout
    Serve,
    /// Store a fact for the current directory
    Remember {
        /// Fact text (words are joined with spaces)
        #[arg(required = true)]
        fact: Vec<String>,
        /// Tags to attach (repeatable or comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Search stored facts
    Recall {
        /// Full-text query (words are joined with spaces)
        query: Vec<String>,
        /// Only facts carrying all of these tags
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Maximum number of facts to show
        #[arg(short = 'n', long)]
        limit: Option<i64>,
        /// Only facts from the current directory
        #[arg(short, long)]
        local: bool,
    },
    /// Delete a fact by id
    Forget { id: i64 },
    /// List running instances
    Instances,
    /// Send a message to a running instance
    Send {
        instance_id: String,
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Show an instance's messages without marking them read
    Messages {
        instance_id: String,
        /// Include messages that were already read
        #[arg(short, long)]
        all: bool,
    },
    /// Show stored facts and live instances
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = ClauderConfig::load()?;

    // stdout carries JSON-RPC; logs go to stderr.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match args.command {
        Command::Serve => {
            let outcome = server::serve_stdio(config).await?;
            if let StopReason::Signal(_) = outcome.reason {
                // The stdin reader thread is still blocked; don't wait for it.
                std::process::exit(0);
            }
        }
        Command::Remember { fact, tags } => {
            cli::facts::remember(&config, &fact.join(" "), &tags)?;
        }
        Command::Recall {
            query,
            tags,
            limit,
            local,
        } => {
            let limit = limit.unwrap_or(config.limits.recall_default_limit);
            cli::facts::recall(&config, &query.join(" "), &tags, limit, local)?;
        }
        Command::Forget { id } => cli::facts::forget(&config, id)?,
        Command::Instances => cli::mailbox::instances(&config)?,
        Command::Send {
            instance_id,
            message,
        } => cli::mailbox::send(&config, &instance_id, &message.join(" "))?,
        Command::Messages { instance_id, all } => {
            cli::mailbox::messages(&config, &instance_id, all)?;
        }
        Command::Status => cli::status::status(&config)?,
    }

    Ok(())
}
