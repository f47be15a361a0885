//! # Personas CLI (`personas`)
//!
//! ## Usage
//!
//! ```bash
//! personas --config ./config/personas.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `personas init` | Create the SQLite database and schema |
//! | `personas import <file>` | Load personas from a JSON array file |
//! | `personas get <id>` | Print one persona as JSON |
//! | `personas query "<text>"` | Answer a natural-language query |
//! | `personas serve` | Start the HTTP server |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use personas_query::{config, get, import, migrate, query, server};

/// Natural-language queries over stored personas.
#[derive(Parser)]
#[command(name = "personas", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/personas.toml")]
    config: PathBuf,

    /// Default log filter when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Safe to run repeatedly.
    Init,

    /// Import personas from a JSON file (array of objects).
    ///
    /// Existing ids are updated in place. Each record is reported to the
    /// log service when one is configured.
    Import {
        /// Path to the JSON file.
        file: PathBuf,
    },

    /// Print a persona by id.
    Get {
        /// Persona id (by default its `numero_documento`).
        id: String,
    },

    /// Answer a natural-language query and print the result as JSON.
    Query {
        /// The query text.
        query: String,
    },

    /// Start the HTTP server on `[server].bind`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Credentials may come from a local .env file.
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import { file } => {
            let count = import::run_import(&cfg, &file).await?;
            println!("Imported {} personas.", count);
        }
        Commands::Get { id } => {
            get::run_get(&cfg, &id).await?;
        }
        Commands::Query { query } => {
            query::run_query(&cfg, &query).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
