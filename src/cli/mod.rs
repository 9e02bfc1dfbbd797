//! Command-line interface.

use clap::{Parser, Subcommand};

use crate::config::Settings;
use crate::repository::{run_migrations, SqlitePool};
use crate::server;

#[derive(Parser)]
#[command(name = "larder")]
#[command(about = "Recipe management service with staged ingestion")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Run pending database migrations and exit
    Migrate,

    /// Start the HTTP server (runs migrations first)
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env();
    let pool = SqlitePool::new(&settings.database_url);

    match cli.command {
        Commands::Migrate => {
            run_migrations(pool.database_url()).await?;
            println!("Database is up to date");
            Ok(())
        }
        Commands::Serve { host, port } => {
            run_migrations(pool.database_url()).await?;
            server::serve(&settings, &host, port).await
        }
    }
}
