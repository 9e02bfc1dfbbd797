//! Larder - recipe management service.
//!
//! Stores structured recipes and turns unstructured text into reviewed
//! recipes through a staged ingestion workflow: extract (in-process LLM or
//! out-of-process import pipeline), stage for review, confirm to commit.

mod cli;
mod config;
mod dictionary;
mod events;
mod llm;
mod models;
mod repository;
mod schema;
mod server;
mod service;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "larder=debug"
    } else {
        "larder=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
