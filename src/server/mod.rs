//! HTTP server for the recipe service.
//!
//! Exposes the recipe CRUD surface and the staged ingestion endpoints.
//! All state is shared through [`AppState`]; handlers stay thin and defer
//! lifecycle decisions to the service layer.

mod error;
mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::config::Settings;
use crate::dictionary::{DictionaryResolver, IngredientResolver};
use crate::events::{ImportedSubscriber, LapinImportPublisher};
use crate::llm::LlmExtractor;
use crate::repository::{RecipeRepository, SqlitePool};
use crate::service::{QueuedExtraction, RecipeService, SyncExtraction};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RecipeService>,
    pub recipes: RecipeRepository,
}

impl AppState {
    /// Wire up the service from settings.
    ///
    /// `AMQP_URL` selects the extraction strategy: set, ingestion is queued
    /// to the import pipeline; unset, the LLM extractor runs in-process.
    pub async fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let pool = SqlitePool::new(&settings.database_url);

        let resolver: Option<Arc<dyn IngredientResolver>> = settings
            .dictionary_url
            .as_deref()
            .map(|url| Arc::new(DictionaryResolver::new(url)) as Arc<dyn IngredientResolver>);

        let strategy: Arc<dyn crate::service::ExtractionStrategy> = match &settings.amqp_url {
            Some(url) => {
                let publisher = LapinImportPublisher::connect(url).await?;
                info!("ingestion strategy: queued via import pipeline");
                Arc::new(QueuedExtraction::new(Arc::new(publisher)))
            }
            None => {
                info!(model = %settings.llm.model, "ingestion strategy: in-process extraction");
                Arc::new(SyncExtraction::new(Arc::new(LlmExtractor::new(
                    settings.llm.clone(),
                ))))
            }
        };

        let service = Arc::new(RecipeService::new(pool.clone(), resolver, strategy));

        Ok(Self {
            service,
            recipes: RecipeRepository::new(pool),
        })
    }
}

/// Start the web server (and the import subscriber when a broker is set).
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::from_settings(settings).await?;

    if let Some(url) = &settings.amqp_url {
        let subscriber = ImportedSubscriber::connect(url, state.service.clone()).await?;
        tokio::spawn(async move {
            if let Err(e) = subscriber.run().await {
                tracing::error!(error = %e, "import subscriber stopped");
            }
        });
    }

    let app = create_router(state);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
