//! Ingestion orchestration.
//!
//! Owns the job lifecycle (pending → processing → staged | failed, then
//! staged → confirmed) and the confirm transaction that turns a staged
//! payload into real recipe rows. Stored staged payloads are re-validated
//! before every transition; stale or hand-edited rows never bypass checks.

mod strategy;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use diesel_async::AsyncConnection;
use tracing::{info, warn};
use uuid::Uuid;

pub use strategy::{ExtractionStrategy, QueuedExtraction, SyncExtraction};

use crate::dictionary::{IngredientResolver, ResolveError};
use crate::events::{ImportedEvent, ImportedEventHandler, PublishError};
use crate::llm::ExtractError;
use crate::models::{IngestionJob, JobStatus, JobType, RecipeDetail, StagedRecipe};
use crate::repository::diesel_models::{NewRecipe, NewRecipeIngredient, NewRecipeStep};
use crate::repository::pool::to_db_error;
use crate::repository::recipes::{insert_ingredient, insert_recipe, insert_step};
use crate::repository::{DbError, JobRepository, RecipeRepository, SqlitePool};

/// Errors from ingestion operations, mapped to HTTP statuses at the edge.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("ingestion job not found")]
    JobNotFound,
    #[error("recipe not found")]
    RecipeNotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("unsupported import status {0:?}")]
    UnsupportedStatus(String),
    #[error("malformed staged payload: {0}")]
    MalformedStagedData(String),
    #[error("no ingredient resolver configured")]
    ResolverUnavailable,
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),
    #[error("ingredient resolution failed: {0}")]
    Resolution(#[from] ResolveError),
    #[error("publish failed: {0}")]
    Publish(#[from] PublishError),
    #[error("database error: {0}")]
    Database(#[from] DbError),
}

/// Orchestrates ingestion jobs and the staged → confirmed commit.
pub struct RecipeService {
    pool: SqlitePool,
    jobs: JobRepository,
    recipes: RecipeRepository,
    resolver: Option<Arc<dyn IngredientResolver>>,
    strategy: Arc<dyn ExtractionStrategy>,
}

impl RecipeService {
    pub fn new(
        pool: SqlitePool,
        resolver: Option<Arc<dyn IngredientResolver>>,
        strategy: Arc<dyn ExtractionStrategy>,
    ) -> Self {
        Self {
            jobs: JobRepository::new(pool.clone()),
            recipes: RecipeRepository::new(pool.clone()),
            pool,
            resolver,
            strategy,
        }
    }

    /// Submit raw input for ingestion.
    ///
    /// Creates a pending job, then hands it to the configured strategy.
    pub async fn ingest(
        &self,
        job_type: JobType,
        raw_input: &str,
    ) -> Result<IngestionJob, ServiceError> {
        if raw_input.trim().is_empty() {
            return Err(ServiceError::Validation(
                "raw_input must not be empty".to_string(),
            ));
        }

        let job = self.jobs.create(job_type, raw_input).await?;
        info!(job_id = %job.id, job_type = job.job_type.as_str(), "ingestion job created");
        self.strategy.begin(&self.jobs, &job).await
    }

    /// Fetch a job by id.
    pub async fn get_job(&self, id: Uuid) -> Result<IngestionJob, ServiceError> {
        self.jobs.get(id).await?.ok_or(ServiceError::JobNotFound)
    }

    /// Confirm a staged job, committing its payload as a recipe.
    ///
    /// The recipe row, its steps, and its ingredients (resolving names
    /// against the dictionary as needed) are written in one transaction.
    /// Any failure inside rolls the whole commit back and leaves the job
    /// staged, so confirm can be retried.
    pub async fn confirm(&self, id: Uuid) -> Result<RecipeDetail, ServiceError> {
        let job = self.get_job(id).await?;
        if job.status != JobStatus::Staged {
            return Err(ServiceError::Conflict(format!(
                "job is {}, only staged jobs can be confirmed",
                job.status.as_str()
            )));
        }

        let payload = job
            .staged_data
            .as_deref()
            .ok_or_else(|| ServiceError::MalformedStagedData("staged job has no payload".to_string()))?;
        let staged = parse_staged_payload(payload)?;

        let recipe_id = self.commit_staged(&staged).await?;

        // The recipe is durably committed at this point. A failure to flip
        // the job to confirmed leaves it staged, where a retried confirm
        // would duplicate the recipe, so we log loudly but do not unwind.
        match self.jobs.set_status(id, JobStatus::Confirmed).await {
            Ok(Some(_)) => {}
            Ok(None) => warn!(job_id = %id, "job disappeared while confirming"),
            Err(e) => warn!(job_id = %id, error = %e, "recipe committed but job not marked confirmed"),
        }

        info!(job_id = %id, recipe_id = %recipe_id, "staged recipe confirmed");
        self.recipes
            .get_detail(recipe_id)
            .await?
            .ok_or(ServiceError::RecipeNotFound)
    }

    /// Write the staged payload as recipe rows in a single transaction.
    async fn commit_staged(&self, staged: &StagedRecipe) -> Result<Uuid, ServiceError> {
        // Unresolved ingredient names need the dictionary; refuse up front
        // rather than half-way through a transaction.
        if self.resolver.is_none() && staged.ingredients.iter().any(|i| i.ingredient_id.is_none()) {
            return Err(ServiceError::ResolverUnavailable);
        }

        let recipe_id = Uuid::new_v4();
        let id_str = recipe_id.to_string();
        let now = Utc::now().to_rfc3339();
        let tags_json = serde_json::to_string(&staged.tags).map_err(to_db_error)?;
        let resolver = self.resolver.clone();

        let mut conn = self.pool.get().await?;
        conn.transaction::<_, ServiceError, _>(|conn| {
            let id_str = id_str.clone();
            let now = now.clone();
            let tags_json = tags_json.clone();
            Box::pin(async move {
                insert_recipe(
                    conn,
                    &NewRecipe {
                        id: &id_str,
                        title: &staged.title,
                        description: staged.description.as_deref(),
                        source_url: staged.source_url.as_deref(),
                        servings: staged.servings,
                        prep_minutes: staged.prep_minutes,
                        cook_minutes: staged.cook_minutes,
                        tags: &tags_json,
                        created_at: &now,
                        updated_at: &now,
                    },
                )
                .await?;

                for (i, instruction) in staged.steps.iter().enumerate() {
                    insert_step(
                        conn,
                        &NewRecipeStep {
                            recipe_id: &id_str,
                            step_number: i as i32 + 1,
                            instruction,
                        },
                    )
                    .await?;
                }

                for ing in &staged.ingredients {
                    let ingredient_id = match ing.ingredient_id {
                        Some(id) => id,
                        None => {
                            let resolver =
                                resolver.as_ref().ok_or(ServiceError::ResolverUnavailable)?;
                            resolver.resolve(&ing.name).await?
                        }
                    };
                    let ingredient_id = ingredient_id.to_string();
                    insert_ingredient(
                        conn,
                        &NewRecipeIngredient {
                            recipe_id: &id_str,
                            ingredient_id: &ingredient_id,
                            quantity: ing.quantity,
                            unit: ing.unit.as_deref(),
                            is_optional: ing.is_optional,
                            preparation_notes: ing.preparation_notes.as_deref(),
                        },
                    )
                    .await?;
                }

                Ok(())
            })
        })
        .await?;

        Ok(recipe_id)
    }

    /// Apply a `recipe.imported` result from the extraction pipeline.
    ///
    /// Missing or blank status means staged. A staged result without a
    /// valid payload fails the job instead of erroring, so a broken
    /// pipeline message cannot be redelivered forever. Unknown statuses
    /// are rejected without touching the job.
    ///
    /// Delivery is at-least-once, so a result may arrive for a job that
    /// already reached a terminal state. Terminal jobs are left untouched
    /// and the event is swallowed; re-staging a confirmed job would let a
    /// second confirm commit its recipe twice.
    pub async fn handle_imported(&self, event: ImportedEvent) -> Result<(), ServiceError> {
        let job = self
            .jobs
            .get(event.job_id)
            .await?
            .ok_or(ServiceError::JobNotFound)?;
        if job.status.is_terminal() {
            warn!(
                job_id = %event.job_id,
                status = job.status.as_str(),
                "dropping import result for terminal job"
            );
            return Ok(());
        }

        match event.effective_status() {
            "failed" => {
                self.jobs
                    .mark_failed(event.job_id)
                    .await?
                    .ok_or(ServiceError::JobNotFound)?;
                info!(
                    job_id = %event.job_id,
                    error = event.error.as_deref().unwrap_or("unspecified"),
                    "import pipeline reported failure"
                );
                Ok(())
            }
            "staged" => {
                let payload = event
                    .staged_data
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()
                    .map_err(|e| ServiceError::MalformedStagedData(e.to_string()))?;

                let valid = payload
                    .as_deref()
                    .map(parse_staged_payload)
                    .transpose();

                match valid {
                    Ok(Some(staged)) => {
                        self.jobs
                            .set_staged(event.job_id, payload.as_deref().unwrap_or_default())
                            .await?
                            .ok_or(ServiceError::JobNotFound)?;
                        info!(job_id = %event.job_id, title = %staged.title, "import result staged");
                        Ok(())
                    }
                    Ok(None) | Err(_) => {
                        warn!(job_id = %event.job_id, "staged import result has no usable payload, failing job");
                        self.jobs
                            .mark_failed(event.job_id)
                            .await?
                            .ok_or(ServiceError::JobNotFound)?;
                        Ok(())
                    }
                }
            }
            other => Err(ServiceError::UnsupportedStatus(other.to_string())),
        }
    }
}

#[async_trait]
impl ImportedEventHandler for RecipeService {
    async fn handle_imported(&self, event: ImportedEvent) -> Result<(), ServiceError> {
        RecipeService::handle_imported(self, event).await
    }
}

/// Parse and validate a staged payload.
///
/// A payload must be a JSON object matching the staged recipe shape with a
/// non-empty title; ingredients without a canonical id must carry a name.
pub(crate) fn parse_staged_payload(json: &str) -> Result<StagedRecipe, ServiceError> {
    let staged: StagedRecipe =
        serde_json::from_str(json).map_err(|e| ServiceError::MalformedStagedData(e.to_string()))?;

    if staged.title.trim().is_empty() {
        return Err(ServiceError::MalformedStagedData(
            "title must not be empty".to_string(),
        ));
    }
    if staged
        .ingredients
        .iter()
        .any(|i| i.ingredient_id.is_none() && i.name.trim().is_empty())
    {
        return Err(ServiceError::MalformedStagedData(
            "ingredient has neither a name nor a canonical id".to_string(),
        ));
    }

    Ok(staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::events::{ImportRequestPublisher, ImportRequestedEvent, NoopImportPublisher};
    use crate::llm::RecipeExtractor;
    use crate::models::{StagedIngredient, StagedRecipe};
    use crate::repository::test_pool;

    struct FakeExtractor {
        result: Result<StagedRecipe, String>,
        calls: AtomicUsize,
    }

    impl FakeExtractor {
        fn staging(staged: StagedRecipe) -> Self {
            Self {
                result: Ok(staged),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(msg: &str) -> Self {
            Self {
                result: Err(msg.to_string()),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl RecipeExtractor for FakeExtractor {
        async fn extract(&self, _raw_text: &str) -> Result<StagedRecipe, ExtractError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map_err(ExtractError::Api)
        }
    }

    struct FakeResolver {
        id: Uuid,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeResolver {
        fn returning(id: Uuid) -> Self {
            Self {
                id,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                id: Uuid::nil(),
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl IngredientResolver for FakeResolver {
        async fn resolve(&self, _name: &str) -> Result<Uuid, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ResolveError::Status(500));
            }
            Ok(self.id)
        }
    }

    struct CapturingPublisher {
        events: Mutex<Vec<ImportRequestedEvent>>,
    }

    impl CapturingPublisher {
        fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ImportRequestPublisher for CapturingPublisher {
        async fn publish(&self, event: ImportRequestedEvent) -> Result<(), PublishError> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    struct FailingPublisher;

    #[async_trait]
    impl ImportRequestPublisher for FailingPublisher {
        async fn publish(&self, _event: ImportRequestedEvent) -> Result<(), PublishError> {
            Err(PublishError::Broker("broker down".to_string()))
        }
    }

    fn sample_staged() -> StagedRecipe {
        StagedRecipe {
            title: "Tomato Soup".to_string(),
            description: Some("Simple soup".to_string()),
            cook_minutes: Some(25),
            tags: vec!["soup".to_string()],
            steps: vec!["chop tomatoes".to_string(), "simmer".to_string()],
            ingredients: vec![
                StagedIngredient {
                    name: "tomato".to_string(),
                    quantity: Some(6.0),
                    ..Default::default()
                },
                StagedIngredient {
                    name: "salt".to_string(),
                    is_optional: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    async fn service_with(
        resolver: Option<Arc<dyn IngredientResolver>>,
        strategy: Arc<dyn ExtractionStrategy>,
    ) -> (RecipeService, tempfile::TempDir) {
        let (pool, dir) = test_pool().await;
        (RecipeService::new(pool, resolver, strategy), dir)
    }

    #[tokio::test]
    async fn test_sync_ingest_stages_job() {
        let extractor = Arc::new(FakeExtractor::staging(sample_staged()));
        let (service, _dir) = service_with(
            None,
            Arc::new(SyncExtraction::new(extractor.clone())),
        )
        .await;

        let job = service.ingest(JobType::TextBlob, "soup text").await.unwrap();
        assert_eq!(job.status, JobStatus::Staged);
        assert_eq!(job.raw_input, "soup text");
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);

        let staged = job.staged_recipe().unwrap().unwrap();
        assert_eq!(staged.title, "Tomato Soup");
        assert_eq!(staged.steps.len(), 2);
    }

    #[tokio::test]
    async fn test_sync_ingest_marks_failed_on_extraction_error() {
        let extractor = Arc::new(FakeExtractor::failing("model unavailable"));
        let (service, _dir) =
            service_with(None, Arc::new(SyncExtraction::new(extractor))).await;

        let job = service.ingest(JobType::TextBlob, "soup text").await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.staged_data.is_none());
    }

    #[tokio::test]
    async fn test_ingest_rejects_blank_input() {
        let (service, _dir) = service_with(
            None,
            Arc::new(SyncExtraction::new(Arc::new(FakeExtractor::staging(
                sample_staged(),
            )))),
        )
        .await;

        let err = service.ingest(JobType::TextBlob, "   \n").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_queued_ingest_publishes_and_stays_pending() {
        let publisher = Arc::new(CapturingPublisher::new());
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(publisher.clone())),
        )
        .await;

        let job = service.ingest(JobType::Url, "https://example.com/r").await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);

        let events = publisher.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].job_id, job.id);
        assert_eq!(events[0].job_type, JobType::Url);
        assert_eq!(events[0].raw_input, "https://example.com/r");
    }

    #[tokio::test]
    async fn test_queued_ingest_fails_job_when_publish_fails() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(FailingPublisher))),
        )
        .await;

        let err = service.ingest(JobType::TextBlob, "text").await.unwrap_err();
        assert!(matches!(err, ServiceError::Publish(_)));
    }

    /// Stage a job directly through the repository for confirm tests.
    async fn staged_job(service: &RecipeService, staged: &StagedRecipe) -> IngestionJob {
        let job = service.jobs.create(JobType::TextBlob, "raw").await.unwrap();
        let json = serde_json::to_string(staged).unwrap();
        service.jobs.set_staged(job.id, &json).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_confirm_commits_recipe_and_marks_confirmed() {
        let canonical = Uuid::new_v4();
        let resolver = Arc::new(FakeResolver::returning(canonical));
        let (service, _dir) = service_with(
            Some(resolver.clone()),
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let job = staged_job(&service, &sample_staged()).await;
        let detail = service.confirm(job.id).await.unwrap();

        assert_eq!(detail.recipe.title, "Tomato Soup");
        assert_eq!(detail.recipe.tags, vec!["soup"]);
        assert_eq!(detail.steps.len(), 2);
        assert_eq!(detail.steps[0].step_number, 1);
        assert_eq!(detail.ingredients.len(), 2);
        assert!(detail.ingredients.iter().all(|i| i.ingredient_id == canonical));
        // One resolve call per unresolved ingredient
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);

        let job = service.get_job(job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Confirmed);
        // Payload is retained on the confirmed job
        assert!(job.staged_data.is_some());
    }

    #[tokio::test]
    async fn test_confirm_skips_resolver_for_preresolved_ingredients() {
        let preresolved = Uuid::new_v4();
        let resolver = Arc::new(FakeResolver::returning(Uuid::new_v4()));
        let (service, _dir) = service_with(
            Some(resolver.clone()),
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let mut staged = sample_staged();
        staged.ingredients = vec![StagedIngredient {
            name: "tomato".to_string(),
            ingredient_id: Some(preresolved),
            ..Default::default()
        }];

        let job = staged_job(&service, &staged).await;
        let detail = service.confirm(job.id).await.unwrap();

        assert_eq!(detail.ingredients[0].ingredient_id, preresolved);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_confirm_rolls_back_on_resolution_failure() {
        let (service, _dir) = service_with(
            Some(Arc::new(FakeResolver::failing())),
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let job = staged_job(&service, &sample_staged()).await;
        let err = service.confirm(job.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Resolution(_)));

        // Nothing committed and the job stayed staged, so confirm can retry
        assert_eq!(service.recipes.count().await.unwrap(), 0);
        let job = service.get_job(job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Staged);
    }

    #[tokio::test]
    async fn test_confirm_without_resolver_for_unresolved_ingredients() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let job = staged_job(&service, &sample_staged()).await;
        let err = service.confirm(job.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::ResolverUnavailable));
        assert_eq!(service.recipes.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_confirm_rejects_non_staged_job() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let job = service.jobs.create(JobType::TextBlob, "raw").await.unwrap();
        let err = service.confirm(job.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        // Confirming twice conflicts the second time
        let json = serde_json::to_string(&StagedRecipe {
            title: "Toast".to_string(),
            ..Default::default()
        })
        .unwrap();
        service.jobs.set_staged(job.id, &json).await.unwrap();
        service.confirm(job.id).await.unwrap();
        let err = service.confirm(job.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_confirm_unknown_job() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let err = service.confirm(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::JobNotFound));
    }

    #[tokio::test]
    async fn test_confirm_rejects_corrupt_payload() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let job = service.jobs.create(JobType::TextBlob, "raw").await.unwrap();
        service.jobs.set_staged(job.id, "not json").await.unwrap();

        let err = service.confirm(job.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::MalformedStagedData(_)));
        // Job is untouched so an operator can inspect it
        let job = service.get_job(job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Staged);
    }

    #[tokio::test]
    async fn test_handle_imported_stages_job() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let job = service.jobs.create(JobType::TextBlob, "raw").await.unwrap();
        let event = ImportedEvent {
            job_id: job.id,
            staged_data: Some(serde_json::to_value(sample_staged()).unwrap()),
            ..Default::default()
        };
        service.handle_imported(event).await.unwrap();

        let job = service.get_job(job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Staged);
        let staged = job.staged_recipe().unwrap().unwrap();
        assert_eq!(staged.title, "Tomato Soup");
    }

    #[tokio::test]
    async fn test_handle_imported_failure_is_unconditional() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let job = staged_job(&service, &sample_staged()).await;
        let event = ImportedEvent {
            job_id: job.id,
            status: Some("failed".to_string()),
            error: Some("pipeline exploded".to_string()),
            ..Default::default()
        };
        service.handle_imported(event).await.unwrap();

        let job = service.get_job(job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.staged_data.is_none());
    }

    #[tokio::test]
    async fn test_redelivered_result_cannot_reopen_confirmed_job() {
        let (service, _dir) = service_with(
            Some(Arc::new(FakeResolver::returning(Uuid::new_v4()))),
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let job = service.jobs.create(JobType::TextBlob, "raw").await.unwrap();
        let event = ImportedEvent {
            job_id: job.id,
            staged_data: Some(serde_json::to_value(sample_staged()).unwrap()),
            ..Default::default()
        };
        service.handle_imported(event.clone()).await.unwrap();
        service.confirm(job.id).await.unwrap();
        assert_eq!(service.recipes.count().await.unwrap(), 1);

        // At-least-once delivery: the same staged result arrives again.
        // It is swallowed and the job stays confirmed.
        service.handle_imported(event).await.unwrap();
        let job_after = service.get_job(job.id).await.unwrap();
        assert_eq!(job_after.status, JobStatus::Confirmed);

        // The commit cannot run a second time
        let err = service.confirm(job.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(service.recipes.count().await.unwrap(), 1);

        // A late failure result does not reopen the job either
        service
            .handle_imported(ImportedEvent {
                job_id: job.id,
                status: Some("failed".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(
            service.get_job(job.id).await.unwrap().status,
            JobStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_handle_imported_unknown_job() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let event = ImportedEvent {
            job_id: Uuid::new_v4(),
            ..Default::default()
        };
        let err = service.handle_imported(event).await.unwrap_err();
        assert!(matches!(err, ServiceError::JobNotFound));
    }

    #[tokio::test]
    async fn test_handle_imported_unsupported_status() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        let job = service.jobs.create(JobType::TextBlob, "raw").await.unwrap();
        let event = ImportedEvent {
            job_id: job.id,
            status: Some("confirmed".to_string()),
            ..Default::default()
        };
        let err = service.handle_imported(event).await.unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedStatus(_)));

        // The job was not mutated
        let job = service.get_job(job.id).await.unwrap();
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn test_handle_imported_invalid_payload_fails_job() {
        let (service, _dir) = service_with(
            None,
            Arc::new(QueuedExtraction::new(Arc::new(NoopImportPublisher))),
        )
        .await;

        // Missing payload entirely
        let job = service.jobs.create(JobType::TextBlob, "raw").await.unwrap();
        service
            .handle_imported(ImportedEvent {
                job_id: job.id,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(service.get_job(job.id).await.unwrap().status, JobStatus::Failed);

        // Payload without a title
        let job = service.jobs.create(JobType::TextBlob, "raw").await.unwrap();
        service
            .handle_imported(ImportedEvent {
                job_id: job.id,
                staged_data: Some(serde_json::json!({"ingredients": []})),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(service.get_job(job.id).await.unwrap().status, JobStatus::Failed);
    }

    #[test]
    fn test_parse_staged_payload_validation() {
        assert!(parse_staged_payload(r#"{"title":"Soup"}"#).is_ok());
        assert!(matches!(
            parse_staged_payload("not json"),
            Err(ServiceError::MalformedStagedData(_))
        ));
        assert!(matches!(
            parse_staged_payload(r#"{"title":"  "}"#),
            Err(ServiceError::MalformedStagedData(_))
        ));
        assert!(matches!(
            parse_staged_payload(r#"{"title":"Soup","ingredients":[{"name":""}]}"#),
            Err(ServiceError::MalformedStagedData(_))
        ));
    }
}
