//! Extraction strategies for newly submitted ingest jobs.
//!
//! The direct strategy runs the extractor in-process during the request and
//! leaves the job staged or failed. The queued strategy hands the job to the
//! out-of-process pipeline and leaves it pending until a `recipe.imported`
//! event arrives.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use super::ServiceError;
use crate::events::{ImportRequestPublisher, ImportRequestedEvent};
use crate::llm::RecipeExtractor;
use crate::models::{IngestionJob, JobStatus};
use crate::repository::JobRepository;

/// Advances a freshly created (pending) job toward staged.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Returns the job in its post-submission state.
    async fn begin(
        &self,
        jobs: &JobRepository,
        job: &IngestionJob,
    ) -> Result<IngestionJob, ServiceError>;
}

/// Runs extraction synchronously inside the submitting request.
pub struct SyncExtraction {
    extractor: Arc<dyn RecipeExtractor>,
}

impl SyncExtraction {
    pub fn new(extractor: Arc<dyn RecipeExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl ExtractionStrategy for SyncExtraction {
    async fn begin(
        &self,
        jobs: &JobRepository,
        job: &IngestionJob,
    ) -> Result<IngestionJob, ServiceError> {
        jobs.set_status(job.id, JobStatus::Processing)
            .await?
            .ok_or(ServiceError::JobNotFound)?;

        match self.extractor.extract(&job.raw_input).await {
            Ok(staged) => {
                let json = serde_json::to_string(&staged)
                    .map_err(|e| ServiceError::MalformedStagedData(e.to_string()))?;
                info!(job_id = %job.id, title = %staged.title, "extraction staged a recipe");
                jobs.set_staged(job.id, &json)
                    .await?
                    .ok_or(ServiceError::JobNotFound)
            }
            Err(e) => {
                warn!(job_id = %job.id, error = %e, "extraction failed, marking job failed");
                jobs.mark_failed(job.id)
                    .await?
                    .ok_or(ServiceError::JobNotFound)
            }
        }
    }
}

/// Publishes an import request and leaves the job pending.
pub struct QueuedExtraction {
    publisher: Arc<dyn ImportRequestPublisher>,
}

impl QueuedExtraction {
    pub fn new(publisher: Arc<dyn ImportRequestPublisher>) -> Self {
        Self { publisher }
    }
}

#[async_trait]
impl ExtractionStrategy for QueuedExtraction {
    async fn begin(
        &self,
        jobs: &JobRepository,
        job: &IngestionJob,
    ) -> Result<IngestionJob, ServiceError> {
        let event = ImportRequestedEvent::new(job.id, job.job_type, &job.raw_input);
        if let Err(e) = self.publisher.publish(event).await {
            // Nothing downstream will ever answer for this job, so fail it
            // rather than stranding it in pending.
            error!(job_id = %job.id, error = %e, "publishing import request failed");
            jobs.mark_failed(job.id).await?;
            return Err(ServiceError::Publish(e));
        }

        info!(job_id = %job.id, "import request queued");
        Ok(job.clone())
    }
}
