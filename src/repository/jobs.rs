//! Ingestion job persistence.
//!
//! Jobs are never deleted by the service; retention is an operator concern.
//! Status transitions are single-row updates and return the refreshed job so
//! callers can check the outcome.

use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::diesel_models::{IngestionJobRecord, NewIngestionJob};
use super::pool::{DbError, SqlitePool};
use crate::models::{IngestionJob, JobStatus, JobType};
use crate::schema::ingestion_jobs;

/// Repository for ingestion job rows.
#[derive(Clone)]
pub struct JobRepository {
    pool: SqlitePool,
}

impl JobRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new pending job with the raw input stored verbatim.
    pub async fn create(&self, job_type: JobType, raw_input: &str) -> Result<IngestionJob, DbError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let mut conn = self.pool.get().await?;

        diesel::insert_into(ingestion_jobs::table)
            .values(&NewIngestionJob {
                id: &id,
                job_type: job_type.as_str(),
                raw_input,
                status: JobStatus::Pending.as_str(),
                staged_data: None,
                created_at: &now,
                updated_at: &now,
            })
            .execute(&mut conn)
            .await?;

        self.get_required(&id).await
    }

    /// Fetch a job by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<IngestionJob>, DbError> {
        let rec = self.get_record(&id.to_string()).await?;
        rec.map(IngestionJob::try_from).transpose()
    }

    /// Update only the status of a job. Returns `None` when the job is unknown.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: JobStatus,
    ) -> Result<Option<IngestionJob>, DbError> {
        let id_str = id.to_string();
        let now = Utc::now().to_rfc3339();
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(ingestion_jobs::table.find(&id_str))
            .set((
                ingestion_jobs::status.eq(status.as_str()),
                ingestion_jobs::updated_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_required(&id_str).await.map(Some)
    }

    /// Mark a job failed, clearing any staged payload.
    ///
    /// staged_data must be non-null only for staged/confirmed jobs.
    pub async fn mark_failed(&self, id: Uuid) -> Result<Option<IngestionJob>, DbError> {
        let id_str = id.to_string();
        let now = Utc::now().to_rfc3339();
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(ingestion_jobs::table.find(&id_str))
            .set((
                ingestion_jobs::status.eq(JobStatus::Failed.as_str()),
                ingestion_jobs::staged_data.eq(None::<String>),
                ingestion_jobs::updated_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_required(&id_str).await.map(Some)
    }

    /// Store the staged payload and move the job to `staged`.
    ///
    /// Terminal jobs are never re-staged; a redelivered import result for a
    /// confirmed or failed job must not reopen it. Returns `None` when the
    /// job is unknown or terminal.
    pub async fn set_staged(
        &self,
        id: Uuid,
        staged_json: &str,
    ) -> Result<Option<IngestionJob>, DbError> {
        let id_str = id.to_string();
        let now = Utc::now().to_rfc3339();
        let mut conn = self.pool.get().await?;

        let terminal = vec![JobStatus::Failed.as_str(), JobStatus::Confirmed.as_str()];
        let rows = diesel::update(
            ingestion_jobs::table
                .find(&id_str)
                .filter(ingestion_jobs::status.ne_all(terminal)),
        )
            .set((
                ingestion_jobs::status.eq(JobStatus::Staged.as_str()),
                ingestion_jobs::staged_data.eq(staged_json),
                ingestion_jobs::updated_at.eq(&now),
            ))
            .execute(&mut conn)
            .await?;

        if rows == 0 {
            return Ok(None);
        }
        self.get_required(&id_str).await.map(Some)
    }

    async fn get_record(&self, id: &str) -> Result<Option<IngestionJobRecord>, DbError> {
        let mut conn = self.pool.get().await?;
        ingestion_jobs::table
            .find(id)
            .first(&mut conn)
            .await
            .optional()
    }

    async fn get_required(&self, id: &str) -> Result<IngestionJob, DbError> {
        self.get_record(id)
            .await?
            .ok_or(DbError::NotFound)?
            .try_into()
    }
}
