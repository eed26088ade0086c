use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{Batch, BatchKeyValue, PoolConfig, StoreError, SurveyJob, SurveyStore};

/// Postgres-backed survey store.
///
/// Job claiming uses `FOR UPDATE SKIP LOCKED` so that no two workers can
/// claim the same unstarted job. Batch ids are v7 uuids, so ordering by id
/// is creation order.
pub struct PgSurveyStore {
    pool: PgPool,
}

impl PgSurveyStore {
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &PoolConfig) -> Result<Self, StoreError> {
        let pool = config.connect().await.map_err(StoreError::PoolCreation)?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl SurveyStore for PgSurveyStore {
    async fn save_job(&self, job: &SurveyJob) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO survey_jobs (id, source_type, start_time, end_time, replication_ended_at, success)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                start_time = EXCLUDED.start_time,
                end_time = EXCLUDED.end_time,
                replication_ended_at = EXCLUDED.replication_ended_at,
                success = EXCLUDED.success
            "#,
        )
        .bind(job.id)
        .bind(&job.source_type)
        .bind(job.start_time)
        .bind(job.end_time)
        .bind(job.replication_ended_at)
        .bind(job.success)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query("save_job", e))?;

        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<SurveyJob>, StoreError> {
        sqlx::query_as::<_, SurveyJob>(
            r#"
            SELECT id, source_type, start_time, end_time, replication_ended_at, success
            FROM survey_jobs
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query("get_job", e))
    }

    async fn claim_next_job(&self) -> Result<Option<SurveyJob>, StoreError> {
        // Lock a row, stamp it as claimed, and return it, all in one statement
        sqlx::query_as::<_, SurveyJob>(
            r#"
            WITH next_job AS (
                SELECT id
                FROM survey_jobs
                WHERE start_time IS NULL AND success IS NULL AND claimed_at IS NULL
                ORDER BY id
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            UPDATE survey_jobs
            SET claimed_at = now()
            FROM next_job
            WHERE survey_jobs.id = next_job.id
            RETURNING
                survey_jobs.id,
                survey_jobs.source_type,
                survey_jobs.start_time,
                survey_jobs.end_time,
                survey_jobs.replication_ended_at,
                survey_jobs.success
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::query("claim_next_job", e))
    }

    async fn save_batch(&self, batch: &Batch) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO batches (
                id, survey_job_id, size_in_bytes, download_url, raw_format,
                processed_format, accession_code, organism, source_type,
                status, pipeline_required, internal_location
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO UPDATE SET
                status = EXCLUDED.status,
                pipeline_required = EXCLUDED.pipeline_required,
                internal_location = EXCLUDED.internal_location
            "#,
        )
        .bind(batch.id)
        .bind(batch.survey_job_id)
        .bind(batch.size_in_bytes)
        .bind(&batch.download_url)
        .bind(&batch.raw_format)
        .bind(&batch.processed_format)
        .bind(&batch.accession_code)
        .bind(&batch.organism)
        .bind(&batch.source_type)
        .bind(batch.status.to_string())
        .bind(&batch.pipeline_required)
        .bind(&batch.internal_location)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::query("save_batch", e))?;

        Ok(())
    }

    async fn save_batch_key_values(&self, key_values: &[BatchKeyValue]) -> Result<(), StoreError> {
        // Batches carry at most a handful of key-values, individual inserts are fine
        for kv in key_values {
            sqlx::query(
                r#"
                INSERT INTO batch_key_values (batch_id, key, value)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(kv.batch_id)
            .bind(&kv.key)
            .bind(&kv.value)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::query("save_batch_key_values", e))?;
        }

        Ok(())
    }
}
