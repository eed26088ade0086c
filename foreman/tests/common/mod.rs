use std::sync::Arc;

use async_trait::async_trait;
use foreman::handler::BatchHandler;
use foreman::surveyor::Surveyor;
use mill_models::{
    Batch, BatchKeyValue, MemoryStore, Pipeline, StoreError, SurveyJob, SurveyStore,
    FORMAT_DETECTION,
};
use tracing::warn;
use uuid::Uuid;

pub const SCRIPTED_SOURCE: &str = "SCRIPTED";

#[derive(Clone)]
pub struct PlannedBatch {
    pub accession_code: String,
    pub pipeline: Pipeline,
    pub processed_format: Option<String>,
}

impl PlannedBatch {
    pub fn discovery(accession_code: &str) -> Self {
        Self {
            accession_code: accession_code.to_string(),
            pipeline: FORMAT_DETECTION,
            processed_format: None,
        }
    }

    pub fn with_pipeline(accession_code: &str, pipeline: Pipeline) -> Self {
        Self {
            accession_code: accession_code.to_string(),
            pipeline,
            processed_format: None,
        }
    }
}

/// A surveyor whose catalog is a fixed script, for driving the runner and
/// handler through every workflow path without a real source.
pub struct ScriptedSurveyor {
    pub store: Arc<dyn SurveyStore>,
    pub batches: Vec<PlannedBatch>,
    pub catalog_available: bool,
}

#[async_trait]
impl Surveyor for ScriptedSurveyor {
    fn source_type(&self) -> &'static str {
        SCRIPTED_SOURCE
    }

    fn determine_pipeline(&self, batch: &Batch, _key_values: &[BatchKeyValue]) -> Pipeline {
        self.batches
            .iter()
            .find(|p| p.accession_code == batch.accession_code)
            .map(|p| p.pipeline.clone())
            .unwrap_or(FORMAT_DETECTION)
    }

    async fn survey(&self, survey_job: &SurveyJob) -> bool {
        if !self.catalog_available {
            return false;
        }

        let handler = BatchHandler::new(self, self.store.as_ref());
        let mut all_handled = true;

        for plan in &self.batches {
            let mut batch = Batch::discovered(
                survey_job,
                &plan.accession_code,
                "HOMO_SAPIENS",
                format!("http://example.com/{}", plan.accession_code),
                10,
            );
            batch.processed_format = plan.processed_format.clone();

            if let Err(e) = handler.handle_batch(&mut batch, &[]).await {
                warn!("Failed to handle batch {}: {e}", plan.accession_code);
                all_handled = false;
            }
        }

        all_handled
    }
}

/// Delegates to a `MemoryStore` but rejects the save of one batch, for
/// driving the persistence-failure path of the survey loop.
pub struct FailingStore {
    pub inner: MemoryStore,
    pub fail_accession: String,
}

#[async_trait]
impl SurveyStore for FailingStore {
    async fn save_job(&self, job: &SurveyJob) -> Result<(), StoreError> {
        self.inner.save_job(job).await
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<SurveyJob>, StoreError> {
        self.inner.get_job(id).await
    }

    async fn claim_next_job(&self) -> Result<Option<SurveyJob>, StoreError> {
        self.inner.claim_next_job().await
    }

    async fn save_batch(&self, batch: &Batch) -> Result<(), StoreError> {
        if batch.accession_code == self.fail_accession {
            return Err(StoreError::query("save_batch", sqlx::Error::PoolClosed));
        }
        self.inner.save_batch(batch).await
    }

    async fn save_batch_key_values(&self, key_values: &[BatchKeyValue]) -> Result<(), StoreError> {
        self.inner.save_batch_key_values(key_values).await
    }
}
