use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{Batch, BatchKeyValue, StoreError, SurveyJob};

/// The durable store for survey jobs and the batches they discover.
///
/// Persisting a batch with status `new` is the hand-off point to the
/// downstream download/transform queue; retry policy for failed saves
/// belongs to the caller or the store itself, never to the survey core.
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Insert or update a job by id.
    async fn save_job(&self, job: &SurveyJob) -> Result<(), StoreError>;

    async fn get_job(&self, id: Uuid) -> Result<Option<SurveyJob>, StoreError>;

    /// Hand out an unstarted job, at most once across concurrent workers.
    async fn claim_next_job(&self) -> Result<Option<SurveyJob>, StoreError>;

    async fn save_batch(&self, batch: &Batch) -> Result<(), StoreError>;

    async fn save_batch_key_values(&self, key_values: &[BatchKeyValue]) -> Result<(), StoreError>;
}

/// In-memory store, used by tests and local runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    jobs: Vec<SurveyJob>,
    claimed: HashSet<Uuid>,
    batches: Vec<Batch>,
    key_values: Vec<BatchKeyValue>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<SurveyJob> {
        self.inner.lock().unwrap().jobs.clone()
    }

    /// Persisted batches, in insertion order.
    pub fn batches(&self) -> Vec<Batch> {
        self.inner.lock().unwrap().batches.clone()
    }

    pub fn key_values(&self) -> Vec<BatchKeyValue> {
        self.inner.lock().unwrap().key_values.clone()
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    async fn save_job(&self, job: &SurveyJob) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.jobs.iter_mut().find(|j| j.id == job.id) {
            Some(existing) => *existing = job.clone(),
            None => inner.jobs.push(job.clone()),
        }
        Ok(())
    }

    async fn get_job(&self, id: Uuid) -> Result<Option<SurveyJob>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn claim_next_job(&self) -> Result<Option<SurveyJob>, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        let claimed = &inner.claimed;
        let next = inner
            .jobs
            .iter()
            .find(|j| j.start_time.is_none() && !j.is_finished() && !claimed.contains(&j.id))
            .cloned();
        if let Some(job) = &next {
            inner.claimed.insert(job.id);
        }
        Ok(next)
    }

    async fn save_batch(&self, batch: &Batch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        match inner.batches.iter_mut().find(|b| b.id == batch.id) {
            Some(existing) => *existing = batch.clone(),
            None => inner.batches.push(batch.clone()),
        }
        Ok(())
    }

    async fn save_batch_key_values(&self, key_values: &[BatchKeyValue]) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.key_values.extend_from_slice(key_values);
        Ok(())
    }
}
