//! Workflow tests for the survey job runner: surveyor resolution, job
//! timing/outcome bookkeeping, and partial-failure semantics, all against
//! the in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use foreman::error::SurveyError;
use foreman::runner::JobRunner;
use foreman::surveyor::array_express::{ArrayExpressSurveyor, Experiment, ExperimentCatalog};
use foreman::surveyor::{Surveyor, SurveyorRegistry};
use mill_models::{BatchStatus, MemoryStore, SurveyJob, SurveyStore, MICRO_ARRAY_TO_PCL};

use common::{FailingStore, PlannedBatch, ScriptedSurveyor, SCRIPTED_SOURCE};

mod common;

fn scripted_registry(batches: Vec<PlannedBatch>, catalog_available: bool) -> SurveyorRegistry {
    let mut registry = SurveyorRegistry::new();
    registry.register(SCRIPTED_SOURCE, move |store| -> Box<dyn Surveyor> {
        Box::new(ScriptedSurveyor {
            store,
            batches: batches.clone(),
            catalog_available,
        })
    });
    registry
}

#[tokio::test]
async fn unsupported_source_fails_without_starting_timers() {
    let store = Arc::new(MemoryStore::new());
    let runner = JobRunner::new(store.clone(), SurveyorRegistry::new());

    let job = runner
        .run_job(SurveyJob::new("UNKNOWN_X"))
        .await
        .unwrap();

    assert_eq!(job.success, Some(false));
    assert!(job.start_time.is_none());
    assert!(job.end_time.is_none());

    // The failed job was persisted as-is
    let persisted = store.get_job(job.id).await.unwrap().unwrap();
    assert_eq!(persisted.success, Some(false));
    assert!(persisted.start_time.is_none());
}

#[tokio::test]
async fn watermark_is_initialized_to_the_start_time() {
    let store = Arc::new(MemoryStore::new());
    let registry = scripted_registry(vec![], true);
    let runner = JobRunner::new(store.clone(), registry);

    let job = runner
        .run_job(SurveyJob::new(SCRIPTED_SOURCE))
        .await
        .unwrap();

    assert_eq!(job.replication_ended_at, job.start_time);
    assert!(job.start_time.is_some());
    assert!(job.end_time.is_some());
    assert_eq!(job.success, Some(true));
}

#[tokio::test]
async fn an_existing_watermark_is_left_alone() {
    let store = Arc::new(MemoryStore::new());
    let registry = scripted_registry(vec![], true);
    let runner = JobRunner::new(store.clone(), registry);

    let watermark: DateTime<Utc> = Utc::now() - Duration::days(7);
    let mut job = SurveyJob::new(SCRIPTED_SOURCE);
    job.replication_ended_at = Some(watermark);

    let job = runner.run_job(job).await.unwrap();

    assert_eq!(job.replication_ended_at, Some(watermark));
}

#[tokio::test]
async fn one_bad_batch_does_not_abort_the_survey() {
    let store = Arc::new(MemoryStore::new());
    // Batch 2 picks a processor pipeline without a processed format, which
    // the handler must reject
    let registry = scripted_registry(
        vec![
            PlannedBatch::discovery("E-MTAB-1"),
            PlannedBatch::with_pipeline("E-MTAB-2", MICRO_ARRAY_TO_PCL),
            PlannedBatch::discovery("E-MTAB-3"),
        ],
        true,
    );
    let runner = JobRunner::new(store.clone(), registry);

    let job = runner
        .run_job(SurveyJob::new(SCRIPTED_SOURCE))
        .await
        .unwrap();

    let batches = store.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].accession_code, "E-MTAB-1");
    assert_eq!(batches[1].accession_code, "E-MTAB-3");

    // The survey's own outcome lands on the job record
    assert_eq!(job.success, Some(false));
    assert!(job.end_time.is_some());
}

#[tokio::test]
async fn a_store_failure_fails_that_batch_and_the_job() {
    let store = Arc::new(FailingStore {
        inner: MemoryStore::new(),
        fail_accession: "E-MTAB-2".to_string(),
    });
    let registry = scripted_registry(
        vec![
            PlannedBatch::discovery("E-MTAB-1"),
            PlannedBatch::discovery("E-MTAB-2"),
            PlannedBatch::discovery("E-MTAB-3"),
        ],
        true,
    );
    let runner = JobRunner::new(store.clone(), registry);

    let job = runner
        .run_job(SurveyJob::new(SCRIPTED_SOURCE))
        .await
        .unwrap();

    // The rejected save costs only its own batch, the rest still land
    let batches = store.inner.batches();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].accession_code, "E-MTAB-1");
    assert_eq!(batches[1].accession_code, "E-MTAB-3");

    assert_eq!(job.success, Some(false));
    assert!(job.end_time.is_some());
}

#[tokio::test]
async fn unreachable_catalog_marks_the_job_unsuccessful() {
    let store = Arc::new(MemoryStore::new());
    let registry = scripted_registry(vec![PlannedBatch::discovery("E-MTAB-1")], false);
    let runner = JobRunner::new(store.clone(), registry);

    let job = runner
        .run_job(SurveyJob::new(SCRIPTED_SOURCE))
        .await
        .unwrap();

    assert_eq!(job.success, Some(false));
    assert!(job.start_time.is_some());
    assert!(job.end_time.is_some());
    assert!(store.batches().is_empty());
}

struct StubCatalog {
    experiments: Vec<Experiment>,
}

#[async_trait]
impl ExperimentCatalog for StubCatalog {
    async fn experiments_since(
        &self,
        _since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Experiment>, SurveyError> {
        Ok(self.experiments.clone())
    }
}

#[tokio::test]
async fn array_express_discovery_end_to_end() {
    let store = Arc::new(MemoryStore::new());

    let mut registry = SurveyorRegistry::new();
    registry.register(ArrayExpressSurveyor::SOURCE_TYPE, |store| -> Box<dyn Surveyor> {
        let catalog = StubCatalog {
            experiments: vec![Experiment {
                accession_code: "E-MTAB-1".to_string(),
                organism: "Homo sapiens".to_string(),
                download_url: "https://example.com/E-MTAB-1.raw.zip".to_string(),
                size_in_bytes: 1024,
                raw_format: Some("CEL".to_string()),
                release_date: Some("2026-01-01".to_string()),
            }],
        };
        Box::new(ArrayExpressSurveyor::new(Box::new(catalog), store))
    });

    let runner = JobRunner::new(store.clone(), registry);
    let job = runner
        .run_job(SurveyJob::new("ARRAY_EXPRESS"))
        .await
        .unwrap();

    assert_eq!(job.success, Some(true));

    let batches = store.batches();
    assert_eq!(batches.len(), 1);
    let batch = &batches[0];
    assert_eq!(batch.accession_code, "E-MTAB-1");
    assert_eq!(batch.source_type, "ARRAY_EXPRESS");
    assert_eq!(batch.status, BatchStatus::New);
    assert_eq!(batch.raw_format.as_deref(), Some("CEL"));
    assert!(batch.processed_format.is_none());
    // No processed format yet, so a discovery pipeline takes it from here
    assert_eq!(batch.pipeline_required, "FORMAT_DETECTION");

    let key_values = store.key_values();
    assert_eq!(key_values.len(), 1);
    assert_eq!(key_values[0].key, "release_date");
    assert_eq!(key_values[0].value, "2026-01-01");
    assert_eq!(key_values[0].batch_id, batch.id);
}
