use async_trait::async_trait;
use mill_models::{Batch, BatchKeyValue, Pipeline, SurveyJob};

pub mod array_express;
pub mod registry;

pub use registry::SurveyorRegistry;

/// A source-specific surveyor, one per external catalog.
///
/// Implementations are stateless between `survey` calls. Each call is one
/// pass over the catalog: discover units, build a `Batch` per unit with the
/// source-facing fields populated (`size_in_bytes`, `download_url`,
/// `raw_format`, `accession_code`, `organism`, plus `processed_format` when
/// it is already known), and run each batch through a
/// [`BatchHandler`](crate::handler::BatchHandler).
#[async_trait]
pub trait Surveyor: Send + Sync {
    /// Stable identifying tag for this source, e.g. "ARRAY_EXPRESS".
    fn source_type(&self) -> &'static str;

    /// Pick the pipeline for a batch. Pure decision: may inspect the batch
    /// and its key-values, must not touch the store.
    fn determine_pipeline(&self, batch: &Batch, key_values: &[BatchKeyValue]) -> Pipeline;

    /// Run one survey pass for the job. A batch that fails to handle is
    /// logged and skipped, the rest of the survey continues. Returns true
    /// only if every discovered batch was handled; false when any batch
    /// failed or the catalog could not be reached at all. Batches already
    /// persisted before a failure stay persisted.
    async fn survey(&self, survey_job: &SurveyJob) -> bool;
}

impl std::fmt::Debug for dyn Surveyor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surveyor")
            .field("source_type", &self.source_type())
            .finish()
    }
}
