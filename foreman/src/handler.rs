use mill_models::{Batch, BatchKeyValue, BatchStatus, SurveyStore};
use tracing::debug;

use crate::error::SurveyError;
use crate::surveyor::Surveyor;

/// Completes a batch a surveyor has discovered and hands it to the store.
///
/// The handler owns the one real invariant of the survey workflow: a
/// processor pipeline may only be assigned to a batch whose
/// `processed_format` is already known. A batch that fails the check is
/// rejected outright, never coerced onto a guessed pipeline.
pub struct BatchHandler<'a> {
    surveyor: &'a dyn Surveyor,
    store: &'a dyn SurveyStore,
}

impl<'a> BatchHandler<'a> {
    pub fn new(surveyor: &'a dyn Surveyor, store: &'a dyn SurveyStore) -> Self {
        Self { surveyor, store }
    }

    /// Stamp the batch, pick its pipeline, and persist it together with its
    /// key-values. Persisting a batch with status `new` is what makes it
    /// visible to the downstream queue.
    pub async fn handle_batch(
        &self,
        batch: &mut Batch,
        key_values: &[BatchKeyValue],
    ) -> Result<bool, SurveyError> {
        batch.source_type = self.surveyor.source_type().to_string();
        batch.status = BatchStatus::New;
        // Nothing has been fetched yet
        batch.internal_location = None;

        let pipeline = self.surveyor.determine_pipeline(batch, key_values);
        if pipeline.is_discovery() || batch.processed_format.is_some() {
            batch.pipeline_required = pipeline.name().to_string();
        } else {
            return Err(SurveyError::InvariantViolation {
                accession_code: batch.accession_code.clone(),
                reason: format!(
                    "{} is a processor pipeline but processed_format is not set",
                    pipeline.name()
                ),
            });
        }

        self.store.save_batch(batch).await?;
        if !key_values.is_empty() {
            self.store.save_batch_key_values(key_values).await?;
        }

        debug!(
            accession_code = %batch.accession_code,
            pipeline = %batch.pipeline_required,
            "handled batch"
        );

        Ok(true)
    }
}
