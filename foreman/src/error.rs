use mill_models::StoreError;
use thiserror::Error;

/// Errors raised while running a survey.
///
/// `UnsupportedSource` is fatal to the whole job. `InvariantViolation` is
/// fatal only to the batch that raised it; the survey loop logs it and
/// carries on with the remaining batches.
#[derive(Error, Debug)]
pub enum SurveyError {
    #[error("source {source_type} is not supported")]
    UnsupportedSource { source_type: String },

    #[error("batch {accession_code} cannot be handled: {reason}")]
    InvariantViolation {
        accession_code: String,
        reason: String,
    },

    #[error("catalog for {source_type} is unavailable: {reason}")]
    CatalogUnavailable {
        source_type: String,
        reason: String,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
