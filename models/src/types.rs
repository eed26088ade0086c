use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::StoreError;

/// One execution attempt of discovery against an external source.
///
/// Created unstarted by whatever schedules surveys. The runner sets
/// `start_time` when it picks the job up and `end_time`/`success` exactly
/// once when the job finishes; a finished job is never resumed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SurveyJob {
    pub id: Uuid,
    pub source_type: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    // Upper bound of data already replicated from this source, used to avoid
    // re-surveying ground we have already covered
    pub replication_ended_at: Option<DateTime<Utc>>,
    pub success: Option<bool>,
}

impl SurveyJob {
    pub fn new(source_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            source_type: source_type.into(),
            start_time: None,
            end_time: None,
            replication_ended_at: None,
            success: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.success.is_some()
    }
}

/// One discoverable dataset unit at an external source.
///
/// A surveyor constructs this with the source-facing fields populated
/// (`size_in_bytes`, `download_url`, `raw_format`, `accession_code`,
/// `organism`, and `processed_format` when already known). The batch handler
/// stamps `source_type`, `status` and `pipeline_required` before the batch
/// is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: Uuid,
    pub survey_job_id: Uuid,
    pub size_in_bytes: i64,
    pub download_url: String,
    pub raw_format: Option<String>,
    pub processed_format: Option<String>,
    pub accession_code: String,
    pub organism: String,
    pub source_type: String,
    pub status: BatchStatus,
    pub pipeline_required: String,
    // Where the downloader put the data, unset until the batch has been fetched
    pub internal_location: Option<String>,
}

impl Batch {
    /// A freshly discovered batch with only the source-facing fields set.
    pub fn discovered(
        survey_job: &SurveyJob,
        accession_code: impl Into<String>,
        organism: impl Into<String>,
        download_url: impl Into<String>,
        size_in_bytes: i64,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            survey_job_id: survey_job.id,
            size_in_bytes,
            download_url: download_url.into(),
            raw_format: None,
            processed_format: None,
            accession_code: accession_code.into(),
            organism: organism.into(),
            source_type: String::new(),
            status: BatchStatus::New,
            pipeline_required: String::new(),
            internal_location: None,
        }
    }
}

/// Auxiliary metadata attached to a batch, passed through to
/// `determine_pipeline` by the surveyor that discovered it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchKeyValue {
    pub batch_id: Uuid,
    pub key: String,
    pub value: String,
}

impl BatchKeyValue {
    pub fn new(batch_id: Uuid, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            batch_id,
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    New,
    Downloaded,
    Processed,
}

impl Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::New => write!(f, "new"),
            BatchStatus::Downloaded => write!(f, "downloaded"),
            BatchStatus::Processed => write!(f, "processed"),
        }
    }
}

impl FromStr for BatchStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(BatchStatus::New),
            "downloaded" => Ok(BatchStatus::Downloaded),
            "processed" => Ok(BatchStatus::Processed),
            _ => Err(StoreError::InvalidStatus(s.to_string())),
        }
    }
}
