use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mill_models::{
    Batch, BatchKeyValue, Pipeline, SurveyJob, SurveyStore, FORMAT_DETECTION, MICRO_ARRAY_TO_PCL,
};
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::error::SurveyError;
use crate::handler::BatchHandler;
use crate::surveyor::Surveyor;

/// One downloadable raw data file at ArrayExpress.
#[derive(Debug, Clone)]
pub struct Experiment {
    pub accession_code: String,
    pub organism: String,
    pub download_url: String,
    pub size_in_bytes: i64,
    pub raw_format: Option<String>,
    pub release_date: Option<String>,
}

/// The catalog lookup is the only remote call a survey makes, so it sits
/// behind this seam. Tests script it, production uses the HTTP client below.
#[async_trait]
pub trait ExperimentCatalog: Send + Sync {
    async fn experiments_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Experiment>, SurveyError>;
}

pub struct ArrayExpressSurveyor {
    catalog: Box<dyn ExperimentCatalog>,
    store: Arc<dyn SurveyStore>,
}

impl ArrayExpressSurveyor {
    pub const SOURCE_TYPE: &'static str = "ARRAY_EXPRESS";

    pub fn new(catalog: Box<dyn ExperimentCatalog>, store: Arc<dyn SurveyStore>) -> Self {
        Self { catalog, store }
    }
}

#[async_trait]
impl Surveyor for ArrayExpressSurveyor {
    fn source_type(&self) -> &'static str {
        Self::SOURCE_TYPE
    }

    fn determine_pipeline(&self, batch: &Batch, _key_values: &[BatchKeyValue]) -> Pipeline {
        // Until the processed format is known, a discovery pass has to work
        // out what this batch actually contains
        if batch.processed_format.is_some() {
            MICRO_ARRAY_TO_PCL
        } else {
            FORMAT_DETECTION
        }
    }

    async fn survey(&self, survey_job: &SurveyJob) -> bool {
        let experiments = match self
            .catalog
            .experiments_since(survey_job.replication_ended_at)
            .await
        {
            Ok(experiments) => experiments,
            Err(e) => {
                error!(job_id = %survey_job.id, "Catalog query failed: {e}");
                return false;
            }
        };

        info!(
            job_id = %survey_job.id,
            count = experiments.len(),
            "Discovered experiments"
        );

        let handler = BatchHandler::new(self, self.store.as_ref());
        let mut all_handled = true;

        for experiment in experiments {
            let mut batch = Batch::discovered(
                survey_job,
                &experiment.accession_code,
                &experiment.organism,
                &experiment.download_url,
                experiment.size_in_bytes,
            );
            batch.raw_format = experiment.raw_format.clone();

            let mut key_values = Vec::new();
            if let Some(release_date) = &experiment.release_date {
                key_values.push(BatchKeyValue::new(batch.id, "release_date", release_date));
            }

            if let Err(e) = handler.handle_batch(&mut batch, &key_values).await {
                warn!(
                    accession_code = %batch.accession_code,
                    "Failed to handle batch: {e}"
                );
                all_handled = false;
            }
        }

        all_handled
    }
}

/// Thin client for the ArrayExpress REST API.
#[derive(Clone)]
pub struct HttpExperimentCatalog {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpExperimentCatalog {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            timeout,
        }
    }

    fn unavailable(reason: impl ToString) -> SurveyError {
        SurveyError::CatalogUnavailable {
            source_type: ArrayExpressSurveyor::SOURCE_TYPE.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl ExperimentCatalog for HttpExperimentCatalog {
    async fn experiments_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<Experiment>, SurveyError> {
        let mut request = self.client.get(&self.base_url).timeout(self.timeout);
        if let Some(since) = since {
            request = request.query(&[("since", since.to_rfc3339())]);
        }

        let response = request
            .send()
            .await
            .map_err(Self::unavailable)?
            .error_for_status()
            .map_err(Self::unavailable)?;

        let body: ExperimentsResponse = response.json().await.map_err(Self::unavailable)?;

        let mut experiments = Vec::new();
        for experiment in body.experiments.experiment {
            // One batch per raw data file, the way downstream wants them
            for file in experiment.files {
                experiments.push(Experiment {
                    accession_code: experiment.accession.clone(),
                    organism: experiment
                        .organism
                        .first()
                        .cloned()
                        .unwrap_or_else(|| "UNKNOWN".to_string()),
                    download_url: file.url,
                    size_in_bytes: file.size,
                    raw_format: file.kind,
                    release_date: experiment.releasedate.clone(),
                });
            }
        }

        Ok(experiments)
    }
}

#[derive(Deserialize)]
struct ExperimentsResponse {
    experiments: ExperimentsEnvelope,
}

#[derive(Deserialize)]
struct ExperimentsEnvelope {
    #[serde(default)]
    experiment: Vec<ApiExperiment>,
}

#[derive(Deserialize)]
struct ApiExperiment {
    accession: String,
    #[serde(default)]
    organism: Vec<String>,
    #[serde(default)]
    releasedate: Option<String>,
    #[serde(default)]
    files: Vec<ApiFile>,
}

#[derive(Deserialize)]
struct ApiFile {
    url: String,
    #[serde(default)]
    size: i64,
    #[serde(default)]
    kind: Option<String>,
}
