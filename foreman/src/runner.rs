use std::sync::Arc;

use chrono::Utc;
use mill_models::{StoreError, SurveyJob, SurveyStore};
use tracing::{error, info};

use crate::surveyor::SurveyorRegistry;

/// Drives one survey job from unstarted to finished.
///
/// The runner owns the job for the duration of the run: resolve the
/// surveyor, stamp the timers, run the survey, stamp the outcome. A job
/// whose surveyor cannot even be resolved is marked unsuccessful without
/// ever entering the running state.
pub struct JobRunner {
    store: Arc<dyn SurveyStore>,
    registry: SurveyorRegistry,
}

impl JobRunner {
    pub fn new(store: Arc<dyn SurveyStore>, registry: SurveyorRegistry) -> Self {
        Self { store, registry }
    }

    /// Errors out of here are persistence failures only; everything the
    /// survey itself can go wrong with ends up on the returned job record.
    pub async fn run_job(&self, mut job: SurveyJob) -> Result<SurveyJob, StoreError> {
        let surveyor = match self
            .registry
            .get_surveyor_for(&job.source_type, self.store.clone())
        {
            Ok(surveyor) => surveyor,
            Err(e) => {
                error!(job_id = %job.id, "Unable to run survey job: {e}");
                job.success = Some(false);
                self.store.save_job(&job).await?;
                return Ok(job);
            }
        };

        self.start_job(&mut job).await?;

        info!(job_id = %job.id, source_type = %job.source_type, "Starting survey");
        let survey_ok = surveyor.survey(&job).await;

        self.end_job(&mut job, survey_ok).await?;
        info!(job_id = %job.id, success = survey_ok, "Survey finished");

        Ok(job)
    }

    async fn start_job(&self, job: &mut SurveyJob) -> Result<(), StoreError> {
        let now = Utc::now();
        job.start_time = Some(now);
        // First run against this source: everything from here on counts as
        // covered, so the watermark starts at the start time
        if job.replication_ended_at.is_none() {
            job.replication_ended_at = Some(now);
        }
        self.store.save_job(job).await
    }

    async fn end_job(&self, job: &mut SurveyJob, success: bool) -> Result<(), StoreError> {
        job.success = Some(success);
        job.end_time = Some(Utc::now());
        self.store.save_job(job).await
    }
}
