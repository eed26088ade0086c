use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use mill_models::SurveyStore;

use crate::config::Config;
use crate::error::SurveyError;
use crate::surveyor::array_express::{ArrayExpressSurveyor, HttpExperimentCatalog};
use crate::surveyor::Surveyor;

type SurveyorConstructor =
    Box<dyn Fn(Arc<dyn SurveyStore>) -> Box<dyn Surveyor> + Send + Sync>;

/// Maps a job's `source_type` tag to the surveyor that can run it.
///
/// New sources get added here by registering a constructor, the runner
/// never changes.
#[derive(Default)]
pub struct SurveyorRegistry {
    constructors: HashMap<String, SurveyorConstructor>,
}

impl SurveyorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every production source wired up.
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();

        let catalog = HttpExperimentCatalog::new(
            config.array_express_api_url.clone(),
            Duration::from_secs(config.catalog_timeout_seconds),
        );
        registry.register(ArrayExpressSurveyor::SOURCE_TYPE, move |store| -> Box<dyn Surveyor> {
            Box::new(ArrayExpressSurveyor::new(Box::new(catalog.clone()), store))
        });

        registry
    }

    pub fn register(
        &mut self,
        source_type: impl Into<String>,
        constructor: impl Fn(Arc<dyn SurveyStore>) -> Box<dyn Surveyor> + Send + Sync + 'static,
    ) {
        self.constructors
            .insert(source_type.into(), Box::new(constructor));
    }

    pub fn get_surveyor_for(
        &self,
        source_type: &str,
        store: Arc<dyn SurveyStore>,
    ) -> Result<Box<dyn Surveyor>, SurveyError> {
        match self.constructors.get(source_type) {
            Some(constructor) => Ok(constructor(store)),
            None => Err(SurveyError::UnsupportedSource {
                source_type: source_type.to_string(),
            }),
        }
    }
}
