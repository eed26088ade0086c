// We do this pattern (privately use a module, then re-export parts of it) so we can
// refactor/rename or generally futz around with the internals without breaking the public API

// Types
mod types;
pub use types::Batch;
pub use types::BatchKeyValue;
pub use types::BatchStatus;
pub use types::SurveyJob;

// Pipeline classification
mod pipeline;
pub use pipeline::Pipeline;
pub use pipeline::PipelineKind;
pub use pipeline::FORMAT_DETECTION;
pub use pipeline::MICRO_ARRAY_TO_PCL;

// Errors
mod error;
pub use error::StoreError;

// Store
mod store;
pub use store::MemoryStore;
pub use store::SurveyStore;

mod pg;
pub use pg::PgSurveyStore;

// Config
mod config;
pub use config::PoolConfig;
