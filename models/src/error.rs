use thiserror::Error;

/// Errors raised by the survey store. Wraps the underlying sqlx errors to
/// keep the command that failed attached to them.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("pool creation failed with: {0}")]
    PoolCreation(#[source] sqlx::Error),
    #[error("{command} query failed with: {error}")]
    Query {
        command: String,
        error: sqlx::Error,
    },
    #[error("{0} is not a valid batch status")]
    InvalidStatus(String),
}

impl StoreError {
    pub fn query(command: impl Into<String>, error: sqlx::Error) -> Self {
        Self::Query {
            command: command.into(),
            error,
        }
    }
}
