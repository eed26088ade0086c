use std::time::Duration;

use serde::{Deserialize, Serialize};
use sqlx::pool::PoolOptions;
use sqlx::{PgPool, Postgres};

/// How many connections a survey worker keeps open when not told otherwise.
/// One worker runs one job at a time and talks straight to postgres, so the
/// pool stays small.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 4;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_ACQUIRE_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_IDLE_TIMEOUT_SECONDS: u64 = 60;

/// Connection settings for the Postgres survey store. Unset fields fall back
/// to the worker defaults above.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PoolConfig {
    pub db_url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_seconds: Option<u64>,
    pub idle_timeout_seconds: Option<u64>,
}

impl PoolConfig {
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            max_connections: None,
            min_connections: None,
            acquire_timeout_seconds: None,
            idle_timeout_seconds: None,
        }
    }

    fn options(&self) -> PoolOptions<Postgres> {
        PoolOptions::new()
            .max_connections(self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS))
            .min_connections(self.min_connections.unwrap_or(DEFAULT_MIN_CONNECTIONS))
            .acquire_timeout(Duration::from_secs(
                self.acquire_timeout_seconds
                    .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_SECONDS),
            ))
            .idle_timeout(Duration::from_secs(
                self.idle_timeout_seconds
                    .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECONDS),
            ))
    }

    pub async fn connect(&self) -> Result<PgPool, sqlx::Error> {
        self.options().connect(&self.db_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_fields_use_worker_defaults() {
        let config = PoolConfig::new("postgres://localhost/mill");
        let options = config.options();

        assert_eq!(options.get_max_connections(), DEFAULT_MAX_CONNECTIONS);
        assert_eq!(options.get_min_connections(), DEFAULT_MIN_CONNECTIONS);
    }

    #[test]
    fn overrides_beat_the_defaults() {
        let mut config = PoolConfig::new("postgres://localhost/mill");
        config.max_connections = Some(16);

        assert_eq!(config.options().get_max_connections(), 16);
    }
}
