use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Error;
use mill_models::{MemoryStore, PgSurveyStore, PoolConfig, SurveyStore};
use tracing::{info, warn};

use crate::config::Config;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<dyn SurveyStore>,
    running: AtomicBool,
}

impl AppContext {
    pub async fn new(config: &Config) -> Result<Self, Error> {
        let store: Arc<dyn SurveyStore> = match &config.database_url {
            Some(url) => {
                let mut pool_config = PoolConfig::new(url);
                pool_config.max_connections = Some(config.max_pg_connections);
                Arc::new(PgSurveyStore::connect(&pool_config).await?)
            }
            None => {
                warn!("DATABASE_URL is not set, using the in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        Ok(Self {
            config: config.clone(),
            store,
            running: AtomicBool::new(true),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    pub fn spawn_shutdown_listener(self: Arc<Self>) {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received, finishing current job");
                self.running.store(false, Ordering::Relaxed);
            }
        });
    }
}
