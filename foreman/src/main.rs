use std::{sync::Arc, time::Duration};

use anyhow::Error;
use axum::{routing::get, Router};
use envconfig::Envconfig;
use foreman::{config::Config, context::AppContext, runner::JobRunner, surveyor::SurveyorRegistry};
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn setup_tracing() {
    let log_layer: tracing_subscriber::filter::Filtered<
        tracing_subscriber::fmt::Layer<tracing_subscriber::Registry>,
        EnvFilter,
        tracing_subscriber::Registry,
    > = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());
    tracing_subscriber::registry().with(log_layer).init();
}

pub async fn index() -> &'static str {
    "survey foreman"
}

fn start_health_liveness_server(config: &Config) -> JoinHandle<()> {
    let router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(index));
    let bind = (config.host.clone(), config.port);
    tokio::task::spawn(async move {
        let listener = tokio::net::TcpListener::bind(bind)
            .await
            .expect("failed to bind health server");
        axum::serve(listener, router)
            .await
            .expect("failed to serve health server");
    })
}

#[tokio::main]
pub async fn main() -> Result<(), Error> {
    setup_tracing();
    info!("Starting up...");

    let config = Config::init_from_env()?;
    let context = Arc::new(AppContext::new(&config).await?);

    context.clone().spawn_shutdown_listener();

    start_health_liveness_server(&config);

    let registry = SurveyorRegistry::with_defaults(&config);
    let runner = JobRunner::new(context.store.clone(), registry);

    while context.is_running() {
        info!("Looking for next survey job");
        let Some(job) = context.store.claim_next_job().await? else {
            if !context.is_running() {
                break;
            }
            info!("No available job found, sleeping");
            tokio::time::sleep(Duration::from_secs(config.idle_poll_seconds)).await;
            continue;
        };

        info!("Claimed job: {:?}", job.id);
        let job = runner.run_job(job).await?;
        info!("Finished job {} with success {:?}", job.id, job.success);
    }

    Ok(())
}
