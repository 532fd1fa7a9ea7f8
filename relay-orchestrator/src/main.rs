use anyhow::Context;
use relay_driver::WebDriverClient;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod db;
pub mod repository;
pub mod service;

use crate::config::Config;
use crate::repository::{CredentialStore, MemoryStore, PgStore, StateStore};
use crate::service::{
    ActiveJobs, Collaborators, Dispatcher, EnvFileSecretResolver, HttpCallbackNotifier,
    JobRunner, SitePlaybook, spawn_worker_pool,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relay_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Relay Orchestrator...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;
    let config = Arc::new(config);

    for dir in [&config.artifact_dir, &config.profile_root] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    let (store, credentials): (Arc<dyn StateStore>, Arc<dyn CredentialStore>) =
        match &config.database_url {
            Some(database_url) => {
                tracing::info!("Connecting to database...");
                let pool = db::create_pool(database_url)
                    .await
                    .context("Failed to create database pool")?;
                db::run_migrations(&pool)
                    .await
                    .context("Failed to run database migrations")?;
                tracing::info!("Database ready");

                let store = Arc::new(PgStore::new(pool));
                (store.clone(), store)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, state is kept in memory only");
                let store = Arc::new(MemoryStore::new());
                (store.clone(), store)
            }
        };

    let playbook = SitePlaybook::load(config.playbook_path.as_deref())
        .context("Failed to load site playbook")?;
    let notifier = HttpCallbackNotifier::new(config.callback_timeout, config.retry.callback)
        .context("Failed to build callback client")?;
    let driver = WebDriverClient::new(config.webdriver_url.clone()).headless(config.headless);
    tracing::info!("Automation driver at {}", driver.base_url());

    let active = Arc::new(ActiveJobs::new());
    let runner = Arc::new(JobRunner::new(
        Arc::clone(&config),
        Collaborators {
            driver: Arc::new(driver),
            store: Arc::clone(&store),
            credentials: Arc::clone(&credentials),
            notifier: Arc::new(notifier),
            secrets: Arc::new(EnvFileSecretResolver),
            playbook: Arc::new(playbook),
        },
        Arc::clone(&active),
    ));

    let (dispatcher, queue) =
        Dispatcher::new(config.queue_capacity, Arc::clone(&store), Arc::clone(&active));
    spawn_worker_pool(queue, runner, config.max_parallel_jobs);

    // Build router with all API endpoints
    let app = api::create_router(api::AppState {
        dispatcher: Arc::new(dispatcher),
        store,
        credentials,
        active,
        config: Arc::clone(&config),
    });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}
