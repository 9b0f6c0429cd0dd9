use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vinex::api::{create_router, AppState};
use vinex::config::{Config, StorageBackend};
use vinex::denoise::DenoiseEngine;
use vinex::llm::{Generator, LlmProvider};
use vinex::recovery::SchemaRegistry;
use vinex::storage::{self, LocalObjectStore};

#[derive(Parser)]
#[command(name = "vinex")]
#[command(about = "Registration document enhancement and field extraction service")]
struct Args {
    /// Path or URL of the denoising weights, overriding DENOISE_WEIGHTS
    #[arg(long)]
    weights: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vinex=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env();
    if let Some(weights) = args.weights {
        config.model.weights = weights;
    }

    if config.server.api_keys.is_empty() {
        tracing::warn!(
            "VINEX_API_KEYS is not set. Protected endpoints will reject every request."
        );
    }

    tracing::info!("Loading denoising model from {}...", config.model.weights);
    let engine = match DenoiseEngine::shared(&config.model).await {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load denoising model");
            return Err(e.into());
        }
    };
    tracing::info!(
        backend = engine.backend_name(),
        output = ?engine.output(),
        "Denoising model ready"
    );

    let schemas = match &config.recovery.schema_dir {
        Some(dir) => SchemaRegistry::with_dir(dir)?,
        None => SchemaRegistry::builtin(),
    };
    tracing::info!(
        schemas = ?schemas.names().collect::<Vec<_>>(),
        "Extraction schemas registered"
    );

    if let Some(llm_config) = &config.llm {
        tracing::info!("Initializing LLM provider: {}...", llm_config.model);
    }
    let llm = LlmProvider::new(config.llm.as_ref());
    if !llm.is_available() {
        tracing::warn!("LLM unavailable - extraction, translation and consignee endpoints will return 501");
    }

    let store: Arc<dyn storage::ObjectStore> = Arc::from(storage::from_config(&config.storage));
    tracing::info!(backend = store.backend(), "Object storage ready");

    let cancel_token = CancellationToken::new();

    if config.storage.backend == StorageBackend::Local && config.storage.retention_secs > 0 {
        let sweeper = LocalObjectStore::new(
            &config.storage.local_dir,
            &config.storage.public_base_url,
            config.storage.folder.clone(),
        );
        let retention = Duration::from_secs(config.storage.retention_secs);
        tracing::info!("Starting storage sweeper... (retention={}s)", retention.as_secs());
        let token = cancel_token.child_token();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        tracing::info!("Storage sweeper shutting down...");
                        break;
                    }
                    _ = tokio::time::sleep(retention) => {
                        if let Err(e) = sweeper.sweep(retention).await {
                            tracing::error!("Storage sweep error: {}", e);
                        }
                    }
                }
            }
        });
    }

    let state = AppState::new(config.clone(), engine, Arc::new(llm), store, schemas);
    let app = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Vinex starting on http://{}", addr);
    tracing::info!("  Health check: http://{}/api/v1/health", addr);
    tracing::info!("  API docs:     http://{}/api/v1/docs", addr);
    tracing::info!("  OpenAPI spec: http://{}/api/v1/openapi.json", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token))
        .await?;

    Ok(())
}

async fn shutdown_signal(cancel_token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, cancelling background tasks...");
    cancel_token.cancel();
}
