use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{Config, ModelKind};
use crate::models::{BertEmbedding, BertTokenizer, IrisClassifier, WordSimilarity};
use crate::{create_app, AppState, Model, ModelHandle};

pub async fn run(config: Config) -> Result<()> {
    match config.model {
        ModelKind::Iris => serve::<IrisClassifier>(config).await,
        ModelKind::WordSimilarity => serve::<WordSimilarity>(config).await,
        ModelKind::BertTokenizer => serve::<BertTokenizer>(config).await,
        ModelKind::BertEmbedding => serve::<BertEmbedding>(config).await,
    }
}

pub async fn serve<M: Model>(config: Config) -> Result<()> {
    let handle = ModelHandle::<M>::new(config.model_source(), config.fetcher());

    if config.lazy_load {
        info!(model = M::KIND, "Deferring model load to first request");
    } else {
        handle
            .acquire()
            .await
            .with_context(|| format!("failed to load {} model from {}", M::KIND, handle.source()))?;
    }

    let app = create_app(AppState::new(handle));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!("Serving {} model on http://{}", M::KIND, addr);
    info!("Available endpoints:");
    info!("  - GET  /ping        - Liveness, 200 once the model is loaded");
    info!("  - GET  /health      - Health report");
    info!("  - GET  /v1/model    - Served model description");
    info!("  - POST /invocations - Score a request");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
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

    info!("Shutdown signal received");
}
