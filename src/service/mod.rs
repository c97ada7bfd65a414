//! Service bootstrap
//!
//! Wires storage, engines, broker, and executor together, then runs the
//! HTTP endpoint on the async runtime with the relay beside it on a worker
//! thread. Shutdown order: stop accepting requests, stop the relay, which
//! flushes and closes its broker handles.

pub mod http;
pub mod runner;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::broker;
use crate::config::Settings;
use crate::engine;
use crate::job::JobExecutor;
use crate::llm;
use crate::media::{self, MediaStager};
use crate::pipeline::ProcessingChain;
use crate::relay::TranscribeRelay;

use self::http::AppState;
use self::runner::RelayRunner;

/// Build the shared job executor from settings.
///
/// Blocking HTTP clients are created here; call from a non-async context.
pub fn build_executor(settings: &Settings) -> Result<Arc<JobExecutor>> {
    let store = media::build_store(&settings.storage)?;
    let engine = engine::build_engine(&settings.engine)?;
    let summarizer = llm::build_summarizer(&settings.summarizer)?;

    let stager = MediaStager::new(store, settings.pipeline.scratch_dir.clone());
    let chain = ProcessingChain::new(
        engine,
        summarizer,
        settings.pipeline.vad_threshold,
        settings.summarizer.max_input_chars,
    );

    Ok(Arc::new(JobExecutor::new(stager, chain)))
}

/// Run the service until SIGINT or SIGTERM
pub async fn run(settings: &Settings) -> Result<()> {
    info!("{} {} starting", crate::APP_NAME, crate::VERSION);
    settings.ensure_dirs()?;

    let executor = {
        let settings = settings.clone();
        tokio::task::spawn_blocking(move || build_executor(&settings))
            .await
            .context("Executor construction task failed")??
    };

    let (consumer, producer) = broker::build(&settings.broker)?;
    let relay = TranscribeRelay::new(consumer, producer, executor.clone(), &settings.broker);
    let runner = RelayRunner::spawn(relay);

    let app = http::router(AppState { executor });
    let listener = tokio::net::TcpListener::bind(&settings.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.listen))?;
    info!("Listening on {}", settings.server.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_requested())
        .await
        .context("HTTP server error")?;

    runner.shutdown().await;
    Ok(())
}

async fn shutdown_requested() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
