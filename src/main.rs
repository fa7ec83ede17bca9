//! Session Context - HTTP server binary
//!
//! Serves context preparation and session history over the session cache.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use session_context::api::{create_router, AppState};
use session_context::packing::{TokenCounter, WhitespaceTokenizer};
use session_context::session::InMemoryStore;
use session_context::Config;

/// Main entry point for the session context server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the session cache (which starts its janitor), store and pipeline
/// 4. Create Axum router with all endpoints
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, stop the janitor and drain
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_context=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting session context server");

    let config = Config::from_env();
    info!(
        capacity = config.cache.capacity,
        expiry_secs = config.cache.expiry_time.as_secs(),
        cleanup_secs = config.cache.cleanup_interval.as_secs(),
        max_context_tokens = config.packer.max_context_tokens,
        max_history_tokens = config.packer.max_history_tokens,
        port = config.server_port,
        "Configuration loaded"
    );

    let state = AppState::with_backends(&config, Arc::new(InMemoryStore::new()), tokenizer()?);
    let cache = state.cache.clone();

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    cache.shutdown();
    info!("Server shutdown complete");
    Ok(())
}

/// Picks the token counter: a HuggingFace tokenizer file when `TOKENIZER_FILE`
/// is set and the `hf-tokenizer` feature is enabled, whitespace otherwise.
#[cfg(feature = "hf-tokenizer")]
fn tokenizer() -> anyhow::Result<Arc<dyn TokenCounter>> {
    use session_context::packing::HfTokenizer;

    match std::env::var("TOKENIZER_FILE") {
        Ok(path) => {
            let tokenizer = HfTokenizer::from_file(&path)
                .map_err(|err| anyhow::anyhow!("failed to load tokenizer {}: {}", path, err))?;
            info!(path = %path, "Using HuggingFace tokenizer");
            Ok(Arc::new(tokenizer))
        }
        Err(_) => Ok(Arc::new(WhitespaceTokenizer)),
    }
}

#[cfg(not(feature = "hf-tokenizer"))]
fn tokenizer() -> anyhow::Result<Arc<dyn TokenCounter>> {
    if std::env::var("TOKENIZER_FILE").is_ok() {
        warn!("TOKENIZER_FILE is set but the hf-tokenizer feature is disabled; counting whitespace tokens");
    }
    Ok(Arc::new(WhitespaceTokenizer))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
