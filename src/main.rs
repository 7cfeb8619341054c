use anyhow::Result;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use pagewatch::audit::PatternSet;
use pagewatch::config::Config;
use pagewatch::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pagewatch=debug".parse()?),
        )
        .json()
        .init();

    let config = Config::from_env()?;

    // Bad policy is a startup failure, never an audit-time one
    let policy = config.load_policy()?;

    info!("Starting pagewatch v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Policy: {} header rules ({})",
        policy.len(),
        config
            .policy_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in".to_string())
    );
    info!("Sensitive patterns: {}", PatternSet::builtin().len());

    if config.api_key.is_some() {
        info!("API key authentication enabled");
    } else {
        info!("API key authentication disabled (open mode)");
    }

    let state = Arc::new(AppState::new(config.clone(), policy));
    let app = build_router(state.clone());

    // Start server with graceful shutdown
    let addr = format!("0.0.0.0:{}", config.port);
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM. Cached tab headers live only in memory, so
/// the number being discarded is logged before the server drains.
async fn shutdown_signal(state: Arc<AppState>) {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => "Ctrl+C",
            Err(e) => {
                tracing::error!("Ctrl+C handler unavailable: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                tracing::error!("SIGTERM handler unavailable: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let received = tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    };

    info!(
        "Received {}, dropping headers for {} cached tabs",
        received,
        state.header_cache.len().await
    );
}
