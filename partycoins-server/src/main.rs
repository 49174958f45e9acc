use anyhow::Context;
use partycoins_core::Ledger;
use partycoins_server::{router, AppState, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("partycoins=info,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.api_key.is_none() {
        tracing::warn!("PARTYCOINS_API_KEY not set, every request will be accepted");
    }

    let ledger = Arc::new(
        Ledger::open(config.ledger.clone())
            .await
            .context("failed to open ledger")?,
    );
    let app = router(AppState::new(ledger.clone(), config.api_key.clone()));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!("partycoins-server listening on http://{}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    match Arc::try_unwrap(ledger) {
        Ok(ledger) => ledger.close()?,
        Err(_) => tracing::warn!("Ledger still in use at shutdown, dropping without close"),
    }

    tracing::info!("partycoins-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
