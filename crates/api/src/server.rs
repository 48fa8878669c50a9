//! Process lifecycle: bind, serve, drain on shutdown, release the stores.

use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{error, info, warn};

use stockroom_infra::config::AppConfig;

use crate::app::{self, services};

/// Run the HTTP server until SIGINT/SIGTERM, then drain and close the stores.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let services = Arc::new(
        services::build_services(&config.storage)
            .await
            .context("failed to initialise stores")?,
    );
    info!(backend = services.backend_name(), "stores ready");

    let app = app::build_app(services.clone());

    let listener = TcpListener::bind(config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    info!(addr = %listener.local_addr()?, "listening");

    let result = serve(
        listener,
        app,
        shutdown_signal(),
        config.server.shutdown_timeout,
    )
    .await;

    services.shutdown().await;
    info!("server stopped");
    result
}

/// Serve `app` until `signal` resolves, then give in-flight requests up to
/// `grace` to finish before returning.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    signal: F,
    grace: Duration,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (fired_tx, fired_rx) = oneshot::channel::<()>();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            let _ = fired_tx.send(());
        })
        .into_future();
    tokio::pin!(server);

    let deadline = async move {
        match fired_rx.await {
            Ok(()) => tokio::time::sleep(grace).await,
            Err(_) => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        result = &mut server => result.context("server error")?,
        _ = deadline => {
            warn!(grace_secs = grace.as_secs(), "shutdown grace period elapsed; dropping open connections");
        }
    }
    Ok(())
}

/// Resolves on SIGINT (Ctrl-C) or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    info!("shutdown signal received");
}
