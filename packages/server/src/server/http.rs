//! HTTP/JSON server.

use std::future::IntoFuture;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use axum::{
    extract::Extension,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::HttpConfig;
use crate::kernel::Service;
use crate::server::app::AppState;
use crate::server::routes::{
    create_provider, delete_provider, health_handler, list_providers, update_provider,
};

/// Build the Axum application router
pub fn build_router(state: AppState, config: &HttpConfig) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/v1/providers", post(create_provider).get(list_providers))
        .route(
            "/v1/providers/:provider_id",
            put(update_provider).delete(delete_provider),
        )
        .layer(Extension(state))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(TraceLayer::new_for_http())
}

/// Serves the router on an already-bound listener.
///
/// On shutdown the listener is closed at once, so new connections are
/// refused, and in-flight requests get `shutdown_timeout` to finish. Past
/// that, `abort` is cancelled: handlers still waiting on storage fail with
/// an internal error and their connections close.
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
    shutdown_timeout: Duration,
    abort: CancellationToken,
}

impl HttpServer {
    pub fn new(
        listener: TcpListener,
        router: Router,
        shutdown_timeout: Duration,
        abort: CancellationToken,
    ) -> Self {
        Self {
            listener,
            router,
            shutdown_timeout,
            abort,
        }
    }
}

#[async_trait::async_trait]
impl Service for HttpServer {
    fn name(&self) -> &'static str {
        "http-server"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        let HttpServer {
            listener,
            router,
            shutdown_timeout,
            abort,
        } = *self;

        let addr = listener.local_addr().context("HTTP listener has no address")?;
        info!(%addr, "HTTP server listening");

        let signal = shutdown.clone();
        let server = axum::serve(listener, router)
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .into_future();
        tokio::pin!(server);

        tokio::select! {
            biased;
            result = &mut server => {
                return result.context("HTTP server failed");
            }
            _ = shutdown.cancelled() => {}
        }

        info!(timeout = ?shutdown_timeout, "draining HTTP server");
        match tokio::time::timeout(shutdown_timeout, server).await {
            Ok(result) => {
                result.context("HTTP server failed while draining")?;
                info!("HTTP server drained");
                Ok(())
            }
            Err(_) => {
                warn!(timeout = ?shutdown_timeout, "HTTP drain timed out, aborting in-flight requests");
                abort.cancel();
                bail!("HTTP drain did not finish within {:?}", shutdown_timeout)
            }
        }
    }
}
