//! Application setup and the dual-server runtime.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::common::RequestContext;
use crate::config::{Config, StorageBackend};
use crate::domains::providers::{
    InMemoryProviderRepository, PostgresProviderRepository, ProviderRepository, ProviderService,
};
use crate::kernel::{postgres, RuntimeState, ServiceHost, Trigger};
use crate::server::grpc::{GrpcServer, ProvidersGrpc};
use crate::server::http::{build_router, HttpServer};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub providers: Arc<ProviderService>,
    /// Deadline handed to the service for each HTTP request.
    pub request_timeout: Duration,
    /// Cancelled when the HTTP drain runs out of time. Every request context
    /// derives from it, so storage calls still in flight are abandoned.
    pub drain: CancellationToken,
}

impl AppState {
    pub fn new(providers: Arc<ProviderService>, request_timeout: Duration) -> Self {
        Self {
            providers,
            request_timeout,
            drain: CancellationToken::new(),
        }
    }

    pub fn request_context(&self) -> RequestContext {
        RequestContext::child_of(&self.drain).deadline_after(self.request_timeout)
    }
}

/// Both servers bound and ready to run.
pub struct Application {
    host: ServiceHost,
    grpc_addr: SocketAddr,
    http_addr: SocketAddr,
}

impl Application {
    /// Bind both listeners. Failure to bind either one aborts startup;
    /// nothing is served until both are bound.
    pub async fn bind(config: &Config, providers: Arc<ProviderService>) -> Result<Self> {
        let host = ServiceHost::new();
        host.set_state(RuntimeState::Starting);

        let listeners = bind_listeners(config).await;
        let (grpc_listener, http_listener) = match listeners {
            Ok(listeners) => listeners,
            Err(e) => {
                host.set_state(RuntimeState::Stopped);
                return Err(e);
            }
        };
        let grpc_addr = grpc_listener.local_addr()?;
        let http_addr = http_listener.local_addr()?;

        let grpc = GrpcServer::new(grpc_listener, ProvidersGrpc::new(providers.clone()));
        let state = AppState::new(providers, config.http.write_timeout);
        let http = HttpServer::new(
            http_listener,
            build_router(state.clone(), &config.http),
            config.http.shutdown_timeout,
            state.drain,
        );

        Ok(Self {
            host: host.with_service(grpc).with_service(http),
            grpc_addr,
            http_addr,
        })
    }

    pub fn grpc_addr(&self) -> SocketAddr {
        self.grpc_addr
    }

    pub fn http_addr(&self) -> SocketAddr {
        self.http_addr
    }

    pub fn state(&self) -> watch::Receiver<RuntimeState> {
        self.host.subscribe()
    }

    /// Cancelling the token has the same effect as the shutdown signal.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.host.shutdown_token()
    }

    /// Serve until `signal` resolves or a server fails, then drain both.
    pub async fn run_until<F>(self, signal: F) -> Trigger
    where
        F: std::future::Future<Output = ()>,
    {
        info!(grpc = %self.grpc_addr, http = %self.http_addr, "serving providers");
        self.host.run_until(signal).await
    }
}

async fn bind_listeners(config: &Config) -> Result<(TcpListener, TcpListener)> {
    let grpc = TcpListener::bind(config.grpc.addr())
        .await
        .with_context(|| format!("Failed to bind gRPC listener on {}", config.grpc.addr()))?;
    let http = TcpListener::bind(config.http.addr())
        .await
        .with_context(|| format!("Failed to bind HTTP listener on {}", config.http.addr()))?;
    Ok((grpc, http))
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
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
        _ = ctrl_c => info!("received Ctrl-C"),
        _ = terminate => info!("received SIGTERM"),
    }
}

/// Wire storage, service and both servers from `config` and run until
/// shutdown. A server failure is returned as an error.
pub async fn run(config: Config) -> Result<()> {
    let (repo, pool): (Arc<dyn ProviderRepository>, Option<PgPool>) = match &config.storage {
        StorageBackend::Postgres(pg) => {
            let pool = postgres::connect(pg).await?;
            (
                Arc::new(PostgresProviderRepository::new(pool.clone())),
                Some(pool),
            )
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; providers are lost on exit");
            (Arc::new(InMemoryProviderRepository::new()), None)
        }
    };
    let providers = Arc::new(ProviderService::new(repo));

    let app = Application::bind(&config, providers).await?;
    let trigger = app.run_until(shutdown_signal()).await;

    if let Some(pool) = pool {
        pool.close().await;
    }

    match trigger {
        Trigger::Signal => {
            info!("Shutdown complete");
            Ok(())
        }
        Trigger::ServiceFailed { service, error } => {
            Err(error.context(format!("{} failed", service)))
        }
    }
}
