//! Test fixtures: running applications and repositories with controllable timing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tonic::transport::Channel;

use providers_core::common::RequestContext;
use providers_core::config::{Config, GrpcConfig, HttpConfig, StorageBackend};
use providers_core::domains::providers::{
    InMemoryProviderRepository, NewProvider, Provider, ProviderId, ProviderPatch,
    ProviderRepository, ProviderResult, ProviderService,
};
use providers_core::kernel::{RuntimeState, Trigger};
use providers_core::server::grpc::proto::providers_service_client::ProvidersServiceClient;
use providers_core::server::Application;

/// Config binding both servers to ephemeral ports.
pub fn test_config(shutdown_timeout: Duration) -> Config {
    Config {
        grpc: GrpcConfig { port: 0 },
        http: HttpConfig {
            port: 0,
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
            shutdown_timeout,
        },
        storage: StorageBackend::Memory,
    }
}

/// An [`Application`] serving in a background task.
pub struct RunningApp {
    pub grpc_addr: SocketAddr,
    pub http_addr: SocketAddr,
    pub state: watch::Receiver<RuntimeState>,
    shutdown: CancellationToken,
    handle: JoinHandle<Trigger>,
}

impl RunningApp {
    pub async fn start(repo: Arc<dyn ProviderRepository>, shutdown_timeout: Duration) -> Self {
        let providers = Arc::new(ProviderService::new(repo));
        let app = Application::bind(&test_config(shutdown_timeout), providers)
            .await
            .expect("Failed to bind application");

        let grpc_addr = loopback(app.grpc_addr());
        let http_addr = loopback(app.http_addr());
        let mut state = app.state();
        let shutdown = app.shutdown_token();
        let handle = tokio::spawn(app.run_until(std::future::pending()));

        state
            .wait_for(|s| *s == RuntimeState::Running)
            .await
            .expect("runtime never reached running");

        Self {
            grpc_addr,
            http_addr,
            state,
            shutdown,
            handle,
        }
    }

    pub async fn in_memory() -> Self {
        Self::start(
            Arc::new(InMemoryProviderRepository::new()),
            Duration::from_secs(3),
        )
        .await
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.http_addr, path)
    }

    pub async fn grpc_client(&self) -> ProvidersServiceClient<Channel> {
        ProvidersServiceClient::connect(format!("http://{}", self.grpc_addr))
            .await
            .expect("Failed to connect gRPC client")
    }

    /// Fire the shutdown signal without waiting for the drain.
    pub fn signal_shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait for the runtime to finish draining.
    pub async fn stopped(self) -> Trigger {
        self.handle.await.expect("runtime task panicked")
    }

    pub async fn stop(self) -> Trigger {
        self.signal_shutdown();
        self.stopped().await
    }
}

/// Listeners bind 0.0.0.0; clients dial loopback on the same port.
fn loopback(addr: SocketAddr) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], addr.port()))
}

/// In-memory repository whose `get_all` announces itself and then stalls.
/// The stall runs under the request context, so cancellation cuts it short.
pub struct SlowRepository {
    inner: InMemoryProviderRepository,
    delay: Duration,
    pub entered: Arc<Notify>,
}

impl SlowRepository {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryProviderRepository::new(),
            delay,
            entered: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl ProviderRepository for SlowRepository {
    async fn store(&self, ctx: &RequestContext, provider: &NewProvider) -> ProviderResult<()> {
        self.inner.store(ctx, provider).await
    }

    async fn get_all(&self, ctx: &RequestContext) -> ProviderResult<Vec<Provider>> {
        self.entered.notify_one();
        ctx.run(async {
            tokio::time::sleep(self.delay).await;
            Ok(())
        })
        .await?;
        self.inner.get_all(ctx).await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &ProviderId,
        patch: &ProviderPatch,
    ) -> ProviderResult<Provider> {
        self.inner.update(ctx, id, patch).await
    }

    async fn delete(&self, ctx: &RequestContext, id: &ProviderId) -> ProviderResult<()> {
        self.inner.delete(ctx, id).await
    }
}
