//! gRPC server (`providers.v1.ProvidersService`).

pub mod proto;
pub mod providers;

pub use providers::ProvidersGrpc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;
use tracing::info;

use crate::kernel::Service;
use proto::providers_service_server::ProvidersServiceServer;

/// Serves [`ProvidersGrpc`] and server reflection on an already-bound listener.
///
/// The drain after shutdown has no deadline of its own: it ends when the last
/// in-flight call completes, so clients are expected to send deadlines.
pub struct GrpcServer {
    listener: TcpListener,
    handler: ProvidersGrpc,
}

impl GrpcServer {
    pub fn new(listener: TcpListener, handler: ProvidersGrpc) -> Self {
        Self { listener, handler }
    }
}

#[async_trait::async_trait]
impl Service for GrpcServer {
    fn name(&self) -> &'static str {
        "grpc-server"
    }

    async fn run(self: Box<Self>, shutdown: CancellationToken) -> Result<()> {
        let addr = self
            .listener
            .local_addr()
            .context("gRPC listener has no address")?;
        info!(%addr, "gRPC server listening");

        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(proto::FILE_DESCRIPTOR_SET)
            .build_v1()
            .context("Failed to build gRPC reflection service")?;

        Server::builder()
            .add_service(reflection)
            .add_service(ProvidersServiceServer::new(self.handler))
            .serve_with_incoming_shutdown(TcpListenerStream::new(self.listener), async move {
                shutdown.cancelled().await;
                info!("draining gRPC server");
            })
            .await
            .context("gRPC server failed")?;

        info!("gRPC server drained");
        Ok(())
    }
}
