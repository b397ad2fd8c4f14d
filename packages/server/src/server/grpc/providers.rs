use std::sync::Arc;
use std::time::Duration;

use tonic::{Request, Response, Status};

use super::proto::{
    self, providers_service_server::ProvidersService, CreateProviderRequest,
    CreateProviderResponse, DeleteProviderRequest, DeleteProviderResponse,
    ListAllProvidersRequest, ListAllProvidersResponse, UpdateProviderRequest,
    UpdateProviderResponse,
};
use crate::common::RequestContext;
use crate::domains::providers::validation::{
    validate_new_provider, validate_patch, validate_provider_id,
};
use crate::domains::providers::{
    NewProvider, ProviderError, ProviderId, ProviderPatch, ProviderService,
};
use crate::server::wire::WireError;

const GRPC_TIMEOUT_HEADER: &str = "grpc-timeout";

/// RPC adapter over [`ProviderService`].
#[derive(Clone)]
pub struct ProvidersGrpc {
    providers: Arc<ProviderService>,
}

impl ProvidersGrpc {
    pub fn new(providers: Arc<ProviderService>) -> Self {
        Self { providers }
    }
}

fn status(err: ProviderError) -> Status {
    WireError::from_domain(&err).into()
}

/// Parse a `grpc-timeout` header value: up to eight digits and a unit.
fn parse_grpc_timeout(value: &str) -> Option<Duration> {
    if value.len() < 2 || value.len() > 9 {
        return None;
    }
    let (digits, unit) = value.split_at(value.len() - 1);
    let amount: u64 = digits.parse().ok()?;

    let duration = match unit {
        "H" => Duration::from_secs(amount.checked_mul(3600)?),
        "M" => Duration::from_secs(amount.checked_mul(60)?),
        "S" => Duration::from_secs(amount),
        "m" => Duration::from_millis(amount),
        "u" => Duration::from_micros(amount),
        "n" => Duration::from_nanos(amount),
        _ => return None,
    };
    Some(duration)
}

/// Context bounded by the caller's deadline, if it sent one.
fn request_context<T>(request: &Request<T>) -> RequestContext {
    request
        .metadata()
        .get(GRPC_TIMEOUT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_grpc_timeout)
        .map(RequestContext::with_timeout)
        .unwrap_or_default()
}

#[tonic::async_trait]
impl ProvidersService for ProvidersGrpc {
    async fn create_provider(
        &self,
        request: Request<CreateProviderRequest>,
    ) -> Result<Response<CreateProviderResponse>, Status> {
        let ctx = request_context(&request);
        let request = request.into_inner();

        let provider = NewProvider::new(request.provider_id, request.name);
        validate_new_provider(&provider).map_err(status)?;

        let id = self
            .providers
            .create(&ctx, provider)
            .await
            .map_err(status)?;

        Ok(Response::new(CreateProviderResponse {
            provider_id: id.into_inner(),
        }))
    }

    async fn list_all_providers(
        &self,
        request: Request<ListAllProvidersRequest>,
    ) -> Result<Response<ListAllProvidersResponse>, Status> {
        let ctx = request_context(&request);

        let providers = self.providers.list_all(&ctx).await.map_err(status)?;

        Ok(Response::new(ListAllProvidersResponse {
            providers: providers.into_iter().map(proto::Provider::from).collect(),
        }))
    }

    async fn update_provider(
        &self,
        request: Request<UpdateProviderRequest>,
    ) -> Result<Response<UpdateProviderResponse>, Status> {
        let ctx = request_context(&request);
        let request = request.into_inner();

        let id = ProviderId::new(request.provider_id);
        let patch = ProviderPatch { name: request.name };
        validate_patch(&id, &patch).map_err(status)?;

        let provider = self
            .providers
            .update(&ctx, &id, patch)
            .await
            .map_err(status)?;

        Ok(Response::new(UpdateProviderResponse {
            provider: Some(provider.into()),
        }))
    }

    async fn delete_provider(
        &self,
        request: Request<DeleteProviderRequest>,
    ) -> Result<Response<DeleteProviderResponse>, Status> {
        let ctx = request_context(&request);
        let id = ProviderId::new(request.into_inner().provider_id);
        validate_provider_id(&id).map_err(status)?;

        self.providers.delete(&ctx, &id).await.map_err(status)?;

        Ok(Response::new(DeleteProviderResponse {}))
    }
}
