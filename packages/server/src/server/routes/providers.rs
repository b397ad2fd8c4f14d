use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domains::providers::validation::{
    validate_new_provider, validate_patch, validate_provider_id,
};
use crate::domains::providers::{NewProvider, Provider, ProviderError, ProviderId, ProviderPatch};
use crate::server::app::AppState;
use crate::server::wire::WireError;

/// Missing fields deserialize as empty strings so validation can report them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateProviderRequest {
    pub provider_id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProviderResponse {
    pub provider_id: String,
}

/// `name` absent leaves the stored name unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProviderRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub provider_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Provider> for ProviderResponse {
    fn from(provider: Provider) -> Self {
        Self {
            provider_id: provider.id.into_inner(),
            name: provider.name,
            created_at: provider.created_at,
            updated_at: provider.updated_at,
        }
    }
}

/// Error response rendered through the shared wire mapping.
#[derive(Debug)]
pub struct ApiError(WireError);

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        ApiError(WireError::from_domain(&err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(error = %rejection, "rejected request body");
        ApiError(WireError::bad_request())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0.http_status(), Json(self.0)).into_response()
    }
}

/// POST /v1/providers
pub async fn create_provider(
    Extension(state): Extension<AppState>,
    payload: Result<Json<CreateProviderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateProviderResponse>), ApiError> {
    let Json(request) = payload?;
    let provider = NewProvider::new(request.provider_id, request.name);
    validate_new_provider(&provider)?;

    let id = state
        .providers
        .create(&state.request_context(), provider)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateProviderResponse {
            provider_id: id.into_inner(),
        }),
    ))
}

/// GET /v1/providers
pub async fn list_providers(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<ProviderResponse>>, ApiError> {
    let providers = state.providers.list_all(&state.request_context()).await?;

    Ok(Json(
        providers.into_iter().map(ProviderResponse::from).collect(),
    ))
}

/// PUT /v1/providers/:provider_id
pub async fn update_provider(
    Extension(state): Extension<AppState>,
    Path(provider_id): Path<String>,
    payload: Result<Json<UpdateProviderRequest>, JsonRejection>,
) -> Result<Json<ProviderResponse>, ApiError> {
    let Json(request) = payload?;
    let id = ProviderId::new(provider_id);
    let patch = ProviderPatch { name: request.name };
    validate_patch(&id, &patch)?;

    let provider = state
        .providers
        .update(&state.request_context(), &id, patch)
        .await?;

    Ok(Json(provider.into()))
}

/// DELETE /v1/providers/:provider_id
pub async fn delete_provider(
    Extension(state): Extension<AppState>,
    Path(provider_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ProviderId::new(provider_id);
    validate_provider_id(&id)?;

    state
        .providers
        .delete(&state.request_context(), &id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
