// Persistence port for providers.
//
// The service depends only on this trait. Implementations are responsible for
// classifying storage failures into the provider error taxonomy; nothing above
// a repository inspects raw storage errors.

use async_trait::async_trait;

use super::errors::ProviderResult;
use super::models::{NewProvider, Provider, ProviderId, ProviderPatch};
use crate::common::RequestContext;

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    /// Insert a new provider. `AlreadyExists` if the id is taken; the existing
    /// row is left untouched.
    async fn store(&self, ctx: &RequestContext, provider: &NewProvider) -> ProviderResult<()>;

    /// Every stored provider. An empty store yields an empty vec.
    async fn get_all(&self, ctx: &RequestContext) -> ProviderResult<Vec<Provider>>;

    /// Apply `patch` to the provider with `id`, refresh `updated_at` and return
    /// the post-update row. `NotFound` if no row matches.
    async fn update(
        &self,
        ctx: &RequestContext,
        id: &ProviderId,
        patch: &ProviderPatch,
    ) -> ProviderResult<Provider>;

    /// Remove exactly one provider. `NotFound` if nothing matched, `Internal`
    /// if more than one row was affected.
    async fn delete(&self, ctx: &RequestContext, id: &ProviderId) -> ProviderResult<()>;
}
