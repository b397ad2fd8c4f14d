//! Provider use cases.
//!
//! Protocol-agnostic orchestration over a [`ProviderRepository`]. Errors are
//! never swallowed or reclassified here; each is wrapped with the call path
//! and passed up with its kind intact.

use std::sync::Arc;

use tracing::debug;

use super::errors::{ProviderResult, ProviderResultExt};
use super::models::{NewProvider, Provider, ProviderId, ProviderPatch};
use super::repository::ProviderRepository;
use crate::common::RequestContext;

#[derive(Clone)]
pub struct ProviderService {
    repo: Arc<dyn ProviderRepository>,
}

impl ProviderService {
    pub fn new(repo: Arc<dyn ProviderRepository>) -> Self {
        Self { repo }
    }

    /// Create a provider and return its id.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        provider: NewProvider,
    ) -> ProviderResult<ProviderId> {
        debug!(provider_id = %provider.id, "creating provider");

        self.repo
            .store(ctx, &provider)
            .await
            .context("ProviderService - create - repo.store")?;

        Ok(provider.id)
    }

    pub async fn list_all(&self, ctx: &RequestContext) -> ProviderResult<Vec<Provider>> {
        let providers = self
            .repo
            .get_all(ctx)
            .await
            .context("ProviderService - list_all - repo.get_all")?;

        debug!(count = providers.len(), "listed providers");
        Ok(providers)
    }

    pub async fn update(
        &self,
        ctx: &RequestContext,
        id: &ProviderId,
        patch: ProviderPatch,
    ) -> ProviderResult<Provider> {
        debug!(provider_id = %id, rename = patch.name.is_some(), "updating provider");

        self.repo
            .update(ctx, id, &patch)
            .await
            .context("ProviderService - update - repo.update")
    }

    pub async fn delete(&self, ctx: &RequestContext, id: &ProviderId) -> ProviderResult<()> {
        debug!(provider_id = %id, "deleting provider");

        self.repo
            .delete(ctx, id)
            .await
            .context("ProviderService - delete - repo.delete")
    }
}
