//! In-memory provider store for bootstrapping and tests.
//!
//! The map never leaves this type. `get_all` takes the read lock, so listings
//! run concurrently with each other; every mutation takes the write lock.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::common::RequestContext;
use crate::domains::providers::errors::{ProviderError, ProviderResult};
use crate::domains::providers::models::{NewProvider, Provider, ProviderId, ProviderPatch};
use crate::domains::providers::repository::ProviderRepository;

#[derive(Debug, Default)]
pub struct InMemoryProviderRepository {
    providers: RwLock<BTreeMap<ProviderId, Provider>>,
}

impl InMemoryProviderRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `updated_at` must move forward on every update, even when the wall clock
/// has not ticked since the previous write.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[async_trait]
impl ProviderRepository for InMemoryProviderRepository {
    async fn store(&self, ctx: &RequestContext, provider: &NewProvider) -> ProviderResult<()> {
        ctx.run(async {
            let mut providers = self.providers.write().await;
            if providers.contains_key(&provider.id) {
                return Err(ProviderError::AlreadyExists(provider.id.clone()));
            }

            let now = Utc::now();
            providers.insert(
                provider.id.clone(),
                Provider {
                    id: provider.id.clone(),
                    name: provider.name.clone(),
                    created_at: now,
                    updated_at: now,
                },
            );
            debug!(provider_id = %provider.id, "provider stored in memory");
            Ok(())
        })
        .await
    }

    async fn get_all(&self, ctx: &RequestContext) -> ProviderResult<Vec<Provider>> {
        ctx.run(async {
            let providers = self.providers.read().await;
            Ok(providers.values().cloned().collect())
        })
        .await
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &ProviderId,
        patch: &ProviderPatch,
    ) -> ProviderResult<Provider> {
        ctx.run(async {
            let mut providers = self.providers.write().await;
            let provider = providers
                .get_mut(id)
                .ok_or_else(|| ProviderError::NotFound(id.clone()))?;

            patch.apply_to(provider);
            provider.updated_at = next_timestamp(provider.updated_at);
            Ok(provider.clone())
        })
        .await
    }

    async fn delete(&self, ctx: &RequestContext, id: &ProviderId) -> ProviderResult<()> {
        ctx.run(async {
            let mut providers = self.providers.write().await;
            match providers.remove(id) {
                Some(_) => Ok(()),
                None => Err(ProviderError::NotFound(id.clone())),
            }
        })
        .await
    }
}
