//! PostgreSQL provider store.
//!
//! Each operation is a single statement, so the pool is the only
//! synchronisation needed. Storage failures are classified here:
//! unique violations become `AlreadyExists`, zero-row updates and deletes
//! become `NotFound`, everything else is `Internal`.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, error};

use crate::common::RequestContext;
use crate::domains::providers::errors::{ProviderError, ProviderResult, ProviderResultExt};
use crate::domains::providers::models::{NewProvider, Provider, ProviderId, ProviderPatch};
use crate::domains::providers::repository::ProviderRepository;

#[derive(Debug, Clone)]
pub struct PostgresProviderRepository {
    pool: PgPool,
}

impl PostgresProviderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

#[async_trait]
impl ProviderRepository for PostgresProviderRepository {
    async fn store(&self, ctx: &RequestContext, provider: &NewProvider) -> ProviderResult<()> {
        ctx.run(async {
            let result = sqlx::query("INSERT INTO providers (provider_id, name) VALUES ($1, $2)")
                .bind(&provider.id)
                .bind(&provider.name)
                .execute(&self.pool)
                .await;

            match result {
                Ok(_) => {
                    debug!(provider_id = %provider.id, "provider inserted");
                    Ok(())
                }
                Err(e) if is_unique_violation(&e) => {
                    Err(ProviderError::AlreadyExists(provider.id.clone()))
                }
                Err(e) => Err(ProviderError::internal(e)),
            }
        })
        .await
        .context("PostgresProviderRepository - store - execute")
    }

    async fn get_all(&self, ctx: &RequestContext) -> ProviderResult<Vec<Provider>> {
        ctx.run(async {
            sqlx::query_as::<_, Provider>(
                r#"
                SELECT provider_id, name, created_at, updated_at
                FROM providers
                ORDER BY created_at, provider_id
                "#,
            )
            .fetch_all(&self.pool)
            .await
            .map_err(ProviderError::internal)
        })
        .await
        .context("PostgresProviderRepository - get_all - fetch_all")
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: &ProviderId,
        patch: &ProviderPatch,
    ) -> ProviderResult<Provider> {
        ctx.run(async {
            let provider = sqlx::query_as::<_, Provider>(
                r#"
                UPDATE providers SET
                    name = COALESCE($2, name),
                    updated_at = NOW()
                WHERE provider_id = $1
                RETURNING provider_id, name, created_at, updated_at
                "#,
            )
            .bind(id)
            .bind(&patch.name)
            .fetch_optional(&self.pool)
            .await
            .map_err(ProviderError::internal)?;

            provider.ok_or_else(|| ProviderError::NotFound(id.clone()))
        })
        .await
        .context("PostgresProviderRepository - update - fetch_optional")
    }

    async fn delete(&self, ctx: &RequestContext, id: &ProviderId) -> ProviderResult<()> {
        ctx.run(async {
            let result = sqlx::query("DELETE FROM providers WHERE provider_id = $1")
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(ProviderError::internal)?;

            match result.rows_affected() {
                1 => Ok(()),
                0 => Err(ProviderError::NotFound(id.clone())),
                affected => {
                    error!(provider_id = %id, affected, "delete removed more than one provider");
                    Err(ProviderError::internal(anyhow::anyhow!(
                        "delete of {} affected {} rows",
                        id,
                        affected
                    )))
                }
            }
        })
        .await
        .context("PostgresProviderRepository - delete - execute")
    }
}
