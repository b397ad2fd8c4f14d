//! Test harness with testcontainers for integration testing.
//!
//! One Postgres container is started on first use and shared by every test in
//! the binary. Each test gets its own freshly created and migrated database,
//! so tests never see each other's providers.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use test_context::AsyncTestContext;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;
use uuid::Uuid;

use providers_core::domains::providers::{PostgresProviderRepository, ProviderService};
use providers_core::kernel::postgres;

/// Shared test infrastructure that persists across all tests.
struct SharedTestInfra {
    /// Server URL without a database name.
    server_url: String,
    // Keep the container alive for the entire test run
    _postgres: ContainerAsync<Postgres>,
}

static SHARED_INFRA: OnceCell<SharedTestInfra> = OnceCell::const_new();

impl SharedTestInfra {
    async fn init() -> Result<Self> {
        init_tracing();

        let postgres = Postgres::default()
            .with_tag("16")
            .start()
            .await
            .context("Failed to start Postgres container")?;

        let pg_host = postgres.get_host().await?;
        let pg_port = postgres.get_host_port_ipv4(5432).await?;
        let server_url = format!("postgresql://postgres:postgres@{}:{}", pg_host, pg_port);

        Ok(Self {
            server_url,
            _postgres: postgres,
        })
    }

    async fn get() -> &'static Self {
        SHARED_INFRA
            .get_or_init(|| async {
                Self::init()
                    .await
                    .expect("Failed to initialize shared test infrastructure")
            })
            .await
    }
}

/// Route test logs through the test writer; run with
/// `RUST_LOG=debug cargo test -- --nocapture` to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Per-test database on the shared Postgres container.
///
/// ```ignore
/// #[test_context(TestHarness)]
/// #[tokio::test]
/// async fn my_test(ctx: &TestHarness) {
///     let repo = ctx.repository();
/// }
/// ```
pub struct TestHarness {
    pub db_pool: PgPool,
    pub database_url: String,
    database_name: String,
    server_url: String,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new().await.expect("Failed to create test harness")
    }

    async fn teardown(self) {
        self.db_pool.close().await;

        // Best effort; the container goes away with the test binary anyway.
        if let Ok(admin) = PgPool::connect(&format!("{}/postgres", self.server_url)).await {
            let _ = sqlx::query(&format!(
                "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
                self.database_name
            ))
            .execute(&admin)
            .await;
            admin.close().await;
        }
    }
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        let infra = SharedTestInfra::get().await;

        let database_name = format!("providers_test_{}", Uuid::new_v4().simple());
        let admin = PgPool::connect(&format!("{}/postgres", infra.server_url))
            .await
            .context("Failed to connect to Postgres admin database")?;
        sqlx::query(&format!("CREATE DATABASE \"{}\"", database_name))
            .execute(&admin)
            .await
            .context("Failed to create test database")?;
        admin.close().await;

        let database_url = format!("{}/{}", infra.server_url, database_name);
        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&database_url)
            .await
            .context("Failed to connect to test database")?;
        postgres::migrate(&db_pool).await?;

        Ok(Self {
            db_pool,
            database_url,
            database_name,
            server_url: infra.server_url.clone(),
        })
    }

    pub fn repository(&self) -> Arc<PostgresProviderRepository> {
        Arc::new(PostgresProviderRepository::new(self.db_pool.clone()))
    }

    pub fn service(&self) -> Arc<ProviderService> {
        Arc::new(ProviderService::new(self.repository()))
    }
}
