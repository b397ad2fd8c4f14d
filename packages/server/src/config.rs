use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub grpc: GrpcConfig,
    pub http: HttpConfig,
    pub storage: StorageBackend,
}

#[derive(Debug, Clone)]
pub struct GrpcConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub port: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    /// Upper bound on waiting for in-flight requests during shutdown.
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub enum StorageBackend {
    Postgres(PostgresConfig),
    /// Process-local store; contents are lost on exit.
    Memory,
}

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub database_url: String,
    pub max_pool_size: u32,
    pub conn_attempts: u32,
    pub conn_retry_timeout: Duration,
}

impl GrpcConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

impl HttpConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// Budget for a whole request: reading it plus producing the response.
    pub fn request_timeout(&self) -> Duration {
        self.read_timeout + self.write_timeout
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup. Unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup("STORAGE_BACKEND").as_deref() {
            None | Some("postgres") => StorageBackend::Postgres(PostgresConfig {
                database_url: lookup("DATABASE_URL")
                    .context("DATABASE_URL must be set when STORAGE_BACKEND is postgres")?,
                max_pool_size: parse_or(&lookup, "PG_MAX_POOL_SIZE", 10)?,
                conn_attempts: parse_or(&lookup, "PG_CONN_ATTEMPTS", 10)?,
                conn_retry_timeout: seconds_or(&lookup, "PG_CONN_RETRY_TIMEOUT_SECONDS", 1)?,
            }),
            Some("memory") => StorageBackend::Memory,
            Some(other) => bail!(
                "STORAGE_BACKEND must be 'postgres' or 'memory', got '{}'",
                other
            ),
        };

        Ok(Self {
            grpc: GrpcConfig {
                port: parse_or(&lookup, "GRPC_PORT", 50051)?,
            },
            http: HttpConfig {
                port: parse_or(&lookup, "HTTP_PORT", 8080)?,
                read_timeout: seconds_or(&lookup, "HTTP_READ_TIMEOUT_SECONDS", 5)?,
                write_timeout: seconds_or(&lookup, "HTTP_WRITE_TIMEOUT_SECONDS", 5)?,
                shutdown_timeout: seconds_or(&lookup, "HTTP_SHUTDOWN_TIMEOUT_SECONDS", 3)?,
            },
            storage,
        })
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{} must be a valid number, got '{}'", key, value)),
        None => Ok(default),
    }
}

fn seconds_or<F>(lookup: &F, key: &str, default: u64) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default).map(Duration::from_secs)
}
