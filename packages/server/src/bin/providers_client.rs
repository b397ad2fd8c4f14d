//! CLI client for the providers gRPC API
//!
//! Every call carries a deadline (`--timeout-ms`). Results are printed as
//! JSON; failures print the gRPC status and exit non-zero.

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use providers_core::server::grpc::proto::{
    self, providers_service_client::ProvidersServiceClient, CreateProviderRequest,
    DeleteProviderRequest, ListAllProvidersRequest, UpdateProviderRequest,
};
use serde::Serialize;
use tonic::transport::Channel;

#[derive(Parser)]
#[command(name = "providers_client")]
#[command(about = "Call the providers gRPC API")]
struct Cli {
    /// Server address
    #[arg(long, env = "PROVIDERS_GRPC_ADDR", default_value = "http://localhost:50051")]
    addr: String,

    /// Per-call deadline in milliseconds
    #[arg(long, default_value_t = 100)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a provider
    Create { id: String, name: String },

    /// List every provider
    List,

    /// Rename a provider; omit --name to only refresh its timestamp
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
    },

    /// Delete a provider
    Delete { id: String },
}

#[derive(Serialize)]
struct ProviderOutput {
    provider_id: String,
    name: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<proto::Provider> for ProviderOutput {
    fn from(provider: proto::Provider) -> Self {
        Self {
            created_at: provider.created_at.as_ref().and_then(proto::from_timestamp),
            updated_at: provider.updated_at.as_ref().and_then(proto::from_timestamp),
            provider_id: provider.provider_id,
            name: provider.name,
        }
    }
}

fn request<T>(message: T, timeout: Duration) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    request.set_timeout(timeout);
    request
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn execute(
    client: &mut ProvidersServiceClient<Channel>,
    command: Commands,
    timeout: Duration,
) -> Result<()> {
    match command {
        Commands::Create { id, name } => {
            let response = client
                .create_provider(request(
                    CreateProviderRequest {
                        provider_id: id,
                        name,
                    },
                    timeout,
                ))
                .await?
                .into_inner();
            print_json(&serde_json::json!({ "provider_id": response.provider_id }))
        }
        Commands::List => {
            let response = client
                .list_all_providers(request(ListAllProvidersRequest {}, timeout))
                .await?
                .into_inner();
            let providers: Vec<ProviderOutput> =
                response.providers.into_iter().map(Into::into).collect();
            print_json(&providers)
        }
        Commands::Update { id, name } => {
            let response = client
                .update_provider(request(
                    UpdateProviderRequest {
                        provider_id: id,
                        name,
                    },
                    timeout,
                ))
                .await?
                .into_inner();
            let provider = response
                .provider
                .context("server returned no provider")?;
            print_json(&ProviderOutput::from(provider))
        }
        Commands::Delete { id } => {
            client
                .delete_provider(request(DeleteProviderRequest { provider_id: id }, timeout))
                .await?;
            print_json(&serde_json::json!({ "deleted": true }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut client = ProvidersServiceClient::connect(cli.addr.clone())
        .await
        .with_context(|| format!("Failed to connect to {}", cli.addr))?;

    execute(
        &mut client,
        cli.command,
        Duration::from_millis(cli.timeout_ms),
    )
    .await
}
