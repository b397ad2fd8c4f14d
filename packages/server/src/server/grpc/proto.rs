//! `providers.v1` messages and the generated `ProvidersService` stubs.
//!
//! Field tags are the wire contract; never renumber them.

use chrono::{DateTime, Utc};

#[derive(Clone, PartialEq, prost::Message)]
pub struct Provider {
    #[prost(string, tag = "1")]
    pub provider_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, optional, tag = "3")]
    pub created_at: Option<prost_types::Timestamp>,
    #[prost(message, optional, tag = "4")]
    pub updated_at: Option<prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateProviderRequest {
    #[prost(string, tag = "1")]
    pub provider_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateProviderResponse {
    #[prost(string, tag = "1")]
    pub provider_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListAllProvidersRequest {}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ListAllProvidersResponse {
    #[prost(message, repeated, tag = "1")]
    pub providers: Vec<Provider>,
}

/// `name` unset leaves the stored name unchanged.
#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateProviderRequest {
    #[prost(string, tag = "1")]
    pub provider_id: String,
    #[prost(string, optional, tag = "2")]
    pub name: Option<String>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UpdateProviderResponse {
    #[prost(message, optional, tag = "1")]
    pub provider: Option<Provider>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeleteProviderRequest {
    #[prost(string, tag = "1")]
    pub provider_id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct DeleteProviderResponse {}

include!(concat!(env!("OUT_DIR"), "/providers.v1.ProvidersService.rs"));

/// Encoded `FileDescriptorSet` for `providers.v1`, served by gRPC reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] =
    include_bytes!(concat!(env!("OUT_DIR"), "/providers_descriptor.bin"));

pub fn to_timestamp(at: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}

/// `None` for timestamps outside chrono's range or with invalid nanos.
pub fn from_timestamp(ts: &prost_types::Timestamp) -> Option<DateTime<Utc>> {
    let nanos = u32::try_from(ts.nanos).ok()?;
    DateTime::from_timestamp(ts.seconds, nanos)
}

impl From<crate::domains::providers::Provider> for Provider {
    fn from(provider: crate::domains::providers::Provider) -> Self {
        Self {
            provider_id: provider.id.into_inner(),
            name: provider.name,
            created_at: Some(to_timestamp(provider.created_at)),
            updated_at: Some(to_timestamp(provider.updated_at)),
        }
    }
}
