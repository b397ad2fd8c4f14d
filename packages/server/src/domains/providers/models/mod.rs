pub mod provider;

pub use provider::{NewProvider, Provider, ProviderId, ProviderPatch};
