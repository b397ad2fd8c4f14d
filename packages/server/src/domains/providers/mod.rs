//! Providers domain - the managed delivery partner directory

pub mod errors;
pub mod models;
pub mod repository;
pub mod service;
pub mod stores;
pub mod validation;

pub use errors::{
    ErrorKind, FieldViolation, Interruption, ProviderError, ProviderResult, ProviderResultExt,
};
pub use models::{NewProvider, Provider, ProviderId, ProviderPatch};
pub use repository::ProviderRepository;
pub use service::ProviderService;
pub use stores::{InMemoryProviderRepository, PostgresProviderRepository};
