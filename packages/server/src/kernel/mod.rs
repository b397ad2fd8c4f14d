//! Kernel module - server infrastructure.

pub mod postgres;
pub mod service_host;

pub use service_host::{RuntimeState, Service, ServiceHost, Trigger};
