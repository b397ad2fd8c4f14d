// Types shared across the domain and server layers

pub mod context;

pub use context::RequestContext;
