// Protocol adapters (HTTP + gRPC) and runtime wiring
pub mod app;
pub mod grpc;
pub mod http;
pub mod routes;
pub mod wire;

pub use app::*;
