// Provider Directory - API Core
//
// CRUD over delivery partners ("providers"), served over both gRPC and
// HTTP/JSON from one process with a shared service layer and Postgres or
// in-memory storage.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
