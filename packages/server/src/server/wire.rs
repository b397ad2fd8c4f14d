//! Domain error → wire error mapping shared by the HTTP and RPC adapters.
//!
//! Both adapters render failures only through [`WireError`], so the status
//! table and the client-visible text cannot drift between protocols.

use axum::http::StatusCode;
use serde::Serialize;
use tracing::{error, warn};

use crate::domains::providers::{ErrorKind, FieldViolation, ProviderError};

pub const BAD_REQUEST: &str = "bad request";
pub const INTERNAL_SERVER_ERROR: &str = "internal server error";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireError {
    #[serde(skip)]
    pub kind: ErrorKind,
    #[serde(rename = "error")]
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub violations: Vec<FieldViolation>,
}

impl WireError {
    /// Classify `err` and log it. `Internal` details stay in the log.
    pub fn from_domain(err: &ProviderError) -> Self {
        let kind = err.kind();
        let message = match (kind, err.root()) {
            (ErrorKind::ValidationFailed, _) => BAD_REQUEST.to_string(),
            (ErrorKind::AlreadyExists, root) | (ErrorKind::NotFound, root) => root.to_string(),
            (ErrorKind::Internal, _) => INTERNAL_SERVER_ERROR.to_string(),
        };

        if kind == ErrorKind::Internal {
            error!(error = %err, "provider request failed");
        } else {
            warn!(error = %err, kind = %kind, "provider request rejected");
        }

        Self {
            kind,
            message,
            violations: err.violations().to_vec(),
        }
    }

    /// Malformed request bodies that never reached validation.
    pub fn bad_request() -> Self {
        Self {
            kind: ErrorKind::ValidationFailed,
            message: BAD_REQUEST.to_string(),
            violations: Vec::new(),
        }
    }

    pub fn http_status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::AlreadyExists => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn grpc_code(&self) -> tonic::Code {
        match self.kind {
            ErrorKind::ValidationFailed => tonic::Code::InvalidArgument,
            ErrorKind::AlreadyExists => tonic::Code::AlreadyExists,
            ErrorKind::NotFound => tonic::Code::NotFound,
            ErrorKind::Internal => tonic::Code::Internal,
        }
    }

    /// Message with violations inlined, for transports without a structured
    /// violations field.
    pub fn detail(&self) -> String {
        if self.violations.is_empty() {
            return self.message.clone();
        }

        let violations = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}: {}", self.message, violations)
    }
}

impl From<WireError> for tonic::Status {
    fn from(err: WireError) -> Self {
        tonic::Status::new(err.grpc_code(), err.detail())
    }
}
