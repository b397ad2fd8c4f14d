//! Provider error taxonomy.
//!
//! Every failure that leaves the repository is one of four kinds (see
//! [`ErrorKind`]). Layers above storage may wrap an error with call-site
//! context, but the kind of the innermost error is always preserved and can be
//! tested with [`ProviderError::kind`] or [`ProviderError::is`] regardless of
//! how many layers wrapped it.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::models::ProviderId;

/// Transport-independent classification of a provider error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ValidationFailed,
    AlreadyExists,
    NotFound,
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ValidationFailed => write!(f, "validation_failed"),
            ErrorKind::AlreadyExists => write!(f, "already_exists"),
            ErrorKind::NotFound => write!(f, "not_found"),
            ErrorKind::Internal => write!(f, "internal"),
        }
    }
}

/// A single rejected request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub description: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            description: description.into(),
        }
    }

    pub fn empty(field: impl Into<String>) -> Self {
        Self::new(field, "empty")
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.description)
    }
}

/// Why an operation was abandoned before storage answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interruption {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interruption::Cancelled => write!(f, "cancelled"),
            Interruption::DeadlineExceeded => write!(f, "deadline exceeded"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("validation failed: {}", join_violations(.0))]
    ValidationFailed(Vec<FieldViolation>),

    #[error("{0}: already exists")]
    AlreadyExists(ProviderId),

    #[error("{0}: not found")]
    NotFound(ProviderId),

    /// The caller gave up (cancellation or deadline); classified as `Internal`.
    #[error("operation {0}")]
    Interrupted(Interruption),

    #[error("internal error: {0:#}")]
    Internal(#[source] anyhow::Error),

    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<ProviderError>,
    },
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProviderError {
    pub fn internal(error: impl Into<anyhow::Error>) -> Self {
        ProviderError::Internal(error.into())
    }

    /// Kind of the innermost error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProviderError::ValidationFailed(_) => ErrorKind::ValidationFailed,
            ProviderError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            ProviderError::NotFound(_) => ErrorKind::NotFound,
            ProviderError::Interrupted(_) | ProviderError::Internal(_) => ErrorKind::Internal,
            ProviderError::Context { source, .. } => source.kind(),
        }
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind() == kind
    }

    /// The error with every context wrapper peeled off.
    pub fn root(&self) -> &ProviderError {
        let mut current = self;
        while let ProviderError::Context { source, .. } = current {
            current = source;
        }
        current
    }

    /// Field violations carried by a `ValidationFailed` error, empty otherwise.
    pub fn violations(&self) -> &[FieldViolation] {
        match self.root() {
            ProviderError::ValidationFailed(violations) => violations,
            _ => &[],
        }
    }

    pub fn interruption(&self) -> Option<Interruption> {
        match self.root() {
            ProviderError::Interrupted(reason) => Some(*reason),
            _ => None,
        }
    }

    pub fn context(self, context: &'static str) -> Self {
        ProviderError::Context {
            context,
            source: Box::new(self),
        }
    }
}

pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Attach call-path context to a provider result without changing its kind.
pub trait ProviderResultExt<T> {
    fn context(self, context: &'static str) -> ProviderResult<T>;
}

impl<T> ProviderResultExt<T> for ProviderResult<T> {
    fn context(self, context: &'static str) -> ProviderResult<T> {
        self.map_err(|e| e.context(context))
    }
}
