use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied natural key of a provider (e.g. `"kuper"`).
///
/// Opaque to the system: no format is imposed beyond being non-empty,
/// which is checked by the adapters before anything reaches storage.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProviderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Provider model - a delivery/logistics partner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Provider {
    #[sqlx(rename = "provider_id")]
    pub id: ProviderId,
    pub name: String,

    // Timestamps (storage-assigned)
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProvider {
    pub id: ProviderId,
    pub name: String,
}

impl NewProvider {
    pub fn new(id: impl Into<ProviderId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Input for updating a provider.
///
/// Each field is `None` when the caller did not supply it, which leaves the
/// stored value unchanged. A supplied field must be valid on its own; an empty
/// `name` is rejected rather than treated as "absent".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderPatch {
    pub name: Option<String>,
}

impl ProviderPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }

    /// Apply the supplied fields to `provider` in place.
    pub fn apply_to(&self, provider: &mut Provider) {
        if let Some(name) = &self.name {
            provider.name = name.clone();
        }
    }
}
