//! Request validation shared by the HTTP and gRPC adapters.
//!
//! Both adapters call these before touching the service, so the rules (and the
//! shape of the resulting `ValidationFailed` error) cannot drift between
//! protocols. Every field is checked; one violation is reported per bad field.

use super::errors::{FieldViolation, ProviderError, ProviderResult};
use super::models::{NewProvider, ProviderId, ProviderPatch};

pub const FIELD_ID: &str = "provider_id";
pub const FIELD_NAME: &str = "name";

fn finish(violations: Vec<FieldViolation>) -> ProviderResult<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ProviderError::ValidationFailed(violations))
    }
}

/// Both `provider_id` and `name` are required on create.
pub fn validate_new_provider(input: &NewProvider) -> ProviderResult<()> {
    let mut violations = Vec::new();
    if input.id.is_empty() {
        violations.push(FieldViolation::empty(FIELD_ID));
    }
    if input.name.is_empty() {
        violations.push(FieldViolation::empty(FIELD_NAME));
    }
    finish(violations)
}

pub fn validate_provider_id(id: &ProviderId) -> ProviderResult<()> {
    if id.is_empty() {
        return finish(vec![FieldViolation::empty(FIELD_ID)]);
    }
    Ok(())
}

/// `provider_id` is required; `name` may be absent but not present-and-empty.
pub fn validate_patch(id: &ProviderId, patch: &ProviderPatch) -> ProviderResult<()> {
    let mut violations = Vec::new();
    if id.is_empty() {
        violations.push(FieldViolation::empty(FIELD_ID));
    }
    if matches!(patch.name.as_deref(), Some("")) {
        violations.push(FieldViolation::empty(FIELD_NAME));
    }
    finish(violations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::providers::errors::ErrorKind;

    #[test]
    fn create_reports_every_empty_field() {
        let err = validate_new_provider(&NewProvider::new("", "")).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert_eq!(
            err.violations(),
            &[FieldViolation::empty("provider_id"), FieldViolation::empty("name")]
        );
    }

    #[test]
    fn create_reports_single_missing_field() {
        let err = validate_new_provider(&NewProvider::new("kuper", "")).unwrap_err();
        assert_eq!(err.violations(), &[FieldViolation::empty("name")]);

        let err = validate_new_provider(&NewProvider::new("", "Kuper")).unwrap_err();
        assert_eq!(err.violations(), &[FieldViolation::empty("provider_id")]);
    }

    #[test]
    fn create_accepts_complete_input() {
        assert!(validate_new_provider(&NewProvider::new("kuper", "Kuper")).is_ok());
    }

    #[test]
    fn patch_without_name_is_valid() {
        assert!(validate_patch(&ProviderId::new("kuper"), &ProviderPatch::default()).is_ok());
    }

    #[test]
    fn patch_with_present_but_empty_name_is_rejected() {
        let err = validate_patch(&ProviderId::new(""), &ProviderPatch::rename("")).unwrap_err();

        assert_eq!(
            err.violations(),
            &[FieldViolation::empty("provider_id"), FieldViolation::empty("name")]
        );
    }

    #[test]
    fn empty_id_is_rejected() {
        let err = validate_provider_id(&ProviderId::new("")).unwrap_err();
        assert_eq!(err.violations(), &[FieldViolation::empty("provider_id")]);
        assert!(validate_provider_id(&ProviderId::new("kuper")).is_ok());
    }
}
