//! Claim checks over the session's access-token payload.
//!
//! Recipes and application code can attach validators to the session recipe.
//! After every session fetch the payload is run through the configured
//! validators; failures surface in the session context as `invalid_claims`
//! and block success redirection. Validators are pure checks over the
//! already-fetched payload.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A failed claim check.
///
/// `id` identifies the validator, `reason` is a validator-specific JSON
/// payload describing the failure. This is also the wire shape consumers see
/// in the session context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimValidationError {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Value>,
}

/// A check applied to the access-token payload.
///
/// `None` from [`validate`](SessionClaimValidator::validate) means the claim
/// is satisfied. `user_context` is an opaque bag the host passes through the
/// call that triggered validation; built-in validators ignore it.
pub trait SessionClaimValidator: Send + Sync {
    /// Stable identifier, reported in validation failures.
    fn id(&self) -> &str;

    /// Runs the check against the payload.
    fn validate(&self, payload: &Value, user_context: &Value) -> Option<ClaimValidationError>;
}

/// Requires a payload key to hold an exact JSON value.
///
/// # Example
///
/// ```
/// use dxauthkit::claims::{HasValueClaimValidator, SessionClaimValidator};
/// use serde_json::{json, Value};
///
/// let validator = HasValueClaimValidator::new("st-ev", json!(true));
/// assert!(validator.validate(&json!({ "st-ev": true }), &Value::Null).is_none());
/// assert!(validator.validate(&json!({ "st-ev": false }), &Value::Null).is_some());
/// ```
pub struct HasValueClaimValidator {
    id: String,
    key: String,
    expected: Value,
}

impl HasValueClaimValidator {
    /// Checks that `key` equals `expected`. The validator id defaults to the
    /// key.
    pub fn new(key: &str, expected: Value) -> Self {
        HasValueClaimValidator {
            id: key.to_string(),
            key: key.to_string(),
            expected,
        }
    }

    /// Overrides the reported validator id.
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }
}

impl SessionClaimValidator for HasValueClaimValidator {
    fn id(&self) -> &str {
        &self.id
    }

    fn validate(&self, payload: &Value, _user_context: &Value) -> Option<ClaimValidationError> {
        let actual = payload.get(&self.key);
        if actual == Some(&self.expected) {
            return None;
        }
        Some(ClaimValidationError {
            id: self.id.clone(),
            reason: Some(serde_json::json!({
                "message": "wrong value",
                "expectedValue": self.expected,
                "actualValue": actual,
            })),
        })
    }
}

/// Runs every validator against the payload and collects the failures, in
/// validator order.
pub fn validate_claims(
    payload: &Value,
    user_context: &Value,
    validators: &[Arc<dyn SessionClaimValidator>],
) -> Vec<ClaimValidationError> {
    let failures: Vec<ClaimValidationError> = validators
        .iter()
        .filter_map(|validator| validator.validate(payload, user_context))
        .collect();
    if !failures.is_empty() {
        tracing::trace!(count = failures.len(), "session claims failed validation");
    }
    failures
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn satisfied_claim_produces_no_error() {
        let validator = HasValueClaimValidator::new("st-ev", json!(true));
        assert!(validator
            .validate(&json!({ "st-ev": true }), &Value::Null)
            .is_none());
    }

    #[test]
    fn wrong_value_reports_expected_and_actual() {
        let validator = HasValueClaimValidator::new("st-ev", json!(true));
        let error = validator
            .validate(&json!({ "st-ev": false }), &Value::Null)
            .unwrap();
        assert_eq!(error.id, "st-ev");
        let reason = error.reason.unwrap();
        assert_eq!(reason["expectedValue"], json!(true));
        assert_eq!(reason["actualValue"], json!(false));
    }

    #[test]
    fn missing_key_fails_with_null_actual() {
        let validator = HasValueClaimValidator::new("role", json!("admin"));
        let error = validator.validate(&json!({}), &Value::Null).unwrap();
        assert_eq!(error.reason.unwrap()["actualValue"], Value::Null);
    }

    #[test]
    fn custom_id_is_reported() {
        let validator = HasValueClaimValidator::new("role", json!("admin")).with_id("admin-role");
        let error = validator
            .validate(&json!({ "role": "user" }), &Value::Null)
            .unwrap();
        assert_eq!(error.id, "admin-role");
    }

    #[test]
    fn validate_claims_collects_failures_in_order() {
        let validators: Vec<Arc<dyn SessionClaimValidator>> = vec![
            Arc::new(HasValueClaimValidator::new("a", json!(1))),
            Arc::new(HasValueClaimValidator::new("b", json!(2))),
            Arc::new(HasValueClaimValidator::new("c", json!(3))),
        ];
        let failures =
            validate_claims(&json!({ "a": 1, "b": 0, "c": 0 }), &Value::Null, &validators);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].id, "b");
        assert_eq!(failures[1].id, "c");
    }

    #[test]
    fn user_context_reaches_the_validators() {
        struct TenantValidator;

        impl SessionClaimValidator for TenantValidator {
            fn id(&self) -> &str {
                "tenant"
            }

            fn validate(&self, payload: &Value, user_context: &Value) -> Option<ClaimValidationError> {
                if payload.get("tenant") == user_context.get("tenant") {
                    return None;
                }
                Some(ClaimValidationError {
                    id: self.id().to_string(),
                    reason: None,
                })
            }
        }

        let validators: Vec<Arc<dyn SessionClaimValidator>> = vec![Arc::new(TenantValidator)];
        let payload = json!({ "tenant": "acme" });
        assert!(validate_claims(&payload, &json!({ "tenant": "acme" }), &validators).is_empty());
        assert_eq!(
            validate_claims(&payload, &json!({ "tenant": "other" }), &validators).len(),
            1
        );
    }

    #[test]
    fn error_serialises_to_wire_shape() {
        let error = ClaimValidationError {
            id: "st-ev".to_string(),
            reason: Some(json!({ "message": "wrong value" })),
        };
        let wire = serde_json::to_value(&error).unwrap();
        assert_eq!(wire["id"], "st-ev");
        assert_eq!(wire["reason"]["message"], "wrong value");

        let bare = ClaimValidationError {
            id: "st-ev".to_string(),
            reason: None,
        };
        assert_eq!(serde_json::to_value(&bare).unwrap(), json!({ "id": "st-ev" }));
    }
}
