//! Capsule metadata returned by registries and mesh replicas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a registry knows about a capsule.
///
/// Well-known fields are typed; anything else a backend attaches is kept in
/// `extra` and passed through to the sandbox untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapsuleMetadata {
    /// UTID of the capsule's execution lineage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utid: Option<String>,
    /// Credit root the UTID is verified against.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_root: Option<String>,
    /// Where the capsule payload lives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_location: Option<String>,
    /// Content hash of the capsule payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capsule_hash: Option<String>,
    /// Credits charged per execution, if the sandbox does not report one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_cost: Option<f64>,
    /// Backend-specific fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl CapsuleMetadata {
    /// Empty metadata.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the UTID.
    #[must_use]
    pub fn with_utid(mut self, utid: impl Into<String>) -> Self {
        self.utid = Some(utid.into());
        self
    }

    /// Set the credit root.
    #[must_use]
    pub fn with_credit_root(mut self, credit_root: impl Into<String>) -> Self {
        self.credit_root = Some(credit_root.into());
        self
    }

    /// Set the payload location.
    #[must_use]
    pub fn with_payload_location(mut self, location: impl Into<String>) -> Self {
        self.payload_location = Some(location.into());
        self
    }

    /// Set the capsule content hash.
    #[must_use]
    pub fn with_capsule_hash(mut self, hash: impl Into<String>) -> Self {
        self.capsule_hash = Some(hash.into());
        self
    }

    /// Set the execution cost.
    #[must_use]
    pub fn with_execution_cost(mut self, cost: f64) -> Self {
        self.execution_cost = Some(cost);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_keeps_extra_fields() {
        let metadata: CapsuleMetadata = serde_json::from_value(json!({
            "utid": "fake",
            "credit_root": "root",
            "execution_cost": 1.0,
            "grid": [64, 64],
        }))
        .unwrap();

        assert_eq!(metadata.utid.as_deref(), Some("fake"));
        assert_eq!(metadata.credit_root.as_deref(), Some("root"));
        assert_eq!(metadata.execution_cost, Some(1.0));
        assert!(metadata.payload_location.is_none());
        assert_eq!(metadata.extra["grid"], json!([64, 64]));
    }

    #[test]
    fn test_serialize_omits_missing_fields() {
        let value = serde_json::to_value(CapsuleMetadata::new().with_utid("u")).unwrap();
        assert_eq!(value, json!({"utid": "u"}));
    }
}
