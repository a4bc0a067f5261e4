//! Shared aliases for execution telemetry and invocation parameters.

use std::collections::BTreeMap;

use serde_json::Value;

/// Free-form execution telemetry (string keys, JSON values).
pub type Telemetry = serde_json::Map<String, Value>;

/// Invocation parameters taken from a URI query string.
pub type Params = BTreeMap<String, String>;

/// Typed reads over a [`Telemetry`] map.
///
/// Missing keys and values of the wrong JSON type both read as `None`.
pub trait TelemetryExt {
    /// Read a string field.
    fn str_field(&self, key: &str) -> Option<&str>;

    /// Read a numeric field as `f64`. Numeric strings are accepted.
    ///
    /// Non-finite values (`"NaN"`, `"inf"`, `"1e400"`) read as `None`.
    fn f64_field(&self, key: &str) -> Option<f64>;
}

impl TelemetryExt for Telemetry {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    fn f64_field(&self, key: &str) -> Option<f64> {
        let value = match self.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_reads() {
        let Value::Object(t) = json!({
            "proof_hash": "abc",
            "execution_cost": 1.5,
            "as_text": " 2.25 ",
            "flag": true,
        }) else {
            unreachable!()
        };

        assert_eq!(t.str_field("proof_hash"), Some("abc"));
        assert_eq!(t.str_field("execution_cost"), None);
        assert_eq!(t.f64_field("execution_cost"), Some(1.5));
        assert_eq!(t.f64_field("as_text"), Some(2.25));
        assert_eq!(t.f64_field("flag"), None);
        assert_eq!(t.f64_field("missing"), None);
    }

    #[test]
    fn test_non_finite_strings_are_not_numbers() {
        let mut t = Telemetry::new();
        for (key, text) in [
            ("nan", "NaN"),
            ("inf", "inf"),
            ("neg", "-infinity"),
            ("big", "1e400"),
        ] {
            t.insert(key.into(), json!(text));
        }

        for key in ["nan", "inf", "neg", "big"] {
            assert_eq!(t.f64_field(key), None, "{key}");
        }
    }
}
