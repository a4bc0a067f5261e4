//! Environment variable overrides.
//!
//! `CAPSULE_*` variables are the highest-precedence layer: they replace
//! whatever the files set.

use std::collections::HashMap;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

/// How an environment value is coerced before it enters the TOML tree.
#[derive(Clone, Copy)]
enum EnvKind {
    Str,
    Int,
}

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    section: &'static str,
    key: &'static str,
    kind: EnvKind,
}

/// All supported `CAPSULE_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "CAPSULE_LOG_LEVEL",
        section: "logging",
        key: "level",
        kind: EnvKind::Str,
    },
    EnvMapping {
        var_name: "CAPSULE_LOG_FORMAT",
        section: "logging",
        key: "format",
        kind: EnvKind::Str,
    },
    EnvMapping {
        var_name: "CAPSULE_SOVEREIGN_ROOT",
        section: "resolver",
        key: "sovereign_root",
        kind: EnvKind::Str,
    },
    EnvMapping {
        var_name: "CAPSULE_LEDGER_JOURNAL",
        section: "ledger",
        key: "journal_path",
        kind: EnvKind::Str,
    },
    EnvMapping {
        var_name: "CAPSULE_RECONCILE_INTERVAL_SECS",
        section: "reconciliation",
        key: "interval_secs",
        kind: EnvKind::Int,
    },
    EnvMapping {
        var_name: "CAPSULE_EVENTS_CAPACITY",
        section: "events",
        key: "channel_capacity",
        kind: EnvKind::Int,
    },
];

/// Apply `CAPSULE_*` overrides to the merged tree.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a numeric variable does not parse.
pub fn apply_env_overrides<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        let value = match mapping.kind {
            EnvKind::Str => toml::Value::String(raw.clone()),
            EnvKind::Int => {
                let parsed = raw.trim().parse::<i64>().map_err(|e| ConfigError::EnvError {
                    var_name: mapping.var_name.to_owned(),
                    message: format!("expected an integer, got '{raw}': {e}"),
                })?;
                toml::Value::Integer(parsed)
            },
        };

        let Some(root) = merged.as_table_mut() else {
            continue;
        };
        let section = root
            .entry(mapping.section)
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if let Some(table) = section.as_table_mut() {
            debug!(
                var = mapping.var_name,
                field = %format!("{}.{}", mapping.section, mapping.key),
                "applying env var override"
            );
            table.insert(mapping.key.to_owned(), value);
            sources.insert(
                format!("{}.{}", mapping.section, mapping.key),
                ConfigLayer::Environment,
            );
            count = count.saturating_add(1);
        }
    }

    Ok(count)
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut merged: toml::Value =
            toml::from_str("[logging]\nlevel = \"info\"\n[reconciliation]\ninterval_secs = 60\n")
                .unwrap();
        let mut sources = FieldSources::new();
        let env = make_env(&[
            ("CAPSULE_LOG_LEVEL", "debug"),
            ("CAPSULE_RECONCILE_INTERVAL_SECS", " 5 "),
            ("CAPSULE_LEDGER_JOURNAL", "/tmp/ledger.jsonl"),
            ("UNRELATED", "x"),
        ]);

        let count = apply_env_overrides(&mut merged, &mut sources, &env).unwrap();
        assert_eq!(count, 3);
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(merged["reconciliation"]["interval_secs"].as_integer(), Some(5));
        assert_eq!(
            merged["ledger"]["journal_path"].as_str(),
            Some("/tmp/ledger.jsonl")
        );
        assert_eq!(
            sources.get("logging.level"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_bad_integer_is_rejected() {
        let mut merged = toml::Value::Table(toml::Table::new());
        let mut sources = FieldSources::new();
        let env = make_env(&[("CAPSULE_EVENTS_CAPACITY", "lots")]);

        let err = apply_env_overrides(&mut merged, &mut sources, &env).unwrap_err();
        assert!(matches!(err, ConfigError::EnvError { ref var_name, .. } if var_name == "CAPSULE_EVENTS_CAPACITY"));
    }
}
