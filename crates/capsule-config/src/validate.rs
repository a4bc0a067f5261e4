//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Tolerance for the credit shares summing to one.
const SHARE_SUM_TOLERANCE: f64 = 1e-6;

/// Validate a fully merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_reconciliation(config)?;
    validate_credits(config)?;
    validate_events(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_reconciliation(config: &Config) -> ConfigResult<()> {
    if config.reconciliation.interval_secs == 0 {
        return Err(invalid(
            "reconciliation.interval_secs",
            "interval must be at least 1 second",
        ));
    }
    Ok(())
}

fn validate_credits(config: &Config) -> ConfigResult<()> {
    let c = &config.credits;
    let shares = [
        ("credits.author_share", c.author_share),
        ("credits.executor_share", c.executor_share),
        ("credits.mesh_share", c.mesh_share),
    ];

    for (field, share) in shares {
        if !share.is_finite() || share < 0.0 {
            return Err(invalid(
                field,
                format!("share {share} must be a finite, non-negative number"),
            ));
        }
    }

    let sum = c.author_share + c.executor_share + c.mesh_share;
    if (sum - 1.0).abs() > SHARE_SUM_TOLERANCE {
        return Err(invalid(
            "credits",
            format!("author, executor and mesh shares must sum to 1.0 (got {sum})"),
        ));
    }
    Ok(())
}

fn validate_events(config: &Config) -> ConfigResult<()> {
    if config.events.channel_capacity == 0 {
        return Err(invalid(
            "events.channel_capacity",
            "channel capacity must be at least 1",
        ));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;
    if !matches!(
        l.level.to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(invalid(
            "logging.level",
            format!(
                "unsupported level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        ));
    }
    if !matches!(
        l.format.to_lowercase().as_str(),
        "pretty" | "compact" | "json" | "full"
    ) {
        return Err(invalid(
            "logging.format",
            format!(
                "unsupported format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        ));
    }
    Ok(())
}
