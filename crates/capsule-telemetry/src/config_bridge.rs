//! Conversion from the `[logging]` config section.

use capsule_config::LoggingSection;

use crate::error::TelemetryResult;
use crate::logging::{FileRotation, LogConfig};

impl TryFrom<&LoggingSection> for LogConfig {
    type Error = crate::TelemetryError;

    fn try_from(section: &LoggingSection) -> TelemetryResult<Self> {
        let mut config =
            LogConfig::new(section.level.to_lowercase()).with_format(section.format.parse()?);
        for directive in &section.directives {
            config = config.with_directive(directive.clone());
        }
        if let Some(dir) = &section.directory {
            config = config.with_file_logging(dir, FileRotation::Daily);
        }
        Ok(config)
    }
}
