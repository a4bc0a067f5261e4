//! Resolved configuration display and serialization.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::FieldSources;
use crate::types::Config;

/// A loaded configuration plus where each value came from.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The validated configuration.
    pub config: Config,
    /// Layer that set each leaf field.
    pub field_sources: FieldSources,
    /// Config files that were found and merged, in order.
    pub loaded_files: Vec<String>,
    /// Capsule home directory used for user-level config.
    pub home: PathBuf,
}

/// Output format for [`ResolvedConfig::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowFormat {
    /// TOML with a trailing comment block listing each field's source.
    #[default]
    Toml,
    /// A single JSON document with `config`, `sources` and `loaded_files`.
    Json,
}

impl fmt::Display for ShowFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Toml => f.write_str("toml"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for ShowFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::ValidationError {
                field: "format".to_owned(),
                message: format!("unknown show format '{other}'; expected toml or json"),
            }),
        }
    }
}

impl ResolvedConfig {
    /// Field sources sorted by dotted path.
    #[must_use]
    pub fn sorted_sources(&self) -> BTreeMap<&str, String> {
        self.field_sources
            .iter()
            .map(|(k, v)| (k.as_str(), v.to_string()))
            .collect()
    }

    /// Render the configuration and its provenance.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RenderError`] if serialization fails.
    pub fn show(&self, format: ShowFormat) -> ConfigResult<String> {
        match format {
            ShowFormat::Toml => self.show_toml(),
            ShowFormat::Json => self.show_json(),
        }
    }

    fn show_toml(&self) -> ConfigResult<String> {
        let mut out =
            toml::to_string_pretty(&self.config).map_err(|e| ConfigError::RenderError(e.to_string()))?;

        out.push_str("\n# Sources\n");
        out.push_str(&format!("#   home = {}\n", self.home.display()));
        for file in &self.loaded_files {
            out.push_str(&format!("#   loaded {file}\n"));
        }
        for (field, layer) in self.sorted_sources() {
            out.push_str(&format!("#   {field} <- {layer}\n"));
        }
        Ok(out)
    }

    fn show_json(&self) -> ConfigResult<String> {
        let doc = serde_json::json!({
            "config": self.config,
            "sources": self.sorted_sources(),
            "loaded_files": self.loaded_files,
            "home": self.home.display().to_string(),
        });
        serde_json::to_string_pretty(&doc).map_err(|e| ConfigError::RenderError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::ConfigLayer;

    fn resolved() -> ResolvedConfig {
        let mut field_sources = FieldSources::new();
        field_sources.insert("logging.level".to_owned(), ConfigLayer::Environment);
        field_sources.insert("credits.author_share".to_owned(), ConfigLayer::Defaults);
        ResolvedConfig {
            config: Config::default(),
            field_sources,
            loaded_files: vec!["/home/u/.capsule/config.toml".to_owned()],
            home: PathBuf::from("/home/u/.capsule"),
        }
    }

    #[test]
    fn test_show_toml_lists_sources() {
        let out = resolved().show(ShowFormat::Toml).unwrap();
        assert!(out.contains("[credits]"));
        assert!(out.contains("#   logging.level <- environment"));
        assert!(out.contains("#   loaded /home/u/.capsule/config.toml"));

        // The config part must still parse back.
        let body = out.split("\n# Sources").next().unwrap();
        let config: Config = toml::from_str(body).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_show_json() {
        let out = resolved().show(ShowFormat::Json).unwrap();
        let doc: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(doc["config"]["reconciliation"]["interval_secs"], 60);
        assert_eq!(doc["sources"]["logging.level"], "environment");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<ShowFormat>().unwrap(), ShowFormat::Json);
        assert!("yaml".parse::<ShowFormat>().is_err());
    }
}
