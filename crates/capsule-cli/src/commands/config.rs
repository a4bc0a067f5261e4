//! Config command - show, validate, and locate configuration.

use std::path::{Path, PathBuf};

use capsule_config::loader::{CONFIG_DIR, CONFIG_FILE};
use capsule_config::{ConfigError, ResolvedConfig, ShowFormat};

use crate::theme::Theme;

/// Print the resolved configuration with per-field sources.
pub(crate) fn show_config(resolved: &ResolvedConfig, format: &str) -> anyhow::Result<()> {
    let format: ShowFormat = format.parse()?;
    print!("{}", resolved.show(format)?);
    Ok(())
}

/// Report whether the configuration loaded and validated.
pub(crate) fn validate_config(
    loaded: Result<&ResolvedConfig, &ConfigError>,
) -> anyhow::Result<()> {
    match loaded {
        Ok(resolved) => {
            println!("{}", Theme::success("Configuration is valid"));
            for file in &resolved.loaded_files {
                println!("  {}", Theme::dimmed(file));
            }
            Ok(())
        },
        Err(e) => {
            println!("{}", Theme::error(&e.to_string()));
            anyhow::bail!("configuration is invalid")
        },
    }
}

/// Config files that are consulted, in precedence order (lowest first).
pub(crate) fn candidate_paths(
    home: &Path,
    workspace: Option<&Path>,
) -> Vec<(&'static str, PathBuf)> {
    let mut paths = vec![("user", home.join(CONFIG_FILE))];
    if let Some(ws) = workspace {
        paths.push(("workspace", ws.join(CONFIG_DIR).join(CONFIG_FILE)));
    }
    paths
}

/// Print the config files that are checked and whether each exists.
pub(crate) fn show_paths(home: &Path, workspace: Option<&Path>) {
    println!("\n{}", Theme::header("Config Paths"));
    println!("{}", Theme::kv("defaults", "<embedded>"));
    for (layer, path) in candidate_paths(home, workspace) {
        let shown = path.display().to_string();
        let state = if path.is_file() {
            shown
        } else {
            format!("{shown} {}", Theme::dimmed("(not found)"))
        };
        println!("{}", Theme::kv(layer, &state));
    }
    println!("{}", Theme::kv("environment", "CAPSULE_*"));
    println!();
}
