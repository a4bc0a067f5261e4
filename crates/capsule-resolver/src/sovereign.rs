//! Sovereign capsules: locally installed capsules that bypass the registry.
//!
//! A URI whose domain is `sovereign` maps to the directory
//! `{root}/{operation}_{version}` (version defaults to `v1`). The directory
//! holds a `capsule.toml` manifest.

use std::path::{Path, PathBuf};

use capsule_core::CapsuleUri;
use serde::{Deserialize, Serialize};

use crate::error::LifecycleError;

/// Manifest file name inside a sovereign capsule directory.
pub const MANIFEST_FILE: &str = "capsule.toml";

/// Version assumed when a sovereign URI carries none.
pub const DEFAULT_SOVEREIGN_VERSION: &str = "v1";

/// Parsed `capsule.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SovereignManifest {
    /// Capsule name.
    pub name: String,
    /// Capsule version.
    #[serde(default)]
    pub version: Option<String>,
    /// Entry point handed to the ignition hook.
    #[serde(default)]
    pub entrypoint: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Any other manifest keys.
    #[serde(flatten)]
    pub extra: toml::Table,
    /// Directory the manifest was loaded from.
    #[serde(skip)]
    pub root: PathBuf,
}

impl SovereignManifest {
    /// Load `capsule.toml` from a capsule directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(dir: &Path) -> Result<Self, LifecycleError> {
        let path = dir.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&path).map_err(|source| {
            LifecycleError::ManifestIo {
                path: path.clone(),
                source,
            }
        })?;
        let mut manifest: Self = toml::from_str(&content)
            .map_err(|source| LifecycleError::ManifestParse { path, source })?;
        manifest.root = dir.to_path_buf();
        Ok(manifest)
    }
}

/// Directory a sovereign URI resolves to under `root`.
#[must_use]
pub fn sovereign_path(root: &Path, uri: &CapsuleUri) -> PathBuf {
    let version = uri.version().unwrap_or(DEFAULT_SOVEREIGN_VERSION);
    root.join(format!("{}_{version}", uri.operation()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sovereign_path() {
        let root = Path::new("/srv/capsules");

        let uri = CapsuleUri::parse("capsule://local/sovereign/agent/boot/v2").unwrap();
        assert_eq!(sovereign_path(root, &uri), root.join("boot_v2"));

        let uri = CapsuleUri::parse("capsule://local/sovereign/boot").unwrap();
        assert_eq!(sovereign_path(root, &uri), root.join("boot_v1"));
    }

    #[test]
    fn test_load_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(MANIFEST_FILE),
            "name = \"boot\"\nversion = \"1.0.0\"\nentrypoint = \"main\"\npriority = 3\n",
        )
        .unwrap();

        let manifest = SovereignManifest::load(dir.path()).unwrap();
        assert_eq!(manifest.name, "boot");
        assert_eq!(manifest.version.as_deref(), Some("1.0.0"));
        assert_eq!(manifest.entrypoint.as_deref(), Some("main"));
        assert_eq!(manifest.extra["priority"].as_integer(), Some(3));
        assert_eq!(manifest.root, dir.path());
    }

    #[test]
    fn test_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            SovereignManifest::load(dir.path()),
            Err(LifecycleError::ManifestIo { .. })
        ));
    }

    #[test]
    fn test_invalid_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), "version = \"1\"\n").unwrap();
        assert!(matches!(
            SovereignManifest::load(dir.path()),
            Err(LifecycleError::ManifestParse { .. })
        ));
    }
}
