//! Test fixtures for common capsules.

use std::path::{Path, PathBuf};

use capsule_core::CapsuleUri;
use capsule_resolver::{CapsuleMetadata, InMemoryCatalog, MANIFEST_FILE, sovereign_path};

/// The canonical registered capsule used across tests.
pub const FUSION_URI: &str = "capsule://fusion/mhd64/v4.1";

/// Parse a URI that is known to be valid.
///
/// # Panics
///
/// Panics if `uri` is malformed.
#[must_use]
pub fn test_uri(uri: &str) -> CapsuleUri {
    match CapsuleUri::parse(uri) {
        Ok(parsed) => parsed,
        Err(e) => panic!("fixture URI {uri} is invalid: {e}"),
    }
}

/// Metadata registered for [`FUSION_URI`]: UTID `fake`, credit root `root`,
/// cost 1.0.
#[must_use]
pub fn fusion_metadata() -> CapsuleMetadata {
    CapsuleMetadata::new()
        .with_utid("fake")
        .with_credit_root("root")
        .with_capsule_hash("mhd64-hash")
        .with_execution_cost(1.0)
}

/// A catalog holding only [`FUSION_URI`].
#[must_use]
pub fn fusion_catalog() -> InMemoryCatalog {
    let catalog = InMemoryCatalog::new();
    catalog.insert(&test_uri(FUSION_URI), fusion_metadata());
    catalog
}

/// Install a sovereign capsule for `uri` under `root` with manifest `name`.
///
/// Returns the capsule directory.
///
/// # Panics
///
/// Panics if the directory or manifest cannot be written.
pub fn install_sovereign(root: &Path, uri: &str, name: &str) -> PathBuf {
    let dir = sovereign_path(root, &test_uri(uri));
    if let Err(e) = std::fs::create_dir_all(&dir) {
        panic!("cannot create {}: {e}", dir.display());
    }
    let manifest = format!("name = \"{name}\"\nentrypoint = \"ignite\"\n");
    if let Err(e) = std::fs::write(dir.join(MANIFEST_FILE), manifest) {
        panic!("cannot write manifest in {}: {e}", dir.display());
    }
    dir
}
