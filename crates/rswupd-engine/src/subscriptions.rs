//! Bundle subscriptions
//!
//! A bundle is subscribed when a file of its name exists in the
//! subscription directory; the contents are irrelevant. The returned list
//! is sorted because the planner binary-searches it.

use rswupd_core::errors::{config_error, Result};
use std::path::Path;

/// Bundle-subscription directory relative to the target root.
pub const BUNDLES_DIR_REL: &str = "usr/share/clear/bundles";

/// Enumerate subscribed bundle names, sorted, dotfiles skipped.
pub fn subscribed_bundles(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        config_error(
            "subscribed_bundles",
            format!("reading {}: {}", dir.display(), e),
        )
    })?;

    let mut bundles = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            config_error(
                "subscribed_bundles",
                format!("reading {}: {}", dir.display(), e),
            )
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        bundles.push(name);
    }

    bundles.sort();
    Ok(bundles)
}
