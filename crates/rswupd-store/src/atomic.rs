//! Atomic write primitives
//!
//! Every file the updater lays down goes through the same discipline: a
//! temp file created as a *sibling* of the destination (so the rename
//! never crosses a filesystem), then a single atomic rename once the
//! content is complete. The temp prefixes are fixed so an interrupted run
//! leaves recognizable droppings:
//!
//! - `.dl.<name>`: in-flight downloads
//! - `<name>.test`: delta outputs awaiting digest verification
//! - `.update.<name>`: commit staging alongside the live path

use crate::errors::{fs_error, Result};
use std::path::{Path, PathBuf};

/// Sibling temp name for an in-flight download of `dest`.
pub fn download_temp(dest: &Path) -> PathBuf {
    sibling_with_prefix(dest, ".dl.")
}

/// Sibling temp name for commit staging of live path `dest`.
pub fn update_temp(dest: &Path) -> PathBuf {
    sibling_with_prefix(dest, ".update.")
}

/// Sibling name for a delta output awaiting verification.
pub fn test_candidate(out: &Path) -> PathBuf {
    let mut name = out.as_os_str().to_os_string();
    name.push(".test");
    PathBuf::from(name)
}

fn sibling_with_prefix(dest: &Path, prefix: &str) -> PathBuf {
    let base = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match dest.parent() {
        Some(parent) => parent.join(format!("{}{}", prefix, base)),
        None => PathBuf::from(format!("{}{}", prefix, base)),
    }
}

/// Atomically move completed content into place.
pub fn promote(temp: &Path, dest: &Path) -> Result<()> {
    std::fs::rename(temp, dest).map_err(|e| fs_error("promote", dest, e))
}

/// Atomically write bytes to a file via a sibling temp.
pub fn atomic_write(dest: &Path, content: &[u8]) -> Result<()> {
    let temp = download_temp(dest);
    std::fs::write(&temp, content).map_err(|e| fs_error("atomic_write", &temp, e))?;
    promote(&temp, dest)
}
