//! State-directory layout
//!
//! Everything the updater persists lives beneath one root, keyed by
//! version:
//!
//! ```text
//! <root>/.lock
//! <root>/<version>/Manifest.MoM
//! <root>/<version>/Manifest.<bundle>
//! <root>/<version>/pack-<bundle>-from-<fromVersion>.tar
//! <root>/<version>/delta/<fromver>-<tover>-<fromhash>-<tohash>
//! <root>/<version>/staged/<hash-text>
//! ```
//!
//! Directories are created mode 0744.

use crate::errors::{fs_error, Result};
use rswupd_core_types::{Hash, Version};
use std::fs::DirBuilder;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

/// Default state-directory root.
pub const DEFAULT_STATE_DIR: &str = "/var/lib/rswupd";

const DIR_MODE: u32 = 0o744;

/// The updater's on-disk state root and its per-version layout.
#[derive(Debug, Clone)]
pub struct StateDir {
    root: PathBuf,
}

impl StateDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the exclusive run-lock file.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(".lock")
    }

    pub fn version_dir(&self, version: Version) -> PathBuf {
        self.root.join(version.to_string())
    }

    pub fn mom_path(&self, version: Version) -> PathBuf {
        self.version_dir(version).join("Manifest.MoM")
    }

    pub fn manifest_path(&self, version: Version, bundle: &str) -> PathBuf {
        self.version_dir(version).join(format!("Manifest.{}", bundle))
    }

    pub fn pack_path(&self, version: Version, bundle: &str, from: Version) -> PathBuf {
        self.version_dir(version)
            .join(format!("pack-{}-from-{}.tar", bundle, from))
    }

    pub fn delta_dir(&self, version: Version) -> PathBuf {
        self.version_dir(version).join("delta")
    }

    pub fn staged_dir(&self, version: Version) -> PathBuf {
        self.version_dir(version).join("staged")
    }

    /// Where content with this digest is staged for this version.
    pub fn staged_path(&self, version: Version, hash: &Hash) -> PathBuf {
        self.staged_dir(version).join(hash.to_hex())
    }

    /// Create `<root>/<version>/` (and the root itself) if missing.
    pub fn ensure_version_dir(&self, version: Version) -> Result<PathBuf> {
        let dir = self.version_dir(version);
        mkdir_all(&dir)?;
        Ok(dir)
    }

    /// Create `<root>/<version>/staged/` if missing.
    pub fn ensure_staged_dir(&self, version: Version) -> Result<PathBuf> {
        let dir = self.staged_dir(version);
        mkdir_all(&dir)?;
        Ok(dir)
    }

    /// Create the state root itself if missing.
    pub fn ensure_root(&self) -> Result<()> {
        mkdir_all(&self.root)
    }
}

fn mkdir_all(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(dir)
        .map_err(|e| fs_error("mkdir", dir, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn state() -> (StateDir, TempDir) {
        let tmp = TempDir::new().unwrap();
        (StateDir::new(tmp.path().join("state")), tmp)
    }

    #[test]
    fn test_layout_paths() {
        let (s, _tmp) = state();
        let v = Version::new(30010);
        let from = Version::new(29990);

        assert!(s.mom_path(v).ends_with("30010/Manifest.MoM"));
        assert!(s
            .manifest_path(v, "os-core")
            .ends_with("30010/Manifest.os-core"));
        assert!(s
            .pack_path(v, "os-core", from)
            .ends_with("30010/pack-os-core-from-29990.tar"));
        assert!(s.delta_dir(v).ends_with("30010/delta"));

        let h = Hash::ZERO;
        assert!(s.staged_path(v, &h).ends_with(format!("30010/staged/{}", h)));
    }

    #[test]
    fn test_ensure_version_dir_creates_with_mode() {
        let (s, _tmp) = state();
        let dir = s.ensure_version_dir(Version::new(100)).unwrap();
        assert!(dir.is_dir());

        let mode = std::fs::metadata(&dir).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o744);
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let (s, _tmp) = state();
        s.ensure_staged_dir(Version::new(100)).unwrap();
        s.ensure_staged_dir(Version::new(100)).unwrap();
        assert!(s.staged_dir(Version::new(100)).is_dir());
    }
}
