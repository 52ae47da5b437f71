//! Staged-content verifier
//!
//! The last gate before the live tree is touched: every present record of
//! the target file set must have verified content in the staged store.
//! Failing here is safe (nothing has been committed yet) and it must
//! stay that way, so this module only ever reads.

use crate::state::UpdateState;
use rswupd_core::digest::digest_file;
use rswupd_core::errors::{Result, UpdError, UpdErrorKind};
use rswupd_core::manifest::FileKind;
use rswupd_store::StateDir;

/// Check every staged artifact against its manifest digest.
///
/// Regular files are re-hashed byte for byte. Symlink records are checked
/// for a staged entry (their manifest hash is not a function of readable
/// file bytes). Directory records carry no staged payload and are
/// materialised by the committer directly.
///
/// ## Errors
///
/// `UpdErrorKind::Integrity` on the first missing or mismatched artifact.
pub fn verify_staged(state_dir: &StateDir, state: &UpdateState) -> Result<()> {
    for f in state.to_by_path.values() {
        if !f.is_present() || matches!(f.kind, FileKind::Directory) {
            continue;
        }

        let staged = state_dir.staged_path(f.version, &f.hash);
        match f.kind {
            FileKind::Symlink => {
                if staged.symlink_metadata().is_err() {
                    return Err(missing(&f.name, &staged));
                }
            }
            _ => {
                let actual = digest_file(&staged).map_err(|_| missing(&f.name, &staged))?;
                if actual != f.hash {
                    return Err(UpdError::new(UpdErrorKind::Integrity)
                        .with_op("verify_staged")
                        .with_path(staged.display().to_string())
                        .with_message(format!(
                            "{}: staged content hashes to {}, manifest says {}",
                            f.name, actual, f.hash
                        )));
                }
            }
        }
    }
    Ok(())
}

fn missing(name: &str, staged: &std::path::Path) -> UpdError {
    UpdError::new(UpdErrorKind::Integrity)
        .with_op("verify_staged")
        .with_path(staged.display().to_string())
        .with_message(format!("{}: staged artifact is missing", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rswupd_core::digest::digest_bytes;
    use rswupd_core::manifest::{FileRecord, FileStatus, Modifier};
    use rswupd_core_types::{Hash, Version};
    use tempfile::TempDir;

    fn record(name: &str, kind: FileKind, hash: Hash) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            kind,
            status: FileStatus::Active,
            modifier: Modifier::None,
            version: Version::new(30010),
            hash,
        }
    }

    fn stage(state_dir: &StateDir, hash: &Hash, content: &[u8]) {
        let dir = state_dir.staged_dir(Version::new(30010));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(hash.to_hex()), content).unwrap();
    }

    #[test]
    fn test_verified_state_passes() {
        let tmp = TempDir::new().unwrap();
        let state_dir = StateDir::new(tmp.path().join("state"));
        let payload = b"verified bytes";
        let hash = digest_bytes(payload);
        stage(&state_dir, &hash, payload);

        let mut state = UpdateState::new();
        let r = record("/usr/bin/foo", FileKind::Regular, hash);
        state.to_by_path.insert(r.name.clone(), r);

        verify_staged(&state_dir, &state).unwrap();
    }

    #[test]
    fn test_missing_artifact_fails() {
        let tmp = TempDir::new().unwrap();
        let state_dir = StateDir::new(tmp.path().join("state"));

        let mut state = UpdateState::new();
        let r = record("/usr/bin/foo", FileKind::Regular, digest_bytes(b"x"));
        state.to_by_path.insert(r.name.clone(), r);

        let err = verify_staged(&state_dir, &state).unwrap_err();
        assert_eq!(err.kind(), UpdErrorKind::Integrity);
    }

    #[test]
    fn test_corrupt_artifact_fails() {
        let tmp = TempDir::new().unwrap();
        let state_dir = StateDir::new(tmp.path().join("state"));
        let hash = digest_bytes(b"the real content");
        stage(&state_dir, &hash, b"tampered content");

        let mut state = UpdateState::new();
        let r = record("/usr/bin/foo", FileKind::Regular, hash);
        state.to_by_path.insert(r.name.clone(), r);

        let err = verify_staged(&state_dir, &state).unwrap_err();
        assert_eq!(err.kind(), UpdErrorKind::Integrity);
        assert!(err.message().contains("/usr/bin/foo"));
    }

    #[test]
    fn test_deletions_and_directories_not_verified() {
        let tmp = TempDir::new().unwrap();
        let state_dir = StateDir::new(tmp.path().join("state"));

        let mut state = UpdateState::new();
        let deleted = FileRecord {
            status: FileStatus::Deleted,
            ..record("/etc/obsolete", FileKind::Unset, Hash::ZERO)
        };
        state.to_by_path.insert(deleted.name.clone(), deleted);
        let dir = record("/usr/share/foo", FileKind::Directory, digest_bytes(b"d"));
        state.to_by_path.insert(dir.name.clone(), dir);

        // Nothing staged for either and the verifier is satisfied
        verify_staged(&state_dir, &state).unwrap();
    }
}
