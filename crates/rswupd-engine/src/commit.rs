//! Two-phase committer
//!
//! The only component that mutates the live tree, in two passes over the
//! target file set in lexicographic path order:
//!
//! **Pass 1, stage into place** (fallible): hard-link each verified
//! artifact to a `.update.<base>` sibling of its final path. Nothing the
//! OS is running from changes; aborting here leaves only temp droppings.
//!
//! **Pass 2, atomic switch** (the critical section): rename each staged
//! sibling over its final path, create directories, remove deleted paths.
//! Errors here are logged and swallowed: a partially completed pass 2 is
//! recovered by the next run, while an early return would strand an
//! inconsistent set of in-flight files.

use crate::delta::live_path;
use crate::exec::run_command_silent;
use crate::state::UpdateState;
use rswupd_core::errors::{io_error, Result};
use rswupd_core::manifest::FileKind;
use rswupd_store::{atomic, StateDir};
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Commits verified staged content to the live tree.
pub struct Committer<'a> {
    state_dir: &'a StateDir,
    target_root: &'a Path,
}

impl<'a> Committer<'a> {
    pub fn new(state_dir: &'a StateDir, target_root: &'a Path) -> Self {
        Self {
            state_dir,
            target_root,
        }
    }

    /// Pass 1: link every verified artifact to its `.update.` sibling.
    ///
    /// Live parent directories are created as needed so the siblings have
    /// a home; deletions and directory records wait for pass 2.
    ///
    /// ## Errors
    ///
    /// `UpdErrorKind::Filesystem`, fatal; the live tree has not been
    /// switched and the run aborts cleanly.
    pub fn stage_files(&self, state: &UpdateState) -> Result<()> {
        for f in state.to_by_path.values() {
            if !f.is_present() || matches!(f.kind, FileKind::Directory) {
                continue;
            }

            let live = live_path(self.target_root, &f.name);
            if let Some(parent) = live.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| io_error("stage_files", parent, e))?;
            }

            let src = self.state_dir.staged_path(f.version, &f.hash);
            let dst = atomic::update_temp(&live);
            link_or_copy(&src, &dst)?;
        }
        Ok(())
    }

    /// Pass 2: the critical section. Runs to completion unconditionally;
    /// every error is logged and swallowed. Must only be called after the
    /// verifier has passed and pass 1 has completed for every record.
    pub fn rename_to_final(&self, state: &UpdateState) {
        for f in state.to_by_path.values() {
            let live = live_path(self.target_root, &f.name);

            if !f.is_present() {
                remove_live(&live);
                continue;
            }

            if matches!(f.kind, FileKind::Directory) {
                if let Err(e) = std::fs::create_dir_all(&live) {
                    tracing::error!(path = %live.display(), error = %e, "mkdir failed during commit");
                }
                continue;
            }

            let staged = atomic::update_temp(&live);
            if let Err(e) = std::fs::rename(&staged, &live) {
                tracing::error!(
                    path = %live.display(),
                    error = %e,
                    "rename into place failed during commit"
                );
            }
        }
    }
}

fn remove_live(live: &Path) {
    let meta = match live.symlink_metadata() {
        Ok(meta) => meta,
        // Already gone: deletion is idempotent
        Err(_) => return,
    };
    let result = if meta.is_dir() {
        std::fs::remove_dir_all(live)
    } else {
        std::fs::remove_file(live)
    };
    if let Err(e) = result {
        tracing::error!(path = %live.display(), error = %e, "removal failed during commit");
    }
}

/// Hard-link `src` to `dst`, falling back to `cp -af` when linking is not
/// possible (cross-device staging). A destination that already is the
/// source, left by an interrupted earlier run, is accepted as done.
fn link_or_copy(src: &Path, dst: &Path) -> Result<()> {
    if same_file(src, dst) {
        return Ok(());
    }
    // A stale sibling from an aborted run would make both link and cp
    // fail; replace it.
    let _ = std::fs::remove_file(dst);

    if std::fs::hard_link(src, dst).is_ok() {
        return Ok(());
    }
    match run_command_silent("cp", &[std::ffi::OsStr::new("-af"), src.as_os_str(), dst.as_os_str()]) {
        Ok(()) => Ok(()),
        Err(e) if e.message().contains("are the same file") => Ok(()),
        Err(e) => Err(e),
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.symlink_metadata(), b.symlink_metadata()) {
        (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rswupd_core::digest::digest_bytes;
    use rswupd_core::manifest::{FileRecord, FileStatus, Modifier};
    use rswupd_core_types::{Hash, Version};
    use std::path::PathBuf;
    use tempfile::TempDir;

    const V: u32 = 30010;

    fn record(name: &str, kind: FileKind, status: FileStatus, hash: Hash) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            kind,
            status,
            modifier: Modifier::None,
            version: Version::new(V),
            hash,
        }
    }

    struct Fixture {
        _tmp: TempDir,
        state_dir: StateDir,
        target_root: PathBuf,
        state: UpdateState,
    }

    fn fixture() -> Fixture {
        let tmp = TempDir::new().unwrap();
        let state_dir = StateDir::new(tmp.path().join("state"));
        let target_root = tmp.path().join("root");
        std::fs::create_dir_all(&target_root).unwrap();
        Fixture {
            _tmp: tmp,
            state_dir,
            target_root,
            state: UpdateState::new(),
        }
    }

    fn stage(fx: &Fixture, content: &[u8]) -> Hash {
        let hash = digest_bytes(content);
        let dir = fx.state_dir.staged_dir(Version::new(V));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(hash.to_hex()), content).unwrap();
        hash
    }

    #[test]
    fn test_two_phase_replaces_file_content() {
        let mut fx = fixture();
        let live = fx.target_root.join("usr/bin/foo");
        std::fs::create_dir_all(live.parent().unwrap()).unwrap();
        std::fs::write(&live, b"old").unwrap();

        let hash = stage(&fx, b"new content");
        let r = record("/usr/bin/foo", FileKind::Regular, FileStatus::Active, hash);
        fx.state.to_by_path.insert(r.name.clone(), r);

        let committer = Committer::new(&fx.state_dir, &fx.target_root);
        committer.stage_files(&fx.state).unwrap();

        // Pass 1 must not have touched the live file
        assert_eq!(std::fs::read(&live).unwrap(), b"old");
        assert!(fx.target_root.join("usr/bin/.update.foo").exists());

        committer.rename_to_final(&fx.state);
        assert_eq!(std::fs::read(&live).unwrap(), b"new content");
        assert!(!fx.target_root.join("usr/bin/.update.foo").exists());
    }

    #[test]
    fn test_new_file_in_new_directory() {
        let mut fx = fixture();
        let hash = stage(&fx, b"fresh");
        let d = record(
            "/opt/newdir",
            FileKind::Directory,
            FileStatus::Active,
            digest_bytes(b"dir"),
        );
        let r = record(
            "/opt/newdir/file",
            FileKind::Regular,
            FileStatus::Active,
            hash,
        );
        fx.state.to_by_path.insert(d.name.clone(), d);
        fx.state.to_by_path.insert(r.name.clone(), r);

        let committer = Committer::new(&fx.state_dir, &fx.target_root);
        committer.stage_files(&fx.state).unwrap();
        committer.rename_to_final(&fx.state);

        assert!(fx.target_root.join("opt/newdir").is_dir());
        assert_eq!(
            std::fs::read(fx.target_root.join("opt/newdir/file")).unwrap(),
            b"fresh"
        );
    }

    #[test]
    fn test_deletion_removes_live_path() {
        let mut fx = fixture();
        let live = fx.target_root.join("etc/obsolete");
        std::fs::create_dir_all(live.parent().unwrap()).unwrap();
        std::fs::write(&live, b"stale").unwrap();

        let r = record("/etc/obsolete", FileKind::Unset, FileStatus::Deleted, Hash::ZERO);
        fx.state.to_by_path.insert(r.name.clone(), r);

        let committer = Committer::new(&fx.state_dir, &fx.target_root);
        committer.stage_files(&fx.state).unwrap();
        committer.rename_to_final(&fx.state);

        assert!(!live.exists());
    }

    #[test]
    fn test_deleting_missing_path_is_quiet() {
        let mut fx = fixture();
        let r = record("/etc/never-there", FileKind::Unset, FileStatus::Deleted, Hash::ZERO);
        fx.state.to_by_path.insert(r.name.clone(), r);

        let committer = Committer::new(&fx.state_dir, &fx.target_root);
        committer.stage_files(&fx.state).unwrap();
        committer.rename_to_final(&fx.state);
    }

    #[test]
    fn test_staged_link_shares_inode() {
        let mut fx = fixture();
        let hash = stage(&fx, b"linked bytes");
        let r = record("/usr/bin/tool", FileKind::Regular, FileStatus::Active, hash);
        fx.state.to_by_path.insert(r.name.clone(), r);

        let committer = Committer::new(&fx.state_dir, &fx.target_root);
        committer.stage_files(&fx.state).unwrap();

        let staged = fx.state_dir.staged_path(Version::new(V), &hash);
        let sibling = fx.target_root.join("usr/bin/.update.tool");
        assert!(same_file(&staged, &sibling));
    }

    #[test]
    fn test_stage_files_tolerates_stale_sibling() {
        let mut fx = fixture();
        let hash = stage(&fx, b"payload");
        let r = record("/usr/bin/tool", FileKind::Regular, FileStatus::Active, hash);
        fx.state.to_by_path.insert(r.name.clone(), r);

        // A previous aborted run left a stale sibling with other content
        let sibling = fx.target_root.join("usr/bin/.update.tool");
        std::fs::create_dir_all(sibling.parent().unwrap()).unwrap();
        std::fs::write(&sibling, b"stale droppings").unwrap();

        let committer = Committer::new(&fx.state_dir, &fx.target_root);
        committer.stage_files(&fx.state).unwrap();
        committer.rename_to_final(&fx.state);

        assert_eq!(
            std::fs::read(fx.target_root.join("usr/bin/tool")).unwrap(),
            b"payload"
        );
    }

    #[test]
    fn test_stage_files_idempotent_when_rerun() {
        let mut fx = fixture();
        let hash = stage(&fx, b"payload");
        let r = record("/usr/bin/tool", FileKind::Regular, FileStatus::Active, hash);
        fx.state.to_by_path.insert(r.name.clone(), r);

        let committer = Committer::new(&fx.state_dir, &fx.target_root);
        committer.stage_files(&fx.state).unwrap();
        committer.stage_files(&fx.state).unwrap();
        committer.rename_to_final(&fx.state);

        assert_eq!(
            std::fs::read(fx.target_root.join("usr/bin/tool")).unwrap(),
            b"payload"
        );
    }
}
