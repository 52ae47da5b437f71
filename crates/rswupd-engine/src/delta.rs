//! Delta applier
//!
//! Packs deliver binary deltas named `<fromver>-<tover>-<fromhash>-<tohash>`.
//! Each one turns a currently installed file into staged content for the
//! new version: the patcher writes to a `.test` sibling, the result is
//! re-digested, and only a byte-exact match is promoted into the staged
//! store.
//!
//! Nothing in this module aborts the run, but the failure modes differ:
//! a delta whose source is not installed (unknown source hash, missing
//! live file) is fatal for that entry only and is logged and skipped,
//! while a patcher failure or a post-patch digest mismatch demotes the
//! target to full-file fallback. Failure paths never leave bytes at the
//! output path.

use crate::state::UpdateState;
use rswupd_core::digest::digest_file;
use rswupd_core::errors::{integrity_mismatch, Result};
use rswupd_core::manifest::FileRecord;
use rswupd_core_types::Version;
use rswupd_store::{atomic, StateDir};
use std::path::{Path, PathBuf};

/// Default binary-patch command.
pub const PATCH_CMD: &str = "bspatch";

/// Applies pack-delivered deltas into the staged store.
pub struct DeltaApplier<'a> {
    state_dir: &'a StateDir,
    /// Live-tree prefix the delta sources are read from
    target_root: &'a Path,
    /// Patch command; tests substitute a stub
    patch_cmd: &'a str,
}

/// What one delta attempt did.
#[derive(Debug, PartialEq, Eq)]
enum DeltaOutcome {
    Staged,
    AlreadyStaged,
    /// Patch output could not be verified; target demoted to fallback
    Demoted,
    /// Delta does not apply to this run's file set, or its source is not
    /// installed; fatal for this entry only, nothing demoted
    Skipped,
}

impl<'a> DeltaApplier<'a> {
    pub fn new(state_dir: &'a StateDir, target_root: &'a Path, patch_cmd: &'a str) -> Self {
        Self {
            state_dir,
            target_root,
            patch_cmd,
        }
    }

    /// Walk the delta directories of every active version and apply
    /// whatever is there. The from-version must already have been removed
    /// from `state.active` by the orchestrator.
    pub fn apply_all(&self, state: &mut UpdateState) -> Result<()> {
        let versions: Vec<Version> = state.active.iter().collect();
        for version in versions {
            self.apply_from_version(version, state)?;
        }
        Ok(())
    }

    fn apply_from_version(&self, version: Version, state: &mut UpdateState) -> Result<()> {
        let delta_dir = self.state_dir.delta_dir(version);
        let entries = match std::fs::read_dir(&delta_dir) {
            Ok(entries) => entries,
            // No delta directory means no pack delivered deltas here
            Err(_) => return Ok(()),
        };

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let name = file_name.to_string_lossy();
            let Some((from_hash, to_hash)) = parse_delta_name(&name) else {
                continue;
            };

            let outcome = self.apply_one(&from_hash, &to_hash, &entry.path(), state)?;
            tracing::debug!(delta = %name, ?outcome, "delta processed");
        }
        Ok(())
    }

    /// Apply a single delta. Returns `Ok` for every per-delta failure
    /// mode; the `Err` arm is reserved for state-store damage (a staged
    /// directory that cannot be created).
    fn apply_one(
        &self,
        from_hash: &str,
        to_hash: &str,
        delta_path: &Path,
        state: &mut UpdateState,
    ) -> Result<DeltaOutcome> {
        let Some(to) = state.to_by_hash.get(to_hash).cloned() else {
            // Routine: packs carry deltas for records below this run's
            // version floor too.
            tracing::debug!(
                delta = %delta_path.display(),
                "delta target is not in this run's file set, skipping this delta"
            );
            return Ok(DeltaOutcome::Skipped);
        };

        let Some(from) = state.from_by_hash.get(from_hash).cloned() else {
            tracing::warn!(
                delta = %delta_path.display(),
                "delta source is not installed, skipping this delta"
            );
            return Ok(DeltaOutcome::Skipped);
        };

        let out = self.state_dir.staged_path(to.version, &to.hash);
        if out.symlink_metadata().is_ok() {
            return Ok(DeltaOutcome::AlreadyStaged);
        }
        self.state_dir.ensure_staged_dir(to.version)?;

        let src = live_path(self.target_root, &from.name);
        if src.symlink_metadata().is_err() {
            tracing::warn!(
                src = %src.display(),
                "delta source file missing from live tree, skipping this delta"
            );
            return Ok(DeltaOutcome::Skipped);
        }

        let candidate = atomic::test_candidate(&out);
        match self.patch_and_verify(&src, &candidate, delta_path, &to) {
            Ok(()) => {
                atomic::promote(&candidate, &out)?;
                Ok(DeltaOutcome::Staged)
            }
            Err(err) => {
                let _ = std::fs::remove_file(&candidate);
                tracing::warn!(
                    delta = %delta_path.display(),
                    error = %err,
                    "delta failed, falling back to full file"
                );
                state.mark_fallback(&to);
                Ok(DeltaOutcome::Demoted)
            }
        }
    }

    fn patch_and_verify(
        &self,
        src: &Path,
        candidate: &Path,
        delta_path: &Path,
        to: &FileRecord,
    ) -> Result<()> {
        crate::exec::run_command_silent(
            self.patch_cmd,
            &[src.as_os_str(), candidate.as_os_str(), delta_path.as_os_str()],
        )?;

        let actual = digest_file(candidate)?;
        if actual != to.hash {
            return Err(integrity_mismatch(
                "apply_delta",
                candidate,
                &to.hash.to_hex(),
                &actual.to_hex(),
            ));
        }
        Ok(())
    }
}

/// Split a delta filename into its from/to hash fields. Filenames that do
/// not have exactly four dash-separated fields are not deltas.
fn parse_delta_name(name: &str) -> Option<(String, String)> {
    let fields: Vec<&str> = name.split('-').collect();
    if fields.len() != 4 {
        return None;
    }
    Some((fields[2].to_string(), fields[3].to_string()))
}

/// Join a manifest path (absolute by convention) onto the target root.
pub fn live_path(target_root: &Path, record_name: &str) -> PathBuf {
    target_root.join(record_name.trim_start_matches('/'))
}
