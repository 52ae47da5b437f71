//! Content acquirer
//!
//! Obtains the bytes for every needed record via the cheapest mechanism
//! available, with a defined fallback cascade:
//!
//! 1. a bundle-wide **pack** (deltas plus some full payloads, keyed by
//!    from/to version), cheap but optional on the server;
//! 2. **deltas** extracted from packs, applied by the delta applier;
//! 3. per-record **full-file** tars, always available, fetched last for
//!    whatever the earlier stages did not satisfy.
//!
//! A pack that 404s or fails to extract must not block the update: the
//! bundle's records are demoted to full-file fetching and the run goes
//! on. Full-file misses, by contrast, are fatal; there is no cheaper
//! mechanism left to fall back to.

use crate::fetch::fetch_tar;
use crate::state::UpdateState;
use crate::transport::Transport;
use rswupd_core::errors::{Result, UpdError, UpdErrorKind};
use rswupd_core::manifest::Manifest;
use rswupd_store::StateDir;

/// Fetches packs and full-file payloads into the staged store.
pub struct ContentAcquirer<'a> {
    state_dir: &'a StateDir,
    transport: &'a dyn Transport,
}

impl<'a> ContentAcquirer<'a> {
    pub fn new(state_dir: &'a StateDir, transport: &'a dyn Transport) -> Self {
        Self {
            state_dir,
            transport,
        }
    }

    /// Fetch and extract the pack for one changed bundle.
    ///
    /// The pack's from-version is the bundle's version in the installed
    /// MoM; a bundle the old MoM does not know has no pack to offer. An
    /// already-downloaded pack archive short-circuits. Extraction
    /// populates `<stateDir>/<to>/delta/` and may pre-populate
    /// `<stateDir>/<to>/staged/`.
    ///
    /// ## Errors
    ///
    /// - `UpdErrorKind::State` when the bundle is absent from the old MoM
    /// - `UpdErrorKind::Transport` / `UpdErrorKind::Exec` when the pack
    ///   cannot be downloaded or extracted
    ///
    /// All of these demote the bundle to full-file fallback at the call
    /// site; none of them aborts the run.
    pub fn fetch_pack(&self, bundle: &Manifest, mom_from: &Manifest) -> Result<()> {
        let recent = mom_from
            .find_bundle(&bundle.name)
            .map(|m| m.version)
            .ok_or_else(|| {
                UpdError::new(UpdErrorKind::State)
                    .with_op("fetch_pack")
                    .with_message(format!(
                        "bundle {} has no installed version to delta from",
                        bundle.name
                    ))
            })?;

        let to = bundle.header.version;
        let pack = self.state_dir.pack_path(to, &bundle.name, recent);
        if pack.is_file() {
            tracing::debug!(bundle = %bundle.name, "pack already on disk");
            return Ok(());
        }

        self.state_dir.ensure_version_dir(to)?;
        let url_path = format!("update/{}/pack-{}-from-{}.tar", to, bundle.name, recent);
        fetch_tar(self.transport, &url_path, &pack)
    }

    /// Fetch every fallback record as a full-file tar, extracted into the
    /// staged store. Hashes already staged (by a pack, a delta, or an
    /// earlier run) are skipped.
    ///
    /// ## Errors
    ///
    /// `UpdErrorKind::Transport` when a full file is missing: fatal, the
    /// cascade has nothing below this.
    pub fn download_remaining(&self, state: &UpdateState) -> Result<()> {
        tracing::info!(count = state.fallback.len(), "files not satisfied by a pack");
        for f in state.fallback.values() {
            self.state_dir.ensure_staged_dir(f.version)?;
            let target = self.state_dir.staged_path(f.version, &f.hash);
            if target.symlink_metadata().is_ok() {
                continue;
            }

            let hash_text = f.hash.to_hex();
            let url_path = format!("update/{}/files/{}.tar", f.version, hash_text);
            let archive = self
                .state_dir
                .staged_dir(f.version)
                .join(format!("{}.tar", hash_text));
            let result = fetch_tar(self.transport, &url_path, &archive);
            let _ = std::fs::remove_file(&archive);
            result?;

            if target.symlink_metadata().is_err() {
                return Err(UpdError::new(UpdErrorKind::Transport)
                    .with_op("download_remaining")
                    .with_url(url_path)
                    .with_message("full-file archive did not contain the expected hash"));
            }
        }
        Ok(())
    }
}
