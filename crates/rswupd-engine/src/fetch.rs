//! Manifest fetcher
//!
//! Obtains and parses manifests, caching them in the state directory.
//! Bundle manifests ship as single-file tars and are extracted via the
//! tar subprocess; the MoM is served uncompressed. Every version a
//! manifest is fetched for registers in [`ActiveVersions`] so the delta
//! applier later knows which delta directories may exist.

use crate::exec::run_command_silent;
use crate::state::ActiveVersions;
use crate::transport::Transport;
use rswupd_core::errors::{Result, UpdError, UpdErrorKind};
use rswupd_core::manifest::{parse_manifest_file, FileRecord, Manifest};
use rswupd_core_types::Version;
use rswupd_store::StateDir;
use std::path::Path;

/// Fetches manifests and tar payloads into the state directory.
pub struct ManifestFetcher<'a> {
    state_dir: &'a StateDir,
    transport: &'a dyn Transport,
}

impl<'a> ManifestFetcher<'a> {
    pub fn new(state_dir: &'a StateDir, transport: &'a dyn Transport) -> Self {
        Self {
            state_dir,
            transport,
        }
    }

    /// Fetch and parse the Manifest-of-Manifests for a version.
    ///
    /// The MoM is always re-fetched: it is the entry point of the run and
    /// the server may republish. The download is atomic, so a concurrent
    /// reader never sees a partial manifest.
    pub fn fetch_mom(&self, version: Version, active: &mut ActiveVersions) -> Result<Manifest> {
        active.add(version);
        self.state_dir.ensure_version_dir(version)?;

        let dest = self.state_dir.mom_path(version);
        let url_path = format!("update/{}/Manifest.MoM", version);
        self.transport.fetch_file(&url_path, &dest)?;

        parse_manifest_file("MoM", &dest)
    }

    /// Fetch and parse one bundle manifest at the version its MoM
    /// reference was minted in. A manifest already on disk is parsed with
    /// no network traffic.
    pub fn fetch_manifest(
        &self,
        bundle: &FileRecord,
        active: &mut ActiveVersions,
    ) -> Result<Manifest> {
        active.add(bundle.version);

        let dest = self.state_dir.manifest_path(bundle.version, &bundle.name);
        if dest.is_file() {
            return parse_manifest_file(&bundle.name, &dest);
        }

        self.state_dir.ensure_version_dir(bundle.version)?;
        let url_path = format!("update/{}/Manifest.{}.tar", bundle.version, bundle.name);
        let mut archive_name = dest.as_os_str().to_os_string();
        archive_name.push(".tar");
        let archive = std::path::PathBuf::from(archive_name);
        self.fetch_and_extract(&url_path, &archive)?;

        if !dest.is_file() {
            return Err(UpdError::new(UpdErrorKind::Transport)
                .with_op("fetch_manifest")
                .with_path(dest.display().to_string())
                .with_message("manifest archive did not contain the manifest"));
        }
        parse_manifest_file(&bundle.name, &dest)
    }

    fn fetch_and_extract(&self, url_path: &str, archive: &Path) -> Result<()> {
        let result = fetch_tar(self.transport, url_path, archive);
        let _ = std::fs::remove_file(archive);
        result
    }
}

/// Download a tar to `archive` and extract it in the archive's directory.
/// The archive file is left in place; callers that do not want it
/// (manifests, full files) remove it afterwards, while pack archives stay
/// as the marker that the pack was already fetched.
pub fn fetch_tar(transport: &dyn Transport, url_path: &str, archive: &Path) -> Result<()> {
    transport.fetch_file(url_path, archive)?;

    let dir = archive.parent().ok_or_else(|| {
        UpdError::new(UpdErrorKind::Internal)
            .with_op("fetch_tar")
            .with_message(format!("archive path has no parent: {}", archive.display()))
    })?;
    run_command_silent(
        "tar",
        &[
            std::ffi::OsStr::new("-C"),
            dir.as_os_str(),
            std::ffi::OsStr::new("-xf"),
            archive.as_os_str(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::FsTransport;
    use rswupd_core::manifest::{FileKind, FileStatus, Modifier};
    use rswupd_core_types::Hash;
    use std::process::Command;
    use tempfile::TempDir;

    const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

    fn mom_text() -> String {
        format!(
            "MANIFEST\t31\nversion:\t30010\n\nM...\t{h}\t30010\tos-core\n",
            h = HASH_A
        )
    }

    fn bundle_ref(version: u32, name: &str) -> FileRecord {
        FileRecord {
            name: name.to_string(),
            kind: FileKind::Manifest,
            status: FileStatus::Active,
            modifier: Modifier::None,
            version: Version::new(version),
            hash: Hash::from_hex(HASH_A).unwrap(),
        }
    }

    /// Build a server tree with a MoM and a tarred bundle manifest.
    fn serve() -> (TempDir, TempDir) {
        let server = TempDir::new().unwrap();
        let v_dir = server.path().join("update/30010");
        std::fs::create_dir_all(&v_dir).unwrap();
        std::fs::write(v_dir.join("Manifest.MoM"), mom_text()).unwrap();

        let manifest_text = format!(
            "MANIFEST\t31\nversion:\t30010\n\nF...\t{h}\t30010\t/usr/bin/foo\n",
            h = HASH_A
        );
        let scratch = TempDir::new().unwrap();
        std::fs::write(scratch.path().join("Manifest.os-core"), manifest_text).unwrap();
        let status = Command::new("tar")
            .args(["-C", scratch.path().to_str().unwrap(), "-cf"])
            .arg(v_dir.join("Manifest.os-core.tar"))
            .arg("Manifest.os-core")
            .status()
            .unwrap();
        assert!(status.success());

        (server, scratch)
    }

    #[test]
    fn test_fetch_mom_registers_version() {
        let (server, _scratch) = serve();
        let state_tmp = TempDir::new().unwrap();
        let state_dir = StateDir::new(state_tmp.path().join("state"));
        let transport = FsTransport::new(server.path());
        let fetcher = ManifestFetcher::new(&state_dir, &transport);
        let mut active = ActiveVersions::default();

        let mom = fetcher.fetch_mom(Version::new(30010), &mut active).unwrap();
        assert_eq!(mom.header.version, Version::new(30010));
        assert!(active.contains(Version::new(30010)));
        assert!(state_dir.mom_path(Version::new(30010)).is_file());
    }

    #[test]
    fn test_fetch_manifest_extracts_and_caches() {
        let (server, _scratch) = serve();
        let state_tmp = TempDir::new().unwrap();
        let state_dir = StateDir::new(state_tmp.path().join("state"));
        let transport = FsTransport::new(server.path());
        let fetcher = ManifestFetcher::new(&state_dir, &transport);
        let mut active = ActiveVersions::default();

        let bundle = bundle_ref(30010, "os-core");
        let manifest = fetcher.fetch_manifest(&bundle, &mut active).unwrap();
        assert_eq!(manifest.name, "os-core");
        assert_eq!(manifest.files.len(), 1);

        // Second fetch parses the cached copy: remove the server tree to
        // prove no network traffic happens.
        drop(server);
        let again = fetcher.fetch_manifest(&bundle, &mut active).unwrap();
        assert_eq!(again.files.len(), 1);
    }

    #[test]
    fn test_fetch_missing_manifest_is_transport_error() {
        let server = TempDir::new().unwrap();
        let state_tmp = TempDir::new().unwrap();
        let state_dir = StateDir::new(state_tmp.path().join("state"));
        let transport = FsTransport::new(server.path());
        let fetcher = ManifestFetcher::new(&state_dir, &transport);
        let mut active = ActiveVersions::default();

        let err = fetcher
            .fetch_manifest(&bundle_ref(30010, "absent"), &mut active)
            .unwrap_err();
        assert_eq!(err.kind(), UpdErrorKind::Transport);
    }
}
