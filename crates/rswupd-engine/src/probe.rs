//! Version probe
//!
//! Answers three questions at the start of a run: what version is
//! installed, what format generation does this OS speak, and what is the
//! newest published version for that generation. The first two come from
//! fixed files on the installed system; the third from the server.

use crate::transport::Transport;
use rswupd_core::errors::{config_error, parse_error, Result};
use rswupd_core_types::{Format, Version};
use std::path::{Path, PathBuf};

/// os-release location relative to the target root.
pub const OS_RELEASE_REL: &str = "usr/lib/os-release";
/// swupd format file location relative to the target root.
pub const FORMAT_FILE_REL: &str = "usr/share/defaults/swupd/format";

/// Reads the installed version and format generation.
///
/// The paths are fields so tests can point the probe at a fixture tree;
/// production uses [`VersionProbe::default`], which reads under `/`.
#[derive(Debug, Clone)]
pub struct VersionProbe {
    pub os_release: PathBuf,
    pub format_file: PathBuf,
}

impl Default for VersionProbe {
    fn default() -> Self {
        Self::under_root(Path::new("/"))
    }
}

impl VersionProbe {
    /// Probe an OS tree rooted somewhere other than `/` (the `--path`
    /// surface; also how tests stay hermetic).
    pub fn under_root(root: &Path) -> Self {
        Self {
            os_release: root.join(OS_RELEASE_REL),
            format_file: root.join(FORMAT_FILE_REL),
        }
    }

    /// Extract the installed version from the `VERSION_ID=` line.
    ///
    /// ## Errors
    ///
    /// `UpdErrorKind::Config` when the file is unreadable, no
    /// `VERSION_ID=` line exists, or its value is not a decimal version.
    pub fn installed_version(&self) -> Result<Version> {
        let text = std::fs::read_to_string(&self.os_release).map_err(|e| {
            config_error(
                "installed_version",
                format!("reading {}: {}", self.os_release.display(), e),
            )
        })?;

        for line in text.lines() {
            if let Some(value) = line.strip_prefix("VERSION_ID=") {
                let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
                return Version::parse(value).map_err(|_| {
                    config_error(
                        "installed_version",
                        format!("VERSION_ID is not a decimal version: {:?}", value),
                    )
                });
            }
        }

        Err(config_error(
            "installed_version",
            format!("no VERSION_ID line in {}", self.os_release.display()),
        ))
    }

    /// Read the installed format generation.
    ///
    /// ## Errors
    ///
    /// `UpdErrorKind::Config` when the file is unreadable or not a
    /// decimal integer (trailing newline tolerated).
    pub fn installed_format(&self) -> Result<Format> {
        let text = std::fs::read_to_string(&self.format_file).map_err(|e| {
            config_error(
                "installed_format",
                format!("reading {}: {}", self.format_file.display(), e),
            )
        })?;

        Format::parse(&text).map_err(|_| {
            config_error(
                "installed_format",
                format!("format file is not a decimal integer: {:?}", text.trim()),
            )
        })
    }

    /// Ask the server for the latest version within a format generation.
    ///
    /// The body is parsed strictly: a mirror serving an HTML error page
    /// must surface as `UpdErrorKind::Parse`, never as a version.
    pub fn server_version(&self, transport: &dyn Transport, format: Format) -> Result<Version> {
        let url_path = format!("update/version/format{}/latest", format);
        let body = transport.fetch_text(&url_path)?;
        Version::parse(&body).map_err(|_| {
            parse_error(
                "server_version",
                format!("latest-version body is not a decimal version: {:?}", body.trim()),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rswupd_core::errors::UpdErrorKind;
    use tempfile::TempDir;

    fn probe_with(os_release: &str, format: &str) -> (VersionProbe, TempDir) {
        let tmp = TempDir::new().unwrap();
        let os_path = tmp.path().join("os-release");
        let fmt_path = tmp.path().join("format");
        std::fs::write(&os_path, os_release).unwrap();
        std::fs::write(&fmt_path, format).unwrap();
        (
            VersionProbe {
                os_release: os_path,
                format_file: fmt_path,
            },
            tmp,
        )
    }

    #[test]
    fn test_installed_version_from_os_release() {
        let (probe, _tmp) = probe_with(
            "NAME=\"Clear Linux OS\"\nID=clear-linux-os\nVERSION_ID=29990\nPRETTY_NAME=x\n",
            "31\n",
        );
        assert_eq!(probe.installed_version().unwrap(), Version::new(29990));
        assert_eq!(probe.installed_format().unwrap(), Format::new(31));
    }

    #[test]
    fn test_quoted_version_id_accepted() {
        let (probe, _tmp) = probe_with("VERSION_ID=\"30010\"\n", "31");
        assert_eq!(probe.installed_version().unwrap(), Version::new(30010));
    }

    #[test]
    fn test_missing_version_id_is_config_error() {
        let (probe, _tmp) = probe_with("NAME=other\n", "31");
        let err = probe.installed_version().unwrap_err();
        assert_eq!(err.kind(), UpdErrorKind::Config);
    }

    #[test]
    fn test_non_decimal_version_id_rejected() {
        let (probe, _tmp) = probe_with("VERSION_ID=rolling\n", "31");
        assert_eq!(
            probe.installed_version().unwrap_err().kind(),
            UpdErrorKind::Config
        );
    }

    #[test]
    fn test_missing_files_are_config_errors() {
        let tmp = TempDir::new().unwrap();
        let probe = VersionProbe {
            os_release: tmp.path().join("absent"),
            format_file: tmp.path().join("also-absent"),
        };
        assert_eq!(
            probe.installed_version().unwrap_err().kind(),
            UpdErrorKind::Config
        );
        assert_eq!(
            probe.installed_format().unwrap_err().kind(),
            UpdErrorKind::Config
        );
    }

    #[test]
    fn test_garbled_format_file_rejected() {
        let (probe, _tmp) = probe_with("VERSION_ID=1\n", "thirty-one\n");
        assert_eq!(
            probe.installed_format().unwrap_err().kind(),
            UpdErrorKind::Config
        );
    }

    #[test]
    fn test_server_version_strict_parse() {
        use crate::transport::FsTransport;

        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("update/version/format31");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("latest"), "30010\n").unwrap();
        let (probe, _fixture) = probe_with("VERSION_ID=1\n", "31");

        let transport = FsTransport::new(tmp.path());
        assert_eq!(
            probe
                .server_version(&transport, Format::new(31))
                .unwrap(),
            Version::new(30010)
        );

        // A broken mirror serving HTML must not become a version
        std::fs::write(dir.join("latest"), "<html>mirror busted</html>").unwrap();
        let err = probe
            .server_version(&transport, Format::new(31))
            .unwrap_err();
        assert_eq!(err.kind(), UpdErrorKind::Parse);
    }
}
