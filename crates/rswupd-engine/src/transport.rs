//! Transport seam
//!
//! Everything the engine pulls from the update server goes through the
//! [`Transport`] trait: small text bodies (the latest-version probe) and
//! whole files (manifests, packs, full-file tars). File fetches land via
//! a `.dl.` sibling temp plus rename, so a truncated download is never
//! observable at the destination path.
//!
//! Two implementations: [`HttpTransport`] for `http(s)://` server roots
//! and [`FsTransport`] for `file://` mirror directories. The latter also
//! serves as the server double in the integration tests.

use rswupd_core::errors::{transport_error, Result};
use rswupd_store::atomic;
use std::io;
use std::path::{Path, PathBuf};

/// A read-only view of the update server, addressed by URL path relative
/// to the server root (e.g. `update/30010/Manifest.MoM`).
pub trait Transport {
    /// Fetch a small text body.
    fn fetch_text(&self, url_path: &str) -> Result<String>;

    /// Fetch a file to `dest`, atomically.
    fn fetch_file(&self, url_path: &str, dest: &Path) -> Result<()>;
}

/// HTTP transport over a blocking agent.
pub struct HttpTransport {
    agent: ureq::Agent,
    root: String,
}

impl HttpTransport {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            agent: ureq::agent(),
            root: trim_trailing_slash(root.into()),
        }
    }

    fn url(&self, url_path: &str) -> String {
        format!("{}/{}", self.root, url_path)
    }

    fn get(&self, url: &str) -> Result<ureq::Response> {
        match self.agent.get(url).call() {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(code, _)) => Err(transport_error(
                "http_get",
                url,
                format!("replied: {}", code),
            )),
            Err(e) => Err(transport_error("http_get", url, e.to_string())),
        }
    }
}

impl Transport for HttpTransport {
    fn fetch_text(&self, url_path: &str) -> Result<String> {
        let url = self.url(url_path);
        let resp = self.get(&url)?;
        resp.into_string()
            .map_err(|e| transport_error("http_get", &url, format!("reading body: {}", e)))
    }

    fn fetch_file(&self, url_path: &str, dest: &Path) -> Result<()> {
        let url = self.url(url_path);
        let resp = self.get(&url)?;

        let temp = atomic::download_temp(dest);
        let copy_result = (|| -> io::Result<()> {
            let mut out = std::fs::File::create(&temp)?;
            let mut body = resp.into_reader();
            io::copy(&mut body, &mut out)?;
            out.sync_all()
        })();
        if let Err(e) = copy_result {
            let _ = std::fs::remove_file(&temp);
            return Err(transport_error(
                "http_fetch_file",
                &url,
                format!("writing {}: {}", temp.display(), e),
            ));
        }

        atomic::promote(&temp, dest)
    }
}

/// Local-directory transport for `file://` mirror roots.
pub struct FsTransport {
    root: PathBuf,
}

impl FsTransport {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn source(&self, url_path: &str) -> PathBuf {
        self.root.join(url_path)
    }
}

impl Transport for FsTransport {
    fn fetch_text(&self, url_path: &str) -> Result<String> {
        let src = self.source(url_path);
        std::fs::read_to_string(&src)
            .map_err(|e| transport_error("fs_fetch", &src.display().to_string(), e.to_string()))
    }

    fn fetch_file(&self, url_path: &str, dest: &Path) -> Result<()> {
        let src = self.source(url_path);
        if !src.is_file() {
            return Err(transport_error(
                "fs_fetch",
                &src.display().to_string(),
                "no such file in mirror",
            ));
        }
        let temp = atomic::download_temp(dest);
        if let Err(e) = std::fs::copy(&src, &temp) {
            let _ = std::fs::remove_file(&temp);
            return Err(transport_error(
                "fs_fetch",
                &src.display().to_string(),
                e.to_string(),
            ));
        }
        atomic::promote(&temp, dest)
    }
}

/// Build the transport matching a server root URL.
///
/// `file:///srv/mirror` roots get the directory transport; anything else
/// is treated as an HTTP root.
pub fn transport_for(server_root: &str) -> Box<dyn Transport> {
    match server_root.strip_prefix("file://") {
        Some(path) => Box::new(FsTransport::new(path)),
        None => Box::new(HttpTransport::new(server_root)),
    }
}

fn trim_trailing_slash(mut s: String) -> String {
    while s.ends_with('/') {
        s.pop();
    }
    s
}
