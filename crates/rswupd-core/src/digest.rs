//! Content digest computation
//!
//! The digest of a regular file is the SHA-256 of its bytes, read in
//! streaming fashion so large payloads do not load into memory. Staged
//! artifacts are named by this digest and every verification step in the
//! pipeline funnels through [`digest_file`].

use crate::errors::{io_error, Result};
use rswupd_core_types::Hash;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const READ_BUF_LEN: usize = 64 * 1024;

/// Compute the content digest of a regular file.
///
/// ## Errors
///
/// `UpdErrorKind::Filesystem` when the file cannot be opened or read,
/// including when it does not exist, which the verifier relies on to
/// detect never-staged artifacts.
pub fn digest_file(path: &Path) -> Result<Hash> {
    let mut file = File::open(path).map_err(|e| io_error("digest_file", path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; READ_BUF_LEN];
    loop {
        let n = file
            .read(&mut buf)
            .map_err(|e| io_error("digest_file", path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(Hash::from_bytes(hasher.finalize().into()))
}

/// Compute the content digest of an in-memory byte slice.
///
/// Test fixtures and manifest generators use this to mint record hashes
/// that [`digest_file`] will agree with.
pub fn digest_bytes(bytes: &[u8]) -> Hash {
    Hash::from_bytes(Sha256::digest(bytes).into())
}
