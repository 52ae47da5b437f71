//! Text parser for the swupd manifest format
//!
//! The format is line oriented and tab separated:
//!
//! ```text
//! MANIFEST<TAB>31
//! version:<TAB>30010
//! previous:<TAB>29990
//! filecount:<TAB>3
//! timestamp:<TAB>1520000000
//! contentsize:<TAB>123456
//! includes:<TAB>os-core
//!
//! F...<TAB><64-hex><TAB>30010<TAB>/usr/bin/foo
//! ```
//!
//! The header block ends at the first blank line; everything after it is
//! file records. Unknown header keys are skipped so newer servers do not
//! break older clients.

use super::{FileRecord, Manifest, ManifestHeader};
use crate::errors::{io_error, parse_error, Result};
use rswupd_core_types::{Hash, Version};
use std::path::Path;

/// Parse manifest text. `name` is the bundle name the caller fetched
/// (`MoM` for a Manifest-of-Manifests); it is carried on the result for
/// logging and pack-URL construction.
pub fn parse_manifest(name: &str, text: &str) -> Result<Manifest> {
    let mut lines = text.lines().enumerate();

    let format = match lines.next() {
        Some((_, line)) => {
            let value = line.strip_prefix("MANIFEST\t").ok_or_else(|| {
                parse_error(
                    "parse_manifest",
                    format!("{}: first line is not a MANIFEST header", name),
                )
            })?;
            value.trim().parse::<u32>().map_err(|_| {
                parse_error(
                    "parse_manifest",
                    format!("{}: bad manifest format {:?}", name, value),
                )
            })?
        }
        None => {
            return Err(parse_error(
                "parse_manifest",
                format!("{}: empty manifest", name),
            ))
        }
    };

    let mut version = None;
    let mut previous = Version::new(0);
    let mut filecount = 0u64;
    let mut timestamp = 0u64;
    let mut contentsize = 0u64;
    let mut includes = Vec::new();

    // Header block: key:<TAB>value until the blank separator line.
    for (idx, line) in lines.by_ref() {
        if line.is_empty() {
            break;
        }
        let (key, value) = line.split_once('\t').ok_or_else(|| {
            parse_error(
                "parse_manifest",
                format!("{}: line {}: malformed header line", name, idx + 1),
            )
        })?;
        let bad_value = |what: &str| {
            parse_error(
                "parse_manifest",
                format!("{}: line {}: bad {} {:?}", name, idx + 1, what, value),
            )
        };
        match key {
            "version:" => version = Some(Version::parse(value).map_err(|_| bad_value("version"))?),
            "previous:" => previous = Version::parse(value).map_err(|_| bad_value("previous"))?,
            "filecount:" => filecount = value.trim().parse().map_err(|_| bad_value("filecount"))?,
            "timestamp:" => timestamp = value.trim().parse().map_err(|_| bad_value("timestamp"))?,
            "contentsize:" => {
                contentsize = value.trim().parse().map_err(|_| bad_value("contentsize"))?
            }
            "includes:" => includes.push(value.trim().to_string()),
            _ => {}
        }
    }

    let version = version.ok_or_else(|| {
        parse_error(
            "parse_manifest",
            format!("{}: header is missing a version", name),
        )
    })?;

    let mut files = Vec::new();
    for (idx, line) in lines {
        if line.is_empty() {
            continue;
        }
        files.push(parse_record(name, idx + 1, line)?);
    }

    Ok(Manifest {
        name: name.to_string(),
        header: ManifestHeader {
            format,
            version,
            previous,
            filecount,
            timestamp,
            contentsize,
            includes,
        },
        files,
    })
}

/// Read and parse a manifest file from disk.
pub fn parse_manifest_file(name: &str, path: &Path) -> Result<Manifest> {
    let text =
        std::fs::read_to_string(path).map_err(|e| io_error("parse_manifest_file", path, e))?;
    parse_manifest(name, &text)
}

fn parse_record(name: &str, line_no: usize, line: &str) -> Result<FileRecord> {
    let mut fields = line.splitn(4, '\t');
    let (flags, hash, version, path) = match (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) {
        (Some(a), Some(b), Some(c), Some(d)) => (a, b, c, d),
        _ => {
            return Err(parse_error(
                "parse_manifest",
                format!("{}: line {}: record needs 4 tab-separated fields", name, line_no),
            ))
        }
    };

    let (kind, status, modifier) = FileRecord::parse_flags(flags)?;
    let hash = Hash::from_hex(hash).map_err(|e| {
        parse_error(
            "parse_manifest",
            format!("{}: line {}: {}", name, line_no, e),
        )
    })?;
    let version = Version::parse(version).map_err(|e| {
        parse_error(
            "parse_manifest",
            format!("{}: line {}: {}", name, line_no, e),
        )
    })?;

    Ok(FileRecord {
        name: path.to_string(),
        kind,
        status,
        modifier,
        version,
        hash,
    })
}
