//! File records and their four-column flag field
//!
//! Each record line carries a four-character flag field; the characters
//! encode kind, status, and modifier in that order, with the fourth
//! position reserved (historically the rename flag). `F...` is a plain
//! regular file, `.d..` a deletion, `M.b.` a MoM bundle reference.

use crate::errors::{parse_error, Result};
use rswupd_core_types::{Hash, Version};

/// What a record names on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
    /// A bundle reference inside a Manifest-of-Manifests
    Manifest,
    /// No type recorded (deleted records)
    Unset,
}

/// Whether the record is live at its manifest's version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Active,
    /// Removed from the OS at this version; the committer deletes the path
    Deleted,
    /// No longer tracked but deliberately left on disk
    Ghosted,
}

/// Special handling class for the path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    None,
    Config,
    State,
    Boot,
}

/// A manifest entry: one path at one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Absolute path (or bundle name for MoM records)
    pub name: String,
    pub kind: FileKind,
    pub status: FileStatus,
    pub modifier: Modifier,
    /// The snapshot in which this record was minted
    pub version: Version,
    pub hash: Hash,
}

impl FileRecord {
    /// A record is present when its content should exist on disk.
    pub fn is_present(&self) -> bool {
        matches!(self.status, FileStatus::Active)
    }

    /// Parse the four-character flag field.
    pub fn parse_flags(flags: &str) -> Result<(FileKind, FileStatus, Modifier)> {
        let chars: Vec<char> = flags.chars().collect();
        if chars.len() != 4 {
            return Err(parse_error(
                "parse_flags",
                format!("flag field must be 4 characters: {:?}", flags),
            ));
        }
        let kind = match chars[0] {
            'F' => FileKind::Regular,
            'D' => FileKind::Directory,
            'L' => FileKind::Symlink,
            'M' => FileKind::Manifest,
            '.' => FileKind::Unset,
            c => {
                return Err(parse_error(
                    "parse_flags",
                    format!("unknown type flag {:?} in {:?}", c, flags),
                ))
            }
        };
        let status = match chars[1] {
            '.' => FileStatus::Active,
            'd' => FileStatus::Deleted,
            'g' => FileStatus::Ghosted,
            c => {
                return Err(parse_error(
                    "parse_flags",
                    format!("unknown status flag {:?} in {:?}", c, flags),
                ))
            }
        };
        let modifier = match chars[2] {
            '.' => Modifier::None,
            'C' => Modifier::Config,
            's' => Modifier::State,
            'b' => Modifier::Boot,
            c => {
                return Err(parse_error(
                    "parse_flags",
                    format!("unknown modifier flag {:?} in {:?}", c, flags),
                ))
            }
        };
        match chars[3] {
            '.' | 'r' => {}
            c => {
                return Err(parse_error(
                    "parse_flags",
                    format!("unknown rename flag {:?} in {:?}", c, flags),
                ))
            }
        }
        Ok((kind, status, modifier))
    }
}
