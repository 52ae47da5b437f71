//! rswupd core - manifest model, digests, and the error/logging facilities
//!
//! This crate provides the foundations the update engine builds on:
//! - The swupd manifest model and text parser (file records, bundle
//!   references, manifest headers)
//! - Content digest computation over regular files
//! - The canonical error facility (`UpdError`/`UpdErrorKind`) with stable
//!   error codes
//! - The structured logging facility (single `init` entry point plus
//!   operation-lifecycle macros)

pub mod digest;
pub mod errors;
pub mod logging_facility;
pub mod manifest;

// Re-export commonly used types
pub use digest::digest_file;
pub use errors::{Result, UpdError, UpdErrorKind};
pub use manifest::{FileKind, FileRecord, FileStatus, Manifest, ManifestHeader, Modifier};

// The lifecycle macros resolve their schema constants through this path,
// so macro consumers need no direct dependency on the types crate.
pub use rswupd_core_types::schema;
