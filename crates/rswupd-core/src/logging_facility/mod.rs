//! Structured logging facility for rswupd
//!
//! `init(profile)` installs the subscriber once; the `log_op_start!`,
//! `log_op_end!`, and `log_op_error!` macros bracket pipeline operations
//! with a shared event schema (one hidden emitter backs all three). The
//! engine layer owns operation-lifecycle logging; the store and core
//! layers use only `tracing::debug!` for internal details.

pub mod init;
pub mod macros;

pub use init::{init, Profile};
