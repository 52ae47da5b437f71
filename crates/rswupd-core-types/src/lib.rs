//! Core types shared across rswupd facilities
//!
//! This crate provides foundational types used by the manifest model,
//! error handling, and logging facilities:
//!
//! - **Version types**: `Version` and `Format`, strict-decimal newtypes
//! - **Content digests**: `Hash`, the fixed-width digest keyed into the
//!   staged content store
//! - **Schema constants**: canonical field keys and event names for
//!   structured logging

pub mod hash;
pub mod schema;
pub mod version;

pub use hash::{Hash, HashParseError};
pub use version::{Format, Version, VersionParseError};
