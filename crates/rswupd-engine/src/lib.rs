//! rswupd Engine - the update reconciliation pipeline
//!
//! Coordinates one update run end to end: probe installed and server
//! versions, resolve subscribed bundle manifests, consolidate the changed
//! file set, acquire content (delta → pack → full-file fallback), verify
//! every staged artifact by digest, and commit atomically to the live
//! tree.
//!
//! The entry point is [`update::run_update`]; everything else in this
//! crate is a stage of that pipeline or a seam it depends on.

pub mod acquire;
pub mod commit;
pub mod delta;
pub mod exec;
pub mod fetch;
pub mod plan;
pub mod probe;
pub mod state;
pub mod subscriptions;
pub mod transport;
pub mod update;
pub mod verify;

pub use transport::{transport_for, FsTransport, HttpTransport, Transport};
pub use update::{run_update, UpdateContext, UpdateOutcome};
