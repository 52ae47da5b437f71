//! Update planner
//!
//! Restricts the run to the bundles that actually changed: a bundle needs
//! work when its MoM_to reference is newer than the installed version and
//! the operator subscribes to it. MoM order is preserved so downstream
//! stages process bundles the way the server published them.

use rswupd_core::manifest::{FileRecord, Manifest};
use rswupd_core_types::Version;

/// Select the subscribed bundles whose server version exceeds `v_from`.
///
/// `subscribed` must be sorted; membership is a binary search.
pub fn planned_bundles(
    subscribed: &[String],
    mom_to: &Manifest,
    v_from: Version,
) -> Vec<FileRecord> {
    mom_to
        .bundle_refs()
        .filter(|m| m.version > v_from)
        .filter(|m| subscribed.binary_search(&m.name).is_ok())
        .cloned()
        .collect()
}

/// Select the subscribed bundle references of an installed-side MoM,
/// regardless of version (the from view needs every subscribed bundle).
pub fn subscribed_refs<'a>(mom: &'a Manifest, subscribed: &'a [String]) -> Vec<&'a FileRecord> {
    mom.bundle_refs()
        .filter(|m| subscribed.binary_search(&m.name).is_ok())
        .collect()
}
