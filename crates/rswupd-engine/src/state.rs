//! Run state: the indexed views over manifest records
//!
//! One [`UpdateState`] exists per update run, owned by the orchestrator
//! and populated in pipeline order:
//!
//! | View | Keyed by | Contents |
//! |------|----------|----------|
//! | `from_by_path` | path | present records from the installed side |
//! | `from_by_hash` | hash text | the same records, for delta source lookup |
//! | `to_by_path` | path (ordered) | all records of changed bundles, deletions included |
//! | `to_by_hash` | hash text | present subset of `to_by_path` |
//! | `fallback` | hash text | records that must be fetched as full files |
//! | `active` | version (ordered) | versions touched during this run |
//!
//! `to_by_path` is an ordered map because the committer walks it
//! lexicographically; `fallback` is hash-keyed so two paths sharing
//! content cost one fetch.

use rswupd_core::manifest::{FileRecord, Manifest};
use rswupd_core_types::Version;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// The set of versions whose delta directories this run may populate.
#[derive(Debug, Default)]
pub struct ActiveVersions(BTreeSet<Version>);

impl ActiveVersions {
    pub fn add(&mut self, version: Version) {
        self.0.insert(version);
    }

    /// Drop a version from the set (the from-version is excluded before
    /// delta application: its directory holds installed-side manifests,
    /// never deltas).
    pub fn remove(&mut self, version: Version) {
        self.0.remove(&version);
    }

    pub fn contains(&self, version: Version) -> bool {
        self.0.contains(&version)
    }

    pub fn iter(&self) -> impl Iterator<Item = Version> + '_ {
        self.0.iter().copied()
    }
}

/// All indexed views for one update run.
#[derive(Debug, Default)]
pub struct UpdateState {
    pub from_by_path: HashMap<String, FileRecord>,
    pub from_by_hash: HashMap<String, FileRecord>,
    pub to_by_path: BTreeMap<String, FileRecord>,
    pub to_by_hash: HashMap<String, FileRecord>,
    pub fallback: BTreeMap<String, FileRecord>,
    pub active: ActiveVersions,
}

impl UpdateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the installed side of a subscribed bundle: present records
    /// only, no version floor.
    pub fn consolidate_from(&mut self, manifest: &Manifest) {
        for f in &manifest.files {
            if !f.is_present() {
                continue;
            }
            self.from_by_path.insert(f.name.clone(), f.clone());
            self.from_by_hash.insert(f.hash.to_hex(), f.clone());
        }
    }

    /// Merge the target side of a changed bundle: records strictly newer
    /// than `min_version`, deletions included so the committer can remove
    /// their paths.
    pub fn consolidate_to(&mut self, manifest: &Manifest, min_version: Version) {
        for f in &manifest.files {
            if f.version <= min_version {
                continue;
            }
            self.to_by_path.insert(f.name.clone(), f.clone());
            if f.is_present() {
                self.to_by_hash.insert(f.hash.to_hex(), f.clone());
            }
        }
    }

    /// Demote every needed record of a bundle to full-file fetching; used
    /// when its pack cannot be obtained.
    pub fn consolidate_fallback(&mut self, manifest: &Manifest, min_version: Version) {
        for f in &manifest.files {
            if f.version <= min_version || !f.is_present() {
                continue;
            }
            self.fallback.insert(f.hash.to_hex(), f.clone());
        }
    }

    /// Demote a single record to full-file fetching; used when its delta
    /// cannot produce verified content.
    pub fn mark_fallback(&mut self, record: &FileRecord) {
        self.fallback.insert(record.hash.to_hex(), record.clone());
    }
}
