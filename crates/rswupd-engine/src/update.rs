//! Update orchestrator
//!
//! Drives one complete update run:
//!
//! 1. Acquire the run lock
//! 2. Probe installed/server versions and enumerate subscriptions
//! 3. Fetch both MoMs and consolidate the installed file set
//! 4. Plan the changed bundles
//! 5. Acquire content: packs, then deltas, then full-file fallback
//! 6. Verify every staged artifact
//! 7. Commit: stage siblings, then the atomic switch
//!
//! Any failure before the verifier aborts with the live tree untouched.
//! Once the verifier has passed, the committer runs to completion
//! unconditionally: its second pass is the critical section and never
//! propagates errors.

use crate::acquire::ContentAcquirer;
use crate::commit::Committer;
use crate::delta::{DeltaApplier, PATCH_CMD};
use crate::fetch::ManifestFetcher;
use crate::plan::{planned_bundles, subscribed_refs};
use crate::probe::VersionProbe;
use crate::state::UpdateState;
use crate::subscriptions::{subscribed_bundles, BUNDLES_DIR_REL};
use crate::transport::{transport_for, Transport};
use crate::verify::verify_staged;
use rswupd_core::errors::Result;
use rswupd_core::{log_op_end, log_op_error, log_op_start};
use rswupd_core_types::Version;
use rswupd_store::{RunLock, StateDir};
use std::path::{Path, PathBuf};

/// Default update server root.
pub const DEFAULT_SERVER_ROOT: &str = "https://download.clearlinux.org";

/// Everything one update run needs, resolved before the pipeline starts.
pub struct UpdateContext {
    pub state_dir: StateDir,
    pub transport: Box<dyn Transport>,
    /// Live-tree prefix; `/` in production, a scratch root in tests
    pub target_root: PathBuf,
    pub probe: VersionProbe,
    pub bundles_dir: PathBuf,
    pub patch_cmd: String,
}

impl UpdateContext {
    /// Context with production defaults for the given server root and
    /// state directory.
    pub fn new(server_root: &str, state_root: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: StateDir::new(state_root),
            transport: transport_for(server_root),
            target_root: PathBuf::from("/"),
            probe: VersionProbe::default(),
            bundles_dir: Path::new("/").join(BUNDLES_DIR_REL),
            patch_cmd: PATCH_CMD.to_string(),
        }
    }

    /// Re-root the run at a target prefix: the live tree, the probe's
    /// config files, and the subscription directory all resolve beneath
    /// it. `/` reproduces the defaults.
    pub fn rooted_at(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        self.probe = VersionProbe::under_root(&root);
        self.bundles_dir = root.join(BUNDLES_DIR_REL);
        self.target_root = root;
        self
    }
}

/// Phases of a single update run, in order. Failure states are reachable
/// from every phase except `Committing`, which is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePhase {
    Idle,
    Probing,
    Planning,
    Acquiring,
    Verifying,
    Committing,
    Done,
}

impl std::fmt::Display for UpdatePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            UpdatePhase::Idle => "idle",
            UpdatePhase::Probing => "probing",
            UpdatePhase::Planning => "planning",
            UpdatePhase::Acquiring => "acquiring",
            UpdatePhase::Verifying => "verifying",
            UpdatePhase::Committing => "committing",
            UpdatePhase::Done => "done",
        };
        f.write_str(name)
    }
}

fn advance(phase: &mut UpdatePhase, next: UpdatePhase) {
    tracing::info!(from = %phase, phase = %next, "phase transition");
    *phase = next;
}

/// Result of a completed run.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub from: Version,
    pub to: Version,
    /// Bundles the planner selected
    pub bundles: usize,
    /// Present records committed to the live tree
    pub changed: usize,
    /// Deletion records processed
    pub deleted: usize,
    /// False when the system was already current and nothing was touched
    pub committed: bool,
}

/// Perform one update run.
pub fn run_update(ctx: &UpdateContext) -> Result<UpdateOutcome> {
    log_op_start!("update");
    let start = std::time::Instant::now();

    let result = run_update_impl(ctx).map_err(|e| {
        let duration_ms = start.elapsed().as_millis() as u64;
        log_op_error!("update", e, duration_ms = duration_ms);
        e
    })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    log_op_end!(
        "update",
        duration_ms = duration_ms,
        version_from = result.from.as_u32(),
        version_to = result.to.as_u32(),
        changed = result.changed
    );
    Ok(result)
}

fn run_update_impl(ctx: &UpdateContext) -> Result<UpdateOutcome> {
    let _lock = RunLock::acquire(&ctx.state_dir)?;
    let mut phase = UpdatePhase::Idle;

    advance(&mut phase, UpdatePhase::Probing);
    let v_from = ctx.probe.installed_version()?;
    let format = ctx.probe.installed_format()?;
    let v_to = ctx.probe.server_version(ctx.transport.as_ref(), format)?;
    tracing::info!(version_from = v_from.as_u32(), version_to = v_to.as_u32(), %format);

    let bundles = subscribed_bundles(&ctx.bundles_dir)?;
    tracing::debug!(subscribed = bundles.len());

    let mut state = UpdateState::new();
    let fetcher = ManifestFetcher::new(&ctx.state_dir, ctx.transport.as_ref());

    let mom_from = fetcher.fetch_mom(v_from, &mut state.active)?;
    for bundle_ref in subscribed_refs(&mom_from, &bundles) {
        let manifest = fetcher.fetch_manifest(bundle_ref, &mut state.active)?;
        state.consolidate_from(&manifest);
    }
    let mom_to = fetcher.fetch_mom(v_to, &mut state.active)?;

    advance(&mut phase, UpdatePhase::Planning);
    let planned = planned_bundles(&bundles, &mom_to, v_from);
    if planned.is_empty() {
        advance(&mut phase, UpdatePhase::Done);
        tracing::info!(version = v_from.as_u32(), "already current");
        return Ok(UpdateOutcome {
            from: v_from,
            to: v_to,
            bundles: 0,
            changed: 0,
            deleted: 0,
            committed: false,
        });
    }
    for b in &planned {
        tracing::info!(bundle = %b.name, version = b.version.as_u32(), "bundle needs update");
    }

    advance(&mut phase, UpdatePhase::Acquiring);
    let acquirer = ContentAcquirer::new(&ctx.state_dir, ctx.transport.as_ref());
    for bundle_ref in &planned {
        let manifest = fetcher.fetch_manifest(bundle_ref, &mut state.active)?;
        state.consolidate_to(&manifest, v_from);
        if let Err(err) = acquirer.fetch_pack(&manifest, &mom_from) {
            tracing::warn!(
                bundle = %manifest.name,
                error = %err,
                "pack unavailable, falling back to full files"
            );
            state.consolidate_fallback(&manifest, v_from);
        }
    }

    // The from-version's directory holds installed-side manifests, never
    // deltas; exclude it before the walk.
    state.active.remove(v_from);
    let applier = DeltaApplier::new(&ctx.state_dir, &ctx.target_root, &ctx.patch_cmd);
    applier.apply_all(&mut state)?;

    acquirer.download_remaining(&state)?;

    advance(&mut phase, UpdatePhase::Verifying);
    verify_staged(&ctx.state_dir, &state)?;

    advance(&mut phase, UpdatePhase::Committing);
    let committer = Committer::new(&ctx.state_dir, &ctx.target_root);
    committer.stage_files(&state)?;
    // Critical section: no failure below this line aborts the run.
    committer.rename_to_final(&state);

    advance(&mut phase, UpdatePhase::Done);
    let changed = state.to_by_path.values().filter(|f| f.is_present()).count();
    let deleted = state.to_by_path.len() - changed;
    Ok(UpdateOutcome {
        from: v_from,
        to: v_to,
        bundles: planned.len(),
        changed,
        deleted,
        committed: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display_names() {
        let phases = [
            (UpdatePhase::Idle, "idle"),
            (UpdatePhase::Probing, "probing"),
            (UpdatePhase::Planning, "planning"),
            (UpdatePhase::Acquiring, "acquiring"),
            (UpdatePhase::Verifying, "verifying"),
            (UpdatePhase::Committing, "committing"),
            (UpdatePhase::Done, "done"),
        ];
        for (phase, name) in phases {
            assert_eq!(phase.to_string(), name);
        }
    }

    #[test]
    fn test_context_defaults() {
        let ctx = UpdateContext::new(DEFAULT_SERVER_ROOT, "/var/lib/rswupd");
        assert_eq!(ctx.target_root, PathBuf::from("/"));
        assert_eq!(ctx.patch_cmd, "bspatch");
        assert_eq!(ctx.bundles_dir, PathBuf::from("/usr/share/clear/bundles"));
        assert_eq!(ctx.probe.os_release, PathBuf::from("/usr/lib/os-release"));
    }

    #[test]
    fn test_rooted_context_re_roots_config_surface() {
        let ctx = UpdateContext::new(DEFAULT_SERVER_ROOT, "/var/lib/rswupd").rooted_at("/sysroot");
        assert_eq!(ctx.target_root, PathBuf::from("/sysroot"));
        assert_eq!(
            ctx.probe.os_release,
            PathBuf::from("/sysroot/usr/lib/os-release")
        );
        assert_eq!(
            ctx.bundles_dir,
            PathBuf::from("/sysroot/usr/share/clear/bundles")
        );
    }
}
