//! Update command
//!
//! Usage:
//!   rswupd update
//!   rswupd update --url file:///srv/mirror --state-dir /tmp/state --path /sysroot

use clap::Args;
use rswupd_core::logging_facility::{init, Profile};
use rswupd_engine::update::{run_update, UpdateContext, DEFAULT_SERVER_ROOT};
use rswupd_store::paths::DEFAULT_STATE_DIR;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Update server root URL (https:// or file:// mirror)
    #[arg(long, default_value = DEFAULT_SERVER_ROOT)]
    pub url: String,

    /// State directory for manifests, packs, and staged content
    #[arg(long, default_value = DEFAULT_STATE_DIR)]
    pub state_dir: PathBuf,

    /// Target root the update is applied under
    #[arg(long, default_value = "/")]
    pub path: PathBuf,

    /// Emit JSON logs (production profile)
    #[arg(long)]
    pub json_logs: bool,
}

/// Execute the update command
pub fn execute(args: UpdateArgs) -> Result<(), Box<dyn std::error::Error>> {
    init(if args.json_logs {
        Profile::Production
    } else {
        Profile::Development
    });

    let ctx = UpdateContext::new(&args.url, args.state_dir).rooted_at(args.path);

    let outcome = run_update(&ctx)?;
    if outcome.committed {
        println!(
            "Updated from {} to {} ({} bundles, {} files changed, {} removed)",
            outcome.from, outcome.to, outcome.bundles, outcome.changed, outcome.deleted
        );
    } else {
        println!("Already up to date at version {}", outcome.from);
    }
    Ok(())
}
