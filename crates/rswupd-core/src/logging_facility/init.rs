//! Logging initialization
//!
//! One entry point, safe to call from both the CLI and library
//! consumers: the first call wins and later calls are no-ops.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Output profile for the logging facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output for interactive runs
    Development,
    /// JSON lines for services and log shippers
    Production,
    /// No subscriber output; tests install their own when they need one
    Test,
}

impl Profile {
    /// The profile's event filter. `RUST_LOG` overrides the default.
    fn filter(self) -> EnvFilter {
        let default = match self {
            Profile::Development => "rswupd=debug",
            Profile::Production | Profile::Test => "rswupd=info",
        };
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility for the given profile.
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(profile.filter())
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(profile.filter())
                .init();
        }
        Profile::Test => {
            tracing_subscriber::registry().init();
        }
    });
}
