//! Global subscriber setup

use serde::Deserialize;
use std::sync::Once;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Output profile, selected by the `[logging]` settings section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Human-readable lines, twinbase crates at debug
    #[default]
    Development,
    /// One JSON object per event, twinbase crates at info
    Production,
    /// No output; tests install the capture layer themselves
    Test,
}

impl Profile {
    /// Filter used when `RUST_LOG` is unset
    ///
    /// Targets match by prefix, so `twinbase` covers every `twinbase_*`
    /// crate.
    pub fn default_directive(&self) -> &'static str {
        match self {
            Profile::Development => "twinbase=debug",
            Profile::Production => "twinbase=info",
            Profile::Test => "off",
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

static INIT: Once = Once::new();

/// Install the process-wide subscriber for `profile`
///
/// Only the first call has any effect. A subscriber installed by someone
/// else beforehand is left in place.
///
/// ```
/// use twinbase_core::logging_facility::{init, Profile};
///
/// init(Profile::Production);
/// ```
pub fn init(profile: Profile) {
    INIT.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_env_filter(profile.filter())
                .try_init()
                .is_ok(),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_env_filter(profile.filter())
                .try_init()
                .is_ok(),
            Profile::Test => tracing_subscriber::registry().try_init().is_ok(),
        };
        if installed {
            tracing::debug!(?profile, "logging initialised");
        }
    });
}
