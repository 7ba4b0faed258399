//! Log verbosity switch exposed to host apps.
//!
//! The crates only emit `tracing` events; the host installs the subscriber.
//! `LogsMode` turns into an `EnvFilter` directive for that subscriber.

use serde::{Deserialize, Serialize};

/// Verbosity of consentkit's own events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogsMode {
    /// Nothing from consentkit crates is emitted.
    #[default]
    Disabled,
    /// Everything down to `debug`, including fetched URLs and decoded flags.
    Verbose,
}

impl LogsMode {
    /// Filter directive scoped to the consentkit targets.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Disabled => "consentkit=off",
            Self::Verbose => "consentkit=debug",
        }
    }
}
