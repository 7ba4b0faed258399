//! Sink trait and the signals every sink receives.
//!
//! The `ConsentSink` trait abstracts over downstream measurement SDKs.
//! Implementations:
//! - `FirebaseSink`: Consent Mode types as granted/denied
//! - `AdjustSink`: `google_dma` granular options as `"1"`/`"0"`
//! - `AirbridgeSink`: device aliases as `"1"`/`"0"`
//! - `AppsFlyerSink`: booleans, sent only for EEA users

use serde::Serialize;

use consentkit_core::{GoogleConsentStatus, Integration, Result, SCOPE_GDPR};

/// Consent flags derived from the scope and Google Consent Mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentSignals {
    /// User falls under GDPR (EEA, UK, CH).
    pub in_eea: bool,
    pub google: GoogleConsentStatus,
}

impl ConsentSignals {
    pub fn new(scope: Option<&str>, google: GoogleConsentStatus) -> Self {
        Self {
            in_eea: scope == Some(SCOPE_GDPR),
            google,
        }
    }

    pub fn ad_storage(&self) -> bool {
        self.google.ad_storage_granted == Some(true)
    }

    pub fn analytics_storage(&self) -> bool {
        self.google.analytics_storage_granted == Some(true)
    }

    pub fn ad_user_data(&self) -> bool {
        self.google.ad_user_data_granted == Some(true)
    }

    pub fn ad_personalization(&self) -> bool {
        self.google.ad_personalization_granted == Some(true)
    }
}

/// "1"/"0" encoding shared by string-typed SDK options.
pub fn flag_digit(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// A downstream SDK receiving consent flags.
pub trait ConsentSink: Send + Sync {
    /// Which integration this sink drives.
    fn integration(&self) -> Integration;

    /// Re-encode `signals` into the SDK's format and hand them over.
    fn apply(&self, signals: &ConsentSignals) -> Result<()>;
}
