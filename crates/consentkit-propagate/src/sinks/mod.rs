//! Vendor sinks. Each wraps a host-supplied binding to the native SDK.

pub mod adjust;
pub mod airbridge;
pub mod appsflyer;
pub mod firebase;

pub use adjust::{AdjustApi, AdjustSink, AdjustThirdPartySharing, GranularOption};
pub use airbridge::{AirbridgeApi, AirbridgeSink};
pub use appsflyer::{AppsFlyerApi, AppsFlyerConsent, AppsFlyerSink};
pub use firebase::{FirebaseAnalyticsApi, FirebaseConsentStatus, FirebaseConsentType, FirebaseSink};
