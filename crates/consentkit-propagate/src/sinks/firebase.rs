//! Firebase Analytics: the four Consent Mode types, granted or denied.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use consentkit_core::{Integration, Result};

use crate::sink::{ConsentSignals, ConsentSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirebaseConsentType {
    AdStorage,
    AnalyticsStorage,
    AdUserData,
    AdPersonalization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FirebaseConsentStatus {
    Granted,
    Denied,
}

impl From<bool> for FirebaseConsentStatus {
    fn from(granted: bool) -> Self {
        if granted {
            Self::Granted
        } else {
            Self::Denied
        }
    }
}

/// Host binding for `FirebaseAnalytics.setConsent`.
pub trait FirebaseAnalyticsApi: Send + Sync {
    fn set_consent(&self, consent: &BTreeMap<FirebaseConsentType, FirebaseConsentStatus>) -> Result<()>;
}

pub struct FirebaseSink {
    api: Arc<dyn FirebaseAnalyticsApi>,
}

impl FirebaseSink {
    pub fn new(api: Arc<dyn FirebaseAnalyticsApi>) -> Self {
        Self { api }
    }

    pub fn payload(signals: &ConsentSignals) -> BTreeMap<FirebaseConsentType, FirebaseConsentStatus> {
        BTreeMap::from([
            (FirebaseConsentType::AdStorage, FirebaseConsentStatus::from(signals.ad_storage())),
            (FirebaseConsentType::AnalyticsStorage, FirebaseConsentStatus::from(signals.analytics_storage())),
            (FirebaseConsentType::AdUserData, FirebaseConsentStatus::from(signals.ad_user_data())),
            (FirebaseConsentType::AdPersonalization, FirebaseConsentStatus::from(signals.ad_personalization())),
        ])
    }
}

impl ConsentSink for FirebaseSink {
    fn integration(&self) -> Integration {
        Integration::Firebase
    }

    fn apply(&self, signals: &ConsentSignals) -> Result<()> {
        self.api.set_consent(&Self::payload(signals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consentkit_core::GoogleConsentStatus;

    #[test]
    fn test_payload_maps_every_type() {
        let signals = ConsentSignals::new(
            Some("us"),
            GoogleConsentStatus {
                ad_storage_granted: Some(true),
                analytics_storage_granted: None,
                ad_user_data_granted: Some(false),
                ad_personalization_granted: Some(true),
            },
        );
        let payload = FirebaseSink::payload(&signals);
        assert_eq!(payload.len(), 4);
        assert_eq!(payload[&FirebaseConsentType::AdStorage], FirebaseConsentStatus::Granted);
        assert_eq!(payload[&FirebaseConsentType::AnalyticsStorage], FirebaseConsentStatus::Denied);
        assert_eq!(payload[&FirebaseConsentType::AdUserData], FirebaseConsentStatus::Denied);
        assert_eq!(payload[&FirebaseConsentType::AdPersonalization], FirebaseConsentStatus::Granted);
    }
}
