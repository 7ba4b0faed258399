//! AppsFlyer: manual consent data, sent as booleans only for EEA users.
//!
//! Older native AppsFlyer builds (bundled by some cross-platform wrappers)
//! reject manual consent; those fall back to TCF data collection, which reads
//! the IAB keys from storage itself.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info};

use consentkit_core::{Error, Integration, Result};

use crate::sink::{ConsentSignals, ConsentSink};

/// Mirror of `AppsFlyerConsent`. Outside the EEA every grant is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppsFlyerConsent {
    pub is_user_subject_to_gdpr: bool,
    pub has_consent_for_data_usage: Option<bool>,
    pub has_consent_for_ads_personalization: Option<bool>,
    pub has_consent_for_ad_storage: Option<bool>,
}

/// Host binding for the AppsFlyer consent calls.
pub trait AppsFlyerApi: Send + Sync {
    fn set_consent_data(&self, consent: &AppsFlyerConsent) -> Result<()>;
    fn enable_tcf_data_collection(&self, enabled: bool) -> Result<()>;
}

pub struct AppsFlyerSink {
    api: Arc<dyn AppsFlyerApi>,
}

impl AppsFlyerSink {
    pub fn new(api: Arc<dyn AppsFlyerApi>) -> Self {
        Self { api }
    }

    pub fn payload(signals: &ConsentSignals) -> AppsFlyerConsent {
        let in_eea = signals.in_eea;
        let eea_only = |granted: bool| in_eea.then_some(granted);
        AppsFlyerConsent {
            is_user_subject_to_gdpr: in_eea,
            has_consent_for_data_usage: eea_only(signals.ad_user_data()),
            has_consent_for_ads_personalization: eea_only(signals.ad_personalization()),
            has_consent_for_ad_storage: eea_only(signals.ad_storage()),
        }
    }
}

impl ConsentSink for AppsFlyerSink {
    fn integration(&self) -> Integration {
        Integration::AppsFlyer
    }

    fn apply(&self, signals: &ConsentSignals) -> Result<()> {
        let Err(manual) = self.api.set_consent_data(&Self::payload(signals)) else {
            return Ok(());
        };
        error!("Failed manually setting consent to AppsFlyer: {}", manual);

        info!("Setting consent to AppsFlyer through TCF");
        self.api.enable_tcf_data_collection(true).map_err(|tcf| {
            Error::sink(
                Integration::AppsFlyer.name(),
                format!("manual consent: {}; TCF fallback: {}", manual, tcf),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consentkit_core::GoogleConsentStatus;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeAppsFlyer {
        manual_fails: bool,
        tcf_fails: bool,
        consents: Mutex<Vec<AppsFlyerConsent>>,
        tcf_calls: Mutex<Vec<bool>>,
    }

    impl AppsFlyerApi for FakeAppsFlyer {
        fn set_consent_data(&self, consent: &AppsFlyerConsent) -> Result<()> {
            if self.manual_fails {
                return Err(Error::sink("appsflyer", "manual mode unsupported"));
            }
            self.consents.lock().push(*consent);
            Ok(())
        }

        fn enable_tcf_data_collection(&self, enabled: bool) -> Result<()> {
            if self.tcf_fails {
                return Err(Error::sink("appsflyer", "not initialized"));
            }
            self.tcf_calls.lock().push(enabled);
            Ok(())
        }
    }

    fn granted_all() -> GoogleConsentStatus {
        GoogleConsentStatus {
            ad_storage_granted: Some(true),
            analytics_storage_granted: Some(true),
            ad_user_data_granted: Some(true),
            ad_personalization_granted: Some(false),
        }
    }

    #[test]
    fn test_eea_sends_booleans() {
        let consent = AppsFlyerSink::payload(&ConsentSignals::new(Some("gdpr"), granted_all()));
        assert!(consent.is_user_subject_to_gdpr);
        assert_eq!(consent.has_consent_for_data_usage, Some(true));
        assert_eq!(consent.has_consent_for_ads_personalization, Some(false));
        assert_eq!(consent.has_consent_for_ad_storage, Some(true));
    }

    #[test]
    fn test_outside_eea_nulls_grants() {
        let consent = AppsFlyerSink::payload(&ConsentSignals::new(Some("us"), granted_all()));
        assert!(!consent.is_user_subject_to_gdpr);
        assert_eq!(consent.has_consent_for_data_usage, None);
        assert_eq!(consent.has_consent_for_ads_personalization, None);
        assert_eq!(consent.has_consent_for_ad_storage, None);
    }

    #[test]
    fn test_manual_success_skips_fallback() {
        let api = Arc::new(FakeAppsFlyer::default());
        let sink = AppsFlyerSink::new(api.clone());
        sink.apply(&ConsentSignals::new(Some("gdpr"), granted_all())).unwrap();
        assert_eq!(api.consents.lock().len(), 1);
        assert!(api.tcf_calls.lock().is_empty());
    }

    #[test]
    fn test_fallback_to_tcf() {
        let api = Arc::new(FakeAppsFlyer {
            manual_fails: true,
            ..Default::default()
        });
        let sink = AppsFlyerSink::new(api.clone());
        sink.apply(&ConsentSignals::new(Some("gdpr"), granted_all())).unwrap();
        assert_eq!(*api.tcf_calls.lock(), vec![true]);
    }

    #[test]
    fn test_both_paths_failing() {
        let api = Arc::new(FakeAppsFlyer {
            manual_fails: true,
            tcf_fails: true,
            ..Default::default()
        });
        let err = AppsFlyerSink::new(api)
            .apply(&ConsentSignals::new(Some("gdpr"), granted_all()))
            .unwrap_err();
        assert!(err.to_string().contains("TCF fallback"));
    }
}
