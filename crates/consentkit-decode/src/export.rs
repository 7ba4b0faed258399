//! Reads stored consent signals and exposes them decoded.
//!
//! Nothing is cached: the consent dialog may rewrite the store at any time,
//! so every getter goes back to the store.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use consentkit_core::GoogleConsentStatus;
use consentkit_store::{keys, PreferenceStore};

use crate::decoders::{
    decode_additional_consent, decode_binary_indices, decode_google_consent, decode_id_list,
    GoogleConsentFlags,
};

/// Decoded view over a preference store.
#[derive(Clone)]
pub struct ConsentExport {
    store: Arc<dyn PreferenceStore>,
}

impl ConsentExport {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    fn raw(&self, key: &str) -> Option<String> {
        self.store.get_string(key)
    }

    /// Consent Mode flags may be stored with any type; only the text matters.
    fn flag(&self, key: &str) -> Option<String> {
        self.store.get(key).map(|value| value.to_string())
    }

    /// IAB TCF v2.2 string, if stored.
    pub fn tc_string(&self) -> Option<String> {
        self.raw(keys::TC_STRING)
    }

    /// Google additional consent string, if stored.
    pub fn ac_string(&self) -> Option<String> {
        self.raw(keys::ADDITIONAL_CONSENT)
    }

    /// Global Privacy Platform string, if stored.
    pub fn gpp_string(&self) -> Option<String> {
        self.raw(keys::GPP_STRING)
    }

    /// Google Consent Mode v2 flags; `None` when the host has no integration.
    pub fn google_consent_mode(&self) -> Option<GoogleConsentStatus> {
        let ad_storage = self.flag(keys::GOOGLE_AD_STORAGE);
        let analytics_storage = self.flag(keys::GOOGLE_ANALYTICS_STORAGE);
        let ad_user_data = self.flag(keys::GOOGLE_AD_USER_DATA);
        let ad_personalization = self.flag(keys::GOOGLE_AD_PERSONALIZATION);

        let status = decode_google_consent(GoogleConsentFlags {
            ad_storage: ad_storage.as_deref(),
            analytics_storage: analytics_storage.as_deref(),
            ad_user_data: ad_user_data.as_deref(),
            ad_personalization: ad_personalization.as_deref(),
        });
        debug!("Google Consent Mode flags: {:?}", status);
        status
    }

    pub fn consented_tcf_vendors(&self) -> Option<Vec<u32>> {
        decode_binary_indices(self.raw(keys::VENDOR_CONSENTS).as_deref())
    }

    pub fn consented_tcf_li_vendors(&self) -> Option<Vec<u32>> {
        decode_binary_indices(self.raw(keys::VENDOR_LEGITIMATE_INTERESTS).as_deref())
    }

    pub fn consented_tcf_purposes(&self) -> Option<Vec<u32>> {
        decode_binary_indices(self.raw(keys::PURPOSE_CONSENTS).as_deref())
    }

    pub fn consented_tcf_li_purposes(&self) -> Option<Vec<u32>> {
        decode_binary_indices(self.raw(keys::PURPOSE_LEGITIMATE_INTERESTS).as_deref())
    }

    /// Google ATP vendors from the additional-consent string.
    pub fn consented_google_vendors(&self) -> Option<Vec<u32>> {
        decode_additional_consent(self.raw(keys::ADDITIONAL_CONSENT).as_deref())
    }

    /// Non-TCF vendors with consent.
    pub fn consented_other_vendors(&self) -> Option<Vec<u32>> {
        decode_id_list(self.raw(keys::OTHER_VENDORS_CONSENT).as_deref())
    }

    /// Non-TCF vendors under legitimate interest.
    pub fn consented_other_li_vendors(&self) -> Option<Vec<u32>> {
        decode_id_list(self.raw(keys::OTHER_VENDORS_LEGITIMATE_INTEREST).as_deref())
    }

    /// Non-TCF purposes with consent.
    pub fn consented_non_tcf_purposes(&self) -> Option<Vec<u32>> {
        decode_id_list(self.raw(keys::OTHER_PURPOSES_CONSENT).as_deref())
    }

    /// Everything at once, read in one pass.
    pub fn snapshot(&self) -> ExportSnapshot {
        ExportSnapshot {
            tc_string: self.tc_string(),
            ac_string: self.ac_string(),
            gpp_string: self.gpp_string(),
            google_consent_mode: self.google_consent_mode(),
            tcf_vendors: self.consented_tcf_vendors(),
            tcf_li_vendors: self.consented_tcf_li_vendors(),
            tcf_purposes: self.consented_tcf_purposes(),
            tcf_li_purposes: self.consented_tcf_li_purposes(),
            google_vendors: self.consented_google_vendors(),
            other_vendors: self.consented_other_vendors(),
            other_li_vendors: self.consented_other_li_vendors(),
            non_tcf_purposes: self.consented_non_tcf_purposes(),
        }
    }
}

/// All decoded consent signals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSnapshot {
    pub tc_string: Option<String>,
    pub ac_string: Option<String>,
    pub gpp_string: Option<String>,
    pub google_consent_mode: Option<GoogleConsentStatus>,
    pub tcf_vendors: Option<Vec<u32>>,
    pub tcf_li_vendors: Option<Vec<u32>>,
    pub tcf_purposes: Option<Vec<u32>>,
    pub tcf_li_purposes: Option<Vec<u32>>,
    pub google_vendors: Option<Vec<u32>>,
    pub other_vendors: Option<Vec<u32>>,
    pub other_li_vendors: Option<Vec<u32>>,
    pub non_tcf_purposes: Option<Vec<u32>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use consentkit_store::{Edit, MemoryStore, PrefValue};

    fn export_with(pairs: &[(&str, &str)]) -> (ConsentExport, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_strings(pairs.iter().copied()));
        (ConsentExport::new(store.clone()), store)
    }

    #[test]
    fn test_empty_store_is_unknown() {
        let (export, _) = export_with(&[]);
        assert_eq!(export.snapshot(), ExportSnapshot::default());
    }

    #[test]
    fn test_tcf_lists() {
        let (export, _) = export_with(&[
            (keys::PURPOSE_CONSENTS, "101"),
            (keys::PURPOSE_LEGITIMATE_INTERESTS, "0100"),
            (keys::VENDOR_CONSENTS, "0001"),
            (keys::VENDOR_LEGITIMATE_INTERESTS, ""),
        ]);
        assert_eq!(export.consented_tcf_purposes(), Some(vec![1, 3]));
        assert_eq!(export.consented_tcf_li_purposes(), Some(vec![2]));
        assert_eq!(export.consented_tcf_vendors(), Some(vec![4]));
        assert_eq!(export.consented_tcf_li_vendors(), None);
    }

    #[test]
    fn test_other_lists_and_ac() {
        let (export, _) = export_with(&[
            (keys::ADDITIONAL_CONSENT, "2~89.2577~dv."),
            (keys::OTHER_VENDORS_CONSENT, "5,7"),
            (keys::OTHER_VENDORS_LEGITIMATE_INTEREST, "[8]"),
            (keys::OTHER_PURPOSES_CONSENT, "nope"),
        ]);
        assert_eq!(export.ac_string().as_deref(), Some("2~89.2577~dv."));
        assert_eq!(export.consented_google_vendors(), Some(vec![89, 2577]));
        assert_eq!(export.consented_other_vendors(), Some(vec![5, 7]));
        assert_eq!(export.consented_other_li_vendors(), Some(vec![8]));
        assert_eq!(export.consented_non_tcf_purposes(), Some(vec![]));
    }

    #[test]
    fn test_reads_are_not_cached() {
        let (export, store) = export_with(&[(keys::PURPOSE_CONSENTS, "1")]);
        assert_eq!(export.consented_tcf_purposes(), Some(vec![1]));

        store.put_string(keys::PURPOSE_CONSENTS, "011").unwrap();
        assert_eq!(export.consented_tcf_purposes(), Some(vec![2, 3]));
    }

    #[test]
    fn test_google_consent_mode_from_store() {
        let (export, store) = export_with(&[]);
        assert!(export.google_consent_mode().is_none());

        store
            .apply(vec![
                Edit::put(keys::GOOGLE_AD_STORAGE, "granted"),
                Edit::put(keys::GOOGLE_AD_USER_DATA, "denied"),
                Edit::Put(keys::GOOGLE_AD_PERSONALIZATION.into(), PrefValue::Bool(true)),
            ])
            .unwrap();

        let gcm = export.google_consent_mode().unwrap();
        assert_eq!(gcm.ad_storage_granted, Some(true));
        assert_eq!(gcm.ad_user_data_granted, Some(false));
        assert_eq!(gcm.ad_personalization_granted, Some(false));
        assert_eq!(gcm.analytics_storage_granted, None);
    }

    #[test]
    fn test_typed_google_flags_still_enable_consent_mode() {
        let (export, store) = export_with(&[]);
        store
            .apply(vec![
                Edit::Put(keys::GOOGLE_AD_STORAGE.into(), PrefValue::Bool(true)),
                Edit::Put(keys::GOOGLE_ANALYTICS_STORAGE.into(), PrefValue::Int(1)),
                Edit::Put(keys::GOOGLE_AD_USER_DATA.into(), PrefValue::Bool(false)),
                Edit::Put(keys::GOOGLE_AD_PERSONALIZATION.into(), PrefValue::Float(0.0)),
            ])
            .unwrap();

        let gcm = export.google_consent_mode().unwrap();
        assert_eq!(gcm.ad_storage_granted, Some(false));
        assert_eq!(gcm.analytics_storage_granted, Some(false));
        assert_eq!(gcm.ad_user_data_granted, Some(false));
        assert_eq!(gcm.ad_personalization_granted, Some(false));
    }

    #[test]
    fn test_empty_other_list_is_explicit_denial() {
        let (export, _) = export_with(&[(keys::OTHER_VENDORS_CONSENT, "[]")]);
        assert_eq!(export.consented_other_vendors(), Some(vec![]));
        assert_eq!(export.consented_other_li_vendors(), None);
    }
}
