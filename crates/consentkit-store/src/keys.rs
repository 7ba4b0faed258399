//! Preference keys read and written by the consent dialog.

pub const TC_STRING: &str = "IABTCF_TCString";
pub const ADDITIONAL_CONSENT: &str = "IABTCF_AddtlConsent";
pub const GPP_STRING: &str = "IABGPP_HDR_GppString";

pub const VENDOR_CONSENTS: &str = "IABTCF_VendorConsents";
pub const VENDOR_LEGITIMATE_INTERESTS: &str = "IABTCF_VendorLegitimateInterests";
pub const PURPOSE_CONSENTS: &str = "IABTCF_PurposeConsents";
pub const PURPOSE_LEGITIMATE_INTERESTS: &str = "IABTCF_PurposeLegitimateInterests";

/// Google Consent Mode flags.
pub const GOOGLE_AD_STORAGE: &str = "CLICKIO_CONSENT_GOOGLE_ANALYTICS_adStorage";
pub const GOOGLE_ANALYTICS_STORAGE: &str = "CLICKIO_CONSENT_GOOGLE_ANALYTICS_analyticsStorage";
pub const GOOGLE_AD_USER_DATA: &str = "CLICKIO_CONSENT_GOOGLE_ANALYTICS_adUserData";
pub const GOOGLE_AD_PERSONALIZATION: &str = "CLICKIO_CONSENT_GOOGLE_ANALYTICS_adPersonalization";

pub const OTHER_VENDORS_CONSENT: &str = "CLICKIO_CONSENT_other_vendors_consent";
pub const OTHER_VENDORS_LEGITIMATE_INTEREST: &str = "CLICKIO_CONSENT_other_vendors_leg_int";
pub const OTHER_PURPOSES_CONSENT: &str = "CLICKIO_CONSENT_other_purposes_consent";

/// Version token written after each successful status check.
pub const SERVER_REQUEST_VERSION: &str = "CLICKIO_CONSENT_server_request";
