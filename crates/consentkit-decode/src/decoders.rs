//! Pure decoders over raw stored strings.

use consentkit_core::GoogleConsentStatus;

/// Literal marking a granted Google Consent Mode flag.
pub const GRANTED: &str = "granted";

/// 1-based positions holding `'1'` in a TCF bit string, ascending.
///
/// Empty or absent input yields `None`. Characters other than `'1'` count as
/// not granted.
pub fn decode_binary_indices(bits: Option<&str>) -> Option<Vec<u32>> {
    let bits = bits.filter(|b| !b.is_empty())?;
    Some(
        bits.chars()
            .zip(1u32..)
            .filter(|(c, _)| *c == '1')
            .map(|(_, index)| index)
            .collect(),
    )
}

/// Vendor ids from an additional-consent string `<version>~<id.id.id>`.
///
/// Only the second `~` segment is read; trailing segments (disclosed vendors
/// in AC v2) are ignored. Non-numeric ids are dropped.
pub fn decode_additional_consent(ac: Option<&str>) -> Option<Vec<u32>> {
    let ids = ac?.split('~').nth(1)?;
    Some(
        ids.split('.')
            .filter_map(|token| token.trim().parse().ok())
            .collect(),
    )
}

/// Integers from a comma-separated list such as `"12,45,3"`.
///
/// The JSON array form `"[12,45,3]"` is tolerated, and `"[]"` decodes to an
/// empty list. Non-numeric tokens are dropped; blank or absent input yields
/// `None`.
pub fn decode_id_list(list: Option<&str>) -> Option<Vec<u32>> {
    let trimmed = list?.trim();
    let bracketed = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']'));
    let inner = bracketed.unwrap_or(trimmed).trim();
    if inner.is_empty() {
        // `[]` is an explicit empty list; a blank value is no data.
        return bracketed.map(|_| Vec::new());
    }
    Some(
        inner
            .split(',')
            .filter_map(|token| token.trim().trim_matches('"').parse().ok())
            .collect(),
    )
}

/// Raw Google Consent Mode flag strings as read from the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleConsentFlags<'a> {
    pub ad_storage: Option<&'a str>,
    pub analytics_storage: Option<&'a str>,
    pub ad_user_data: Option<&'a str>,
    pub ad_personalization: Option<&'a str>,
}

impl GoogleConsentFlags<'_> {
    fn is_empty(&self) -> bool {
        self.ad_storage.is_none()
            && self.analytics_storage.is_none()
            && self.ad_user_data.is_none()
            && self.ad_personalization.is_none()
    }
}

/// Decode Google Consent Mode v2 flags.
///
/// `None` when no flag is stored at all. Otherwise every stored flag is
/// `true` only for the exact literal `"granted"`.
pub fn decode_google_consent(flags: GoogleConsentFlags<'_>) -> Option<GoogleConsentStatus> {
    if flags.is_empty() {
        return None;
    }
    let granted = |flag: Option<&str>| flag.map(|value| value == GRANTED);
    Some(GoogleConsentStatus {
        ad_storage_granted: granted(flags.ad_storage),
        analytics_storage_granted: granted(flags.analytics_storage),
        ad_user_data_granted: granted(flags.ad_user_data),
        ad_personalization_granted: granted(flags.ad_personalization),
    })
}
