//! Adjust: third-party sharing with `google_dma` granular options.

use std::sync::Arc;

use serde::Serialize;

use consentkit_core::{Integration, Result};

use crate::sink::{flag_digit, ConsentSignals, ConsentSink};

pub const GOOGLE_DMA_PARTNER: &str = "google_dma";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GranularOption {
    pub partner: String,
    pub key: String,
    pub value: String,
}

/// Mirror of `AdjustThirdPartySharing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustThirdPartySharing {
    pub is_enabled: bool,
    pub granular_options: Vec<GranularOption>,
}

impl AdjustThirdPartySharing {
    pub fn new(is_enabled: bool) -> Self {
        Self {
            is_enabled,
            granular_options: Vec::new(),
        }
    }

    pub fn add_granular_option(&mut self, partner: &str, key: &str, value: &str) {
        self.granular_options.push(GranularOption {
            partner: partner.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    pub fn option(&self, partner: &str, key: &str) -> Option<&str> {
        self.granular_options
            .iter()
            .find(|o| o.partner == partner && o.key == key)
            .map(|o| o.value.as_str())
    }
}

/// Host binding for `Adjust.trackThirdPartySharing`.
pub trait AdjustApi: Send + Sync {
    fn track_third_party_sharing(&self, sharing: &AdjustThirdPartySharing) -> Result<()>;
}

pub struct AdjustSink {
    api: Arc<dyn AdjustApi>,
}

impl AdjustSink {
    pub fn new(api: Arc<dyn AdjustApi>) -> Self {
        Self { api }
    }

    pub fn payload(signals: &ConsentSignals) -> AdjustThirdPartySharing {
        let mut sharing = AdjustThirdPartySharing::new(true);
        sharing.add_granular_option(GOOGLE_DMA_PARTNER, "eea", flag_digit(signals.in_eea));
        sharing.add_granular_option(
            GOOGLE_DMA_PARTNER,
            "ad_personalization",
            flag_digit(signals.ad_personalization()),
        );
        sharing.add_granular_option(
            GOOGLE_DMA_PARTNER,
            "ad_user_data",
            flag_digit(signals.ad_user_data()),
        );
        sharing
    }
}

impl ConsentSink for AdjustSink {
    fn integration(&self) -> Integration {
        Integration::Adjust
    }

    fn apply(&self, signals: &ConsentSignals) -> Result<()> {
        self.api.track_third_party_sharing(&Self::payload(signals))
    }
}
