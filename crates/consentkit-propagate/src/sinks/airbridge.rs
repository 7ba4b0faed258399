//! Airbridge: three device aliases carrying "1"/"0".

use std::sync::Arc;

use consentkit_core::{Integration, Result};

use crate::sink::{flag_digit, ConsentSignals, ConsentSink};

/// Host binding for `Airbridge.setDeviceAlias`.
pub trait AirbridgeApi: Send + Sync {
    fn set_device_alias(&self, key: &str, value: &str) -> Result<()>;
}

pub struct AirbridgeSink {
    api: Arc<dyn AirbridgeApi>,
}

impl AirbridgeSink {
    pub fn new(api: Arc<dyn AirbridgeApi>) -> Self {
        Self { api }
    }

    pub fn payload(signals: &ConsentSignals) -> [(&'static str, &'static str); 3] {
        [
            ("eea", flag_digit(signals.in_eea)),
            ("adPersonalization", flag_digit(signals.ad_personalization())),
            ("adUserData", flag_digit(signals.ad_user_data())),
        ]
    }
}

impl ConsentSink for AirbridgeSink {
    fn integration(&self) -> Integration {
        Integration::Airbridge
    }

    fn apply(&self, signals: &ConsentSignals) -> Result<()> {
        for (key, value) in Self::payload(signals) {
            self.api.set_device_alias(key, value)?;
        }
        Ok(())
    }
}
