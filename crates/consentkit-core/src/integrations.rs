//! Downstream measurement integrations enabled by the host app.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A measurement SDK that can receive derived consent flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Integration {
    /// Firebase Analytics (Google Consent Mode types).
    Firebase,
    /// Airbridge device aliases.
    Airbridge,
    /// Adjust third-party sharing (`google_dma` granular options).
    Adjust,
    /// AppsFlyer manual consent data, TCF collection as fallback.
    #[serde(rename = "appsflyer")]
    AppsFlyer,
}

impl Integration {
    /// Propagation order.
    pub fn all() -> &'static [Integration] {
        &[Self::Firebase, Self::Airbridge, Self::Adjust, Self::AppsFlyer]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Firebase => "firebase",
            Self::Airbridge => "airbridge",
            Self::Adjust => "adjust",
            Self::AppsFlyer => "appsflyer",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "firebase" | "firebase_analytics" => Some(Self::Firebase),
            "airbridge" => Some(Self::Airbridge),
            "adjust" => Some(Self::Adjust),
            "appsflyer" => Some(Self::AppsFlyer),
            _ => None,
        }
    }
}

impl std::fmt::Display for Integration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Which integrations are linked into the host app.
///
/// Decided at composition time; a sink whose integration is missing here is
/// skipped silently during propagation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default)]
    pub enabled: BTreeSet<Integration>,
}

impl IntegrationsConfig {
    pub fn all() -> Self {
        Self::from_iter(Integration::all().iter().copied())
    }

    /// Parse a comma-separated list such as `"firebase,adjust"`.
    /// Unknown names are logged and ignored.
    pub fn from_names(names: &str) -> Self {
        let mut enabled = BTreeSet::new();
        for name in names.split(',').filter(|n| !n.trim().is_empty()) {
            match Integration::parse(name) {
                Some(integration) => {
                    enabled.insert(integration);
                }
                None => warn!("Ignoring unknown integration: {}", name.trim()),
            }
        }
        Self { enabled }
    }

    /// Read `CONSENTKIT_INTEGRATIONS`, if set.
    pub fn from_env() -> Option<Self> {
        std::env::var("CONSENTKIT_INTEGRATIONS")
            .ok()
            .map(|names| Self::from_names(&names))
    }

    pub fn is_enabled(&self, integration: Integration) -> bool {
        self.enabled.contains(&integration)
    }
}

impl FromIterator<Integration> for IntegrationsConfig {
    fn from_iter<I: IntoIterator<Item = Integration>>(iter: I) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}
