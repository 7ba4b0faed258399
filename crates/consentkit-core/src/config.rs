//! Site configuration and engine options.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::integrations::IntegrationsConfig;
use crate::logging::LogsMode;
use crate::{Error, Result};

pub const DEFAULT_STATUS_BASE_URL: &str = "https://clickiocdn.com";
pub const DEFAULT_CONSENT_APP_URL: &str = "https://clickiocmp.com/t/static/consent_app.html";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Per-site configuration supplied by the host at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkConfig {
    /// Site identifier issued by the consent platform.
    #[serde(rename = "siteId")]
    pub site_id: String,
    /// Optional UI language for the consent dialog.
    #[serde(default, rename = "appLanguage", skip_serializing_if = "Option::is_none")]
    pub app_language: Option<String>,
}

impl SdkConfig {
    pub fn new(site_id: impl Into<String>) -> Self {
        Self {
            site_id: site_id.into(),
            app_language: None,
        }
    }

    pub fn with_language(mut self, lang: impl Into<String>) -> Self {
        self.app_language = Some(lang.into());
        self
    }

    /// Reject configurations the status endpoint cannot answer.
    pub fn validate(&self) -> Result<()> {
        if self.site_id.trim().is_empty() {
            return Err(Error::Config("site id must not be empty".into()));
        }
        Ok(())
    }
}

/// Engine behavior knobs (persisted as JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Origin serving `/sdk/consent-status`.
    #[serde(default = "default_status_base_url")]
    pub status_base_url: String,
    /// Page loaded by the consent dialog.
    #[serde(default = "default_consent_app_url")]
    pub consent_app_url: String,
    #[serde(default = "default_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_timeout")]
    pub read_timeout_secs: u64,
    /// Force flag assumed when a `gdpr` response omits `force`.
    #[serde(default)]
    pub gdpr_force_default: bool,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    #[serde(default)]
    pub logs_mode: LogsMode,
    /// Path to options file (not serialized).
    #[serde(skip)]
    pub config_path: PathBuf,
}

fn default_status_base_url() -> String {
    DEFAULT_STATUS_BASE_URL.into()
}
fn default_consent_app_url() -> String {
    DEFAULT_CONSENT_APP_URL.into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            status_base_url: DEFAULT_STATUS_BASE_URL.into(),
            consent_app_url: DEFAULT_CONSENT_APP_URL.into(),
            connect_timeout_secs: DEFAULT_TIMEOUT_SECS,
            read_timeout_secs: DEFAULT_TIMEOUT_SECS,
            gdpr_force_default: false,
            integrations: IntegrationsConfig::default(),
            logs_mode: LogsMode::default(),
            config_path: PathBuf::new(),
        }
    }
}

impl EngineOptions {
    /// Load options from file, falling back to defaults, then env overrides.
    pub fn load(config_path: &Path) -> Self {
        let mut options: EngineOptions = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        options.config_path = config_path.to_path_buf();
        options.apply_env();
        options
    }

    /// Env vars win over the file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("CONSENTKIT_STATUS_URL") {
            if !url.trim().is_empty() {
                self.status_base_url = url;
            }
        }
        if let Some(integrations) = IntegrationsConfig::from_env() {
            self.integrations = integrations;
        }
    }

    /// Save options to disk.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved engine options to {}", self.config_path.display());
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}
