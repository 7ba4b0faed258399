//! Consent status model shared by the client, engine, and dispatcher.

use serde::{Deserialize, Serialize};

/// Wire value for the GDPR regime.
pub const SCOPE_GDPR: &str = "gdpr";
/// Wire value for US state privacy laws.
pub const SCOPE_US: &str = "us";
/// Canonical wire value for users outside any regime.
pub const SCOPE_OUT_OF_SCOPE: &str = "out of scope";
/// Older servers spelled "out of scope" with underscores.
pub const SCOPE_OUT_OF_SCOPE_LEGACY: &str = "out_of_scope";

/// Privacy regime applying to the current user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scope {
    #[serde(rename = "gdpr")]
    Gdpr,
    #[serde(rename = "us")]
    Us,
    #[serde(rename = "out of scope", alias = "out_of_scope")]
    OutOfScope,
}

impl Scope {
    /// Parse a wire scope. Unrecognized values yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            SCOPE_GDPR => Some(Self::Gdpr),
            SCOPE_US => Some(Self::Us),
            SCOPE_OUT_OF_SCOPE | SCOPE_OUT_OF_SCOPE_LEGACY => Some(Self::OutOfScope),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gdpr => SCOPE_GDPR,
            Self::Us => SCOPE_US,
            Self::OutOfScope => SCOPE_OUT_OF_SCOPE,
        }
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize a scope received from the server.
///
/// Empty strings mean "no scope" and the legacy underscore spelling is
/// rewritten to [`SCOPE_OUT_OF_SCOPE`]. Other values pass through untouched so
/// that unknown regimes still surface through `check_consent_scope`.
pub fn normalize_scope(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed == SCOPE_OUT_OF_SCOPE_LEGACY {
        return Some(SCOPE_OUT_OF_SCOPE.to_string());
    }
    Some(trimmed.to_string())
}

/// Result of a consent-status round trip.
///
/// An error-only status never carries a scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsentStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConsentStatus {
    /// Status for a successful response.
    pub fn scoped(scope: Option<String>, force: bool) -> Self {
        Self {
            scope,
            force: Some(force),
            error: None,
        }
    }

    /// Status for a failed fetch.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            scope: None,
            force: None,
            error: Some(error.into()),
        }
    }

    /// Typed scope, if the wire value is recognized.
    pub fn scope_kind(&self) -> Option<Scope> {
        self.scope.as_deref().and_then(Scope::parse)
    }

    pub fn is_gdpr(&self) -> bool {
        self.scope_kind() == Some(Scope::Gdpr)
    }

    /// Copy with the force flag cleared, as after a confirmed decision.
    pub fn with_decision(&self) -> Self {
        Self {
            force: Some(false),
            ..self.clone()
        }
    }

    /// Diagnostic used whenever the scope is missing.
    pub fn missing_scope_reason(status: Option<&Self>) -> String {
        format!(
            "Consent status is not loaded, possible reason: {}",
            status
                .and_then(|s| s.error.as_deref())
                .unwrap_or("null")
        )
    }
}

/// Public consent state derived from [`ConsentStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentState {
    NotApplicable,
    GdprNoDecision,
    GdprDecisionObtained,
    Us,
    Unknown,
}

impl ConsentState {
    /// Derive the state. Rules are checked in priority order.
    pub fn derive(status: Option<&ConsentStatus>) -> Self {
        let Some(status) = status else {
            return Self::Unknown;
        };
        match (status.scope_kind(), status.force) {
            (Some(Scope::OutOfScope), _) => Self::NotApplicable,
            (Some(Scope::Gdpr), Some(true)) => Self::GdprNoDecision,
            (Some(Scope::Gdpr), Some(false)) => Self::GdprDecisionObtained,
            (Some(Scope::Us), _) => Self::Us,
            _ => Self::Unknown,
        }
    }
}

impl std::fmt::Display for ConsentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotApplicable => write!(f, "NOT_APPLICABLE"),
            Self::GdprNoDecision => write!(f, "GDPR_NO_DECISION"),
            Self::GdprDecisionObtained => write!(f, "GDPR_DECISION_OBTAINED"),
            Self::Us => write!(f, "US"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// How the host asks for the consent dialog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialogMode {
    /// Open only while a GDPR decision is still outstanding.
    #[default]
    Default,
    /// Reopen for any user inside a regime (GDPR or US).
    Resurface,
}

impl DialogMode {
    /// Whether this mode opens the dialog for `status`. Readiness is the
    /// caller's concern.
    pub fn permits(&self, status: &ConsentStatus) -> bool {
        let Some(scope) = status.scope.as_deref() else {
            return false;
        };
        match self {
            Self::Default => status.is_gdpr() && status.force == Some(true),
            Self::Resurface => Scope::parse(scope) != Some(Scope::OutOfScope),
        }
    }
}

/// Google Consent Mode v2 flags. `None` per field means the flag was not stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleConsentStatus {
    pub ad_storage_granted: Option<bool>,
    pub analytics_storage_granted: Option<bool>,
    pub ad_user_data_granted: Option<bool>,
    pub ad_personalization_granted: Option<bool>,
}
