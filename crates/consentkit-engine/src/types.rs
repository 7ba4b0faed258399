//! Engine lifecycle types.

use serde::Serialize;

use consentkit_core::{ConsentState, ConsentStatus, SdkConfig};

/// Where the engine is in its session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnginePhase {
    Uninitialized,
    Fetching,
    /// Terminal for the session.
    Ready,
    /// The fetch completed without a scope.
    Failed,
}

/// Point-in-time view of the engine, as printed by the CLI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSnapshot {
    pub phase: EnginePhase,
    pub config: Option<SdkConfig>,
    pub status: Option<ConsentStatus>,
    pub state: ConsentState,
    pub ready_at: Option<String>,
}
