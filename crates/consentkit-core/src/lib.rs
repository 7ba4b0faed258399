//! consentkit Core: consent status model, configuration, integrations, errors.

pub mod config;
pub mod error;
pub mod integrations;
pub mod logging;
pub mod types;

pub use config::{EngineOptions, SdkConfig};
pub use error::{Error, Result};
pub use integrations::{Integration, IntegrationsConfig};
pub use logging::LogsMode;
pub use types::*;
