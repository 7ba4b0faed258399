//! consentkit Client: fetches `{scope, force}` from the consent-status endpoint.
//!
//! One GET per initialization, no retries. Failures of any kind fold into an
//! error-only [`ConsentStatus`](consentkit_core::ConsentStatus).

pub mod client;
pub mod response;

pub use client::{ConsentStatusClient, STATUS_PATH};
pub use response::parse_status_response;
