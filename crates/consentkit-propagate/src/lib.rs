//! consentkit Propagate: pushes derived consent flags into measurement SDKs.
//!
//! Each downstream SDK is a [`ConsentSink`]. The host supplies the native
//! bindings (`FirebaseAnalyticsApi`, `AdjustApi`, ...) and lists the linked
//! integrations in an `IntegrationsConfig`; the [`Propagator`] calls every
//! enabled sink and isolates their failures from one another.

pub mod dispatcher;
pub mod sink;
pub mod sinks;

pub use dispatcher::{PropagationReport, Propagator};
pub use sink::{ConsentSignals, ConsentSink};
pub use sinks::*;
