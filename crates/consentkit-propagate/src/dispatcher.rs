//! Fan-out of consent signals to every enabled sink.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use consentkit_core::{GoogleConsentStatus, Integration, IntegrationsConfig};

use crate::sink::{ConsentSignals, ConsentSink};

/// What happened during one propagation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PropagationReport {
    /// Google Consent Mode data was present, so sinks were considered at all.
    pub consent_mode_enabled: bool,
    pub applied: Vec<Integration>,
    /// Registered but not linked into the host app.
    pub skipped: Vec<Integration>,
    pub failed: Vec<(Integration, String)>,
}

/// Calls each enabled sink in registration order.
pub struct Propagator {
    integrations: IntegrationsConfig,
    sinks: Vec<Arc<dyn ConsentSink>>,
}

impl Propagator {
    pub fn new(integrations: IntegrationsConfig) -> Self {
        Self {
            integrations,
            sinks: Vec::new(),
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn ConsentSink>) -> Self {
        self.register(sink);
        self
    }

    pub fn register(&mut self, sink: Arc<dyn ConsentSink>) {
        debug!("Registered consent sink: {}", sink.integration());
        self.sinks.push(sink);
    }

    /// Push the current flags to every enabled sink.
    ///
    /// No-op without Google Consent Mode data. A failing or panicking sink is
    /// logged and does not stop the remaining ones.
    pub fn propagate(&self, scope: Option<&str>, google: Option<&GoogleConsentStatus>) -> PropagationReport {
        let mut report = PropagationReport::default();
        debug!("Is Google Consent Mode Enabled = {}", google.is_some());
        let Some(google) = google else {
            return report;
        };
        report.consent_mode_enabled = true;

        let signals = ConsentSignals::new(scope, *google);
        for sink in &self.sinks {
            let integration = sink.integration();
            if !self.integrations.is_enabled(integration) {
                report.skipped.push(integration);
                continue;
            }

            info!("Setting consent to {}", integration);
            match catch_unwind(AssertUnwindSafe(|| sink.apply(&signals))) {
                Ok(Ok(())) => {
                    info!("Successful finished setting consent to {}", integration);
                    report.applied.push(integration);
                }
                Ok(Err(e)) => {
                    error!("Failed setting consent to {}: {}", integration, e);
                    report.failed.push((integration, e.to_string()));
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!("Failed setting consent to {}: panic: {}", integration, message);
                    report.failed.push((integration, message));
                }
            }
        }
        report
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use consentkit_core::{Error, Result};
    use parking_lot::Mutex;

    enum Behavior {
        Succeed,
        Fail,
        Panic,
    }

    struct ScriptedSink {
        integration: Integration,
        behavior: Behavior,
        seen: Mutex<Vec<ConsentSignals>>,
    }

    impl ScriptedSink {
        fn new(integration: Integration, behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                integration,
                behavior,
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl ConsentSink for ScriptedSink {
        fn integration(&self) -> Integration {
            self.integration
        }

        fn apply(&self, signals: &ConsentSignals) -> Result<()> {
            self.seen.lock().push(*signals);
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => Err(Error::sink(self.integration.name(), "not initialized")),
                Behavior::Panic => panic!("native SDK crashed"),
            }
        }
    }

    fn google() -> GoogleConsentStatus {
        GoogleConsentStatus {
            ad_storage_granted: Some(true),
            analytics_storage_granted: Some(true),
            ad_user_data_granted: Some(true),
            ad_personalization_granted: Some(true),
        }
    }

    #[test]
    fn test_noop_without_consent_mode() {
        let sink = ScriptedSink::new(Integration::Firebase, Behavior::Succeed);
        let propagator = Propagator::new(IntegrationsConfig::all()).with_sink(sink.clone());

        let report = propagator.propagate(Some("gdpr"), None);
        assert!(!report.consent_mode_enabled);
        assert!(report.applied.is_empty());
        assert!(sink.seen.lock().is_empty());
    }

    #[test]
    fn test_disabled_integrations_are_skipped() {
        let firebase = ScriptedSink::new(Integration::Firebase, Behavior::Succeed);
        let adjust = ScriptedSink::new(Integration::Adjust, Behavior::Succeed);
        let propagator = Propagator::new(IntegrationsConfig::from_names("adjust"))
            .with_sink(firebase.clone())
            .with_sink(adjust.clone());

        let report = propagator.propagate(Some("us"), Some(&google()));
        assert_eq!(report.applied, vec![Integration::Adjust]);
        assert_eq!(report.skipped, vec![Integration::Firebase]);
        assert!(firebase.seen.lock().is_empty());
        assert!(!adjust.seen.lock()[0].in_eea);
    }

    #[test]
    fn test_failures_are_isolated() {
        let firebase = ScriptedSink::new(Integration::Firebase, Behavior::Fail);
        let airbridge = ScriptedSink::new(Integration::Airbridge, Behavior::Panic);
        let adjust = ScriptedSink::new(Integration::Adjust, Behavior::Succeed);
        let propagator = Propagator::new(IntegrationsConfig::all())
            .with_sink(firebase)
            .with_sink(airbridge)
            .with_sink(adjust.clone());

        let report = propagator.propagate(Some("gdpr"), Some(&google()));
        assert_eq!(report.applied, vec![Integration::Adjust]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].0, Integration::Firebase);
        assert_eq!(report.failed[1], (Integration::Airbridge, "native SDK crashed".to_string()));
        assert!(adjust.seen.lock()[0].in_eea);
    }
}
