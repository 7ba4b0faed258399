//! The consent engine: fetch lifecycle, readiness, queries, propagation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use url::Url;

use consentkit_client::ConsentStatusClient;
use consentkit_core::{
    ConsentState, ConsentStatus, DialogMode, EngineOptions, Error, Result, SdkConfig,
};
use consentkit_decode::ConsentExport;
use consentkit_propagate::{ConsentSink, PropagationReport, Propagator};
use consentkit_store::{keys, Edit, PreferenceStore};

use crate::connectivity::{AlwaysOnline, Connectivity};
use crate::context::{ImmediateContext, UiContext};
use crate::ready::ReadyLatch;
use crate::session::{DialogSession, ReadOnlyBridge};
use crate::types::{EnginePhase, EngineSnapshot};

type UpdateListener = Arc<dyn Fn() + Send + Sync>;

struct EngineState {
    config: Option<SdkConfig>,
    status: Option<ConsentStatus>,
    phase: EnginePhase,
    ready_at: Option<DateTime<Utc>>,
}

/// Owns the consent status for one host session.
///
/// Construct with [`ConsentEngine::builder`]; the engine is always handled
/// through an `Arc` because the background fetch holds a reference to it.
pub struct ConsentEngine {
    options: EngineOptions,
    client: ConsentStatusClient,
    store: Arc<dyn PreferenceStore>,
    export: ConsentExport,
    propagator: Propagator,
    ui: Arc<dyn UiContext>,
    connectivity: Arc<dyn Connectivity>,
    runtime: Option<Handle>,
    state: RwLock<EngineState>,
    ready: ReadyLatch,
    /// Serializes decision confirmation with bridge writes.
    write_guard: Mutex<()>,
    consent_updated: RwLock<Option<UpdateListener>>,
}

/// Completion handle for the background status fetch.
///
/// Dropping it does not cancel the fetch.
pub struct FetchHandle {
    inner: JoinHandle<()>,
}

impl FetchHandle {
    /// Resolve once the fetch result has been posted to the UI context.
    pub async fn wait(self) {
        if let Err(e) = self.inner.await {
            error!("Consent status fetch task failed: {}", e);
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct EngineBuilder {
    store: Arc<dyn PreferenceStore>,
    options: EngineOptions,
    sinks: Vec<Arc<dyn ConsentSink>>,
    ui: Arc<dyn UiContext>,
    connectivity: Arc<dyn Connectivity>,
    runtime: Option<Handle>,
}

impl EngineBuilder {
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// Register a downstream SDK sink. Only sinks enabled in
    /// `EngineOptions::integrations` receive consent.
    pub fn sink(mut self, sink: Arc<dyn ConsentSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn ui_context(mut self, ui: Arc<dyn UiContext>) -> Self {
        self.ui = ui;
        self
    }

    pub fn connectivity(mut self, connectivity: Arc<dyn Connectivity>) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Runtime for the background fetch. Defaults to the runtime current at
    /// `initialize` time.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<Arc<ConsentEngine>> {
        let client = ConsentStatusClient::new(&self.options)?;
        let mut propagator = Propagator::new(self.options.integrations.clone());
        for sink in self.sinks {
            propagator.register(sink);
        }

        Ok(Arc::new(ConsentEngine {
            client,
            export: ConsentExport::new(self.store.clone()),
            store: self.store,
            options: self.options,
            propagator,
            ui: self.ui,
            connectivity: self.connectivity,
            runtime: self.runtime,
            state: RwLock::new(EngineState {
                config: None,
                status: None,
                phase: EnginePhase::Uninitialized,
                ready_at: None,
            }),
            ready: ReadyLatch::new(),
            write_guard: Mutex::new(()),
            consent_updated: RwLock::new(None),
        }))
    }
}

impl ConsentEngine {
    pub fn builder(store: Arc<dyn PreferenceStore>) -> EngineBuilder {
        EngineBuilder {
            store,
            options: EngineOptions::default(),
            sinks: Vec::new(),
            ui: Arc::new(ImmediateContext),
            connectivity: Arc::new(AlwaysOnline),
            runtime: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start the session: fetch the consent status in the background and
    /// push already-stored consent to the sinks right away.
    ///
    /// Fails when the configuration is invalid or differs from the one the
    /// engine was first initialized with, when no tokio runtime is available,
    /// or when the network is unreachable. Repeating the same configuration
    /// re-fetches the status.
    pub fn initialize(self: &Arc<Self>, config: SdkConfig) -> Result<FetchHandle> {
        info!("Initialization started");
        config.validate()?;

        let runtime = match &self.runtime {
            Some(handle) => handle.clone(),
            None => Handle::try_current()
                .map_err(|e| Error::Internal(format!("no tokio runtime for the status fetch: {}", e)))?,
        };

        if !self.connectivity.is_available() {
            let err = Error::NetworkUnavailable;
            error!("{}", err);
            return Err(err);
        }

        {
            let mut state = self.state.write();
            match state.config.clone() {
                Some(existing) if existing != config => {
                    let err = Error::Config(format!(
                        "engine is already initialized for site {}",
                        existing.site_id
                    ));
                    error!("{}", err);
                    return Err(err);
                }
                Some(_) => debug!("Re-fetching consent status for the initialized site"),
                None => state.config = Some(config.clone()),
            }
            if state.phase != EnginePhase::Ready {
                state.phase = EnginePhase::Fetching;
            }
        }

        let version = self.store.get_string(keys::SERVER_REQUEST_VERSION);
        debug!("Stored server request version: {:?}", version);

        let engine = Arc::clone(self);
        let inner = runtime.spawn(async move {
            let status = engine
                .client
                .fetch_status(&config.site_id, version.as_deref())
                .await;
            let target = Arc::clone(&engine);
            engine
                .ui
                .post(Box::new(move || target.complete_fetch(status)));
        });

        self.propagate();
        info!("Initialization finished");
        Ok(FetchHandle { inner })
    }

    /// Apply a fetch result. Runs on the UI context.
    pub(crate) fn complete_fetch(&self, status: ConsentStatus) {
        debug!("Consent status received: {:?}", status);
        let scoped = status.scope.is_some();
        {
            let mut state = self.state.write();
            if !scoped && state.phase == EnginePhase::Ready {
                warn!(
                    "Ignoring failed refresh, keeping loaded status: {}",
                    ConsentStatus::missing_scope_reason(Some(&status))
                );
                return;
            }
            if scoped {
                state.phase = EnginePhase::Ready;
                if state.ready_at.is_none() {
                    state.ready_at = Some(Utc::now());
                }
            } else {
                state.phase = EnginePhase::Failed;
            }
            state.status = Some(status.clone());
        }

        if !scoped {
            error!("{}", ConsentStatus::missing_scope_reason(Some(&status)));
            return;
        }

        if self.ready.fire() {
            debug!("Calling onReady");
        }
        self.propagate();
    }

    /// Register a readiness listener. Runs immediately if already ready.
    pub fn on_ready(&self, listener: impl FnOnce() + Send + 'static) {
        self.ready.register(listener);
    }

    /// Resolve once the consent status has loaded with a scope.
    pub async fn ready(&self) {
        self.ready.wait().await;
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_fired()
    }

    /// Host listener for consent changes made through the dialog.
    pub fn on_consent_updated(&self, listener: Option<Arc<dyn Fn() + Send + Sync>>) {
        *self.consent_updated.write() = listener;
    }

    pub(crate) fn notify_consent_updated(&self) {
        let listener = self.consent_updated.read().clone();
        if let Some(listener) = listener {
            listener();
        }
    }

    /// Record that the user has made a choice: the GDPR dialog is no longer
    /// forced. Re-propagates without re-firing readiness.
    pub fn confirm_decision(&self) {
        {
            let _guard = self.write_guard.lock();
            let mut state = self.state.write();
            if let Some(status) = state.status.as_mut() {
                *status = status.with_decision();
            }
        }
        debug!("Consent decision confirmed");
        // Sinks run without the write guard so they may write back.
        self.propagate();
    }

    /// Apply a dialog write batch under the write guard.
    pub(crate) fn apply_write(&self, edits: Vec<Edit>) -> Result<()> {
        let _guard = self.write_guard.lock();
        self.store.apply(edits)
    }

    /// Push the stored Google Consent Mode flags to the enabled sinks.
    pub fn propagate(&self) -> PropagationReport {
        let scope = self.state.read().status.as_ref().and_then(|s| s.scope.clone());
        let google = self.export.google_consent_mode();
        self.propagator.propagate(scope.as_deref(), google.as_ref())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn phase(&self) -> EnginePhase {
        self.state.read().phase
    }

    pub fn status(&self) -> Option<ConsentStatus> {
        self.state.read().status.clone()
    }

    pub fn config(&self) -> Option<SdkConfig> {
        self.state.read().config.clone()
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn export(&self) -> &ConsentExport {
        &self.export
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        let state = self.state.read();
        EngineSnapshot {
            phase: state.phase,
            config: state.config.clone(),
            status: state.status.clone(),
            state: ConsentState::derive(state.status.as_ref()),
            ready_at: state.ready_at.map(|t| t.to_rfc3339()),
        }
    }

    /// The regime applying to the user, e.g. `"gdpr"`.
    pub fn check_consent_scope(&self) -> Option<String> {
        let status = self.status();
        let scope = status.as_ref().and_then(|s| s.scope.clone());
        if scope.is_none() {
            error!("{}", ConsentStatus::missing_scope_reason(status.as_ref()));
        }
        scope
    }

    pub fn check_consent_state(&self) -> ConsentState {
        let status = self.status();
        let state = ConsentState::derive(status.as_ref());
        if state == ConsentState::Unknown {
            error!("{}", ConsentStatus::missing_scope_reason(status.as_ref()));
        }
        state
    }

    /// Whether TCF purpose `id` is consented. `None` before readiness or
    /// when nothing is stored.
    pub fn check_consent_for_purpose(&self, id: u32) -> Option<bool> {
        if !self.is_ready() {
            return None;
        }
        self.export
            .consented_tcf_purposes()
            .map(|purposes| purposes.contains(&id))
    }

    /// Whether TCF vendor `id` is consented. `None` before readiness or when
    /// nothing is stored.
    pub fn check_consent_for_vendor(&self, id: u32) -> Option<bool> {
        if !self.is_ready() {
            return None;
        }
        self.export
            .consented_tcf_vendors()
            .map(|vendors| vendors.contains(&id))
    }

    // -----------------------------------------------------------------------
    // Dialog
    // -----------------------------------------------------------------------

    pub fn should_open_dialog(&self, mode: DialogMode) -> bool {
        info!("Dialog requested with mode {:?}", mode);
        if !self.is_ready() {
            info!("Dialog not shown: consent status is not ready");
            return false;
        }
        let Some(status) = self.status() else {
            return false;
        };
        if status.scope.is_none() {
            error!("{}", ConsentStatus::missing_scope_reason(Some(&status)));
            return false;
        }
        if !mode.permits(&status) {
            info!(
                "Dialog not shown: mode {:?} does not apply to scope {:?} (force = {:?})",
                mode, status.scope, status.force
            );
            return false;
        }
        true
    }

    /// `<consent app>?sid=<site>[&lang=<lang>]` for the initialized site.
    pub fn consent_url(&self) -> Result<Url> {
        let config = self
            .config()
            .ok_or_else(|| Error::Config("engine is not initialized".into()))?;
        let mut url = Url::parse(&self.options.consent_app_url).map_err(|e| {
            Error::Config(format!("Invalid consent app URL {}: {}", self.options.consent_app_url, e))
        })?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("sid", &config.site_id);
            if let Some(lang) = config.app_language.as_deref().filter(|l| !l.is_empty()) {
                query.append_pair("lang", lang);
            }
        }
        Ok(url)
    }

    /// Open a dialog session on the hosted consent app, if `mode` allows it.
    pub fn open_dialog(self: &Arc<Self>, mode: DialogMode) -> Option<DialogSession> {
        if !self.should_open_dialog(mode) {
            return None;
        }
        match self.consent_url() {
            Ok(url) => self.start_session(url, false),
            Err(e) => {
                error!("Cannot open consent dialog: {}", e);
                None
            }
        }
    }

    /// Open a dialog session on a host-provided page.
    pub fn open_custom_dialog(self: &Arc<Self>, mode: DialogMode, url: &str) -> Option<DialogSession> {
        if !self.should_open_dialog(mode) {
            return None;
        }
        match Url::parse(url) {
            Ok(url) => self.start_session(url, true),
            Err(e) => {
                error!("Cannot open consent dialog at {}: {}", url, e);
                None
            }
        }
    }

    fn start_session(self: &Arc<Self>, url: Url, custom: bool) -> Option<DialogSession> {
        if !self.connectivity.is_available() {
            error!("{}", Error::NetworkUnavailable);
            return None;
        }
        let session = DialogSession::new(Arc::clone(self), url, custom);
        info!("Opened consent dialog session {}", session.id());
        Some(session)
    }

    /// Bridge for site pages embedding consent reads.
    pub fn read_only_bridge(&self) -> ReadOnlyBridge {
        ReadOnlyBridge::new(self.store.clone())
    }

    pub(crate) fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }
}
