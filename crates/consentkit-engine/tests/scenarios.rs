//! End-to-end engine scenarios against a wiremock consent-status endpoint.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use consentkit_core::{
    ConsentState, DialogMode, EngineOptions, Error, Integration, IntegrationsConfig, Result,
    SdkConfig,
};
use consentkit_engine::{ConnectivityFlag, ConsentEngine, EnginePhase, QueuedContext};
use consentkit_propagate::{ConsentSignals, ConsentSink};
use consentkit_store::{keys, MemoryStore, PreferenceStore};
use parking_lot::Mutex;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn options(mock_server: &MockServer) -> EngineOptions {
    EngineOptions {
        status_base_url: mock_server.uri(),
        connect_timeout_secs: 1,
        read_timeout_secs: 1,
        ..Default::default()
    }
}

async fn serve_status(mock_server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/sdk/consent-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(mock_server)
        .await;
}

async fn ready_engine(mock_server: &MockServer, store: Arc<MemoryStore>) -> Arc<ConsentEngine> {
    let engine = ConsentEngine::builder(store)
        .options(options(mock_server))
        .build()
        .unwrap();
    engine
        .initialize(SdkConfig::new("241131"))
        .unwrap()
        .wait()
        .await;
    engine
}

#[tokio::test]
async fn scenario_a_gdpr_without_decision_opens_default_dialog() {
    let mock_server = MockServer::start().await;
    serve_status(&mock_server, serde_json::json!({"scope": "gdpr", "force": true})).await;

    let engine = ready_engine(&mock_server, Arc::new(MemoryStore::new())).await;

    assert_eq!(engine.phase(), EnginePhase::Ready);
    assert_eq!(engine.check_consent_state(), ConsentState::GdprNoDecision);
    assert!(engine.should_open_dialog(DialogMode::Default));
    let dialog = engine.open_dialog(DialogMode::Default).unwrap();
    assert_eq!(
        dialog.url().as_str(),
        "https://clickiocmp.com/t/static/consent_app.html?sid=241131"
    );
}

#[tokio::test]
async fn scenario_b_confirmed_decision_only_resurfaces() {
    let mock_server = MockServer::start().await;
    serve_status(&mock_server, serde_json::json!({"scope": "gdpr", "force": true})).await;

    let engine = ready_engine(&mock_server, Arc::new(MemoryStore::new())).await;
    let dialog = engine.open_dialog(DialogMode::Default).unwrap();
    assert!(dialog.write(r#"{"IABTCF_TCString":"CQ","IABTCF_PurposeConsents":"11"}"#));
    dialog.close();

    assert_eq!(engine.check_consent_state(), ConsentState::GdprDecisionObtained);
    assert!(!engine.should_open_dialog(DialogMode::Default));
    assert!(engine.should_open_dialog(DialogMode::Resurface));
    assert_eq!(engine.export().tc_string().as_deref(), Some("CQ"));
}

#[tokio::test]
async fn scenario_c_out_of_scope_never_opens() {
    let mock_server = MockServer::start().await;
    serve_status(&mock_server, serde_json::json!({"scope": "out of scope"})).await;

    let engine = ready_engine(&mock_server, Arc::new(MemoryStore::new())).await;

    assert_eq!(engine.check_consent_state(), ConsentState::NotApplicable);
    assert!(!engine.should_open_dialog(DialogMode::Default));
    assert!(!engine.should_open_dialog(DialogMode::Resurface));
    assert!(engine.open_dialog(DialogMode::Resurface).is_none());
}

#[tokio::test]
async fn scenario_d_purpose_consents_from_store() {
    let mock_server = MockServer::start().await;
    serve_status(&mock_server, serde_json::json!({"scope": "gdpr", "force": false})).await;

    let store = Arc::new(MemoryStore::with_strings([(keys::PURPOSE_CONSENTS, "101")]));
    let engine = ready_engine(&mock_server, store).await;

    assert_eq!(engine.check_consent_for_purpose(1), Some(true));
    assert_eq!(engine.check_consent_for_purpose(2), Some(false));
    assert_eq!(engine.check_consent_for_purpose(3), Some(true));
    assert_eq!(engine.check_consent_for_vendor(1), None);
}

#[tokio::test]
async fn scenario_e_timeout_leaves_engine_unready() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"scope": "gdpr", "force": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let engine = ConsentEngine::builder(Arc::new(MemoryStore::new()))
        .options(options(&mock_server))
        .build()
        .unwrap();
    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    engine.on_ready(move || {
        f.fetch_add(1, Ordering::SeqCst);
    });

    engine
        .initialize(SdkConfig::new("241131"))
        .unwrap()
        .wait()
        .await;

    assert_eq!(engine.check_consent_scope(), None);
    assert_eq!(engine.check_consent_state(), ConsentState::Unknown);
    assert_eq!(engine.phase(), EnginePhase::Failed);
    assert!(engine.status().unwrap().error.is_some());
    assert_eq!(fired.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn version_token_is_sent_from_store() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdk/consent-status"))
        .and(query_param("s", "241131"))
        .and(query_param("v", "7f3a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"scope": "us"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryStore::new());
    store.put_string(keys::SERVER_REQUEST_VERSION, "7f3a").unwrap();
    let engine = ready_engine(&mock_server, store).await;

    assert_eq!(engine.check_consent_state(), ConsentState::Us);
}

#[tokio::test]
async fn completion_waits_for_the_ui_context() {
    let mock_server = MockServer::start().await;
    serve_status(&mock_server, serde_json::json!({"scope": "gdpr", "force": true})).await;

    let ui = Arc::new(QueuedContext::new());
    let engine = ConsentEngine::builder(Arc::new(MemoryStore::new()))
        .options(options(&mock_server))
        .ui_context(ui.clone())
        .build()
        .unwrap();

    let fired = Arc::new(AtomicUsize::new(0));
    let f = fired.clone();
    engine.on_ready(move || {
        f.fetch_add(1, Ordering::SeqCst);
    });

    engine
        .initialize(SdkConfig::new("241131"))
        .unwrap()
        .wait()
        .await;
    assert_eq!(engine.phase(), EnginePhase::Fetching);
    assert!(!engine.is_ready());

    assert_eq!(ui.run_pending(), 1);
    assert!(engine.is_ready());
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // Registering after readiness runs right away, exactly once.
    let late = Arc::new(AtomicUsize::new(0));
    let l = late.clone();
    engine.on_ready(move || {
        l.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(late.load(Ordering::SeqCst), 1);
    engine.ready().await;
}

#[tokio::test]
async fn offline_initialize_is_rejected() {
    let mock_server = MockServer::start().await;
    let engine = ConsentEngine::builder(Arc::new(MemoryStore::new()))
        .options(options(&mock_server))
        .connectivity(Arc::new(ConnectivityFlag::new(false)))
        .build()
        .unwrap();

    let err = engine.initialize(SdkConfig::new("241131")).err().unwrap();
    assert!(matches!(err, Error::NetworkUnavailable));
    assert_eq!(engine.phase(), EnginePhase::Uninitialized);
    assert!(engine.config().is_none());
}

#[tokio::test]
async fn reinitialize_keeps_the_first_config() {
    let mock_server = MockServer::start().await;
    serve_status(&mock_server, serde_json::json!({"scope": "us"})).await;

    let engine = ready_engine(&mock_server, Arc::new(MemoryStore::new())).await;

    let err = engine.initialize(SdkConfig::new("999")).err().unwrap();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(engine.config().unwrap().site_id, "241131");
    assert_eq!(engine.check_consent_state(), ConsentState::Us);

    // The same config may re-fetch.
    engine
        .initialize(SdkConfig::new("241131"))
        .unwrap()
        .wait()
        .await;
    assert_eq!(engine.config().unwrap().site_id, "241131");
    assert_eq!(engine.phase(), EnginePhase::Ready);
}

struct RecordingSink {
    calls: Mutex<Vec<ConsentSignals>>,
}

impl ConsentSink for RecordingSink {
    fn integration(&self) -> Integration {
        Integration::Firebase
    }

    fn apply(&self, signals: &ConsentSignals) -> Result<()> {
        self.calls.lock().push(*signals);
        Ok(())
    }
}

#[tokio::test]
async fn stored_consent_propagates_before_the_fetch_completes() {
    let mock_server = MockServer::start().await;
    serve_status(&mock_server, serde_json::json!({"scope": "gdpr", "force": false})).await;

    let store = Arc::new(MemoryStore::with_strings([
        (keys::GOOGLE_AD_STORAGE, "granted"),
        (keys::GOOGLE_ANALYTICS_STORAGE, "granted"),
        (keys::GOOGLE_AD_USER_DATA, "granted"),
        (keys::GOOGLE_AD_PERSONALIZATION, "denied"),
    ]));
    let sink = Arc::new(RecordingSink {
        calls: Mutex::new(Vec::new()),
    });
    let ui = Arc::new(QueuedContext::new());
    let engine = ConsentEngine::builder(store)
        .options(EngineOptions {
            integrations: IntegrationsConfig::from_names("firebase"),
            ..options(&mock_server)
        })
        .sink(sink.clone())
        .ui_context(ui.clone())
        .build()
        .unwrap();

    let handle = engine.initialize(SdkConfig::new("241131")).unwrap();
    {
        let calls = sink.calls.lock();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].in_eea);
        assert!(calls[0].ad_user_data());
        assert!(!calls[0].ad_personalization());
    }

    handle.wait().await;
    assert_eq!(sink.calls.lock().len(), 1);

    ui.run_pending();
    let calls = sink.calls.lock();
    assert_eq!(calls.len(), 2);
    assert!(calls[1].in_eea);
}
