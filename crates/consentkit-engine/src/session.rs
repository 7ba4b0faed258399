//! Dialog sessions: the bridge between the consent UI and the preference store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info};
use url::Url;

use consentkit_core::{Error, Result};
use consentkit_store::{Edit, PrefValue, PreferenceStore};

use crate::engine::ConsentEngine;

/// Hosts the hosted consent app navigates within.
const INTERNAL_HOST_SUFFIXES: &[&str] = &["clickio.com", "clickiocmp.com"];

/// One open consent dialog.
///
/// The dialog reads and writes consent keys through [`read`](Self::read) and
/// [`write`](Self::write); [`ready`](Self::ready) or [`close`](Self::close)
/// ends the session and confirms the user's decision.
pub struct DialogSession {
    id: String,
    engine: Arc<ConsentEngine>,
    url: Url,
    custom: bool,
    created_at: DateTime<Utc>,
    write_called: AtomicBool,
    closed: AtomicBool,
}

impl DialogSession {
    pub(crate) fn new(engine: Arc<ConsentEngine>, url: Url, custom: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            engine,
            url,
            custom,
            created_at: Utc::now(),
            write_called: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Page the dialog should load.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn read(&self, key: Option<&str>) -> Option<String> {
        read_key(self.engine.store().as_ref(), key)
    }

    /// Apply a JSON object of key/value pairs as one atomic batch.
    ///
    /// Returns `false` and writes nothing if `json` is not an object or the
    /// store rejects the batch.
    pub fn write(&self, json: &str) -> bool {
        info!("write called");
        debug!("write payload: {}", json);
        let edits = match parse_edits(json) {
            Ok(edits) => edits,
            Err(e) => {
                error!("Rejected dialog write: {}", e);
                return false;
            }
        };
        match self.engine.apply_write(edits) {
            Ok(()) => {
                self.write_called.store(true, Ordering::SeqCst);
                true
            }
            Err(e) => {
                error!("Dialog write failed: {}", e);
                false
            }
        }
    }

    /// The dialog finished loading. Hosted dialogs signal the end of the
    /// session this way; custom pages stay open until [`close`](Self::close).
    pub fn ready(&self) {
        info!("ready called");
        if !self.custom {
            self.finish();
        }
    }

    pub fn close(&self) {
        info!("close called");
        self.finish();
    }

    /// Whether navigation to `link` stays inside the dialog.
    pub fn is_internal_link(&self, link: &str) -> bool {
        if self.custom {
            return true;
        }
        let Ok(url) = Url::parse(link) else {
            return false;
        };
        url.host_str()
            .map(|host| INTERNAL_HOST_SUFFIXES.iter().any(|suffix| host.ends_with(suffix)))
            .unwrap_or(false)
    }

    fn finish(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.engine.confirm_decision();
        if self.write_called.load(Ordering::SeqCst) {
            self.engine.notify_consent_updated();
        }
        info!("Consent dialog session {} closed", self.id);
    }
}

/// Bridge for site pages that may read consent but never change it.
pub struct ReadOnlyBridge {
    store: Arc<dyn PreferenceStore>,
}

impl ReadOnlyBridge {
    pub(crate) fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn read(&self, key: Option<&str>) -> Option<String> {
        read_key(self.store.as_ref(), key)
    }

    pub fn write(&self, _json: &str) -> bool {
        false
    }
}

fn read_key(store: &dyn PreferenceStore, key: Option<&str>) -> Option<String> {
    info!("read called");
    let key = key.filter(|k| !k.is_empty())?;
    let value = store.get(key).map(|v| v.to_string());
    debug!("read {} = {:?}", key, value);
    value
}

/// Map a dialog payload to store edits. Nulls remove keys; arrays and
/// objects are stored as their JSON text.
fn parse_edits(json: &str) -> Result<Vec<Edit>> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Object(map) = value else {
        return Err(Error::Internal(format!("expected a JSON object, got {}", value)));
    };

    let edits = map
        .into_iter()
        .map(|(key, value)| match value {
            Value::Null => Edit::Remove(key),
            Value::Bool(b) => Edit::Put(key, PrefValue::Bool(b)),
            Value::Number(n) => {
                let value = match n.as_i64() {
                    Some(i) => PrefValue::Int(i),
                    None => PrefValue::Float(n.as_f64().unwrap_or_default()),
                };
                Edit::Put(key, value)
            }
            Value::String(s) => Edit::Put(key, PrefValue::String(s)),
            other => Edit::Put(key, PrefValue::String(other.to_string())),
        })
        .collect();
    Ok(edits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use consentkit_core::{ConsentStatus, DialogMode};
    use consentkit_store::MemoryStore;
    use std::sync::atomic::AtomicUsize;

    fn gdpr_engine(store: Arc<MemoryStore>) -> Arc<ConsentEngine> {
        let engine = ConsentEngine::builder(store).build().unwrap();
        engine.complete_fetch(ConsentStatus::scoped(Some("gdpr".into()), true));
        engine
    }

    fn session(engine: &Arc<ConsentEngine>) -> DialogSession {
        DialogSession::new(
            engine.clone(),
            Url::parse("https://clickiocmp.com/t/static/consent_app.html?sid=1").unwrap(),
            false,
        )
    }

    #[test]
    fn test_parse_edits_types() {
        let edits = parse_edits(
            r#"{"s":"x","i":42,"f":1.5,"b":true,"n":null,"a":[1,2],"o":{"k":"v"}}"#,
        )
        .unwrap();
        let find = |key: &str| edits.iter().find(|e| e.key() == key).cloned().unwrap();

        assert_eq!(find("s"), Edit::put("s", "x"));
        assert_eq!(find("i"), Edit::Put("i".into(), PrefValue::Int(42)));
        assert_eq!(find("f"), Edit::Put("f".into(), PrefValue::Float(1.5)));
        assert_eq!(find("b"), Edit::Put("b".into(), PrefValue::Bool(true)));
        assert_eq!(find("n"), Edit::remove("n"));
        assert_eq!(find("a"), Edit::put("a", "[1,2]"));
        assert_eq!(find("o"), Edit::put("o", r#"{"k":"v"}"#));
    }

    #[test]
    fn test_parse_edits_rejects_non_objects() {
        assert!(parse_edits("not json").is_err());
        assert!(parse_edits("[1]").is_err());
        assert!(parse_edits("\"s\"").is_err());
    }

    #[test]
    fn test_write_then_read() {
        let store = Arc::new(MemoryStore::with_strings([("old", "1")]));
        let engine = gdpr_engine(store.clone());
        let dialog = session(&engine);

        assert!(dialog.write(r#"{"IABTCF_PurposeConsents":"101","old":null,"IABTCF_gdprApplies":1}"#));
        assert_eq!(dialog.read(Some("IABTCF_PurposeConsents")).as_deref(), Some("101"));
        assert_eq!(dialog.read(Some("IABTCF_gdprApplies")).as_deref(), Some("1"));
        assert_eq!(dialog.read(Some("old")), None);
        assert_eq!(dialog.read(Some("")), None);
        assert_eq!(dialog.read(None), None);
        assert_eq!(engine.check_consent_for_purpose(3), Some(true));
    }

    #[test]
    fn test_malformed_write_changes_nothing() {
        let store = Arc::new(MemoryStore::with_strings([("k", "v")]));
        let engine = gdpr_engine(store.clone());
        let dialog = session(&engine);

        assert!(!dialog.write("{\"k\":"));
        assert!(!dialog.write("[\"k\"]"));
        assert_eq!(dialog.read(Some("k")).as_deref(), Some("v"));
    }

    #[test]
    fn test_close_confirms_and_notifies_after_write() {
        let engine = gdpr_engine(Arc::new(MemoryStore::new()));
        let updates = Arc::new(AtomicUsize::new(0));
        let u = updates.clone();
        engine.on_consent_updated(Some(Arc::new(move || {
            u.fetch_add(1, Ordering::SeqCst);
        })));

        let dialog = session(&engine);
        assert!(dialog.write(r#"{"IABTCF_TCString":"CQ"}"#));
        dialog.ready();
        dialog.close();

        assert!(dialog.is_closed());
        assert_eq!(updates.load(Ordering::SeqCst), 1);
        assert!(!engine.should_open_dialog(DialogMode::Default));
        assert!(engine.should_open_dialog(DialogMode::Resurface));
    }

    #[test]
    fn test_close_without_write_does_not_notify() {
        let engine = gdpr_engine(Arc::new(MemoryStore::new()));
        let updates = Arc::new(AtomicUsize::new(0));
        let u = updates.clone();
        engine.on_consent_updated(Some(Arc::new(move || {
            u.fetch_add(1, Ordering::SeqCst);
        })));

        session(&engine).close();
        assert_eq!(updates.load(Ordering::SeqCst), 0);
        assert_eq!(engine.status().unwrap().force, Some(false));
    }

    #[test]
    fn test_custom_page_stays_open_on_ready() {
        let engine = gdpr_engine(Arc::new(MemoryStore::new()));
        let dialog = DialogSession::new(
            engine.clone(),
            Url::parse("https://example.org/privacy").unwrap(),
            true,
        );
        dialog.ready();
        assert!(!dialog.is_closed());
        assert!(dialog.is_internal_link("https://anywhere.net/"));
    }

    #[test]
    fn test_internal_links() {
        let engine = gdpr_engine(Arc::new(MemoryStore::new()));
        let dialog = session(&engine);
        assert!(dialog.is_internal_link("https://clickiocmp.com/t/static/vendors.html"));
        assert!(dialog.is_internal_link("https://cdn.clickio.com/x"));
        assert!(!dialog.is_internal_link("https://example.org/privacy"));
        assert!(!dialog.is_internal_link("not a link"));
    }

    #[test]
    fn test_read_only_bridge() {
        let store = Arc::new(MemoryStore::with_strings([("IABTCF_TCString", "CQ")]));
        let engine = ConsentEngine::builder(store).build().unwrap();
        let bridge = engine.read_only_bridge();

        assert_eq!(bridge.read(Some("IABTCF_TCString")).as_deref(), Some("CQ"));
        assert!(!bridge.write(r#"{"IABTCF_TCString":"x"}"#));
        assert_eq!(bridge.read(Some("IABTCF_TCString")).as_deref(), Some("CQ"));
    }
}
