//! Consent-status response parsing.

use serde_json::Value;
use tracing::{debug, error};

use consentkit_core::{normalize_scope, ConsentStatus, Error, Result, SCOPE_GDPR};

/// Parse a consent-status response.
///
/// * 200: `scope` (empty means absent) and `force`. A missing `force` takes
///   `gdpr_force_default` for GDPR users and `false` otherwise.
/// * anything else: the body's `error` field (or the status code) becomes a
///   [`Error::FetchFailed`].
///
/// An empty body reads as `{}`.
pub fn parse_status_response(status: u16, body: &str, gdpr_force_default: bool) -> Result<ConsentStatus> {
    let body = if body.trim().is_empty() { "{}" } else { body };
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(e) if status == 200 => return Err(Error::MalformedResponse(e.to_string())),
        Err(_) => return Err(Error::FetchFailed(format!("HTTP {}", status))),
    };

    if status != 200 {
        error!("Server response is not OK: {}", status);
        debug!("Error response json: {}", json);
        let message = json
            .get("error")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .map(String::from)
            .unwrap_or_else(|| format!("HTTP {}", status));
        return Err(Error::FetchFailed(message));
    }

    let Some(object) = json.as_object() else {
        return Err(Error::MalformedResponse(format!("expected a JSON object, got {}", json)));
    };
    debug!("Parsing consent status: {}", json);

    let scope = object
        .get("scope")
        .and_then(Value::as_str)
        .and_then(normalize_scope);

    if scope.is_none() {
        if let Some(message) = object.get("error").and_then(Value::as_str) {
            return Ok(ConsentStatus::failed(message));
        }
    }

    let default_force = scope.as_deref() == Some(SCOPE_GDPR) && gdpr_force_default;
    let force = object.get("force").and_then(as_lenient_bool).unwrap_or(default_force);

    Ok(ConsentStatus::scoped(scope, force))
}

/// Accept JSON booleans plus the `"true"`/`"false"` strings some proxies emit.
fn as_lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
