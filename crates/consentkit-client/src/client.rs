//! HTTP client for `/sdk/consent-status`.

use reqwest::{Client, Url};
use tracing::{debug, error, info};

use consentkit_core::{ConsentStatus, EngineOptions, Error, Result};

use crate::response::parse_status_response;

pub const STATUS_PATH: &str = "/sdk/consent-status";

/// Looks up the consent scope for a site.
#[derive(Debug, Clone)]
pub struct ConsentStatusClient {
    http: Client,
    base_url: String,
    gdpr_force_default: bool,
}

impl ConsentStatusClient {
    /// Build a client with the connect/read timeouts from `options`.
    pub fn new(options: &EngineOptions) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(options.connect_timeout())
            .timeout(options.read_timeout())
            .build()
            .map_err(|e| Error::Config(format!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            base_url: options.status_base_url.trim_end_matches('/').to_string(),
            gdpr_force_default: options.gdpr_force_default,
        })
    }

    /// `<base>/sdk/consent-status?s=<site>[&v=<version>]`
    pub fn status_url(&self, site_id: &str, version: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, STATUS_PATH))
            .map_err(|e| Error::Config(format!("Invalid status URL {}: {}", self.base_url, e)))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("s", site_id);
            if let Some(version) = version.filter(|v| !v.is_empty()) {
                query.append_pair("v", version);
            }
        }
        Ok(url)
    }

    /// Fetch the status, surfacing failures as typed errors.
    pub async fn try_fetch_status(&self, site_id: &str, version: Option<&str>) -> Result<ConsentStatus> {
        let url = self.status_url(site_id, version)?;
        debug!("Fetching URL: {}", url);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::FetchFailed(e.to_string()))?;

        let code = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| Error::FetchFailed(format!("Reading response body failed: {}", e)))?;

        if code == 200 {
            debug!("The server returned response code \"OK\"");
        }
        parse_status_response(code, &body, self.gdpr_force_default)
    }

    /// Fetch the status. Never fails: errors become an error-only status.
    pub async fn fetch_status(&self, site_id: &str, version: Option<&str>) -> ConsentStatus {
        info!("Started fetching consent status");
        match self.try_fetch_status(site_id, version).await {
            Ok(status) => status,
            Err(e) => {
                error!("Consent status fetch failed: {}", e);
                match e {
                    Error::FetchFailed(message) | Error::MalformedResponse(message) => {
                        ConsentStatus::failed(message)
                    }
                    other => ConsentStatus::failed(other.to_string()),
                }
            }
        }
    }
}
