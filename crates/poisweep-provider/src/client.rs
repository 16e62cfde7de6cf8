//! HTTP client for the place-search provider.
//!
//! Wraps `reqwest` with provider-specific error classification: 401/403 are
//! fatal authentication failures, 5xx and connection/timeout failures are
//! transient, and an unparseable body is a malformed response. The client
//! holds no mutable state and is cheap to share across aggregation workers.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};

use poisweep_core::Anchor;

use crate::error::ProviderError;

const DEFAULT_BASE_URL: &str = "https://api.placesearch.example.com";

/// Parameters for one single-anchor provider call. Constructed fresh per
/// anchor per search invocation; never persisted.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub anchor: Anchor,
    pub radius_km_hint: f64,
    pub max_results: u32,
    pub country: Option<String>,
    pub language: Option<String>,
}

impl SearchRequest {
    /// Builds a request, rejecting argument violations before any network
    /// traffic.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidRequest`] for an empty query, a
    /// non-positive radius, or a zero result limit.
    pub fn new(
        query: impl Into<String>,
        anchor: Anchor,
        radius_km_hint: f64,
        max_results: u32,
    ) -> Result<Self, ProviderError> {
        let query = query.into();
        if query.trim().is_empty() {
            return Err(ProviderError::InvalidRequest(
                "query must be non-empty".to_string(),
            ));
        }
        if !(radius_km_hint > 0.0 && radius_km_hint.is_finite()) {
            return Err(ProviderError::InvalidRequest(format!(
                "radius_km_hint must be positive, got {radius_km_hint}"
            )));
        }
        if max_results == 0 {
            return Err(ProviderError::InvalidRequest(
                "max_results must be positive".to_string(),
            ));
        }
        Ok(Self {
            query,
            anchor,
            radius_km_hint,
            max_results,
            country: None,
            language: None,
        })
    }

    #[must_use]
    pub fn with_locale(mut self, country: Option<String>, language: Option<String>) -> Self {
        self.country = country;
        self.language = language;
        self
    }
}

/// Maps the radius hint to the provider's `zoom` field.
///
/// The provider searches a viewport, not a circle; the mapping is a monotone
/// step function (smaller radius, tighter zoom) and intentionally coarse.
fn zoom_for_radius(radius_km: f64) -> u8 {
    if radius_km <= 1.0 {
        16
    } else if radius_km <= 2.0 {
        15
    } else if radius_km <= 5.0 {
        14
    } else if radius_km <= 10.0 {
        13
    } else if radius_km <= 20.0 {
        12
    } else if radius_km <= 50.0 {
        11
    } else {
        10
    }
}

/// Client for the place-search provider.
///
/// Use [`ProviderClient::new`] for production or
/// [`ProviderClient::with_base_url`] to point at a mock server in tests.
pub struct ProviderClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl ProviderClient {
    /// Creates a new client pointed at the production provider endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with
    /// wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Http`] if the HTTP client cannot be built, or
    /// [`ProviderError::InvalidRequest`] if `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("poisweep/0.1 (branch-network-intelligence)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            ProviderError::InvalidRequest(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Runs one single-anchor search and returns the raw payload entries.
    ///
    /// The entries are loosely-typed provider JSON; pass each through
    /// [`crate::normalize`] to obtain canonical records.
    ///
    /// # Errors
    ///
    /// - [`ProviderError::Auth`] on HTTP 401/403 (fatal, never retried).
    /// - [`ProviderError::Transient`] on 5xx, connection failure, or timeout.
    /// - [`ProviderError::MalformedResponse`] if the body is not a record
    ///   list.
    /// - [`ProviderError::Api`] on any other non-2xx status.
    pub async fn search(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<serde_json::Value>, ProviderError> {
        let url = self
            .base_url
            .join("search")
            .map_err(|e| ProviderError::InvalidRequest(format!("invalid search URL: {e}")))?;

        // Provider contract: lat/lng are stringified decimal degrees.
        let body = serde_json::json!({
            "query": request.query,
            "lat": format!("{:.7}", request.anchor.latitude),
            "lng": format!("{:.7}", request.anchor.longitude),
            "maxItems": request.max_results,
            "country": request.country,
            "lang": request.language,
            "zoom": zoom_for_radius(request.radius_km_hint),
        });

        let response = self
            .client
            .post(url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        match status {
            StatusCode::OK | StatusCode::CREATED => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(ProviderError::Auth(format!(
                    "provider returned {status} for {}",
                    request.anchor.id
                )));
            }
            s if s.is_server_error() => {
                return Err(ProviderError::Transient(format!(
                    "provider returned {status}"
                )));
            }
            s => {
                let detail = response.text().await.unwrap_or_default();
                return Err(ProviderError::Api {
                    status: s.as_u16(),
                    detail: truncate(&detail, 200),
                });
            }
        }

        let text = response.text().await.map_err(classify_transport_error)?;
        Self::parse_record_list(&text, &request.anchor.id)
    }

    /// Accepts either a bare JSON array or an object wrapping the array in a
    /// `data` field; anything else is a malformed response.
    fn parse_record_list(
        body: &str,
        context: &str,
    ) -> Result<Vec<serde_json::Value>, ProviderError> {
        let value: serde_json::Value =
            serde_json::from_str(body).map_err(|e| ProviderError::MalformedResponse {
                context: context.to_string(),
                reason: format!("body is not JSON: {e}"),
            })?;

        match value {
            serde_json::Value::Array(entries) => Ok(entries),
            serde_json::Value::Object(mut map) => match map.remove("data") {
                Some(serde_json::Value::Array(entries)) => Ok(entries),
                _ => Err(ProviderError::MalformedResponse {
                    context: context.to_string(),
                    reason: "object response has no 'data' array".to_string(),
                }),
            },
            _ => Err(ProviderError::MalformedResponse {
                context: context.to_string(),
                reason: "response is neither an array nor an object".to_string(),
            }),
        }
    }
}

/// Timeouts and connection failures are transient; everything else from the
/// transport layer is surfaced as-is.
fn classify_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() || err.is_connect() {
        ProviderError::Transient(err.to_string())
    } else {
        ProviderError::Http(err)
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}…", &s[..end])
    }
}
