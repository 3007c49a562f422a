//! HTTP client for the routing matrix API.
//!
//! Wraps `reqwest` with typed response handling, the per-request element
//! cap, transient-error retry, and the availability self-test probe. The
//! client is explicitly constructed and injected by callers (no
//! process-global instance) so tests can point it at a mock server.

use std::time::Duration;

use reqwest::{Client, Url};

use hatod_core::Coordinate;

use crate::error::RoutingError;
use crate::retry::retry_with_backoff;
use crate::types::{MatrixOutcome, MatrixResponse};

/// Provider-imposed ceiling on `origins × destinations` per request.
pub const MAX_MATRIX_ELEMENTS: usize = 625;

const DEFAULT_BASE_URL: &str = "https://routes.hatod.internal/matrix";
const DEFAULT_MAX_RETRIES: u32 = 2;
const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Client for the routing matrix API.
///
/// Use [`RoutingClient::new`] for production or
/// [`RoutingClient::with_base_url`] to point at a mock server in tests.
pub struct RoutingClient {
    client: Client,
    api_key: Option<String>,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl RoutingClient {
    /// Creates a new client pointed at the production routing API.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: Option<&str>, timeout_secs: u64) -> Result<Self, RoutingError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RoutingError::ApiError`] if `base_url`
    /// is not a valid URL.
    pub fn with_base_url(
        api_key: Option<&str>,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("hatod/0.1 (merchant-discovery)")
            .build()?;

        let base_url = Url::parse(base_url)
            .map_err(|e| RoutingError::ApiError(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            api_key: api_key.map(ToOwned::to_owned),
            base_url,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Overrides the transient-error retry policy.
    #[must_use]
    pub fn retry_policy(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Requests routed distance/duration from each origin to the destination.
    ///
    /// Travel mode is fixed to the two-wheeler profile with traffic-aware
    /// departure. Outcomes are returned in origin input order, one per
    /// origin. Transient failures are retried per the client's policy.
    ///
    /// # Errors
    ///
    /// - [`RoutingError::TooManyElements`] if `origins` exceeds
    ///   [`MAX_MATRIX_ELEMENTS`]; chunk above this client.
    /// - [`RoutingError::ApiError`] on a non-OK envelope status or a row
    ///   count that does not match the request.
    /// - [`RoutingError::Http`] on network failure or non-2xx status after
    ///   retries are exhausted.
    /// - [`RoutingError::Deserialize`] if the body is not the expected shape.
    pub async fn distance_matrix(
        &self,
        origins: &[Coordinate],
        destination: Coordinate,
    ) -> Result<Vec<MatrixOutcome>, RoutingError> {
        if origins.is_empty() {
            return Ok(Vec::new());
        }
        if origins.len() > MAX_MATRIX_ELEMENTS {
            return Err(RoutingError::TooManyElements {
                requested: origins.len(),
                max: MAX_MATRIX_ELEMENTS,
            });
        }

        let url = self.build_url(origins, destination);
        let response = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.request_matrix(url.clone(), None)
        })
        .await?;

        Self::outcomes_from(response, origins.len())
    }

    /// Availability self-test: one trivial probe→probe request.
    ///
    /// Used to fail a whole query early with a descriptive error instead of
    /// degrading per-merchant. No retries; a slow or broken provider should
    /// surface immediately.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError`] if the probe request fails or the envelope
    /// status is not OK.
    pub async fn self_test(
        &self,
        probe: Coordinate,
        timeout: Duration,
    ) -> Result<(), RoutingError> {
        let url = self.build_url(&[probe], probe);
        let response = self.request_matrix(url, Some(timeout)).await?;
        Self::outcomes_from(response, 1).map(|_| ())
    }

    /// Builds the matrix request URL: pipe-separated `lat,lng` origins, a
    /// single destination, the two-wheeler mode, and traffic-aware departure.
    fn build_url(&self, origins: &[Coordinate], destination: Coordinate) -> Url {
        let origins_param = origins
            .iter()
            .map(|c| format!("{},{}", c.latitude, c.longitude))
            .collect::<Vec<_>>()
            .join("|");
        let destination_param = format!("{},{}", destination.latitude, destination.longitude);

        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("origins", &origins_param);
            pairs.append_pair("destinations", &destination_param);
            pairs.append_pair("mode", "two_wheeler");
            pairs.append_pair("departure_time", "now");
            if let Some(key) = &self.api_key {
                pairs.append_pair("key", key);
            }
        }
        url
    }

    /// Sends the request, asserts a 2xx status, parses the envelope, and
    /// checks the top-level status field.
    async fn request_matrix(
        &self,
        url: Url,
        timeout: Option<Duration>,
    ) -> Result<MatrixResponse, RoutingError> {
        let mut request = self.client.get(url.clone());
        if let Some(t) = timeout {
            request = request.timeout(t);
        }
        let response = request.send().await?.error_for_status()?;
        let body = response.text().await?;
        let parsed: MatrixResponse =
            serde_json::from_str(&body).map_err(|e| RoutingError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        if parsed.status != "OK" {
            let detail = parsed.error_message.unwrap_or_default();
            return Err(RoutingError::ApiError(format!(
                "{} {detail}",
                parsed.status
            )));
        }
        Ok(parsed)
    }

    /// Flattens a one-destination matrix response into per-origin outcomes.
    fn outcomes_from(
        response: MatrixResponse,
        expected: usize,
    ) -> Result<Vec<MatrixOutcome>, RoutingError> {
        if response.rows.len() != expected {
            return Err(RoutingError::ApiError(format!(
                "expected {expected} rows, got {}",
                response.rows.len()
            )));
        }
        response
            .rows
            .into_iter()
            .map(|mut row| {
                if row.elements.len() == 1 {
                    Ok(row.elements.remove(0).into_outcome())
                } else {
                    Err(RoutingError::ApiError(format!(
                        "expected 1 element per row, got {}",
                        row.elements.len()
                    )))
                }
            })
            .collect()
    }
}
