use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::errors::CoreError;
use crate::models::rates::RateSnapshot;
use super::traits::{FetchOutcome, RateProvider};

pub const DEFAULT_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";

const PROVIDER_NAME: &str = "ExchangeRate-API";

/// exchangerate-api.com v6 provider.
///
/// - **Endpoint**: `GET {base_url}/{api_key}/latest/{base}`
/// - **Auth**: API key embedded in the URL path.
/// - **Response**: `{ "conversion_rates": { "USD": 1, "EUR": 0.92, ... }, ... }`
///
/// One request per call; no retries.
pub struct ExchangeRateApiProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateApiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_options(DEFAULT_BASE_URL, api_key, Duration::from_secs(30))
    }

    pub fn with_options(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Full request URL for `base`. Contains the API key; never log it.
    pub fn latest_url(&self, base: &str) -> String {
        format!("{}/{}/latest/{}", self.base_url, self.api_key, base.to_uppercase())
    }
}

// ── ExchangeRate-API response types ─────────────────────────────────

#[derive(Deserialize)]
struct LatestResponse {
    conversion_rates: RateSnapshot,
}

/// Interpret a response from the `latest` endpoint.
///
/// Only HTTP 200 yields rates; any other status is `NoData`. A 200 whose body
/// lacks a well-formed `conversion_rates` object is `InvalidResponse`.
pub fn parse_latest_response(status: u16, body: &str) -> Result<FetchOutcome, CoreError> {
    if status != 200 {
        return Ok(FetchOutcome::NoData { status });
    }
    let resp: LatestResponse = serde_json::from_str(body).map_err(|e| CoreError::InvalidResponse {
        provider: PROVIDER_NAME.into(),
        message: format!("Failed to parse conversion_rates: {e}"),
    })?;
    Ok(FetchOutcome::Rates(resp.conversion_rates))
}

#[async_trait]
impl RateProvider for ExchangeRateApiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_latest(&self, base: &str) -> Result<FetchOutcome, CoreError> {
        let url = self.latest_url(base);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CoreError::from(e).redact(&self.api_key))?;
        let status = resp.status().as_u16();
        if status != 200 {
            // Body is not read: a broken error body must not turn NoData into Fetch.
            log::warn!("{PROVIDER_NAME} responded with HTTP {status} for base {base}");
            return Ok(FetchOutcome::NoData { status });
        }

        let body = resp
            .text()
            .await
            .map_err(|e| CoreError::from(e).redact(&self.api_key))?;
        parse_latest_response(status, &body)
    }
}
