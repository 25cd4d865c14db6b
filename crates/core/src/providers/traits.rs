use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::rates::RateSnapshot;

/// Result of a rate request that reached the endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// HTTP 200 with a parsed `conversion_rates` mapping.
    Rates(RateSnapshot),
    /// Endpoint answered with a non-success status; no rates available.
    NoData { status: u16 },
}

/// Source of the latest rate quotes.
///
/// Network failures (DNS, refused connection, timeout) are returned as
/// `Err`, distinct from an endpoint that answered without data.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Human-readable name of this provider (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the latest rates quoted against `base`.
    async fn fetch_latest(&self, base: &str) -> Result<FetchOutcome, CoreError>;
}
