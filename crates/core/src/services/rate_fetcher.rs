use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::CoreError;
use crate::models::rates::RateSnapshot;
use crate::providers::traits::{FetchOutcome, RateProvider};
use crate::reactive::{Calculation, Deps, Source};
use crate::storage::cache::RateCache;

/// Fetches the latest snapshot and persists it to the cache store.
///
/// Every call issues one live request; there is no minimum interval between
/// calls and no retry. Rate limiting is up to the caller (the dashboard only
/// fetches when its refresh source changes).
#[derive(Clone)]
pub struct RateFetcher {
    provider: Arc<dyn RateProvider>,
    cache: Arc<dyn RateCache>,
    base: String,
}

impl RateFetcher {
    pub fn new(provider: Arc<dyn RateProvider>, cache: Arc<dyn RateCache>, base: impl Into<String>) -> Self {
        Self {
            provider,
            cache,
            base: base.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Fetch the latest rates.
    ///
    /// - `Ok(Rates)`: the snapshot was written to the cache, replacing prior content.
    /// - `Ok(NoData)`: the endpoint answered with a non-200 status; the cache is untouched.
    /// - `Err`: the endpoint could not be reached, or the snapshot lacks the base currency.
    pub async fn fetch(&self) -> Result<FetchOutcome, CoreError> {
        log::info!("fetching latest {} rates from {}", self.base, self.provider.name());
        let outcome = self.provider.fetch_latest(&self.base).await?;

        match &outcome {
            FetchOutcome::Rates(snapshot) => {
                snapshot.validate_base(&self.base)?;
                self.cache.write(snapshot)?;
                log::info!("received {} rates", snapshot.len());
            }
            FetchOutcome::NoData { status } => {
                log::warn!("{} returned no data (HTTP {status})", self.provider.name());
            }
        }
        Ok(outcome)
    }
}

/// Calculation that performs a live fetch whenever the refresh source changes.
/// `NoData` becomes an error so dependents render an error state.
pub struct LatestRatesCalc {
    fetcher: RateFetcher,
    refresh: Source<u64>,
}

impl LatestRatesCalc {
    pub fn new(fetcher: RateFetcher, refresh: Source<u64>) -> Self {
        Self { fetcher, refresh }
    }
}

#[async_trait]
impl Calculation for LatestRatesCalc {
    type Output = RateSnapshot;

    async fn evaluate(&self, deps: &Deps) -> Result<RateSnapshot, CoreError> {
        let generation = *deps.get(&self.refresh)?;
        log::debug!("latest rates, refresh #{generation}");
        match self.fetcher.fetch().await? {
            FetchOutcome::Rates(snapshot) => Ok(snapshot),
            FetchOutcome::NoData { status } => Err(CoreError::NoData { status }),
        }
    }
}
