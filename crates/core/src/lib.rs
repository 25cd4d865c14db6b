pub mod errors;
pub mod models;
pub mod providers;
pub mod reactive;
pub mod services;
pub mod storage;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use models::{
    currency,
    event::UiEvent,
    historical::{DateRange, HistoricalTable},
    rates::RateSnapshot,
    settings::Settings,
};
use providers::{exchangerate_api::ExchangeRateApiProvider, traits::RateProvider};
use reactive::{Binding, BindingSet, Calc, ReactiveGraph, Reactive, RenderUpdate, Source};
use services::rate_fetcher::{LatestRatesCalc, RateFetcher};
use storage::{
    cache::{FileRateCache, RateCache},
    dataset::HistoricalLoader,
};

use errors::CoreError;

/// Binding names, in render order.
pub const CONVERSION_BINDING: &str = "conversion";
pub const RATES_BINDING: &str = "rates";
pub const HISTORY_BINDING: &str = "history";

/// Main entry point for the FX dashboard core library.
///
/// Owns the reactive graph wiring the UI inputs to the computed outputs:
///
/// ```text
/// refresh ──► latest_rates ──► cached_rates ──┬──► [rates table]
///                                             └─┐
/// input_currency ───────────────────────────► conversion ──► [conversion value box]
/// output_currency ──────────────────────────┘
/// date_range ──► filtered_history ──► [history table]
/// ```
#[must_use]
pub struct FxDashboard {
    graph: ReactiveGraph,
    bindings: BindingSet,
    input_currency: Source<String>,
    output_currency: Source<String>,
    date_range: Source<DateRange>,
    refresh: Source<u64>,
    latest_rates: Calc<RateSnapshot>,
    cached_rates: Calc<RateSnapshot>,
    conversion: Calc<String>,
    filtered_history: Calc<HistoricalTable>,
    refresh_count: u64,
}

impl std::fmt::Debug for FxDashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FxDashboard")
            .field("graph", &self.graph)
            .field("bindings", &self.bindings.len())
            .field("refresh_count", &self.refresh_count)
            .finish()
    }
}

impl FxDashboard {
    /// Build a dashboard from injected collaborators.
    ///
    /// `settings` supplies the base currency and initial input values; the
    /// date range starts at `settings.default_start` and ends today.
    pub fn new(
        settings: &Settings,
        provider: Arc<dyn RateProvider>,
        cache: Arc<dyn RateCache>,
        history: HistoricalTable,
    ) -> Result<Self, CoreError> {
        let range = DateRange::until_today(settings.default_start);
        Self::with_range(settings, provider, cache, history, range)
    }

    /// Like [`new`](Self::new) with an explicit initial date range.
    pub fn with_range(
        settings: &Settings,
        provider: Arc<dyn RateProvider>,
        cache: Arc<dyn RateCache>,
        history: HistoricalTable,
        range: DateRange,
    ) -> Result<Self, CoreError> {
        let input = currency::normalize(&settings.input_currency)?;
        let output = currency::normalize(&settings.output_currency)?;
        let base = currency::normalize(&settings.base_currency)?;
        let history = Arc::new(history);

        let mut graph = ReactiveGraph::new();

        // ── Sources ─────────────────────────────────────────────────
        let input_currency = graph.source("input_currency", input);
        let output_currency = graph.source("output_currency", output);
        let date_range = graph.source("date_range", range);
        let refresh = graph.source("refresh", 0u64);

        // ── Calculations ────────────────────────────────────────────
        let fetcher = RateFetcher::new(provider, cache.clone(), base);
        let latest_rates = graph.calculation(
            "latest_rates",
            &[refresh.id()],
            LatestRatesCalc::new(fetcher, refresh),
        )?;

        let cached_rates = graph.calc("cached_rates", &[latest_rates.id()], move |deps| {
            deps.get(&latest_rates)?;
            cache.read()
        })?;

        let conversion = graph.calc(
            "conversion",
            &[cached_rates.id(), input_currency.id(), output_currency.id()],
            move |deps| {
                let rates = deps.get(&cached_rates)?;
                let from = deps.get(&input_currency)?;
                let to = deps.get(&output_currency)?;
                rates.conversion_text(from, to)
            },
        )?;

        let filtered_history = graph.calc("filtered_history", &[date_range.id()], move |deps| {
            let range = deps.get(&date_range)?;
            Ok(history.filter(range))
        })?;

        // ── Output bindings ─────────────────────────────────────────
        let mut bindings = BindingSet::new();
        bindings.add(Binding::value_box(CONVERSION_BINDING, "Conversion Rate", &conversion));
        bindings.add(Binding::table(RATES_BINDING, &cached_rates));
        bindings.add(Binding::table(HISTORY_BINDING, &filtered_history));

        Ok(Self {
            graph,
            bindings,
            input_currency,
            output_currency,
            date_range,
            refresh,
            latest_rates,
            cached_rates,
            conversion,
            filtered_history,
            refresh_count: 0,
        })
    }

    /// Build a dashboard with the live exchange-rate provider, the file cache
    /// and the historical CSV. Relative historical paths resolve against `app_dir`.
    pub fn from_settings(settings: &Settings, app_dir: &Path) -> Result<Self, CoreError> {
        let provider = ExchangeRateApiProvider::with_options(
            settings.api_base_url.clone(),
            settings.api_key.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        );
        let cache = FileRateCache::new(settings.cache_path.clone());
        let history = HistoricalLoader::load_from_path(&settings.historical_path_in(app_dir))?;
        Self::new(settings, Arc::new(provider), Arc::new(cache), history)
    }

    // ── Events ──────────────────────────────────────────────────────

    /// Apply one UI event to its source. Unknown currency codes are rejected
    /// without touching the graph.
    pub fn apply(&mut self, event: &UiEvent) -> Result<(), CoreError> {
        match event {
            UiEvent::SetInputCurrency(code) => {
                let code = currency::normalize(code)?;
                self.graph.set(&self.input_currency, code)?;
            }
            UiEvent::SetOutputCurrency(code) => {
                let code = currency::normalize(code)?;
                self.graph.set(&self.output_currency, code)?;
            }
            UiEvent::SetDateRange(range) => {
                self.graph.set(&self.date_range, *range)?;
            }
            UiEvent::Refresh => {
                self.refresh_count += 1;
                self.graph.set(&self.refresh, self.refresh_count)?;
            }
        }
        Ok(())
    }

    /// Settle pass: bring every binding up to date and return the ones that re-rendered.
    pub async fn settle(&mut self) -> Vec<RenderUpdate> {
        self.bindings.settle(&mut self.graph).await
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// `1 {from} is equal to {rate} {to}` for the current selection.
    pub async fn conversion_text(&mut self) -> Result<Arc<String>, CoreError> {
        self.graph.get(&self.conversion).await
    }

    /// Snapshot as read back from the cache.
    pub async fn rates(&mut self) -> Result<Arc<RateSnapshot>, CoreError> {
        self.graph.get(&self.cached_rates).await
    }

    /// Snapshot as returned by the last fetch.
    pub async fn latest_rates(&mut self) -> Result<Arc<RateSnapshot>, CoreError> {
        self.graph.get(&self.latest_rates).await
    }

    /// Historical rows within the selected range.
    pub async fn filtered_history(&mut self) -> Result<Arc<HistoricalTable>, CoreError> {
        self.graph.get(&self.filtered_history).await
    }

    pub async fn date_range(&mut self) -> Result<DateRange, CoreError> {
        Ok(*self.graph.get(&self.date_range).await?)
    }

    pub async fn input_currency(&mut self) -> Result<Arc<String>, CoreError> {
        self.graph.get(&self.input_currency).await
    }

    pub async fn output_currency(&mut self) -> Result<Arc<String>, CoreError> {
        self.graph.get(&self.output_currency).await
    }

    /// Number of live fetches performed so far.
    pub fn fetch_count(&self) -> u64 {
        self.graph.evaluations(self.latest_rates.id()).unwrap_or(0)
    }
}
