use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::CoreError;

use super::currency;

/// Environment variable that overrides `api_key`.
pub const API_KEY_ENV: &str = "EXCHANGE_RATE_API_KEY";

/// Dashboard configuration. Every field has a default, so an empty TOML
/// document is a valid configuration.
///
/// Dates are written as quoted strings (`default_start = "2004-01-01"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Currency all fetched rates are quoted against.
    pub base_currency: String,

    /// Rate endpoint root; the request path is `{api_base_url}/{api_key}/latest/{base}`.
    pub api_base_url: String,

    pub api_key: String,

    /// Timeout for the rate request, in seconds.
    pub request_timeout_secs: u64,

    /// Where the latest snapshot is cached.
    pub cache_path: PathBuf,

    /// Historical CSV. Relative paths resolve against the application's directory.
    pub historical_path: PathBuf,

    /// Default start of the date-range input (the end defaults to today).
    pub default_start: NaiveDate,

    pub input_currency: String,
    pub output_currency: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_currency: currency::BASE_CURRENCY.to_string(),
            api_base_url: "https://v6.exchangerate-api.com/v6".to_string(),
            api_key: String::new(),
            request_timeout_secs: 30,
            cache_path: PathBuf::from("exchange_rate.txt"),
            historical_path: PathBuf::from("historical_rates_fixed.csv"),
            default_start: NaiveDate::from_ymd_opt(2004, 1, 1).unwrap_or_default(),
            input_currency: "USD".to_string(),
            output_currency: "EUR".to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    pub fn to_toml(&self) -> Result<String, CoreError> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))
    }

    /// Override the API key from `EXCHANGE_RATE_API_KEY` when it is set.
    pub fn apply_env(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.api_key = key.trim().to_string();
            }
        }
        self
    }

    /// Check currency codes against the catalogue and normalize them to upper case.
    pub fn validate(mut self) -> Result<Self, CoreError> {
        self.base_currency = currency::normalize(&self.base_currency)
            .map_err(|e| CoreError::Config(format!("base_currency: {e}")))?;
        self.input_currency = currency::normalize(&self.input_currency)
            .map_err(|e| CoreError::Config(format!("input_currency: {e}")))?;
        self.output_currency = currency::normalize(&self.output_currency)
            .map_err(|e| CoreError::Config(format!("output_currency: {e}")))?;
        if self.request_timeout_secs == 0 {
            return Err(CoreError::Config(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(CoreError::Config("api_base_url must not be empty".into()));
        }
        Ok(self)
    }

    /// Copy safe to log: the API key is masked.
    pub fn redacted(mut self) -> Self {
        if !self.api_key.is_empty() {
            self.api_key = "<redacted>".to_string();
        }
        self
    }

    /// Resolve `historical_path` against `app_dir` when it is relative.
    pub fn historical_path_in(&self, app_dir: &Path) -> PathBuf {
        if self.historical_path.is_absolute() {
            self.historical_path.clone()
        } else {
            app_dir.join(&self.historical_path)
        }
    }
}
