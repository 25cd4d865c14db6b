use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::CoreError;

use super::table::{Table, ToTable};

/// Latest-known snapshot of rates: currency code → units of that currency per
/// one unit of the base currency.
///
/// Serialized as a flat JSON object (`{"USD": 1.0, "EUR": 0.9, ...}`), which is
/// both the `conversion_rates` payload of the API and the cache file format.
/// Keys are kept in a `BTreeMap` so the rendered table is ordered by code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateSnapshot {
    rates: BTreeMap<String, f64>,
}

impl RateSnapshot {
    pub fn new(rates: BTreeMap<String, f64>) -> Self {
        Self { rates }
    }

    /// Build a snapshot from `(code, rate)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            rates: pairs.into_iter().map(|(c, r)| (c.into(), r)).collect(),
        }
    }

    /// Check that the base currency is present with a rate of exactly 1.0.
    pub fn validate_base(&self, base: &str) -> Result<(), CoreError> {
        match self.rates.get(base) {
            Some(&r) if r == 1.0 => Ok(()),
            Some(&r) => Err(CoreError::InvalidSnapshot(format!(
                "base currency {base} has rate {r}, expected 1.0"
            ))),
            None => Err(CoreError::InvalidSnapshot(format!(
                "base currency {base} missing from snapshot"
            ))),
        }
    }

    /// Rate of one base unit in `code`.
    pub fn rate(&self, code: &str) -> Result<f64, CoreError> {
        self.rates
            .get(code)
            .copied()
            .ok_or_else(|| CoreError::Lookup {
                currency: code.to_string(),
            })
    }

    /// Units of `to` per one unit of `from`, derived through the base currency.
    pub fn conversion_rate(&self, from: &str, to: &str) -> Result<f64, CoreError> {
        let from_rate = self.rate(from)?;
        let to_rate = self.rate(to)?;

        if !from_rate.is_finite() || from_rate <= 0.0 {
            return Err(CoreError::InvalidRate {
                currency: from.to_string(),
                rate: from_rate,
            });
        }
        if !to_rate.is_finite() || to_rate < 0.0 {
            return Err(CoreError::InvalidRate {
                currency: to.to_string(),
                rate: to_rate,
            });
        }

        Ok(to_rate / from_rate)
    }

    /// Human-readable conversion line, e.g. `1 EUR is equal to 166.6667 JPY`.
    pub fn conversion_text(&self, from: &str, to: &str) -> Result<String, CoreError> {
        let rate = self.conversion_rate(from, to)?;
        Ok(format!("1 {from} is equal to {rate:.4} {to}"))
    }

    pub fn rates(&self) -> &BTreeMap<String, f64> {
        &self.rates
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rates.contains_key(code)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl ToTable for RateSnapshot {
    fn to_table(&self) -> Table {
        let rows = self
            .rates
            .iter()
            .map(|(code, rate)| vec![code.clone(), rate.to_string()])
            .collect();
        Table::new(vec!["Currency".into(), "Rate".into()], rows)
    }
}
