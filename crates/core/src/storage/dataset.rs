use chrono::{NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord};
use std::io::Read;
use std::path::Path;

use crate::errors::CoreError;
use crate::models::historical::{HistoricalRecord, HistoricalTable};

/// Name of the required date column (matched case-insensitively).
pub const DATE_COLUMN: &str = "Date";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Loads the historical rate table from CSV: one `Date` column plus one or
/// more rate columns. Loaded once at startup; the result is immutable.
pub struct HistoricalLoader;

impl HistoricalLoader {
    pub fn load_from_path(path: &Path) -> Result<HistoricalTable, CoreError> {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| {
                CoreError::Dataset(format!("Failed to open {}: {e}", path.display()))
            })?;
        let table = Self::load(rdr)?;
        log::info!(
            "loaded {} historical rows ({} rate columns) from {}",
            table.len(),
            table.columns().len(),
            path.display()
        );
        Ok(table)
    }

    pub fn load_from_reader<R: Read>(reader: R) -> Result<HistoricalTable, CoreError> {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        Self::load(rdr)
    }

    fn load<R: Read>(mut rdr: csv::Reader<R>) -> Result<HistoricalTable, CoreError> {
        let headers = rdr
            .headers()
            .map_err(|e| CoreError::Dataset(format!("Failed to read headers: {e}")))?
            .clone();
        let date_idx = Self::find_column(&headers, DATE_COLUMN)?;

        let columns: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != date_idx && !h.is_empty())
            .map(|(_, h)| h.to_string())
            .collect();
        let value_idx: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| *i != date_idx && !h.is_empty())
            .map(|(i, _)| i)
            .collect();
        if columns.is_empty() {
            return Err(CoreError::Dataset("no rate columns found".into()));
        }

        let mut records = Vec::new();
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let line = row + 2;
            let raw_date = record.get(date_idx).unwrap_or("");
            let date = parse_date(raw_date).ok_or_else(|| {
                CoreError::Dataset(format!("row {line}: cannot parse date '{raw_date}'"))
            })?;
            let values = value_idx
                .iter()
                .zip(&columns)
                .map(|(&i, name)| parse_value(record.get(i).unwrap_or(""), name, line))
                .collect::<Result<Vec<_>, _>>()?;
            records.push(HistoricalRecord { date, values });
        }

        HistoricalTable::new(columns, records)
    }

    fn find_column(headers: &StringRecord, name: &str) -> Result<usize, CoreError> {
        headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(name))
            .ok_or_else(|| CoreError::Dataset(format!("Column '{name}' not found")))
    }
}

/// Parse a calendar date in any of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(raw, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(raw, f).ok())
                .map(|dt| dt.date())
        })
}

fn parse_value(raw: &str, column: &str, line: usize) -> Result<Option<f64>, CoreError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| {
        CoreError::Dataset(format!("row {line}: invalid value '{raw}' in column '{column}'"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
        for raw in ["2020-01-02", "2020/01/02", "01/02/2020", "2020-01-02 00:00:00"] {
            assert_eq!(parse_date(raw), Some(expected), "layout {raw}");
        }
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn empty_and_nan_cells_are_missing() {
        assert_eq!(parse_value("", "EUR", 2).unwrap(), None);
        assert_eq!(parse_value("NaN", "EUR", 2).unwrap(), None);
        assert_eq!(parse_value("0.91", "EUR", 2).unwrap(), Some(0.91));
        assert!(parse_value("abc", "EUR", 2).is_err());
    }
}
