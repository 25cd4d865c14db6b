use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

use super::table::{Table, ToTable};

/// Inclusive date range selected in the UI.
///
/// `start <= end` is not enforced: an inverted range simply matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Range from `start` through today in the local time zone.
    pub fn until_today(start: NaiveDate) -> Self {
        Self::new(start, chrono::Local::now().date_naive())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

/// One dated row of the historical dataset. `values[i]` belongs to
/// `HistoricalTable::columns()[i]`; `None` marks an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub date: NaiveDate,
    pub values: Vec<Option<f64>>,
}

/// Immutable, date-ordered table of historical rates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalTable {
    columns: Vec<String>,
    records: Vec<HistoricalRecord>,
}

impl HistoricalTable {
    /// Build a table, checking that dates are non-decreasing and every row
    /// has one value per column.
    pub fn new(columns: Vec<String>, records: Vec<HistoricalRecord>) -> Result<Self, CoreError> {
        for (i, record) in records.iter().enumerate() {
            if record.values.len() != columns.len() {
                return Err(CoreError::Dataset(format!(
                    "row {} has {} values, expected {}",
                    i + 1,
                    record.values.len(),
                    columns.len()
                )));
            }
        }
        if let Some(i) = records.windows(2).position(|w| w[0].date > w[1].date) {
            return Err(CoreError::Dataset(format!(
                "dates out of order at row {}: {} follows {}",
                i + 2,
                records[i + 1].date,
                records[i].date
            )));
        }
        Ok(Self { columns, records })
    }

    /// Rate column names (the `Date` column is not included).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[HistoricalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Records whose date lies within `range` (inclusive), as a new table in
    /// source order. Empty when nothing matches or the range is inverted.
    pub fn filter(&self, range: &DateRange) -> HistoricalTable {
        if range.is_inverted() {
            return self.empty_like();
        }
        // Dates are sorted, so the matching rows form one contiguous slice.
        let start = self.records.partition_point(|r| r.date < range.start);
        let end = self.records.partition_point(|r| r.date <= range.end);
        let records = if start < end {
            self.records[start..end].to_vec()
        } else {
            Vec::new()
        };
        HistoricalTable {
            columns: self.columns.clone(),
            records,
        }
    }

    /// `(date, value)` series for one rate column, skipping empty cells.
    pub fn column(&self, name: &str) -> Option<Vec<(NaiveDate, f64)>> {
        let idx = self
            .columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))?;
        Some(
            self.records
                .iter()
                .filter_map(|r| r.values[idx].map(|v| (r.date, v)))
                .collect(),
        )
    }

    fn empty_like(&self) -> HistoricalTable {
        HistoricalTable {
            columns: self.columns.clone(),
            records: Vec::new(),
        }
    }
}

impl ToTable for HistoricalTable {
    fn to_table(&self) -> Table {
        let mut columns = Vec::with_capacity(self.columns.len() + 1);
        columns.push("Date".to_string());
        columns.extend(self.columns.iter().cloned());

        let rows = self
            .records
            .iter()
            .map(|r| {
                let mut row = Vec::with_capacity(r.values.len() + 1);
                row.push(r.date.format("%Y-%m-%d").to_string());
                row.extend(r.values.iter().map(|v| v.map(|x| x.to_string()).unwrap_or_default()));
                row
            })
            .collect();
        Table::new(columns, rows)
    }
}
