// ═══════════════════════════════════════════════════════════════════
// Storage Tests — rate cache stores, historical CSV loading
// ═══════════════════════════════════════════════════════════════════

use chrono::NaiveDate;
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

use fx_dashboard_core::errors::CoreError;
use fx_dashboard_core::models::rates::RateSnapshot;
use fx_dashboard_core::storage::cache::{FileRateCache, MemoryRateCache, RateCache};
use fx_dashboard_core::storage::dataset::HistoricalLoader;

fn snapshot() -> RateSnapshot {
    RateSnapshot::from_pairs([("USD", 1.0), ("EUR", 0.9), ("JPY", 150.0), ("KWD", 0.30712)])
}

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ═══════════════════════════════════════════════════════════════════
// FileRateCache
// ═══════════════════════════════════════════════════════════════════

mod file_cache {
    use super::*;

    #[test]
    fn write_then_read_yields_equal_mapping() {
        let dir = tempdir().unwrap();
        let cache = FileRateCache::new(dir.path().join("exchange_rate.txt"));

        cache.write(&snapshot()).unwrap();
        assert_eq!(cache.read().unwrap(), snapshot());
    }

    #[test]
    fn file_holds_flat_json_object() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exchange_rate.txt");
        FileRateCache::new(&path).write(&snapshot()).unwrap();

        let raw: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let obj = raw.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        assert_eq!(obj["JPY"].as_f64(), Some(150.0));
    }

    #[test]
    fn write_replaces_previous_content() {
        let dir = tempdir().unwrap();
        let cache = FileRateCache::new(dir.path().join("exchange_rate.txt"));

        cache.write(&snapshot()).unwrap();
        let smaller = RateSnapshot::from_pairs([("USD", 1.0)]);
        cache.write(&smaller).unwrap();
        assert_eq!(cache.read().unwrap(), smaller);
    }

    #[test]
    fn missing_file_is_cache_read_error() {
        let dir = tempdir().unwrap();
        let cache = FileRateCache::new(dir.path().join("never_written.txt"));
        assert!(matches!(cache.read(), Err(CoreError::CacheRead(_))));
    }

    #[test]
    fn malformed_file_is_cache_read_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("exchange_rate.txt");
        std::fs::write(&path, r#"{"USD": 1.0, "EUR": "#).unwrap();
        assert!(matches!(FileRateCache::new(&path).read(), Err(CoreError::CacheRead(_))));

        std::fs::write(&path, r#"{"USD": "one"}"#).unwrap();
        assert!(matches!(FileRateCache::new(&path).read(), Err(CoreError::CacheRead(_))));
    }

    #[test]
    fn unwritable_path_is_cache_write_error() {
        let dir = tempdir().unwrap();
        let cache = FileRateCache::new(dir.path().join("missing_dir").join("rates.txt"));
        assert!(matches!(cache.write(&snapshot()), Err(CoreError::CacheWrite(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════
// MemoryRateCache
// ═══════════════════════════════════════════════════════════════════

mod memory_cache {
    use super::*;

    #[test]
    fn empty_cache_fails_to_read() {
        assert!(matches!(MemoryRateCache::new().read(), Err(CoreError::CacheRead(_))));
    }

    #[test]
    fn round_trip_through_serialized_form() {
        let cache = MemoryRateCache::new();
        cache.write(&snapshot()).unwrap();
        assert_eq!(cache.read().unwrap(), snapshot());
        assert!(cache.raw().unwrap().starts_with('{'));
    }

    #[test]
    fn corrupted_content_fails_to_read() {
        let cache = MemoryRateCache::with_raw("not json");
        assert!(matches!(cache.read(), Err(CoreError::CacheRead(_))));
    }
}

// ═══════════════════════════════════════════════════════════════════
// HistoricalLoader
// ═══════════════════════════════════════════════════════════════════

mod historical_loader {
    use super::*;

    const CSV: &str = "\
Date,EUR,JPY
2020-01-01,0.89,108.5
2020-01-02,0.90,
2020-01-03,0.91,109.1
";

    #[test]
    fn loads_rate_columns_in_order() {
        let table = HistoricalLoader::load_from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["EUR".to_string(), "JPY".to_string()]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.first_date(), Some(d("2020-01-01")));
        assert_eq!(table.last_date(), Some(d("2020-01-03")));
        assert_eq!(table.records()[1].values, vec![Some(0.90), None]);
    }

    #[test]
    fn date_column_can_be_anywhere_and_any_case() {
        let csv = "GBP,date\n0.78,2021-03-01 00:00:00\n0.79,2021-03-02 00:00:00\n";
        let table = HistoricalLoader::load_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["GBP".to_string()]);
        assert_eq!(table.records()[1].date, d("2021-03-02"));
    }

    #[test]
    fn missing_date_column_is_rejected() {
        let csv = "Day,EUR\n2020-01-01,0.9\n";
        let err = HistoricalLoader::load_from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CoreError::Dataset(msg) if msg.contains("Date")));
    }

    #[test]
    fn unparseable_date_is_rejected() {
        let csv = "Date,EUR\nlast tuesday,0.9\n";
        assert!(matches!(
            HistoricalLoader::load_from_reader(csv.as_bytes()),
            Err(CoreError::Dataset(_))
        ));
    }

    #[test]
    fn decreasing_dates_are_rejected() {
        let csv = "Date,EUR\n2020-01-02,0.9\n2020-01-01,0.9\n";
        assert!(matches!(
            HistoricalLoader::load_from_reader(csv.as_bytes()),
            Err(CoreError::Dataset(_))
        ));
    }

    #[test]
    fn table_without_rate_columns_is_rejected() {
        let csv = "Date\n2020-01-01\n";
        assert!(HistoricalLoader::load_from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn loads_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{CSV}").unwrap();
        let table = HistoricalLoader::load_from_path(file.path()).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn missing_path_is_dataset_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            HistoricalLoader::load_from_path(&dir.path().join("nope.csv")),
            Err(CoreError::Dataset(_))
        ));
    }
}
