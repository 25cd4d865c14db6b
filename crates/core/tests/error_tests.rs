// ═══════════════════════════════════════════════════════════════════
// Error Tests — CoreError variants, Display formatting, From impls
// ═══════════════════════════════════════════════════════════════════

use fx_dashboard_core::errors::CoreError;

// ── Display formatting ──────────────────────────────────────────────

mod display {
    use super::*;

    #[test]
    fn fetch() {
        let err = CoreError::Fetch("connection refused".into());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn timeout() {
        let err = CoreError::Timeout("operation timed out".into());
        assert_eq!(err.to_string(), "Request timed out: operation timed out");
    }

    #[test]
    fn no_data() {
        let err = CoreError::NoData { status: 404 };
        assert_eq!(
            err.to_string(),
            "No data: rate endpoint responded with HTTP 404"
        );
    }

    #[test]
    fn invalid_response() {
        let err = CoreError::InvalidResponse {
            provider: "ExchangeRate-API".into(),
            message: "missing conversion_rates".into(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid response from ExchangeRate-API: missing conversion_rates"
        );
    }

    #[test]
    fn cache_read() {
        let err = CoreError::CacheRead("cache is empty".into());
        assert_eq!(err.to_string(), "Cache read error: cache is empty");
    }

    #[test]
    fn lookup() {
        let err = CoreError::Lookup { currency: "HRK".into() };
        assert_eq!(
            err.to_string(),
            "Currency HRK is not quoted in the current rate snapshot"
        );
    }

    #[test]
    fn unknown_currency() {
        let err = CoreError::UnknownCurrency("XYZ".into());
        assert_eq!(err.to_string(), "Unknown currency code: XYZ");
    }

    #[test]
    fn undeclared_dependency() {
        let err = CoreError::UndeclaredDependency {
            calc: "conversion".into(),
            dependency: "#3".into(),
        };
        assert_eq!(
            err.to_string(),
            "Calculation 'conversion' read undeclared dependency '#3'"
        );
    }
}

// ── From impls ──────────────────────────────────────────────────────

mod conversions {
    use super::*;

    #[test]
    fn from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(CoreError::from(io), CoreError::FileIO(msg) if msg == "gone"));
    }

    #[test]
    fn from_toml_error() {
        let err = toml::from_str::<toml::Table>("= nope").unwrap_err();
        assert!(matches!(CoreError::from(err), CoreError::Config(_)));
    }

    #[test]
    fn from_csv_error() {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader("a,b\nc\n".as_bytes());
        let err = rdr.records().find_map(|r| r.err()).unwrap();
        assert!(matches!(CoreError::from(err), CoreError::Dataset(_)));
    }
}

// ── Redaction ───────────────────────────────────────────────────────

mod redaction {
    use super::*;

    #[test]
    fn strips_secret_from_network_messages() {
        let err = CoreError::Fetch("error sending request for url (https://h/v6/KEY/latest/USD)".into());
        assert_eq!(
            err.redact("KEY").to_string(),
            "Network error: error sending request for url (https://h/v6/<redacted>/latest/USD)"
        );
    }

    #[test]
    fn leaves_other_variants_alone() {
        let err = CoreError::NoData { status: 403 };
        assert_eq!(err.clone().redact("403"), err);
    }

    #[test]
    fn empty_secret_is_noop() {
        let err = CoreError::Timeout("slow".into());
        assert_eq!(err.clone().redact(""), err);
    }
}
