use thiserror::Error;

/// Unified error type for the entire fx-dashboard-core library.
/// Every public function returns `Result<T, CoreError>`.
///
/// Errors are `Clone` because a failed calculation memoizes its error and
/// hands a copy to every dependent that reads it.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    // ── Network / Rate endpoint ─────────────────────────────────────
    #[error("Network error: {0}")]
    Fetch(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("No data: rate endpoint responded with HTTP {status}")]
    NoData { status: u16 },

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    // ── Cache file ──────────────────────────────────────────────────
    #[error("Cache read error: {0}")]
    CacheRead(String),

    #[error("Cache write error: {0}")]
    CacheWrite(String),

    // ── Rates / Currencies ──────────────────────────────────────────
    #[error("Currency {currency} is not quoted in the current rate snapshot")]
    Lookup { currency: String },

    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    #[error("Invalid rate for {currency}: {rate}")]
    InvalidRate { currency: String, rate: f64 },

    #[error("Invalid rate snapshot: {0}")]
    InvalidSnapshot(String),

    // ── Historical dataset ──────────────────────────────────────────
    #[error("Historical dataset error: {0}")]
    Dataset(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Reactive graph ──────────────────────────────────────────────
    #[error("Unknown reactive node: {0}")]
    UnknownNode(usize),

    #[error("Type mismatch reading node '{node}': expected {expected}")]
    TypeMismatch { node: String, expected: &'static str },

    #[error("Calculation '{calc}' read undeclared dependency '{dependency}'")]
    UndeclaredDependency { calc: String, dependency: String },
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Dataset(e.to_string())
    }
}

impl From<toml::de::Error> for CoreError {
    fn from(e: toml::de::Error) -> Self {
        CoreError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // reqwest errors carry the full URL, and the API key lives in its path.
        let msg = match e.url() {
            Some(url) => {
                let full = url.as_str();
                let host = url.host_str().unwrap_or("<unknown host>");
                e.to_string().replace(full, &format!("{}://{host}/<redacted>", url.scheme()))
            }
            None => e.to_string(),
        };
        if e.is_timeout() {
            CoreError::Timeout(msg)
        } else {
            CoreError::Fetch(msg)
        }
    }
}

impl CoreError {
    /// Strip a secret from an error message (used for API keys embedded in URLs).
    pub fn redact(self, secret: &str) -> Self {
        if secret.is_empty() {
            return self;
        }
        let scrub = |s: String| s.replace(secret, "<redacted>");
        match self {
            CoreError::Fetch(m) => CoreError::Fetch(scrub(m)),
            CoreError::Timeout(m) => CoreError::Timeout(scrub(m)),
            CoreError::InvalidResponse { provider, message } => CoreError::InvalidResponse {
                provider,
                message: scrub(message),
            },
            other => other,
        }
    }
}
