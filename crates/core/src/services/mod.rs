pub mod rate_fetcher;
pub mod session;
