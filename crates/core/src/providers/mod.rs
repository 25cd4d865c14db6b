pub mod traits;

// API provider implementations
pub mod exchangerate_api;
