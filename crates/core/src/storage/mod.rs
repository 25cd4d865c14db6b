pub mod cache;
pub mod dataset;
