pub mod currency;
pub mod event;
pub mod historical;
pub mod rates;
pub mod settings;
pub mod table;
