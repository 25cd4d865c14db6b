use serde::{Deserialize, Serialize};

use super::historical::DateRange;

/// A user interaction that mutates one reactive source.
///
/// Events are applied one at a time, in arrival order, each followed by
/// exactly one settle pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UiEvent {
    SetInputCurrency(String),
    SetOutputCurrency(String),
    SetDateRange(DateRange),
    /// Re-fetch the live rates.
    Refresh,
}

impl std::fmt::Display for UiEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UiEvent::SetInputCurrency(c) => write!(f, "input currency → {c}"),
            UiEvent::SetOutputCurrency(c) => write!(f, "output currency → {c}"),
            UiEvent::SetDateRange(r) => write!(f, "date range → {}..{}", r.start, r.end),
            UiEvent::Refresh => write!(f, "refresh"),
        }
    }
}
