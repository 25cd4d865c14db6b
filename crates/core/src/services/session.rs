use tokio::sync::mpsc;

use crate::errors::CoreError;
use crate::models::event::UiEvent;
use crate::reactive::RenderUpdate;
use crate::FxDashboard;

/// Where rendered output goes (a terminal, a test recorder, ...).
pub trait Surface {
    fn present(&mut self, update: &RenderUpdate);

    /// Called when an event is rejected (e.g. a currency outside the catalogue).
    fn rejected(&mut self, _event: &UiEvent, _error: &CoreError) {}
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub events_applied: usize,
    pub events_rejected: usize,
    pub settle_passes: usize,
}

/// Event loop driving a dashboard.
///
/// UI events queue on an unbounded channel and are handled strictly in
/// arrival order: apply one event, run one settle pass to completion
/// (including any suspended fetch), then take the next event. An event that
/// arrives while a pass is suspended waits behind it; nothing is cancelled.
pub struct Session {
    dashboard: FxDashboard,
    events: mpsc::UnboundedReceiver<UiEvent>,
}

impl Session {
    /// Create a session and the sender used to feed it events.
    pub fn new(dashboard: FxDashboard) -> (Self, mpsc::UnboundedSender<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                dashboard,
                events: rx,
            },
            tx,
        )
    }

    /// Run an initial settle pass, then process events until every sender is dropped.
    /// Rejected events do not mutate any source and are not followed by a pass.
    pub async fn run<S: Surface>(mut self, surface: &mut S) -> (FxDashboard, SessionStats) {
        let mut stats = SessionStats::default();

        for update in self.dashboard.settle().await {
            surface.present(&update);
        }
        stats.settle_passes += 1;

        while let Some(event) = self.events.recv().await {
            log::debug!("event: {event}");
            if let Err(e) = self.dashboard.apply(&event) {
                log::warn!("rejected event ({event}): {e}");
                surface.rejected(&event, &e);
                stats.events_rejected += 1;
                continue;
            }
            stats.events_applied += 1;

            for update in self.dashboard.settle().await {
                surface.present(&update);
            }
            stats.settle_passes += 1;
        }

        log::info!(
            "session ended: {} events applied, {} rejected",
            stats.events_applied,
            stats.events_rejected
        );
        (self.dashboard, stats)
    }
}
