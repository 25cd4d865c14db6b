use fx_dashboard_core::errors::CoreError;
use fx_dashboard_core::models::event::UiEvent;
use fx_dashboard_core::reactive::{BindingKind, Output, RenderUpdate};
use fx_dashboard_core::services::session::Surface;

/// Historical tables longer than this are truncated on screen.
const MAX_HISTORY_ROWS: usize = 20;

/// Prints each re-rendered region to stdout.
pub struct ConsoleSurface {
    max_rows: usize,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self {
            max_rows: MAX_HISTORY_ROWS,
        }
    }
}

impl Default for ConsoleSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for ConsoleSurface {
    fn present(&mut self, update: &RenderUpdate) {
        let title = match &update.kind {
            BindingKind::ValueBox { title } => title.clone(),
            BindingKind::Text | BindingKind::Table => update.binding.clone(),
        };
        println!("── {title} ──");
        match &update.output {
            Output::Text(text) => println!("{text}"),
            Output::Table(table) => {
                let mut shown = table.clone();
                let total = shown.rows.len();
                shown.rows.truncate(self.max_rows);
                println!("{}", shown.to_text());
                if total > self.max_rows {
                    println!("… {} more rows", total - self.max_rows);
                }
            }
            Output::Error(msg) => println!("(unavailable) {msg}"),
        }
        println!();
    }

    fn rejected(&mut self, event: &UiEvent, error: &CoreError) {
        eprintln!("Ignored {event}: {error}");
    }
}
