use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;

use fx_dashboard_core::models::event::UiEvent;
use fx_dashboard_core::models::historical::DateRange;
use fx_dashboard_core::models::settings::Settings;
use fx_dashboard_core::services::session::Session;
use fx_dashboard_core::FxDashboard;

mod commands;
mod console;

use commands::Command;
use console::ConsoleSurface;

#[derive(Debug, Parser)]
#[command(name = "fx-dashboard", version, about = "Live and historical currency exchange rates")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input currency (overrides config)
    #[arg(long)]
    from: Option<String>,

    /// Output currency (overrides config)
    #[arg(long)]
    to: Option<String>,

    /// Start of the historical range (YYYY-MM-DD)
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End of the historical range (YYYY-MM-DD, defaults to today)
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Render once and exit instead of reading commands from stdin
    #[arg(long)]
    once: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(&cli)?;
    log::info!("{:?}", settings.clone().redacted());

    let app_dir = app_dir();
    let start = cli.start.unwrap_or(settings.default_start);
    let end = cli.end.unwrap_or_else(|| chrono::Local::now().date_naive());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    runtime.block_on(async move {
        let mut dashboard = FxDashboard::from_settings(&settings, &app_dir)
            .context("failed to build dashboard")?;
        dashboard
            .apply(&UiEvent::SetDateRange(DateRange::new(start, end)))
            .context("invalid date range")?;

        let (session, events) = Session::new(dashboard);
        if !cli.once {
            println!("{}", commands::HELP);
            std::thread::spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    match commands::parse(&line) {
                        Ok(Command::Event(event)) => {
                            if events.send(event).is_err() {
                                break;
                            }
                        }
                        Ok(Command::Quit) => break,
                        Ok(Command::Help) => println!("{}", commands::HELP),
                        Ok(Command::Currencies) => commands::print_currencies(),
                        Ok(Command::Empty) => {}
                        Err(msg) => eprintln!("{msg}"),
                    }
                }
                // Dropping the sender ends the session.
            });
        } else {
            drop(events);
        }

        let mut surface = ConsoleSurface::new();
        let (_, stats) = session.run(&mut surface).await;
        log::info!("{stats:?}");
        Ok::<(), anyhow::Error>(())
    })
}

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Settings::default(),
    }
    .apply_env();

    if let Some(from) = &cli.from {
        settings.input_currency = from.clone();
    }
    if let Some(to) = &cli.to {
        settings.output_currency = to.clone();
    }
    Ok(settings.validate()?)
}

/// Directory of the running executable; falls back to the working directory.
fn app_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}
