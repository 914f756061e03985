mod analytics;
mod app;
mod auth;
mod catalog;
mod components;
mod config;
mod db;
mod doctors;
mod error;
mod models;
mod tui;
mod visits;

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use config::Config;
use crossterm::{
    event::DisableMouseCapture,
    terminal::{self, LeaveAlternateScreen},
};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tui::Tui;

fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing(&config.log_file)?;
    tracing::info!(version = config::APP_VERSION, "starting {}", config::APP_NAME);

    let conn = db::open_database(&config.db)?;
    if config.seed_demo {
        db::seed::seed_demo(&conn, analytics::local_today())?;
    }

    let _guard = CleanupGuard;

    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    let mut tui = Tui::new(terminal);
    tui.init()?;

    let mut app = App::new(conn);
    let res = app.run(&mut tui);

    tui.exit()?;

    if let Err(e) = res {
        tracing::error!(error = %e, "application error");
        eprintln!("Application Error: {e}");
    }
    Ok(())
}

/// Sends `tracing` output to the log file; `RUST_LOG` overrides the level.
fn init_tracing(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "fieldtrack=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
    Ok(())
}

struct CleanupGuard;

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        // Ignore errors during cleanup
        let _ = terminal::disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    }
}
