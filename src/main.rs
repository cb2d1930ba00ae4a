mod app;
mod config;
mod logging;
mod task;
mod task_store;
mod ui;

use anyhow::{Context, Result};
use app::App;
use config::{Config, CONFIG_FILE};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, path::Path};
use task_store::TaskStore;
use tracing::{error, info};

fn open_tasks(config: &Config) -> Result<App> {
    let store = TaskStore::new(&config.database_path);
    store
        .initialize()
        .context("failed to initialize task storage")?;
    info!(database = %store.path().display(), "task storage ready");
    App::new(store).context("failed to load tasks")
}

fn main() -> Result<()> {
    let config = Config::load(Path::new(CONFIG_FILE)).context("failed to load configuration")?;
    logging::init(&config)?;

    let mut app = open_tasks(&config).inspect_err(|err| error!("startup failed: {err:#}"))?;

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        SetTitle(ui::WINDOW_TITLE)
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = ui::run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    match &result {
        Ok(()) => info!("window closed"),
        Err(err) => error!("session aborted: {err:#}"),
    }
    result
}
