//! Interactive terminal console
//!
//! Two tabs (app permissions and users), each a paginated list with
//! create, edit and delete dialogs. Gateway calls run on tokio tasks and
//! report back to the draw loop over a channel.

pub mod app;
pub mod components;
pub mod events;
pub mod screens;
pub mod ui;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{error, info};

pub use app::App;

use crate::gateway::ConsoleGateway;
use crate::locale::Locale;

/// Take over the terminal and run the console until the user quits
pub async fn run_tui(
    gateway: Arc<dyn ConsoleGateway>,
    locale: Locale,
    lookup_debounce: Duration,
) -> Result<()> {
    info!("Starting console TUI ({})", locale.name);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(gateway, locale, lookup_debounce);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!("Console TUI encountered an error: {}", e);
    }
    result
}
