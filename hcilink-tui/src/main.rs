/*!
 * HCILINK Bluetooth Manager TUI
 * Scan for nearby devices and connect with a keypress
 * Onyx Digital Intelligence Development LLC
 */

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use tokio::time::{interval, Duration};

mod app;
mod logging;
mod ui;

use app::App;
use hcilink_core::audit::AuditEntry;
use hcilink_core::{HciConfig, SharedWorkflow, Workflow};
use ui::render_ui;

#[derive(Parser)]
#[command(name = "hcilink")]
#[command(about = "HCILINK Bluetooth Manager TUI")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/hcilink/hcilink.toml")]
    config: String,

    /// Write debug logs to hcilink-tui.log
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init_file_logging(cli.debug)?;

    let config = HciConfig::load(&cli.config)?;
    let workflow = Workflow::from_config(&config);
    workflow
        .audit()
        .record(AuditEntry::info("Bluetooth Manager started"));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(SharedWorkflow::new(workflow));

    // Create ticker for UI updates
    let mut ticker = interval(Duration::from_millis(100));

    let result: Result<()> = loop {
        // Handle events
        if event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.dialog.is_some() {
                    match key.code {
                        KeyCode::Esc | KeyCode::Enter => app.dismiss_dialog(),
                        KeyCode::Char('q') => break Ok(()),
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Char('q') => break Ok(()),
                        KeyCode::Up => app.previous_device(),
                        KeyCode::Down => app.next_device(),
                        KeyCode::Char('s') => app.start_scan(),
                        KeyCode::Enter | KeyCode::Char('c') => app.start_connect(),
                        KeyCode::Char('r') => app.refresh_services(),
                        _ => {}
                    }
                }
            }
        }

        ticker.tick().await;
        app.drain_events();

        // Render UI
        if let Err(e) = terminal.draw(|f| render_ui(f, &app)) {
            break Err(e.into());
        }
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
