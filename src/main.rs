use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    io::{self, Stdout},
    time::Duration,
};
use term_state_monitor::app::App;
use term_state_monitor::config::Config;
use term_state_monitor::logging::{init_logging, LogOutput};
use term_state_monitor::ui::dashboard;
use tracing::info;

const CLOCK_REFRESH: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging(LogOutput::Sink);
    let config = Config::load();
    let mut app = App::mount(&config)?;
    let redraw = app.redraw();

    enable_raw_mode()?;
    let mut terminal = restore_on_error(open_terminal, || {
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = disable_raw_mode();
    })?;
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(CLOCK_REFRESH);

    let result = async {
        loop {
            app.drain_diagnostics();
            let screen = app.screen();
            terminal.draw(|frame| dashboard::render(frame, &screen))?;
            tokio::select! {
                _ = redraw.notified() => {}
                _ = ticker.tick() => {}
                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if is_quit(key) => break,
                        Some(Ok(_)) => {}
                        Some(Err(err)) => return Err(err.into()),
                        None => break,
                    }
                }
            }
        }
        Ok::<(), Box<dyn Error>>(())
    }
    .await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let reports = app.unmount().await;
    info!(pollers = reports.len(), "exiting");
    result
}

fn open_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

/// Runs `setup`, calling `restore` if it fails so the terminal is not left in raw mode.
fn restore_on_error<T>(
    setup: impl FnOnce() -> io::Result<T>,
    restore: impl FnOnce(),
) -> io::Result<T> {
    let result = setup();
    if result.is_err() {
        restore();
    }
    result
}

fn is_quit(key: KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}
