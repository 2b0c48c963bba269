//! Async event loop for the terminal front end.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{app::App, events::TuiEvent, ui::render_ui};
use crate::{language::Language, service::ExecutionService, session::SessionController};

/// Run the terminal front end until the user quits.
pub async fn run_tui<S>(controller: SessionController<S>, api_url: String) -> Result<()>
where
    S: ExecutionService + 'static,
{
    // Check if we're in a proper terminal environment
    if !io::IsTerminal::is_terminal(&io::stdout()) {
        return Err(anyhow::anyhow!("TUI mode requires a proper terminal environment"));
    }

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(controller.snapshot(), api_url);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<TuiEvent>();

    // Resolve availability once at startup
    spawn_probe(&controller, event_tx.clone());

    let result = run_app(&mut terminal, &mut app, &controller, event_tx, event_rx).await;

    // Restore terminal
    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableBracketedPaste)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main application loop
async fn run_app<S>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    controller: &SessionController<S>,
    event_tx: mpsc::UnboundedSender<TuiEvent>,
    mut event_rx: mpsc::UnboundedReceiver<TuiEvent>,
) -> Result<()>
where
    S: ExecutionService + 'static,
{
    // Spawn input reader
    let input_tx = event_tx.clone();
    tokio::task::spawn_blocking(move || loop {
        if event::poll(Duration::from_millis(100)).unwrap_or(false) {
            let forwarded = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => input_tx.send(TuiEvent::Key(key)),
                Ok(Event::Paste(text)) => input_tx.send(TuiEvent::Paste(text)),
                _ => Ok(()),
            };
            if forwarded.is_err() {
                break; // Channel closed
            }
        } else if input_tx.is_closed() {
            break;
        }
    });

    loop {
        app.sync(controller.snapshot());
        app.expire_toast(Instant::now());
        terminal.draw(|frame| render_ui(frame, app))?;

        while let Ok(tui_event) = event_rx.try_recv() {
            match tui_event {
                TuiEvent::Key(key) => {
                    if handle_key_event(app, key, controller, &event_tx) {
                        info!("Quit requested");
                        return Ok(());
                    }
                }
                TuiEvent::Paste(text) => {
                    app.editor.insert_str(&text);
                    controller.set_source(app.editor.text());
                }
                TuiEvent::AvailabilityResolved(availability) => {
                    debug!(%availability, "Availability event");
                }
                TuiEvent::ExecutionFinished(notice) => {
                    app.notify(notice);
                }
            }
        }

        // Small delay to prevent busy waiting
        tokio::time::sleep(Duration::from_millis(16)).await; // ~60 FPS
    }
}

fn spawn_probe<S>(controller: &SessionController<S>, tx: mpsc::UnboundedSender<TuiEvent>)
where
    S: ExecutionService + 'static,
{
    let controller = controller.clone();
    tokio::spawn(async move {
        let availability = controller.check_availability().await;
        let _ = tx.send(TuiEvent::AvailabilityResolved(availability));
    });
}

fn spawn_execute<S>(controller: &SessionController<S>, tx: mpsc::UnboundedSender<TuiEvent>)
where
    S: ExecutionService + 'static,
{
    let controller = controller.clone();
    tokio::spawn(async move {
        let notice = controller.execute().await;
        let _ = tx.send(TuiEvent::ExecutionFinished(notice));
    });
}

/// Handle keyboard events. Returns true when the user asked to quit.
fn handle_key_event<S>(
    app: &mut App,
    key: KeyEvent,
    controller: &SessionController<S>,
    event_tx: &mpsc::UnboundedSender<TuiEvent>,
) -> bool
where
    S: ExecutionService + 'static,
{
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // While help is open, any key closes it
    if app.show_help {
        app.toggle_help();
        return false;
    }

    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => return true,
        KeyCode::Esc => return true,
        KeyCode::F(1) => app.toggle_help(),
        KeyCode::F(2) => switch_language(app, controller, Language::next),
        KeyCode::F(3) => switch_language(app, controller, Language::prev),
        KeyCode::F(5) => run(app, controller, event_tx),
        KeyCode::Char('r') if ctrl => run(app, controller, event_tx),
        KeyCode::F(6) => spawn_probe(controller, event_tx.clone()),
        KeyCode::PageUp => app.scroll_output_up(),
        KeyCode::PageDown => app.scroll_output_down(),
        KeyCode::Up => app.editor.move_up(),
        KeyCode::Down => app.editor.move_down(),
        KeyCode::Left => app.editor.move_left(),
        KeyCode::Right => app.editor.move_right(),
        KeyCode::Home => app.editor.move_home(),
        KeyCode::End => app.editor.move_end(),
        code => {
            if edit(app, code, ctrl) {
                controller.set_source(app.editor.text());
            }
        }
    }
    false
}

/// Step from the controller's current language, then resync so later keys in
/// the same batch edit the new template.
fn switch_language<S>(app: &mut App, controller: &SessionController<S>, step: fn(Language) -> Language)
where
    S: ExecutionService + 'static,
{
    controller.select_language(step(controller.snapshot().language));
    app.sync(controller.snapshot());
}

/// Apply an editing key. Returns true when the buffer changed.
fn edit(app: &mut App, code: KeyCode, ctrl: bool) -> bool {
    match code {
        KeyCode::Enter => app.editor.newline(),
        KeyCode::Tab => app.editor.insert_tab(),
        KeyCode::Backspace => app.editor.backspace(),
        KeyCode::Delete => app.editor.delete(),
        KeyCode::Char(c) if !ctrl => app.editor.insert_char(c),
        _ => return false,
    }
    true
}

fn run<S>(app: &mut App, controller: &SessionController<S>, event_tx: &mpsc::UnboundedSender<TuiEvent>)
where
    S: ExecutionService + 'static,
{
    // The run action is disabled while a request is in flight
    if !app.can_run() {
        return;
    }
    controller.set_source(app.editor.text());
    spawn_execute(controller, event_tx.clone());
}
