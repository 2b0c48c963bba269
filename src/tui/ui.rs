//! UI layout and rendering logic for the TUI.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::app::App;
use crate::language::Language;
use crate::session::{Availability, Phase};

/// Render the main UI
pub fn render_ui(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),  // Language selector
            Constraint::Min(6),     // Editor
            Constraint::Length(1),  // Run button
            Constraint::Length(10), // Output
            Constraint::Length(5),  // Statistics
            Constraint::Length(1),  // Status bar
        ])
        .split(frame.area());

    render_language_selector(frame, app, main_layout[0]);
    render_editor(frame, app, main_layout[1]);
    render_run_button(frame, app, main_layout[2]);
    render_output(frame, app, main_layout[3]);
    render_statistics(frame, app, main_layout[4]);
    render_status_bar(frame, app, main_layout[5]);

    if app.toast.is_some() {
        render_toast(frame, app);
    }

    // Render help overlay if requested
    if app.show_help {
        render_help_overlay(frame);
    }
}

fn render_language_selector(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<&str> = Language::ALL.iter().map(|l| l.display_name()).collect();
    let selected = Language::ALL
        .iter()
        .position(|l| *l == app.session.language)
        .unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Language (F2/F3)"),
        )
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD | Modifier::REVERSED),
        );
    frame.render_widget(tabs, area);
}

fn render_editor(frame: &mut Frame, app: &App, area: Rect) {
    let editor = &app.editor;
    let inner_height = area.height.saturating_sub(2) as usize;

    // Keep the cursor row in view
    let top = if inner_height == 0 {
        0
    } else {
        editor.row.saturating_sub(inner_height - 1)
    };

    let lines: Vec<Line> = editor.lines.iter().map(|l| Line::from(l.as_str())).collect();
    let title = format!(
        "Editor - {} [{}] Ln {}, Col {}",
        app.session.language.display_name(),
        app.session.language.syntax_id(),
        editor.row + 1,
        editor.col + 1
    );
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title))
        .scroll((top as u16, 0));
    frame.render_widget(paragraph, area);

    if !app.show_help {
        let x = area.x + 1 + editor.before_cursor().width() as u16;
        let y = area.y + 1 + (editor.row - top) as u16;
        let max_x = area.x + area.width.saturating_sub(2);
        frame.set_cursor_position((x.min(max_x), y));
    }
}

fn render_run_button(frame: &mut Frame, app: &App, area: Rect) {
    let (label, style) = if app.session.in_flight {
        (" Executing... ", Style::default().fg(Color::Black).bg(Color::DarkGray))
    } else {
        (
            " [F5] Run Code ",
            Style::default()
                .fg(Color::White)
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
    };
    frame.render_widget(Paragraph::new(Span::styled(label, style)), area);
}

fn render_output(frame: &mut Frame, app: &App, area: Rect) {
    let (text, color) = match (&app.session.last_run, app.session.phase) {
        (_, Phase::Submitting) => ("Executing...".to_string(), Color::Yellow),
        (Some(run), Phase::Succeeded) => (run.result.text().to_string(), Color::Green),
        (Some(run), Phase::Failed) => (run.result.text().to_string(), Color::Red),
        _ => (String::new(), Color::Reset),
    };
    let text = if text.is_empty() { "No output yet".to_string() } else { text };

    let mut title = "Output (PgUp/PgDn)".to_string();
    if let Some(run) = &app.session.last_run {
        if let Some(code) = run.exit_code {
            title.push_str(&format!(" | exit {}", code));
        }
        title.push_str(&format!(" | {} ms", run.elapsed.as_millis()));
    }

    let paragraph = Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false })
        .scroll((app.output_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_statistics(frame: &mut Frame, app: &App, area: Rect) {
    let stats = &app.session.stats;
    let lines = vec![
        Line::from(format!("Total Executions:        {}", stats.total)),
        Line::from(format!("Success Rate:            {:.0}%", stats.success_rate())),
        Line::from(format!(
            "Average Execution Time:  {}ms",
            stats.average_elapsed().as_millis()
        )),
    ];
    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Statistics"));
    frame.render_widget(paragraph, area);
}

/// Render the status bar
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let availability_color = match app.session.availability {
        Availability::Available => Color::Green,
        Availability::Unavailable => Color::Red,
        Availability::Unknown => Color::Yellow,
    };
    let line = Line::from(vec![
        Span::raw(" API: "),
        Span::styled(
            app.session.availability.to_string(),
            Style::default().fg(availability_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" | {} | F1 help | F6 re-check | Esc quit", app.api_url)),
    ]);
    let status_paragraph =
        Paragraph::new(line).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    frame.render_widget(status_paragraph, area);
}

fn render_toast(frame: &mut Frame, app: &App) {
    let Some(toast) = &app.toast else { return };
    let message = toast.notice.message();
    let area = frame.area();
    let width = (message.width() as u16 + 4).min(area.width);
    let height = 3.min(area.height);
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width + 1),
        y: area.y + area.height.saturating_sub(height + 1),
        width,
        height,
    };
    let color = if toast.notice.is_error() { Color::Red } else { Color::Green };

    frame.render_widget(Clear, popup);
    let paragraph = Paragraph::new(message)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(color)));
    frame.render_widget(paragraph, popup);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame) {
    let popup_area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, popup_area);

    let help_lines = vec![
        Line::from("CodeCrate Help"),
        Line::from(""),
        Line::from("Run:"),
        Line::from("  F5 / Ctrl+R  - Run code"),
        Line::from("  F6           - Re-check service availability"),
        Line::from(""),
        Line::from("Language:"),
        Line::from("  F2 / F3      - Next / previous language (resets the editor)"),
        Line::from(""),
        Line::from("Editor:"),
        Line::from("  Arrows, Home, End, Tab, Enter, Backspace, Delete"),
        Line::from("  PgUp/PgDn    - Scroll output"),
        Line::from(""),
        Line::from("  F1           - Toggle this help"),
        Line::from("  Esc / Ctrl+C - Quit"),
    ];

    let help_paragraph = Paragraph::new(Text::from(help_lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help")
                .title_style(
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(help_paragraph, popup_area);
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
