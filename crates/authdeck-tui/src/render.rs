//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState` by immutable reference, draw to a ratatui
//! Frame, and never mutate state or return effects.

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use unicode_width::UnicodeWidthStr;

use authdeck_core::actions::{CredentialMethod, OperationMode};

use crate::output::OutputKind;
use crate::state::{AppState, Focus};

/// Height of status line at the bottom.
const STATUS_HEIGHT: u16 = 1;

/// Lines of output shown in the result pane.
const OUTPUT_LINES: usize = 50;

/// Spinner frames for status line animation.
const SPINNER_FRAMES: &[&str] = &["◐", "◓", "◑", "◒"];

/// Slows the spinner relative to the tick cadence.
const SPINNER_SPEED_DIVISOR: usize = 2;

/// Renders the entire TUI to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(12),
            Constraint::Length(10),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(area);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[0]);

    render_controls(app, frame, columns[0]);
    render_user_panel(app, frame, columns[1]);
    render_output(app, frame, chunks[1]);
    render_status_line(app, frame, chunks[2]);
}

fn focus_style(app: &AppState, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

/// Left column: mode tabs, action list, credential method, input fields.
fn render_controls(app: &AppState, frame: &mut Frame, area: Rect) {
    let requirements = app.selection.field_requirements();
    let method_height = if app.selection.requires_credential() { 3 } else { 0 };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(7),
            Constraint::Length(method_height),
            Constraint::Length(3),
            Constraint::Length(3),
        ])
        .split(area);

    render_mode_tabs(app, frame, rows[0]);
    render_action_list(app, frame, rows[1]);
    if method_height > 0 {
        render_method_picker(app, frame, rows[2]);
    }
    render_field(
        frame,
        rows[3],
        "Email",
        &app.fields.email,
        requirements.email,
        app.focus == Focus::EmailField,
        false,
    );
    render_field(
        frame,
        rows[4],
        "Password",
        &app.fields.password,
        requirements.password,
        app.focus == Focus::PasswordField,
        true,
    );
}

fn render_mode_tabs(app: &AppState, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (i, mode) in OperationMode::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let selected = *mode == app.selection.mode;
        let enabled = OperationMode::valid_modes(app.signed_in()).contains(mode);
        let style = if selected {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if enabled {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(mode.label(), style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(app, Focus::ModePicker))
        .title(" Mode ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_action_list(app: &AppState, frame: &mut Frame, area: Rect) {
    let selected = app.selection.action_index();
    let items: Vec<ListItem> = app
        .selection
        .action_labels()
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let (marker, style) = if i == selected {
                (
                    "> ",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                ("  ", Style::default().fg(Color::Gray))
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, style),
                Span::styled(label.to_string(), style),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(app, Focus::ActionPicker))
        .title(" Action ");
    frame.render_widget(List::new(items).block(block), area);
}

fn render_method_picker(app: &AppState, frame: &mut Frame, area: Rect) {
    let mut spans = Vec::new();
    for (i, method) in CredentialMethod::ALL.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        let style = if *method == app.selection.credential_method {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        spans.push(Span::styled(method.label(), style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(focus_style(app, Focus::MethodPicker))
        .title(" Credential ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_field(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    value: &str,
    enabled: bool,
    focused: bool,
    mask: bool,
) {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let text_style = if enabled {
        Style::default().fg(Color::White)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let shown = if !enabled {
        "(not used)".to_string()
    } else if mask {
        "•".repeat(value.width())
    } else {
        value.to_string()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(format!(" {title} "));
    frame.render_widget(
        Paragraph::new(Span::styled(shown, text_style)).block(block),
        area,
    );
}

/// Right column: current identity and profile photo metadata.
fn render_user_panel(app: &AppState, frame: &mut Frame, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    match &app.current_user {
        Some(user) => {
            lines.push(field_line("uid", &user.uid));
            lines.push(field_line("email", user.email.as_deref().unwrap_or("-")));
            lines.push(field_line(
                "name",
                user.display_name.as_deref().unwrap_or("-"),
            ));
            lines.push(field_line(
                "providers",
                &if user.provider_ids.is_empty() {
                    "-".to_string()
                } else {
                    user.provider_ids.join(", ")
                },
            ));
            lines.push(Line::default());
            match (&user.photo_url, &app.photo.meta) {
                (Some(url), Some(meta)) => {
                    lines.push(field_line("photo", url));
                    lines.push(field_line(
                        "",
                        &format!(
                            "{}x{} {} ({} bytes)",
                            meta.width, meta.height, meta.format, meta.bytes
                        ),
                    ));
                }
                (Some(url), None) => {
                    lines.push(field_line("photo", url));
                    if app.tasks.photo_fetch.is_running() {
                        lines.push(field_line("", "loading..."));
                    }
                }
                (None, _) => lines.push(field_line("photo", "-")),
            }
        }
        None => lines.push(Line::from(Span::styled(
            "Signed out",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" User ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(name: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{name:>10} "), Style::default().fg(Color::DarkGray)),
        Span::styled(value.to_string(), Style::default().fg(Color::Gray)),
    ])
}

/// Bottom pane: timestamped operation results, most recent last.
fn render_output(app: &AppState, frame: &mut Frame, area: Rect) {
    let inner_height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = app
        .output
        .tail(OUTPUT_LINES.min(inner_height.max(1)))
        .iter()
        .map(|entry| {
            let color = match entry.kind {
                OutputKind::Info => Color::Gray,
                OutputKind::Success => Color::Green,
                OutputKind::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    entry.at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(entry.text.clone(), Style::default().fg(color)),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Output ");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Renders the status line at the very bottom.
fn render_status_line(app: &AppState, frame: &mut Frame, area: Rect) {
    let spans: Vec<Span> = if app.tasks.execute.is_running() {
        let spinner_idx = (app.spinner_frame / SPINNER_SPEED_DIVISOR) % SPINNER_FRAMES.len();
        vec![
            Span::styled(SPINNER_FRAMES[spinner_idx], Style::default().fg(Color::Green)),
            Span::raw(" "),
            Span::styled("Running...", Style::default().fg(Color::Green)),
        ]
    } else {
        vec![
            Span::styled("Tab", Style::default().fg(Color::DarkGray)),
            Span::raw(" focus  "),
            Span::styled("Enter", Style::default().fg(Color::DarkGray)),
            Span::raw(" execute  "),
            Span::styled("Esc", Style::default().fg(Color::DarkGray)),
            Span::raw(" quit"),
        ]
    };

    let status = Paragraph::new(Line::from(spans)).alignment(Alignment::Left);
    frame.render_widget(status, area);
}
