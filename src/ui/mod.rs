//! Terminal User Interface rendering module
//!
//! Renders the current view with ratatui: a header, the paged table for the
//! active resource, an optional filter bar, and a one-line footer. Modal
//! state (help, dialogs, input, detail, notifications) is drawn as an
//! overlay on top.
//!
//! # Architecture
//!
//! - [`splash`] - Startup splash screen shown during the first fetch
//! - `header` - View tabs, counts, and sort/page state
//! - `help` - Help overlay showing keybindings
//! - `dialog` - Confirmation and warning dialogs
//! - `command_box` - Command mode input (`:` key)
//! - `input` - One-line text entry for new items and comments
//! - `detail` - Sub-resource panel (comments, photos)
//! - `notifications` - Notification history panel

mod command_box;
mod detail;
mod dialog;
mod header;
mod help;
mod input;
mod notifications;
pub mod splash;

use crate::app::{App, Mode, FAVORITE_FIELD};
use crate::detail::LoadState;
use crate::notification::NotificationStatus;
use crate::pipeline::SortKey;
use crate::resource::{Item, ResourceDef};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use serde_json::Value;

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header
            Constraint::Min(1),    // Table
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    header::render(f, app, chunks[0]);
    render_main_content(f, app, chunks[1]);
    render_footer(f, app, chunks[2]);

    // Overlays
    match app.mode {
        Mode::Help => help::render(f, app),
        Mode::Confirm | Mode::Warning => dialog::render(f, app),
        Mode::Command => command_box::render(f, app),
        Mode::Input => {
            if app.detail.is_open() {
                detail::render(f, app);
            }
            input::render(f, app);
        }
        Mode::Detail => detail::render(f, app),
        Mode::Notifications => notifications::render(f, app),
        Mode::Normal => {}
    }
}

/// Centered rectangle taking `percent_x`/`percent_y` of `r`
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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

fn render_main_content(f: &mut Frame, app: &App, area: Rect) {
    let show_filter = app.filter_active || !app.view_state.filter_text.is_empty();

    if show_filter {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(area);

        render_filter_bar(f, app, chunks[0]);
        render_table(f, app, chunks[1]);
    } else {
        render_table(f, app, area);
    }
}

fn render_filter_bar(f: &mut Frame, app: &App, area: Rect) {
    let style = if app.filter_active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let text = if app.filter_active {
        format!("/{}_", app.view_state.filter_text)
    } else {
        format!("/{}", app.view_state.filter_text)
    };

    f.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), area);
}

/// Extra columns some views show next to their data columns
enum ExtraColumn {
    Author,
    Thumbnail,
}

impl ExtraColumn {
    fn header(&self) -> &'static str {
        match self {
            Self::Author => "AUTHOR",
            Self::Thumbnail => "COVER",
        }
    }

    fn width(&self) -> u16 {
        match self {
            Self::Author => 20,
            Self::Thumbnail => 36,
        }
    }
}

fn extra_columns(resource: &ResourceDef) -> Vec<ExtraColumn> {
    let mut extras = Vec::new();
    if resource.author_field.is_some() {
        extras.push(ExtraColumn::Author);
    }
    if resource.thumbnail.is_some() {
        extras.push(ExtraColumn::Thumbnail);
    }
    extras
}

fn render_table(f: &mut Frame, app: &App, area: Rect) {
    let Some(resource) = app.current_resource() else {
        let msg = Paragraph::new("Unknown view").style(Style::default().fg(Color::Red));
        f.render_widget(msg, area);
        return;
    };

    let projection = app.projection();
    let selection_info = if app.selection.is_empty() {
        String::new()
    } else {
        format!(" [{}✓]", app.selection.len())
    };
    let title = format!(
        " {}[{}] page {}/{}{} ",
        resource.display_name,
        projection.total_matches,
        app.view_state.page,
        projection.total_pages,
        selection_info
    );

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner_area = block.inner(area);
    f.render_widget(block, area);

    if projection.items.is_empty() {
        let msg = if app.loading {
            "Loading..."
        } else if app.view_state.filter_text.is_empty() {
            "No items"
        } else {
            "No items match the filter"
        };
        let empty = Paragraph::new(msg)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center);
        f.render_widget(empty, inner_area);
        return;
    }

    let extras = extra_columns(resource);
    let sorted_field = match &app.view_state.sort_key {
        SortKey::Field(field) => Some(field.as_str()),
        SortKey::Default => None,
    };
    let header_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut header_cells = vec![Cell::from("  ").style(header_style)];
    header_cells.extend(resource.columns.iter().map(|col| {
        let text = if sorted_field == Some(col.json_path.as_str()) {
            format!(" {} {}", col.header, app.view_state.sort_direction.arrow())
        } else {
            format!(" {}", col.header)
        };
        Cell::from(text).style(header_style)
    }));
    header_cells.extend(
        extras
            .iter()
            .map(|extra| Cell::from(format!(" {}", extra.header())).style(header_style)),
    );
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = projection
        .items
        .iter()
        .map(|item| {
            let is_selected = app.is_selected(item.id);
            let mut cells = vec![Cell::from(row_marker(item, is_selected)).style(
                if is_selected {
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Yellow)
                },
            )];

            cells.extend(resource.columns.iter().map(|col| {
                let (text, style) = format_cell(item.field(&col.json_path));
                Cell::from(format!(" {}", truncate_string(&text, 60))).style(style)
            }));

            cells.extend(extras.iter().map(|extra| {
                let text = match extra {
                    ExtraColumn::Author => app.author_name(item).unwrap_or("…").to_string(),
                    ExtraColumn::Thumbnail => thumbnail_text(app.thumbnail(item.id)),
                };
                Cell::from(format!(" {}", truncate_string(&text, 40)))
                    .style(Style::default().fg(Color::DarkGray))
            }));

            let row = Row::new(cells);
            if is_selected {
                row.style(Style::default().bg(Color::Rgb(40, 60, 40)))
            } else {
                row
            }
        })
        .collect();

    let mut widths = vec![Constraint::Length(3)];
    widths.extend(resource.columns.iter().map(|col| Constraint::Fill(col.width)));
    widths.extend(extras.iter().map(|extra| Constraint::Fill(extra.width())));

    let table = Table::new(rows, widths).header(header).row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = TableState::default();
    state.select(Some(app.cursor));
    f.render_stateful_widget(table, inner_area, &mut state);
}

/// Selection dot plus favorite star
fn row_marker(item: &Item, is_selected: bool) -> String {
    let dot = if is_selected { '●' } else { ' ' };
    let star = if item.flag(FAVORITE_FIELD) { '★' } else { ' ' };
    format!("{}{}", dot, star)
}

fn format_cell(value: Option<&Value>) -> (String, Style) {
    match value {
        Some(Value::Bool(true)) => ("✓ done".to_string(), Style::default().fg(Color::Green)),
        Some(Value::Bool(false)) => ("○ open".to_string(), Style::default().fg(Color::Yellow)),
        Some(Value::String(s)) => (s.replace('\n', " "), Style::default()),
        Some(Value::Number(n)) => (n.to_string(), Style::default().fg(Color::LightBlue)),
        Some(Value::Null) | None => ("-".to_string(), Style::default().fg(Color::DarkGray)),
        Some(other) => (other.to_string(), Style::default()),
    }
}

fn thumbnail_text(state: Option<&LoadState<Option<String>>>) -> String {
    match state {
        None | Some(LoadState::Idle) | Some(LoadState::Loading) => "…".to_string(),
        Some(LoadState::Loaded(Some(url))) => url.clone(),
        Some(LoadState::Loaded(None)) => "(no photos)".to_string(),
        Some(LoadState::Failed(_)) => "(unavailable)".to_string(),
    }
}

/// Truncate string for display (Unicode-safe)
pub(crate) fn truncate_string(s: &str, max_len: usize) -> String {
    let char_count = s.chars().count();
    if char_count > max_len {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    } else {
        s.to_string()
    }
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let toast = app.notification_manager.current_toast();

    let hint = match app.mode {
        Mode::Detail => "j/k: scroll | a: add | Esc: close".to_string(),
        _ if app.filter_active => "Type to filter | Enter: apply | Esc: clear".to_string(),
        _ => {
            let sub_hint = app
                .current_resource()
                .and_then(|r| r.sub_resource.as_ref())
                .map(|s| format!(" | {}:{}", s.shortcut, s.display_name))
                .unwrap_or_default();
            format!(
                "[/]: page | s/S: sort | +/-: size {}{}",
                app.view_state.page_size, sub_hint
            )
        }
    };

    let (status_text, style) = if let Some(err) = &app.error_message {
        (
            format!("Error: {}", err),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else if let Some(notif) = toast {
        let color = match notif.status {
            NotificationStatus::Success => Color::Green,
            NotificationStatus::Error(_) => Color::Red,
            NotificationStatus::Pending => Color::Yellow,
        };
        (notif.toast_message(), Style::default().fg(color))
    } else if app.loading {
        ("Loading...".to_string(), Style::default().fg(Color::Yellow))
    } else {
        (hint, Style::default().fg(Color::DarkGray))
    };

    let pending = app.notification_manager.pending_count();
    let indicator = if pending > 0 {
        format!(" [↻{}]", pending)
    } else if app.notification_manager.has_notifications() {
        " [N]".to_string()
    } else {
        String::new()
    };

    let footer = Line::from(vec![
        Span::styled(
            format!("<{}>", app.view_key),
            Style::default().fg(Color::Black).bg(Color::Cyan),
        ),
        Span::raw(" "),
        Span::styled(status_text, style),
        Span::styled(indicator, Style::default().fg(Color::DarkGray)),
    ]);

    f.render_widget(Paragraph::new(footer), area);
}
