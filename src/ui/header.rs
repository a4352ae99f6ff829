//! Header Component
//!
//! Displays the API root, view tabs, and list state.

use crate::app::App;
use crate::resource::{get_resource, view_keys};
use crate::VERSION;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" tplace v{} ", VERSION),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    // Row 1: API root
    let mut api_line = vec![
        Span::styled(" API: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            app.client.base_url(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    if app.readonly {
        api_line.push(Span::styled(
            "  [READ-ONLY]",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(api_line)), rows[0]);

    // Row 2: view tabs
    let mut tabs = vec![Span::styled(" Views: ", Style::default().fg(Color::DarkGray))];
    for (i, key) in view_keys().iter().enumerate() {
        let name = get_resource(key)
            .map(|r| r.display_name.as_str())
            .unwrap_or(key.as_str());
        let style = if *key == app.view_key {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        tabs.push(Span::styled(format!(" {}:{} ", i + 1, name), style));
        tabs.push(Span::raw(" "));
    }
    f.render_widget(Paragraph::new(Line::from(tabs)), rows[1]);

    // Row 3: counts and sort
    let state_line = if let Some(resource) = app.current_resource() {
        let projection = app.projection();
        let mut spans = vec![
            Span::styled(" Count: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                projection.total_matches.to_string(),
                Style::default().fg(Color::White),
            ),
        ];
        if projection.total_matches != app.collection.len() {
            spans.push(Span::styled(
                format!(" (filtered from {})", app.collection.len()),
                Style::default().fg(Color::DarkGray),
            ));
        }
        spans.extend([
            Span::raw("  "),
            Span::styled("Sort: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!(
                    "{} {}",
                    resource.sort_label(&app.view_state.sort_key),
                    app.view_state.sort_direction.arrow()
                ),
                Style::default().fg(Color::Green),
            ),
            Span::raw("  "),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" help", Style::default().fg(Color::DarkGray)),
        ]);
        Line::from(spans)
    } else {
        Line::from(Span::styled(
            " No resource selected",
            Style::default().fg(Color::Red),
        ))
    };
    f.render_widget(Paragraph::new(state_line), rows[2]);
}
