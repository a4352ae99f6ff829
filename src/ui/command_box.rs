//! Command Box
//!
//! Command input with autocomplete.

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(12)])
        .split(f.area());

    let command_area = chunks[1];
    f.render_widget(Clear, command_area);

    let inner_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(command_area);

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Command ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    let mut spans = vec![
        Span::styled(":", Style::default().fg(Color::Cyan)),
        Span::styled(app.command_text.as_str(), Style::default().fg(Color::White)),
    ];
    // Ghost text for the rest of the highlighted suggestion
    if let Some(remaining) = app
        .command_preview
        .as_deref()
        .and_then(|preview| preview.strip_prefix(app.command_text.as_str()))
    {
        spans.push(Span::styled(remaining, Style::default().fg(Color::DarkGray)));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).block(input_block),
        inner_chunks[0],
    );

    let suggestions_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " Suggestions (↑/↓ to select, Tab to complete) ",
            Style::default().fg(Color::DarkGray),
        ));

    let suggestions: Vec<ListItem> = app
        .command_suggestions
        .iter()
        .enumerate()
        .take(8)
        .map(|(i, cmd)| {
            let style = if i == app.command_suggestion_selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Span::styled(format!("  {}", cmd), style))
        })
        .collect();

    f.render_widget(
        List::new(suggestions).block(suggestions_block),
        inner_chunks[1],
    );
}
