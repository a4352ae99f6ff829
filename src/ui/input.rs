//! Input Box
//!
//! One-line text entry for new items and comments.

use crate::app::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let Some(input) = &app.input else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(4)])
        .split(f.area());
    let area = chunks[1];
    f.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green))
        .title(Span::styled(
            format!(" {} ", input.prompt),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ));

    let mut lines = vec![Line::from(vec![
        Span::styled("> ", Style::default().fg(Color::Green)),
        Span::styled(input.text.as_str(), Style::default().fg(Color::White)),
        Span::styled("_", Style::default().fg(Color::DarkGray)),
    ])];
    lines.push(match &input.error {
        Some(err) => Line::from(Span::styled(err.as_str(), Style::default().fg(Color::Red))),
        None => Line::from(Span::styled(
            "Enter: submit  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    });

    f.render_widget(Paragraph::new(lines).block(block), area);
}
