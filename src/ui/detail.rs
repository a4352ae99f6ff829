//! Detail Panel
//!
//! Parent record on top, its nested items (comments, photos) below.

use super::centered_rect;
use crate::app::App;
use crate::detail::LoadState;
use crate::resource::{extract_json_value, Item, ResourceDef};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub fn render(f: &mut Frame, app: &App) {
    let (Some(resource), Some(parent)) = (app.current_resource(), app.detail_parent.as_ref())
    else {
        return;
    };

    let popup_area = centered_rect(80, 80, f.area());
    f.render_widget(Clear, popup_area);

    let child_name = resource
        .sub_resource
        .as_ref()
        .map(|s| s.display_name.as_str())
        .unwrap_or("Details");
    let count = app
        .detail
        .state
        .loaded()
        .map(|children| format!("[{}]", children.len()))
        .unwrap_or_default();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" {} #{} {}{} ", resource.display_name, parent.id, child_name, count),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let inner = block.inner(popup_area);
    f.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    render_parent(f, resource, parent, chunks[0]);
    render_children(f, app, chunks[1]);

    let help = Line::from(vec![
        Span::styled("j/k", Style::default().fg(Color::Yellow)),
        Span::raw(": scroll  "),
        Span::styled("a", Style::default().fg(Color::Yellow)),
        Span::raw(": add  "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(": close"),
    ]);
    f.render_widget(Paragraph::new(help).alignment(Alignment::Center), chunks[2]);
}

fn render_parent(f: &mut Frame, resource: &ResourceDef, parent: &Item, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        parent.text(&resource.title_field),
        Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    ))];
    for col in &resource.columns {
        if col.json_path == resource.title_field {
            continue;
        }
        lines.push(Line::from(Span::styled(
            extract_json_value(&parent.data, &col.json_path),
            Style::default().fg(Color::Gray),
        )));
    }

    f.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }),
        area,
    );
}

fn render_children(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let children = match &app.detail.state {
        LoadState::Idle | LoadState::Loading => {
            status_line(f, inner, "Loading...", Color::Yellow);
            return;
        }
        LoadState::Failed(err) => {
            status_line(f, inner, &format!("Failed to load: {}", err), Color::Red);
            return;
        }
        LoadState::Loaded(children) if children.is_empty() => {
            status_line(f, inner, "Nothing here yet", Color::DarkGray);
            return;
        }
        LoadState::Loaded(children) => children,
    };

    let Some(child_def) = app.sub_resource() else {
        return;
    };

    // scroll counts whole children
    let mut lines = Vec::new();
    for child in children.iter().skip(app.detail.scroll) {
        lines.push(Line::from(vec![
            Span::styled(format!("#{} ", child.id), Style::default().fg(Color::DarkGray)),
            Span::styled(
                child.text(&child_def.title_field),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ]));
        for col in &child_def.columns {
            if col.json_path == child_def.title_field {
                continue;
            }
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {}: ", col.header.to_lowercase()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(extract_json_value(&child.data, &col.json_path).replace('\n', " ")),
            ]));
        }
        lines.push(Line::from(""));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
}

fn status_line(f: &mut Frame, area: Rect, text: &str, color: Color) {
    f.render_widget(
        Paragraph::new(text)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center),
        area,
    );
}
