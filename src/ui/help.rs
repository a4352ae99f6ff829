//! Help Overlay
//!
//! Shows keyboard shortcuts.

use super::centered_rect;
use crate::app::App;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

const SECTIONS: &[(&str, &[(&str, &str)])] = &[
    (
        "Navigation",
        &[
            ("j/k, ↑/↓", "Move up/down"),
            ("g/G", "Top/bottom of page"),
            ("[/], ←/→", "Previous/next page"),
            ("{/}", "First/last page"),
            ("+/-", "Page size"),
            ("1-9", "Switch view"),
            ("R", "Refresh current view"),
        ],
    ),
    (
        "Filter & sort",
        &[
            ("/", "Start filtering"),
            ("Esc", "Clear filter"),
            ("s", "Cycle sort field"),
            ("S", "Toggle sort direction"),
        ],
    ),
    (
        "Selection",
        &[
            ("Space", "Toggle row"),
            ("a", "Select/deselect all"),
            ("X", "Delete selected"),
        ],
    ),
    (
        "Items",
        &[
            ("n", "New item"),
            ("x, Del", "Delete item"),
            ("t", "Toggle completed"),
            ("f", "Toggle favorite"),
            ("Enter", "Open details (comments, photos)"),
            ("a (details)", "Add comment"),
        ],
    ),
    (
        "Other",
        &[
            (":", "Command mode"),
            ("N", "Notification history"),
            ("?/Esc", "Close help"),
            ("q", "Quit"),
        ],
    ),
];

pub fn render(f: &mut Frame, _app: &App) {
    let popup_area = centered_rect(70, 80, f.area());
    f.render_widget(Clear, popup_area);

    let mut help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    for (title, keys) in SECTIONS {
        help_text.push(Line::from(Span::styled(
            *title,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (key, desc) in *keys {
            help_text.push(Line::from(vec![
                Span::styled(format!("  {:<12}", key), Style::default().fg(Color::Yellow)),
                Span::raw(*desc),
            ]));
        }
        help_text.push(Line::from(""));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ));

    f.render_widget(Paragraph::new(help_text).block(block), popup_area);
}
