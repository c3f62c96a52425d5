//! Services table: one row per endpoint with its status and current values.

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
};

use crate::service::Service;
use crate::ui::theme::{ERR, OK, RESTARTED, SELECTED_BG};
use crate::var::VarName;

pub fn status_span(s: &Service) -> Span<'static> {
    if s.err.is_some() {
        Span::styled("ERR", Style::default().fg(ERR).add_modifier(Modifier::BOLD))
    } else if s.restarted {
        Span::styled("RESTARTED", Style::default().fg(RESTARTED).add_modifier(Modifier::BOLD))
    } else {
        Span::styled("OK", Style::default().fg(OK))
    }
}

pub fn draw_services(
    f: &mut ratatui::Frame<'_>,
    area: Rect,
    services: &[Service],
    vars: &[VarName],
    selected: usize,
) {
    let header = Row::new(
        ["Service", "Status"]
            .into_iter()
            .map(|h| Cell::from(h.to_string()))
            .chain(vars.iter().map(|v| Cell::from(v.short().to_string()))),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = services.iter().map(|s| {
        let cells = [Cell::from(s.name.clone()), Cell::from(status_span(s))]
            .into_iter()
            .chain(vars.iter().map(|v| Cell::from(s.value(v))));
        Row::new(cells)
    });

    let widths: Vec<Constraint> = [Constraint::Min(16), Constraint::Length(10)]
        .into_iter()
        .chain(vars.iter().map(|_| Constraint::Min(10)))
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Services"))
        .highlight_style(Style::default().bg(SELECTED_BG));

    let mut state = TableState::default().with_selected(Some(selected));
    f.render_stateful_widget(table, area, &mut state);
}
